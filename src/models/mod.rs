//! Core data models for the bracket engine.

mod bracket_match;
mod diagnostic;
mod ids;
mod match_state;
mod round;
mod stats;
mod team;

pub use bracket_match::*;
pub use diagnostic::*;
pub use ids::*;
pub use match_state::*;
pub use round::*;
pub use stats::*;
pub use team::*;
