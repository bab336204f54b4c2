//! # Bracket Engine
//!
//! Normalizes raw FACEIT championship match records into a single-elimination
//! bracket and aggregates per-map match statistics.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (matches, teams, rounds, stats, diagnostics)
//! - **raw**: Source record shapes and lenient value coercion
//! - **normalize**: Team registry and raw → canonical match normalization
//! - **bracket**: Tree reconstruction and round grouping
//! - **calculate**: Player and team statistics aggregation
//! - **schedule**: Live / upcoming / past partition
//! - **engine**: One-call entry points returning owned reports
//! - **storage**: JSON, envelope and JSONL file input, JSONL export
//! - **config**: Configuration loading and validation

pub mod bracket;
pub mod calculate;
pub mod config;
pub mod engine;
pub mod models;
pub mod normalize;
pub mod raw;
pub mod schedule;
pub mod storage;

pub use models::*;
