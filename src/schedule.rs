//! Live / upcoming / past partition of a match list.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Match, MatchState};

/// Matches split by where they sit relative to a reference time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schedule {
    pub live: Vec<Match>,
    pub upcoming: Vec<Match>,
    pub past: Vec<Match>,
}

impl Schedule {
    /// Total matches across all three lists.
    pub fn len(&self) -> usize {
        self.live.len() + self.upcoming.len() + self.past.len()
    }

    /// True when no list holds a match.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition matches against `now`.
///
/// Live and complete matches go by state. Everything else is upcoming unless
/// its scheduled time has already passed; an unscheduled match is upcoming.
/// Each list is ordered by scheduled time (unscheduled first), then id.
pub fn partition(matches: &[Match], now: DateTime<Utc>) -> Schedule {
    let mut schedule = Schedule::default();

    for m in matches {
        let bucket = match m.state {
            MatchState::Live => &mut schedule.live,
            MatchState::Complete => &mut schedule.past,
            MatchState::Pending | MatchState::Scheduled => match m.scheduled_at {
                Some(at) if at < now => &mut schedule.past,
                _ => &mut schedule.upcoming,
            },
        };
        bucket.push(m.clone());
    }

    for bucket in [&mut schedule.live, &mut schedule.upcoming, &mut schedule.past] {
        bucket.sort_by(|a, b| {
            a.scheduled_at
                .cmp(&b.scheduled_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    schedule
}
