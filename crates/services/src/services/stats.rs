//! Totals shown at the top of a personal training log.

use db::models::training_session::{GiType, TrainingSession};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct LogStats {
    pub total_sessions: u32,
    pub total_minutes: u32,
    /// `total_minutes / 60`, rounded half-up
    pub total_hours: u32,
    pub gi_sessions: u32,
    pub nogi_sessions: u32,
}

impl LogStats {
    /// Aggregate any sequence of sessions. Order does not matter.
    pub fn from_sessions<'a, I>(sessions: I) -> Self
    where
        I: IntoIterator<Item = &'a TrainingSession>,
    {
        let mut total_sessions: u64 = 0;
        let mut total_minutes: u64 = 0;
        let mut gi_sessions: u64 = 0;
        let mut nogi_sessions: u64 = 0;

        for session in sessions {
            total_sessions += 1;
            total_minutes += u64::from(session.duration_min.max(0).unsigned_abs());
            match session.gi_type {
                GiType::Gi => gi_sessions += 1,
                GiType::Nogi => nogi_sessions += 1,
            }
        }

        Self {
            total_sessions: saturate(total_sessions),
            total_minutes: saturate(total_minutes),
            total_hours: saturate(round_hours(total_minutes)),
            gi_sessions: saturate(gi_sessions),
            nogi_sessions: saturate(nogi_sessions),
        }
    }

    /// No sessions logged; the stats panel is hidden in that case
    pub fn is_empty(&self) -> bool {
        self.total_sessions == 0
    }
}

fn round_hours(minutes: u64) -> u64 {
    (minutes + 30) / 60
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
