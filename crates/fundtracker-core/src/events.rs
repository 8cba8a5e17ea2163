use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change in a session produces an Event.
/// The host drains them after each action; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ContributionAdded {
        amount: f64,
        total: f64,
        percent_funded: u8,
        at: DateTime<Utc>,
    },
    ContributionRemoved {
        amount: f64,
        total: f64,
        percent_funded: u8,
        at: DateTime<Utc>,
    },
    LedgerReset {
        removed_count: usize,
        at: DateTime<Utc>,
    },
    /// One per threshold crossed by a single contribution, ascending.
    MilestoneReached {
        percent: u8,
        at: DateTime<Utc>,
    },
    ConfettiStarted {
        particle_count: usize,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    ConfettiFinished {
        frames: u64,
        at: DateTime<Utc>,
    },
}
