//! Staggered milestone announcements.
//!
//! When one contribution crosses several milestones the first is announced
//! immediately and the rest follow at a fixed interval. The queue is a
//! repeating schedule polled from the host's tick; the owner drops it as
//! soon as it drains so nothing stays scheduled afterwards.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct AnnouncementQueue {
    pending: VecDeque<u8>,
    next_due_ms: f64,
    interval_ms: u64,
}

impl AnnouncementQueue {
    /// First delivery is due one interval after `now_ms`.
    pub fn new(milestones: impl IntoIterator<Item = u8>, now_ms: f64, interval_ms: u64) -> Self {
        Self {
            pending: milestones.into_iter().collect(),
            next_due_ms: now_ms + interval_ms as f64,
            interval_ms,
        }
    }

    pub fn extend(&mut self, milestones: impl IntoIterator<Item = u8>) {
        self.pending.extend(milestones);
    }

    /// Pop the next milestone if it is due. At most one per call.
    pub fn poll(&mut self, now_ms: f64) -> Option<u8> {
        if now_ms < self.next_due_ms {
            return None;
        }
        let next = self.pending.pop_front()?;
        self.next_due_ms += self.interval_ms as f64;
        Some(next)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_due_ms(&self) -> f64 {
        self.next_due_ms
    }
}
