//! Contribution ledger.
//!
//! An ordered list of contributions toward a fixed target. Totals,
//! remaining amount and percent funded are derived on every query and
//! never stored.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::money::{from_cents, to_cents, Cents};

/// Largest accepted target. Keeps every cent total exactly representable
/// as an `f64`.
pub const MAX_TARGET: f64 = 10_000_000_000_000.0;

/// Result of a successful [`Ledger::add`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub total: f64,
    pub percent_funded: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    target: Cents,
    contributions: Vec<Cents>,
}

impl Ledger {
    /// Create an empty ledger. `target` is rounded to cents and must lie
    /// in `0.01..=MAX_TARGET`.
    pub fn new(target: f64) -> Result<Self, LedgerError> {
        let cents = to_cents(target)
            .filter(|&c| c > 0 && target <= MAX_TARGET)
            .ok_or(LedgerError::InvalidTarget { target })?;
        Ok(Self {
            target: cents,
            contributions: Vec::new(),
        })
    }

    /// Rebuild a ledger from persisted amounts. Entries that are not finite,
    /// are negative, or would overflow the running total are dropped.
    pub fn with_contributions(target: f64, amounts: &[f64]) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(target)?;
        let mut total: Cents = 0;
        for cents in amounts.iter().filter_map(|&a| to_cents(a)) {
            if cents < 0 {
                continue;
            }
            match total.checked_add(cents) {
                Some(sum) => {
                    total = sum;
                    ledger.contributions.push(cents);
                }
                None => warn!(cents, "persisted contribution overflows total, dropped"),
            }
        }
        Ok(ledger)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn target(&self) -> f64 {
        from_cents(self.target)
    }

    pub fn total(&self) -> f64 {
        from_cents(self.total_cents())
    }

    /// Amount still missing, floored at zero.
    pub fn remaining(&self) -> f64 {
        from_cents((self.target - self.total_cents()).max(0))
    }

    /// Integer percent of target reached, rounded and capped at 100.
    pub fn percent_funded(&self) -> u8 {
        percent_of(self.total_cents(), self.target)
    }

    /// Contributions in insertion order.
    pub fn contributions(&self) -> Vec<f64> {
        self.contributions.iter().map(|&c| from_cents(c)).collect()
    }

    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append a contribution rounded to cents. Amounts that round to zero
    /// cents are rejected.
    pub fn add(&mut self, amount: f64) -> Result<Progress, LedgerError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::invalid(amount.to_string()));
        }
        let cents = to_cents(amount)
            .filter(|&c| c > 0)
            .ok_or_else(|| LedgerError::invalid(amount.to_string()))?;
        self.total_cents()
            .checked_add(cents)
            .ok_or_else(|| LedgerError::invalid(amount.to_string()))?;

        self.contributions.push(cents);
        debug!(cents, count = self.contributions.len(), "contribution appended");
        Ok(Progress {
            total: self.total(),
            percent_funded: self.percent_funded(),
        })
    }

    /// Remove and return the most recent contribution.
    pub fn undo_last(&mut self) -> Result<f64, LedgerError> {
        let cents = self.contributions.pop().ok_or(LedgerError::EmptyLedger)?;
        debug!(cents, count = self.contributions.len(), "contribution removed");
        Ok(from_cents(cents))
    }

    pub fn reset(&mut self) {
        self.contributions.clear();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn total_cents(&self) -> Cents {
        self.contributions.iter().sum()
    }
}

fn percent_of(total: Cents, target: Cents) -> u8 {
    if target <= 0 {
        return 100;
    }
    let pct = (total as f64 / target as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
