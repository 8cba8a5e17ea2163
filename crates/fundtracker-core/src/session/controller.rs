//! Session controller.
//!
//! Owns the ledger for one application instance and turns user actions
//! (add, undo, reset) into ledger mutations, persistence writes,
//! notifications and confetti runs. All timing comes from the host: the
//! caller passes the current timestamp and drives `tick()` and `frame()`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::announcements::AnnouncementQueue;
use super::collaborators::{ConfirmPrompt, Notifier, Stage};
use crate::confetti::ConfettiSimulator;
use crate::error::{LedgerError, Result};
use crate::events::Event;
use crate::ledger::{Ledger, Progress};
use crate::milestone::MilestoneMark;
use crate::money::format_money;
use crate::storage::{Config, ContributionStore};

pub const EMPTY_INPUT_MESSAGE: &str = "Enter an amount to add.";
pub const INVALID_INPUT_MESSAGE: &str = "Enter a valid positive number.";
pub const NOTHING_TO_UNDO_MESSAGE: &str = "Nothing to undo.";
pub const RESET_PROMPT: &str = "Reset all contributions? This cannot be undone.";
pub const RESET_DONE_MESSAGE: &str = "All cleared";

pub fn milestone_message(percent: u8) -> String {
    format!("Congrats - reached {percent}%!")
}

/// Result of a successful contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOutcome {
    pub amount: f64,
    pub progress: Progress,
    /// Milestones crossed by this contribution, ascending.
    pub crossed: Vec<u8>,
}

/// Read-only view of the funding state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub target: f64,
    pub total: f64,
    pub remaining: f64,
    pub percent_funded: u8,
    pub contribution_count: usize,
    pub milestones: Vec<MilestoneMark>,
}

pub struct Session {
    config: Config,
    ledger: Ledger,
    store: Box<dyn ContributionStore>,
    notifier: Box<dyn Notifier>,
    stage: Stage,
    confetti: ConfettiSimulator,
    announcements: Option<AnnouncementQueue>,
    events: Vec<Event>,
}

impl Session {
    /// Build a session and load the ledger from `store`.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn new(
        config: Config,
        store: impl ContributionStore + 'static,
        notifier: impl Notifier + 'static,
        stage: Stage,
    ) -> Result<Self> {
        config.validate()?;
        let amounts = store.load();
        let ledger = Ledger::with_contributions(config.goal.target, &amounts)?;
        debug!(
            count = ledger.len(),
            total = ledger.total(),
            "session loaded"
        );
        let confetti = ConfettiSimulator::new(config.confetti.clone())?;
        Ok(Self {
            config,
            ledger,
            store: Box::new(store),
            notifier: Box::new(notifier),
            stage,
            confetti,
            announcements: None,
            events: Vec::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn progress(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            target: self.ledger.target(),
            total: self.ledger.total(),
            remaining: self.ledger.remaining(),
            percent_funded: self.ledger.percent_funded(),
            contribution_count: self.ledger.len(),
            milestones: self.config.goal.milestones.marks(self.ledger.target()),
        }
    }

    pub fn is_animating(&self) -> bool {
        self.confetti.is_running()
    }

    pub fn has_pending_announcements(&self) -> bool {
        self.announcements.is_some()
    }

    /// True while a confetti run or announcement schedule is outstanding.
    pub fn is_busy(&self) -> bool {
        self.is_animating() || self.has_pending_announcements()
    }

    pub fn confetti(&self) -> &ConfettiSimulator {
        &self.confetti
    }

    /// Format an amount in the configured currency.
    pub fn format_amount(&self, amount: f64) -> String {
        format_money(amount, &self.config.goal.currency_symbol)
    }

    /// Events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Parse `raw` and record it as a contribution.
    ///
    /// Invalid input is reported through the notifier and leaves the
    /// ledger untouched.
    pub fn add_contribution(&mut self, raw: &str, now_ms: f64) -> Result<AddOutcome, LedgerError> {
        let raw = raw.trim();
        if raw.is_empty() {
            self.notify(EMPTY_INPUT_MESSAGE);
            return Err(LedgerError::invalid(raw));
        }
        let amount = match raw.parse::<f64>() {
            Ok(n) => n,
            Err(_) => {
                self.notify(INVALID_INPUT_MESSAGE);
                return Err(LedgerError::invalid(raw));
            }
        };

        let prev_pct = self.ledger.percent_funded();
        let progress = match self.ledger.add(amount) {
            Ok(progress) => progress,
            Err(e) => {
                self.notify(INVALID_INPUT_MESSAGE);
                return Err(e);
            }
        };
        self.persist();

        let amount = crate::money::round2(amount);
        let crossed = self
            .config
            .goal
            .milestones
            .crossed(prev_pct, progress.percent_funded);
        info!(
            amount,
            total = progress.total,
            percent = progress.percent_funded,
            crossed = crossed.len(),
            "contribution added"
        );

        self.events.push(Event::ContributionAdded {
            amount,
            total: progress.total,
            percent_funded: progress.percent_funded,
            at: Utc::now(),
        });
        for &percent in &crossed {
            self.events.push(Event::MilestoneReached {
                percent,
                at: Utc::now(),
            });
        }

        match crossed.split_first() {
            Some((&first, rest)) => {
                self.notify(&milestone_message(first));
                self.celebrate(now_ms);
                self.schedule_announcements(rest, now_ms);
            }
            None => {
                let message = format!("{} added", self.format_amount(amount));
                self.notify(&message);
            }
        }

        Ok(AddOutcome {
            amount,
            progress,
            crossed,
        })
    }

    /// Remove the most recent contribution.
    pub fn undo(&mut self) -> Result<f64, LedgerError> {
        let amount = match self.ledger.undo_last() {
            Ok(amount) => amount,
            Err(e) => {
                self.notify(NOTHING_TO_UNDO_MESSAGE);
                return Err(e);
            }
        };
        self.persist();
        info!(amount, total = self.ledger.total(), "contribution removed");

        self.events.push(Event::ContributionRemoved {
            amount,
            total: self.ledger.total(),
            percent_funded: self.ledger.percent_funded(),
            at: Utc::now(),
        });
        let message = format!("Removed {}", self.format_amount(amount));
        self.notify(&message);
        Ok(amount)
    }

    /// Clear every contribution once `prompt` approves. Returns whether the
    /// ledger was cleared.
    pub fn reset(&mut self, prompt: &mut dyn ConfirmPrompt) -> bool {
        if !prompt.confirm(RESET_PROMPT) {
            debug!("reset declined");
            return false;
        }
        let removed_count = self.ledger.len();
        self.ledger.reset();
        self.persist();
        info!(removed_count, "ledger reset");

        self.events.push(Event::LedgerReset {
            removed_count,
            at: Utc::now(),
        });
        self.notify(RESET_DONE_MESSAGE);
        true
    }

    /// Start a confetti run with the configured duration. Ignored while one
    /// is already running.
    pub fn celebrate(&mut self, now_ms: f64) -> bool {
        let duration_ms = self.config.confetti.duration_ms;
        let stage = &mut self.stage;
        let started = self.confetti.start(
            duration_ms,
            now_ms,
            stage.surface.as_mut(),
            stage.frames.as_mut(),
            stage.rng.as_mut(),
        );
        match started {
            Some(event) => {
                self.events.push(event);
                true
            }
            None => false,
        }
    }

    /// Frame callback: advance the confetti by one step.
    pub fn frame(&mut self, now_ms: f64) {
        let stage = &mut self.stage;
        if let Some(event) =
            self.confetti
                .step(now_ms, stage.surface.as_mut(), stage.frames.as_mut())
        {
            self.events.push(event);
        }
    }

    /// The rendering surface changed size.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.confetti.resize(width, height);
    }

    /// Timer callback: deliver the next due milestone announcement.
    pub fn tick(&mut self, now_ms: f64) {
        let Some(queue) = self.announcements.as_mut() else {
            return;
        };
        let due = queue.poll(now_ms);
        let drained = queue.is_empty();
        if let Some(percent) = due {
            self.notify(&milestone_message(percent));
        }
        if drained {
            self.announcements = None;
            debug!("announcement schedule cancelled");
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn schedule_announcements(&mut self, rest: &[u8], now_ms: f64) {
        if rest.is_empty() {
            return;
        }
        let interval = self.config.notifications.announcement_interval_ms;
        match self.announcements.as_mut() {
            Some(queue) => queue.extend(rest.iter().copied()),
            None => {
                self.announcements = Some(AnnouncementQueue::new(
                    rest.iter().copied(),
                    now_ms,
                    interval,
                ));
            }
        }
        debug!(queued = rest.len(), interval, "milestone announcements scheduled");
    }

    fn persist(&mut self) {
        // Best effort: the in-memory ledger stays authoritative.
        if let Err(e) = self.store.save(&self.ledger.contributions()) {
            warn!(error = %e, "failed to persist contributions");
        }
    }

    fn notify(&mut self, message: &str) {
        self.notifier
            .notify(message, self.config.notifications.toast_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confetti::{HiddenSurface, SequenceRandom};
    use crate::session::RecordingNotifier;
    use crate::storage::MemoryStore;

    #[derive(Default)]
    struct NoFrames;

    impl crate::confetti::FrameDriver for NoFrames {
        fn request_frame(&mut self) {}
    }

    fn session_with_target(target: f64) -> (Session, MemoryStore, RecordingNotifier) {
        let mut config = Config::default();
        config.goal.target = target;
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let stage = Stage::new(
            HiddenSurface::new(800.0, 600.0),
            NoFrames,
            SequenceRandom::constant(0.5),
        );
        let session = Session::new(config, store.clone(), notifier.clone(), stage).unwrap();
        (session, store, notifier)
    }

    fn stage() -> Stage {
        Stage::new(
            HiddenSurface::new(800.0, 600.0),
            NoFrames,
            SequenceRandom::constant(0.5),
        )
    }

    #[test]
    fn milestone_message_wording() {
        assert_eq!(milestone_message(30), "Congrats - reached 30%!");
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = Config::default();
        config.goal.target = 1e17;
        let result = Session::new(config, MemoryStore::new(), RecordingNotifier::new(), stage());
        assert!(matches!(result, Err(crate::error::CoreError::Config(_))));

        let mut config = Config::default();
        config.confetti.palette.clear();
        let result = Session::new(config, MemoryStore::new(), RecordingNotifier::new(), stage());
        assert!(result.is_err());
    }

    #[test]
    fn small_add_acknowledges_amount() {
        let (mut s, store, notifier) = session_with_target(100.0);
        let out = s.add_contribution("5", 0.0).unwrap();
        assert!(out.crossed.is_empty());
        assert_eq!(store.amounts(), vec![5.0]);
        assert_eq!(notifier.last().unwrap(), "5\u{a0}€ added");
        assert!(!s.is_animating());
    }

    #[test]
    fn crossing_starts_confetti_and_staggers_rest() {
        let (mut s, _store, notifier) = session_with_target(100.0);
        s.add_contribution("5", 0.0).unwrap();
        let out = s.add_contribution("50", 100.0).unwrap();
        assert_eq!(out.crossed, vec![10, 20, 30, 40, 50]);
        assert!(s.is_animating());
        assert_eq!(notifier.last().unwrap(), milestone_message(10));

        s.tick(999.0);
        assert_eq!(notifier.last().unwrap(), milestone_message(10));
        s.tick(1000.0);
        assert_eq!(notifier.last().unwrap(), milestone_message(20));
        s.tick(1900.0);
        s.tick(2800.0);
        assert!(s.has_pending_announcements());
        s.tick(3700.0);
        assert_eq!(notifier.last().unwrap(), milestone_message(50));
        assert!(!s.has_pending_announcements());
    }

    #[test]
    fn invalid_input_is_rejected_without_mutation() {
        let (mut s, store, notifier) = session_with_target(100.0);
        assert!(s.add_contribution("   ", 0.0).is_err());
        assert_eq!(notifier.last().unwrap(), EMPTY_INPUT_MESSAGE);
        for raw in ["abc", "-3", "0", "NaN", "inf"] {
            assert!(matches!(
                s.add_contribution(raw, 0.0),
                Err(LedgerError::InvalidAmount { .. })
            ));
            assert_eq!(notifier.last().unwrap(), INVALID_INPUT_MESSAGE);
        }
        assert!(s.ledger().is_empty());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn undo_and_reset_notify() {
        let (mut s, store, notifier) = session_with_target(100.0);
        assert_eq!(s.undo(), Err(LedgerError::EmptyLedger));
        assert_eq!(notifier.last().unwrap(), NOTHING_TO_UNDO_MESSAGE);

        s.add_contribution("12.346", 0.0).unwrap();
        assert_eq!(s.undo().unwrap(), 12.35);
        assert_eq!(notifier.last().unwrap(), "Removed 12.35\u{a0}€");
        assert!(store.amounts().is_empty());

        s.add_contribution("1", 0.0).unwrap();
        assert!(!s.reset(&mut |_: &str| false));
        assert_eq!(s.ledger().len(), 1);
        assert!(s.reset(&mut |msg: &str| msg == RESET_PROMPT));
        assert!(s.ledger().is_empty());
        assert_eq!(notifier.last().unwrap(), RESET_DONE_MESSAGE);
    }

    #[test]
    fn failed_write_keeps_in_memory_state() {
        let (mut s, store, _notifier) = session_with_target(100.0);
        store.fail_writes(true);
        s.add_contribution("20", 0.0).unwrap();
        assert_eq!(s.ledger().total(), 20.0);
        assert!(store.amounts().is_empty());
    }
}
