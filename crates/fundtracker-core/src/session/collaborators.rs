//! Host-provided collaborators injected into a [`Session`](super::Session).

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::confetti::{FrameDriver, RandomSource, RenderSurface};

/// Displays a transient message, replacing whatever is shown and
/// dismissing itself after `duration_ms`.
pub trait Notifier {
    fn notify(&mut self, message: &str, duration_ms: u64);
}

/// Synchronous yes/no question asked before destructive actions.
pub trait ConfirmPrompt {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub duration_ms: u64,
}

/// Notifier that keeps every message. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    log: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.log.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.log.borrow().iter().map(|n| n.message.clone()).collect()
    }

    /// The message currently on screen, if any was shown.
    pub fn last(&self) -> Option<String> {
        self.log.borrow().last().map(|n| n.message.clone())
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, message: &str, duration_ms: u64) {
        self.log.borrow_mut().push(Notification {
            message: message.to_string(),
            duration_ms,
        });
    }
}

/// Everything the confetti needs from the host.
pub struct Stage {
    pub surface: Box<dyn RenderSurface>,
    pub frames: Box<dyn FrameDriver>,
    pub rng: Box<dyn RandomSource>,
}

impl Stage {
    pub fn new(
        surface: impl RenderSurface + 'static,
        frames: impl FrameDriver + 'static,
        rng: impl RandomSource + 'static,
    ) -> Self {
        Self {
            surface: Box::new(surface),
            frames: Box::new(frames),
            rng: Box::new(rng),
        }
    }
}
