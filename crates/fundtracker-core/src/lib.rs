//! # fundtracker Core Library
//!
//! This library provides the core logic for fundtracker, a local tracker of
//! contributions toward a fixed funding target. All operations are exposed
//! through the `fundtracker` CLI; the library itself has no I/O loop.
//!
//! ## Architecture
//!
//! - **Ledger**: ordered contributions with derived total, remaining and
//!   percent funded
//! - **Milestones**: detection of every threshold crossed by one addition
//! - **Confetti**: a frame-driven particle simulator; the caller supplies
//!   the clock, the drawing surface and the randomness
//! - **Session**: orchestrates user actions against the ledger and the
//!   injected collaborators (store, notifier, confirmation prompt, stage)
//! - **Storage**: SQLite key-value persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`Session`]: one per application instance, owns the ledger
//! - [`Ledger`]: contribution arithmetic in whole cents
//! - [`ConfettiSimulator`]: Idle/Running particle state machine
//! - [`Config`]: application configuration management

pub mod confetti;
pub mod error;
pub mod events;
pub mod ledger;
pub mod milestone;
pub mod money;
pub mod session;
pub mod storage;

pub use confetti::{
    ConfettiConfig, ConfettiSimulator, FrameDriver, HiddenSurface, Particle, PcgRandom,
    RandomSource, RenderSurface, Rgb, RotatedRect, SequenceRandom, SimulatorState,
};
pub use error::{ConfigError, CoreError, LedgerError, StorageError, ValidationError};
pub use events::Event;
pub use ledger::{Ledger, Progress};
pub use milestone::{crossed, MilestoneMark, Milestones};
pub use money::format_money;
pub use session::{
    AddOutcome, ConfirmPrompt, Notification, Notifier, ProgressSnapshot, RecordingNotifier,
    Session, Stage,
};
pub use storage::{Config, ContributionStore, Database, KvContributionStore, MemoryStore};
