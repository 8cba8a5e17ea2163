mod announcements;
mod collaborators;
mod controller;

pub use announcements::AnnouncementQueue;
pub use collaborators::{ConfirmPrompt, Notification, Notifier, RecordingNotifier, Stage};
pub use controller::{
    milestone_message, AddOutcome, ProgressSnapshot, Session, EMPTY_INPUT_MESSAGE,
    INVALID_INPUT_MESSAGE, NOTHING_TO_UNDO_MESSAGE, RESET_DONE_MESSAGE, RESET_PROMPT,
};
