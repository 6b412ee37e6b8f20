//! Stateful controllers for the dairy operations core.
//!
//! Every controller is built from an explicit [`SessionContext`] and talks to
//! stores only through the traits in `dairyops-storage`. All state changes
//! happen through `&mut self`, one action at a time.

pub mod account;
pub mod draft;
pub mod error;
pub mod screen;
pub mod session;

pub use account::{AccountCreationFlow, AccountError, ACKNOWLEDGMENT_WINDOW};
pub use draft::{DraftError, DraftState, RecordDraftController, Submission};
pub use error::GeneralError;
pub use screen::{Confirmation, DeleteOutcome, ListScreen, SaveOutcome, ScreenError};
pub use session::{CurrentUser, SessionContext};
