//! Optimistic move coordination
//!
//! - `coordinator` - [`MoveCoordinator`], owner of the timeline
//! - `authority` - [`GameMode`] and its [`Confirmation`] strategy
//! - `pending` - the per-attempt [`SubmissionPhase`] state machine
//! - `puzzle` - scripted [`PuzzleLine`]

pub mod authority;
#[allow(clippy::module_inception)]
pub mod coordinator;
pub mod pending;
pub mod puzzle;

pub use authority::{Confirmation, GameMode};
pub use coordinator::{MoveCoordinator, Outbound, Reconciliation, Submission};
pub use pending::{PendingSubmission, SubmissionPhase};
pub use puzzle::PuzzleLine;
