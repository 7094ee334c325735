//! Game logic - timeline, reconciliation and the session around them
//!
//! # Module Organization
//!
//! - `timeline` - [`MoveTimeline`], the browsable move history over a position
//! - `material` - [`MaterialLedger`], captured material per side
//! - `coordinator` - [`MoveCoordinator`], optimistic moves and pushed records
//! - `engine` - engine opponent: UCI worker, difficulty, [`EngineBridge`]
//! - `projection` - [`BoardDescriptor`] for a board widget
//! - `feedback` - [`MoveCue`] and [`MoveOrigin`] for notifications and sounds
//! - `record` - persisted game record and its identifiers
//! - `session` - the actor task tying it all together
//!
//! # Data Flow
//!
//! 1. A command, push or engine line reaches the session task
//! 2. The coordinator mutates the timeline (all or nothing)
//! 3. The coordinator returns the follow-up; the session dispatches it
//! 4. The session projects the board and broadcasts a [`SessionEvent`]

pub mod coordinator;
pub mod engine;
pub mod feedback;
pub mod material;
pub mod projection;
pub mod record;
pub mod session;
pub mod timeline;

// Re-export the main entry points
pub use coordinator::{GameMode, MoveCoordinator, Outbound, Reconciliation, SubmissionPhase};
pub use engine::{Difficulty, EngineBridge};
pub use feedback::{MoveCue, MoveOrigin};
pub use material::MaterialLedger;
pub use projection::{project, BoardDescriptor};
pub use record::{GameId, GameRecord, Participants};
pub use session::{
    Navigation, SessionBuilder, SessionEvent, SessionEventKind, SessionHandle, SessionSnapshot,
};
pub use timeline::MoveTimeline;
