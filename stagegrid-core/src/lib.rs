//! Stagegrid core
//!
//! Decides which participants of a live media session are on stage and which
//! grid shape displays them, as participants join, leave and start speaking.
//!
//! ## Architecture
//!
//! - **`SessionView`**: read-only roster / speaker contract the host provides
//! - **`RoomSession`**: in-memory session publishing `RosterEvent`s
//! - **`VisibilitySelector`**: prune, promote, fill and cap the visible set
//! - **`GridShape`**: discrete layout derived from the visible count
//! - **`Stage`**: selector + shape published atomically as a `StageSnapshot`
//! - **`StageController`**: tokio task recomputing the stage on roster events
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stagegrid_core::{Config, Participant, RoomName, RoomSession, Stage, StageController};
//!
//! let config = Config::default();
//! let local = Participant::local("PA_me", "me");
//! let session = RoomSession::new(RoomName::from("standup"), local, &config.session)?;
//! let controller = StageController::spawn(session.clone(), Stage::new(&config.stage));
//!
//! session.join(Participant::remote("PA_1", "alice"))?;
//! let snapshot = controller.snapshot();
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod grid;
pub mod logging;
pub mod participant;
pub mod selector;
pub mod session;
pub mod stage;
pub mod types;

pub use config::{Config, LoggingConfig, SessionConfig, StageConfig};
pub use controller::StageController;
pub use error::{Error, Result};
pub use grid::{GridShape, GridTracker, MAX_TILES};
pub use participant::{Participant, ParticipantKind};
pub use selector::{select_visible, PromotionPolicy, SelectionStats, VisibilitySelector};
pub use session::{RoomSession, RosterEvent, SessionView};
pub use stage::{Stage, StageSnapshot, StageView, Tile};
pub use types::{ParticipantIdentity, ParticipantSid, RoomName};
