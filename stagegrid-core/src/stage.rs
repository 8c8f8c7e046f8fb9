//! Stage state and render plan
//!
//! [`Stage`] couples the visibility selector with the grid tracker and
//! publishes both through one `watch` channel, so observers never see a
//! visible set paired with a shape computed for a different set.

use crate::config::StageConfig;
use crate::grid::{GridShape, GridTracker};
use crate::participant::Participant;
use crate::selector::{SelectionStats, VisibilitySelector};
use crate::session::{RoomSession, SessionView};
use crate::types::{ParticipantIdentity, ParticipantSid};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

/// Visible participants and the grid shape computed for them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub visible: Vec<Participant>,
    /// `None` until the first non-empty selection
    pub shape: Option<GridShape>,
    /// Bumped each time `visible` or `shape` changes
    pub revision: u64,
}

impl StageSnapshot {
    #[must_use]
    pub fn visible_sids(&self) -> Vec<&ParticipantSid> {
        self.visible.iter().map(|p| &p.sid).collect()
    }
}

/// One tile on the stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Render key
    pub key: ParticipantIdentity,
    pub sid: ParticipantSid,
    pub label: String,
}

/// What the view layer should draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum StageView {
    Error { message: String },
    Closed,
    Empty,
    Grid {
        shape: GridShape,
        class: String,
        tiles: Vec<Tile>,
    },
}

impl StageView {
    /// Decide what to draw for a session state and stage snapshot.
    ///
    /// Errors win over a closed session, which wins over the grid.
    #[must_use]
    pub fn from_parts(error: Option<String>, closed: bool, snapshot: &StageSnapshot) -> Self {
        if let Some(message) = error {
            return Self::Error { message };
        }
        if closed {
            return Self::Closed;
        }

        match snapshot.shape {
            Some(shape) if !snapshot.visible.is_empty() => Self::Grid {
                shape,
                class: shape.css_class().to_string(),
                tiles: snapshot
                    .visible
                    .iter()
                    .map(|p| Tile {
                        key: p.identity.clone(),
                        sid: p.sid.clone(),
                        label: p.display_name().to_string(),
                    })
                    .collect(),
            },
            _ => Self::Empty,
        }
    }

    /// Render plan for an in-memory session
    #[must_use]
    pub fn for_session(session: &RoomSession, snapshot: &StageSnapshot) -> Self {
        Self::from_parts(session.error(), session.is_closed(), snapshot)
    }
}

/// Owns the visible set and grid shape of one stage
pub struct Stage {
    selector: VisibilitySelector,
    grid: GridTracker,
    tx: watch::Sender<StageSnapshot>,
}

impl Stage {
    #[must_use]
    pub fn new(config: &StageConfig) -> Self {
        let (tx, _) = watch::channel(StageSnapshot::default());
        Self {
            selector: VisibilitySelector::new(config.max_visible, config.promotion),
            grid: GridTracker::new(),
            tx,
        }
    }

    /// Observe snapshots as they are published
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StageSnapshot> {
        self.tx.subscribe()
    }

    /// Latest published snapshot
    #[must_use]
    pub fn snapshot(&self) -> StageSnapshot {
        self.tx.borrow().clone()
    }

    /// Recompute from a fresh session snapshot and publish the result.
    ///
    /// Returns `true` when the visible set or shape changed.
    pub fn recompute<S: SessionView + ?Sized>(&mut self, session: &S) -> bool {
        let stats: SelectionStats = self.selector.recompute(session);
        let visible = self.selector.visible();
        let shape = self.grid.update(visible.len());

        let changed = self.tx.send_if_modified(|current| {
            if current.visible.as_slice() == visible && current.shape == shape {
                return false;
            }
            current.visible = visible.to_vec();
            current.shape = shape;
            current.revision += 1;
            true
        });

        if changed {
            debug!(
                visible = visible.len(),
                shape = ?shape,
                pruned = stats.pruned,
                promoted = stats.promoted,
                filled = stats.filled,
                "Stage updated"
            );
        }

        changed
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("visible", &self.selector.visible().len())
            .field("shape", &self.grid.current())
            .finish()
    }
}
