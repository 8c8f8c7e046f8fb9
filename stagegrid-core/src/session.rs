//! Session contract and an in-memory room session
//!
//! The stage never owns participants. It reads them through [`SessionView`]
//! on every recomputation and reacts to [`RosterEvent`]s published by the
//! session.

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::participant::Participant;
use crate::types::{ParticipantSid, RoomName};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Read-only view of a live session, queried fresh on each recomputation
#[cfg_attr(test, mockall::automock)]
pub trait SessionView {
    /// Whether `sid` is currently in the roster
    fn is_connected(&self, sid: &ParticipantSid) -> bool;

    /// Current speakers, most active first. May include the local participant.
    fn active_speakers(&self) -> Vec<Participant>;

    /// Every known participant in a stable order, local and remote
    fn all_participants(&self) -> Vec<Participant>;

    /// Sid of the viewer's own participant
    fn local_sid(&self) -> Option<ParticipantSid>;
}

/// Change notifications published by a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RosterEvent {
    ParticipantJoined {
        sid: ParticipantSid,
        timestamp: DateTime<Utc>,
    },
    ParticipantLeft {
        sid: ParticipantSid,
        timestamp: DateTime<Utc>,
    },
    ActiveSpeakersChanged {
        speakers: Vec<ParticipantSid>,
        timestamp: DateTime<Utc>,
    },
    Failed {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Closed {
        timestamp: DateTime<Utc>,
    },
}

impl RosterEvent {
    /// Whether the stage should stop listening after this event
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// Short name used in logs and replay output
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::ParticipantLeft { .. } => "participant_left",
            Self::ActiveSpeakersChanged { .. } => "active_speakers_changed",
            Self::Failed { .. } => "failed",
            Self::Closed { .. } => "closed",
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    /// Local participant first, remotes in join order
    participants: Vec<Participant>,
    active_speakers: Vec<ParticipantSid>,
    error: Option<String>,
    closed: bool,
}

/// In-memory session for a single room
#[derive(Clone)]
pub struct RoomSession {
    room: RoomName,
    local_sid: ParticipantSid,
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<RosterEvent>,
    max_participants: usize,
}

impl RoomSession {
    /// Create a session whose roster initially contains only `local`
    pub fn new(room: RoomName, local: Participant, config: &SessionConfig) -> Result<Self> {
        if !local.is_local() {
            return Err(Error::InvalidInput(format!(
                "participant {} is not local",
                local.sid
            )));
        }

        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let local_sid = local.sid.clone();

        info!(
            room = %room,
            local_sid = %local_sid,
            max_participants = config.max_participants,
            "Room session created"
        );

        Ok(Self {
            room,
            local_sid,
            state: Arc::new(RwLock::new(SessionState {
                participants: vec![local],
                ..Default::default()
            })),
            events,
            max_participants: config.max_participants,
        })
    }

    #[must_use]
    pub const fn room(&self) -> &RoomName {
        &self.room
    }

    /// Subscribe to roster change notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.events.subscribe()
    }

    /// Add a remote participant to the roster
    pub fn join(&self, participant: Participant) -> Result<()> {
        {
            let mut state = self.state.write();
            if state.closed {
                return Err(Error::InvalidInput(format!("room {} is closed", self.room)));
            }
            if participant.is_local() {
                return Err(Error::InvalidInput(format!(
                    "room {} already has a local participant",
                    self.room
                )));
            }
            if state.participants.iter().any(|p| p.sid == participant.sid) {
                return Err(Error::AlreadyExists(format!(
                    "participant {}",
                    participant.sid
                )));
            }
            if self.max_participants > 0 && state.participants.len() >= self.max_participants {
                warn!(
                    room = %self.room,
                    current = state.participants.len(),
                    max = self.max_participants,
                    "Participant limit reached"
                );
                return Err(Error::LimitReached(format!(
                    "room {} holds at most {} participants",
                    self.room, self.max_participants
                )));
            }

            debug!(room = %self.room, sid = %participant.sid, "Participant joined");
            state.participants.push(participant.clone());
        }

        self.publish(RosterEvent::ParticipantJoined {
            sid: participant.sid,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Remove a remote participant from the roster
    pub fn leave(&self, sid: &ParticipantSid) -> Result<Participant> {
        let removed = {
            let mut state = self.state.write();
            if state.closed {
                return Err(Error::InvalidInput(format!("room {} is closed", self.room)));
            }
            if *sid == self.local_sid {
                return Err(Error::InvalidInput(
                    "the local participant cannot leave the roster".to_string(),
                ));
            }
            let index = state
                .participants
                .iter()
                .position(|p| &p.sid == sid)
                .ok_or_else(|| Error::NotFound(format!("participant {sid}")))?;

            state.active_speakers.retain(|s| s != sid);
            state.participants.remove(index)
        };

        debug!(room = %self.room, sid = %sid, "Participant left");
        self.publish(RosterEvent::ParticipantLeft {
            sid: sid.clone(),
            timestamp: Utc::now(),
        });
        Ok(removed)
    }

    /// Replace the active-speaker order. Unknown and repeated sids are dropped.
    ///
    /// Ignored once the session is closed.
    pub fn set_active_speakers(&self, sids: Vec<ParticipantSid>) {
        let speakers = {
            let mut state = self.state.write();
            if state.closed {
                debug!(room = %self.room, "Speaker update after close ignored");
                return;
            }
            let mut speakers: Vec<ParticipantSid> = Vec::with_capacity(sids.len());
            for sid in sids {
                let known = state.participants.iter().any(|p| p.sid == sid);
                if known && !speakers.contains(&sid) {
                    speakers.push(sid);
                }
            }
            state.active_speakers.clone_from(&speakers);
            speakers
        };

        self.publish(RosterEvent::ActiveSpeakersChanged {
            speakers,
            timestamp: Utc::now(),
        });
    }

    /// Record a session failure. A closed session keeps its final state.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        {
            let mut state = self.state.write();
            if state.closed {
                debug!(room = %self.room, error = %message, "Failure after close ignored");
                return;
            }
            state.error = Some(message.clone());
        }
        warn!(room = %self.room, error = %message, "Room session failed");
        self.publish(RosterEvent::Failed {
            message,
            timestamp: Utc::now(),
        });
    }

    /// Close the session. Later roster changes are rejected or ignored, so
    /// `Closed` is always the last event published.
    pub fn close(&self) {
        {
            let mut state = self.state.write();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        info!(room = %self.room, "Room session closed");
        self.publish(RosterEvent::Closed {
            timestamp: Utc::now(),
        });
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.state.read().participants.len()
    }

    #[must_use]
    pub fn participant(&self, sid: &ParticipantSid) -> Option<Participant> {
        self.state
            .read()
            .participants
            .iter()
            .find(|p| &p.sid == sid)
            .cloned()
    }

    fn publish(&self, event: RosterEvent) {
        // No subscribers is fine; the stage may not be attached yet
        if self.events.send(event).is_err() {
            debug!(room = %self.room, "No roster subscribers");
        }
    }
}

impl SessionView for RoomSession {
    fn is_connected(&self, sid: &ParticipantSid) -> bool {
        self.state.read().participants.iter().any(|p| &p.sid == sid)
    }

    fn active_speakers(&self) -> Vec<Participant> {
        let state = self.state.read();
        state
            .active_speakers
            .iter()
            .filter_map(|sid| state.participants.iter().find(|p| &p.sid == sid).cloned())
            .collect()
    }

    fn all_participants(&self) -> Vec<Participant> {
        self.state.read().participants.clone()
    }

    fn local_sid(&self) -> Option<ParticipantSid> {
        Some(self.local_sid.clone())
    }
}

impl std::fmt::Debug for RoomSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomSession")
            .field("room", &self.room)
            .field("local_sid", &self.local_sid)
            .field("participants", &self.participant_count())
            .finish()
    }
}
