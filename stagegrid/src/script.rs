//! Scripted session replay

use serde::{Deserialize, Serialize};
use stagegrid_core::{Participant, ParticipantIdentity, ParticipantSid, RoomName, RoomSession};
use std::path::Path;
use tracing::warn;

/// A recorded sequence of roster changes for one room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub room: RoomName,
    pub local: ScriptParticipant,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptParticipant {
    pub sid: ParticipantSid,
    pub identity: ParticipantIdentity,
    #[serde(default)]
    pub name: Option<String>,
}

impl ScriptParticipant {
    fn into_participant(self, local: bool) -> Participant {
        let participant = if local {
            Participant::local(self.sid, self.identity)
        } else {
            Participant::remote(self.sid, self.identity)
        };
        match self.name {
            Some(name) => participant.with_name(name),
            None => participant,
        }
    }

    pub fn into_local(self) -> Participant {
        self.into_participant(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    Join {
        #[serde(flatten)]
        participant: ScriptParticipant,
    },
    Leave {
        sid: ParticipantSid,
    },
    Speakers {
        sids: Vec<ParticipantSid>,
    },
    Fail {
        message: String,
    },
    Close,
}

impl ScriptStep {
    /// Apply the step to `session`.
    ///
    /// Returns whether a roster event was published. Rejected steps are
    /// logged and skipped so a script with a bad line still replays.
    pub fn apply(self, session: &RoomSession) -> bool {
        match self {
            Self::Join { participant } => {
                let sid = participant.sid.clone();
                match session.join(participant.into_participant(false)) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(sid = %sid, error = %e, "Join rejected");
                        false
                    }
                }
            }
            Self::Leave { sid } => match session.leave(&sid) {
                Ok(_) => true,
                Err(e) => {
                    warn!(sid = %sid, error = %e, "Leave rejected");
                    false
                }
            },
            Self::Speakers { sids } => {
                let open = !session.is_closed();
                session.set_active_speakers(sids);
                open
            }
            Self::Fail { message } => {
                let open = !session.is_closed();
                session.fail(message);
                open
            }
            Self::Close => {
                let was_open = !session.is_closed();
                session.close();
                was_open
            }
        }
    }

    pub const fn action(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::Speakers { .. } => "speakers",
            Self::Fail { .. } => "fail",
            Self::Close => "close",
        }
    }
}

/// Read a script from a JSON file
pub fn load_script(path: &Path) -> stagegrid_core::Result<Script> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
