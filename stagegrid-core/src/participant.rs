//! Participant model as seen by the stage

use crate::types::{ParticipantIdentity, ParticipantSid};
use serde::{Deserialize, Serialize};

/// Whether a participant is the viewer's own presence or someone else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantKind {
    Local,
    Remote,
}

/// A session member referenced by the stage.
///
/// Participants are owned by the session; the stage only clones and compares
/// them by [`ParticipantSid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub sid: ParticipantSid,
    pub identity: ParticipantIdentity,
    pub kind: ParticipantKind,
    /// Human-readable name, if the session knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Participant {
    pub fn local(sid: impl Into<ParticipantSid>, identity: impl Into<ParticipantIdentity>) -> Self {
        Self {
            sid: sid.into(),
            identity: identity.into(),
            kind: ParticipantKind::Local,
            name: None,
        }
    }

    pub fn remote(
        sid: impl Into<ParticipantSid>,
        identity: impl Into<ParticipantIdentity>,
    ) -> Self {
        Self {
            sid: sid.into(),
            identity: identity.into(),
            kind: ParticipantKind::Remote,
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        self.kind == ParticipantKind::Local
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.kind == ParticipantKind::Remote
    }

    /// Name to show on the tile, falling back to the identity
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.identity.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_helpers() {
        let local = Participant::local("PA_local", "me");
        let remote = Participant::remote("PA_1", "alice");

        assert!(local.is_local());
        assert!(!local.is_remote());
        assert!(remote.is_remote());
    }

    #[test]
    fn test_display_name_falls_back_to_identity() {
        let p = Participant::remote("PA_1", "alice");
        assert_eq!(p.display_name(), "alice");

        let p = p.with_name("Alice Liddell");
        assert_eq!(p.display_name(), "Alice Liddell");
    }

    #[test]
    fn test_serde_shape() {
        let p = Participant::remote("PA_1", "alice");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["sid"], "PA_1");
        assert_eq!(json["kind"], "remote");
        assert!(json.get("name").is_none());
    }
}
