//! Identifier newtypes shared by the session and stage layers

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Session-assigned participant id, used for roster membership
    ParticipantSid
);

string_id!(
    /// Display identity of a participant, used as the tile key when rendering
    ParticipantIdentity
);

string_id!(
    /// Name of the room a session is attached to
    RoomName
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_transparent_strings() {
        let sid = ParticipantSid::from("PA_1");
        assert_eq!(sid.to_string(), "PA_1");
        assert_eq!(serde_json::to_string(&sid).unwrap(), "\"PA_1\"");

        let room: RoomName = serde_json::from_str("\"standup\"").unwrap();
        assert_eq!(room.as_str(), "standup");
        assert_eq!(ParticipantIdentity::from(String::from("alice")).as_str(), "alice");
    }
}
