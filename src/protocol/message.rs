//! Signaling message types
//!
//! Two enums, one per direction: `ClientMessage` (client → relay) and
//! `ServerMessage` (relay → client, or relay → room for multicast events).

use serde::{Deserialize, Serialize};

/// Identifier of one transport connection
///
/// Unique per connection, not per person: the same user joining twice gets
/// two distinct ids. Assigned by the relay when the socket is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One member of a room, as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub connection_id: ConnectionId,
    pub display_name: String,
}

/// Whether a session description is an offer or an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// A connection description exchanged during negotiation
///
/// Serialized as `{"type": "offer", "sdp": "..."}` so browser peers can feed
/// it straight into `RTCSessionDescription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// One network-path candidate proposed during connectivity establishment
///
/// Field names follow the browser's `RTCIceCandidateInit` dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInit {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex", default, skip_serializing_if = "Option::is_none")]
    pub sdp_mline_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

/// Machine-checkable failure kind reported alongside the human-readable message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Room code unknown or inactive
    NotFound,
    /// Room is at capacity
    Capacity,
    /// Relay or channel failure
    Transport,
    /// Offer/answer/candidate construction or application failed
    Negotiation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not-found"),
            ErrorKind::Capacity => write!(f, "capacity"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Negotiation => write!(f, "negotiation"),
        }
    }
}

/// Messages sent by a client to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Enter the room with the given code
    #[serde(rename_all = "camelCase")]
    Join { code: String, display_name: String },
    /// Exit the current room
    Leave,
    /// Connection offer for one remote member, relayed verbatim
    Offer {
        to: ConnectionId,
        sdp: SessionDescription,
    },
    /// Connection answer for one remote member, relayed verbatim
    Answer {
        to: ConnectionId,
        sdp: SessionDescription,
    },
    /// Network-path candidate for one remote member, relayed verbatim
    Candidate {
        to: ConnectionId,
        candidate: CandidateInit,
    },
    /// Local media changed (e.g. screen-share toggled); multicast to the room
    #[serde(rename_all = "camelCase")]
    TrackStateChange { is_sharing: bool },
    /// Text chat line; broadcast to the whole room including the sender
    Chat { message: String },
}

/// Messages sent by the relay to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Reply to a successful join: everyone already in the room
    ExistingMembers { members: Vec<MemberInfo> },
    /// Multicast to the room when someone joins
    #[serde(rename_all = "camelCase")]
    MemberJoined {
        connection_id: ConnectionId,
        display_name: String,
    },
    /// Multicast to the room when someone leaves or disconnects
    #[serde(rename_all = "camelCase")]
    MemberLeft { connection_id: ConnectionId },
    /// Relayed offer, tagged with the sender
    Offer {
        from: ConnectionId,
        sdp: SessionDescription,
    },
    /// Relayed answer, tagged with the sender
    Answer {
        from: ConnectionId,
        sdp: SessionDescription,
    },
    /// Relayed candidate, tagged with the sender
    Candidate {
        from: ConnectionId,
        candidate: CandidateInit,
    },
    /// Multicast media-state update, tagged with the sender
    #[serde(rename_all = "camelCase")]
    TrackStateChange { from: ConnectionId, is_sharing: bool },
    /// Chat line fanned out to the room, stamped server-side
    #[serde(rename_all = "camelCase")]
    Chat {
        from: ConnectionId,
        display_name: String,
        message: String,
        /// Unix timestamp in milliseconds
        sent_at: u64,
    },
    /// Request failed; `kind` is machine-checkable, `message` human-readable
    Error { kind: ErrorKind, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_wire_shape() {
        let msg = ClientMessage::Join {
            code: "12345678".to_string(),
            display_name: "alice".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["event"], "join");
        assert_eq!(json["data"]["code"], "12345678");
        assert_eq!(json["data"]["displayName"], "alice");
    }

    #[test]
    fn test_leave_has_no_payload() {
        let json = serde_json::to_string(&ClientMessage::Leave).unwrap();
        assert_eq!(json, r#"{"event":"leave"}"#);
    }

    #[test]
    fn test_offer_round_trip_tags_target() {
        let msg = ClientMessage::Offer {
            to: ConnectionId(7),
            sdp: SessionDescription::offer("v=0"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""event":"offer""#));
        assert!(json.contains(r#""type":"offer""#));

        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_candidate_field_names_match_browser_dictionary() {
        let msg = ServerMessage::Candidate {
            from: ConnectionId(3),
            candidate: CandidateInit {
                candidate: "candidate:0 1 UDP 2122252543 192.0.2.1 54400 typ host".to_string(),
                sdp_mid: Some("0".to_string()),
                sdp_mline_index: Some(0),
                username_fragment: None,
            },
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["data"]["candidate"]["sdpMid"], "0");
        assert_eq!(json["data"]["candidate"]["sdpMLineIndex"], 0);
        // Absent options are omitted, not serialized as null
        assert!(json["data"]["candidate"]
            .as_object()
            .unwrap()
            .get("usernameFragment")
            .is_none());
    }

    #[test]
    fn test_event_names_are_kebab_case() {
        let msg = ServerMessage::MemberJoined {
            connection_id: ConnectionId(1),
            display_name: "bob".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "member-joined");
        assert_eq!(json["data"]["connectionId"], 1);

        let msg = ClientMessage::TrackStateChange { is_sharing: true };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "track-state-change");
        assert_eq!(json["data"]["isSharing"], true);
    }

    #[test]
    fn test_error_kind_is_machine_checkable() {
        let msg = ServerMessage::Error {
            kind: ErrorKind::Capacity,
            message: "Room is full".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["data"]["kind"], "capacity");
    }
}
