//! Client ↔ server wire protocol.
//!
//! Every frame is a JSON object tagged by `type`. Negotiation payloads are
//! carried as opaque JSON and never inspected.

use parley_common::ConnectionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contribution::Contribution;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Events a client sends. Missing string fields decode as empty so the
/// handlers can answer with a proper error instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    Join {
        #[serde(default)]
        room_id: String,
        #[serde(default)]
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    Leave {
        #[serde(default)]
        room_id: String,
    },
    Offer {
        to: ConnectionId,
        #[serde(default)]
        payload: Value,
    },
    Answer {
        to: ConnectionId,
        #[serde(default)]
        payload: Value,
    },
    IceCandidate {
        to: ConnectionId,
        #[serde(default)]
        payload: Value,
    },
    #[serde(rename_all = "camelCase")]
    ToggleMedia {
        #[serde(default)]
        room_id: String,
        #[serde(default)]
        mic: Option<bool>,
        #[serde(default)]
        video: Option<bool>,
    },
    #[serde(rename_all = "camelCase")]
    StartSpeaking {
        #[serde(default)]
        room_id: String,
    },
    #[serde(rename_all = "camelCase")]
    StopSpeaking {
        #[serde(default)]
        room_id: String,
    },
    #[serde(rename_all = "camelCase")]
    StartPrep {
        #[serde(default)]
        room_id: String,
        #[serde(default)]
        starter: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    EndDiscussion {
        #[serde(default)]
        room_id: String,
    },
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// A participant as shown in roster broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSnapshot {
    pub connection_id: ConnectionId,
    pub user_id: String,
    pub name: String,
    pub mic: bool,
    pub video: bool,
    pub speaking: bool,
    pub speaking_time_ms: u64,
}

/// Events the server sends, either to a whole room or to one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    RoomData {
        participants: Vec<ParticipantSnapshot>,
    },
    ContributionUpdate {
        contributions: Vec<Contribution>,
    },
    #[serde(rename_all = "camelCase")]
    NewUserJoined {
        user_id: String,
        user_name: String,
        connection_id: ConnectionId,
    },
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_id: String,
        user: ParticipantSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    UserLeft { connection_id: ConnectionId },
    Offer {
        from: ConnectionId,
        payload: Value,
    },
    Answer {
        from: ConnectionId,
        payload: Value,
    },
    IceCandidate {
        from: ConnectionId,
        payload: Value,
    },
    /// `prep_duration` is in seconds.
    #[serde(rename_all = "camelCase")]
    PrepStart {
        topic: String,
        prep_duration: u64,
        starter: String,
    },
    DiscussionStart {
        topic: String,
    },
    DiscussionEnded,
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| {
                format!("{{\"type\":\"error\",\"message\":\"encode failed: {e}\"}}")
            })
    }
}

/// The three negotiation message kinds that are relayed verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    /// Wrap a payload for delivery to the target.
    pub fn into_event(self, from: ConnectionId, payload: Value) -> ServerEvent {
        match self {
            SignalKind::Offer => ServerEvent::Offer { from, payload },
            SignalKind::Answer => ServerEvent::Answer { from, payload },
            SignalKind::IceCandidate => ServerEvent::IceCandidate { from, payload },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
        }
    }
}
