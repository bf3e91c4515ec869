//! Protocol event model.
//!
//! Everything in this module is *delivered* by the external protocol
//! library; wharf only reacts to it. Events are handled strictly
//! sequentially, one callback invocation at a time.

use serde::{Deserialize, Serialize};

use crate::message::MessageInfo;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Open,
    Close,
}

/// Why the connection closed.
///
/// Mirrors the protocol library's disconnect status codes. Only
/// [`DisconnectReason::LoggedOut`] suppresses reconnection; every other
/// reason is retried by reconnecting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    ConnectionClosed,
    ConnectionLost,
    ConnectionReplaced,
    TimedOut,
    RestartRequired,
    BadSession,
    LoggedOut,
}

impl DisconnectReason {
    /// Whether the client should attempt to reconnect after this reason.
    pub fn should_reconnect(&self) -> bool {
        !matches!(self, DisconnectReason::LoggedOut)
    }
}

/// A connection state change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionUpdate {
    pub connection: Option<ConnectionState>,
    pub last_disconnect: Option<DisconnectReason>,
}

/// How a batch of upserted messages arrived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpsertType {
    /// Live messages that should be processed (and dispatched on).
    Notify,
    /// History-sync messages appended to the store.
    Append,
}

/// A batch of newly received or synced messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagesUpsert {
    pub messages: Vec<MessageInfo>,
    pub upsert_type: UpsertType,
}

/// A partial group metadata update. Only changed fields are set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GroupUpdate {
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// What happened to the named participants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantAction {
    Add,
    Remove,
    Promote,
    Demote,
}

/// A group membership change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupParticipantsUpdate {
    /// The group JID.
    pub id: String,
    pub action: ParticipantAction,
    pub participants: Vec<String>,
}

/// Call signaling state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Offer,
    Accept,
    Reject,
    Timeout,
}

/// An incoming or updated call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallEvent {
    /// The chat the call belongs to.
    pub chat_id: String,
    /// The calling JID.
    pub from: String,
    pub status: CallStatus,
}

/// All events the protocol library delivers to this layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ProtocolEvent {
    ConnectionUpdate(ConnectionUpdate),
    MessagesUpsert(MessagesUpsert),
    /// The library mutated the credential bundle; the current state must be
    /// persisted in full.
    CredsUpdate,
    GroupsUpdate(Vec<GroupUpdate>),
    GroupParticipantsUpdate(GroupParticipantsUpdate),
    Call(Vec<CallEvent>),
}
