//! Shared types for the wharf messaging layer.
//!
//! Wharf is a command-dispatch and session-persistence layer on top of an
//! external WhatsApp-protocol socket. This crate holds the types every other
//! crate speaks: the error enum, configuration, the message content model,
//! the protocol event model, and group metadata.

pub mod config;
pub mod error;
pub mod event;
pub mod group;
pub mod message;

pub use config::{
    BotOptions, ConnectionOptions, GroupCacheConfig, PairingMode, UnresolvedCommandPolicy,
};
pub use error::WharfError;
pub use event::{
    CallEvent, CallStatus, ConnectionState, ConnectionUpdate, DisconnectReason,
    GroupParticipantsUpdate, GroupUpdate, MessagesUpsert, ParticipantAction, ProtocolEvent,
    UpsertType,
};
pub use group::{GroupMetadata, GroupParticipant};
pub use message::{Contact, MessageContent, MessageInfo, MessageKey};
