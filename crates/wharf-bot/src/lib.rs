//! Command dispatch and client lifecycle on top of a WhatsApp-protocol socket.
//!
//! The protocol itself (handshake, encryption, framing) lives in an external
//! library this crate treats as an opaque collaborator behind the
//! [`ProtocolSocket`] trait. What lives here is the glue: routing inbound
//! text to registered command handlers, keeping a short-lived group-metadata
//! cache, and wiring credential updates to the session store.
//!
//! # Architecture
//!
//! - [`socket`]: the socket trait, outbound content, and the provider that
//!   builds sockets on (re)connect
//! - [`command`]: command registry, alias resolution, and dispatch
//! - [`group_cache`]: TTL cache for group metadata
//! - [`events`]: typed subscription surface for protocol events
//! - [`client`]: connection lifecycle, reconnect decisions, event loop
//! - [`bot`]: the user-facing facade tying registry and client together

pub mod bot;
pub mod client;
pub mod command;
pub mod events;
pub mod group_cache;
pub mod socket;

pub use bot::Bot;
pub use client::Client;
pub use command::{Command, CommandContext, CommandRegistry, RegistryError, Resolution};
pub use events::EventRegistry;
pub use group_cache::{Clock, GroupCache, ManualClock, SystemClock};
pub use socket::{
    GroupLookup, OutboundContent, ProtocolSocket, SocketError, SocketHandle, SocketProvider,
};
