//! Connection lifecycle around the protocol socket.
//!
//! The client owns the session auth state, the group cache, and the event
//! registry. It reacts to lifecycle events from the socket: credential
//! updates trigger a persistence flush, group events refresh the cache, and
//! a closed connection is reconnected unless the account logged out.
//! Everything runs in reaction to the event stream, one event at a time.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{info, warn};

use wharf_session::{SessionAuth, SessionStore};
use wharf_types::{
    ConnectionOptions, ConnectionState, MessageInfo, PairingMode, ProtocolEvent, WharfError,
};

use crate::events::EventRegistry;
use crate::group_cache::GroupCache;
use crate::socket::{OutboundContent, ProtocolSocket, SocketProvider};

struct ClientState {
    socket: Option<Arc<dyn ProtocolSocket>>,
    auth: Option<Arc<SessionAuth>>,
    pending_events: Option<mpsc::UnboundedReceiver<ProtocolEvent>>,
    connecting: bool,
}

/// A session-scoped client over a [`SocketProvider`].
pub struct Client {
    provider: Box<dyn SocketProvider>,
    options: ConnectionOptions,
    events: EventRegistry,
    group_cache: Option<Arc<GroupCache>>,
    state: Mutex<ClientState>,
}

impl Client {
    /// Create a client. No connection is made until [`Client::connect`].
    pub fn new(provider: impl SocketProvider, options: ConnectionOptions) -> Self {
        let group_cache = options
            .group_cache
            .as_ref()
            .map(|cfg| Arc::new(GroupCache::new(cfg.ttl)));
        Self {
            provider: Box::new(provider),
            options,
            events: EventRegistry::new(),
            group_cache,
            state: Mutex::new(ClientState {
                socket: None,
                auth: None,
                pending_events: None,
                connecting: false,
            }),
        }
    }

    /// The event subscription surface.
    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    /// The group metadata cache, when enabled.
    pub fn group_cache(&self) -> Option<&Arc<GroupCache>> {
        self.group_cache.as_ref()
    }

    /// The session auth state, once connected.
    pub fn auth(&self) -> Option<Arc<SessionAuth>> {
        self.state.lock().expect("client state lock").auth.clone()
    }

    /// The live socket, or [`WharfError::NotConnected`].
    pub fn socket(&self) -> Result<Arc<dyn ProtocolSocket>, WharfError> {
        self.state
            .lock()
            .expect("client state lock")
            .socket
            .clone()
            .ok_or(WharfError::NotConnected)
    }

    /// Load the session and establish the connection.
    ///
    /// In phone pairing mode, an unregistered session requests a pairing
    /// code and logs it for the operator to enter on the phone.
    ///
    /// `connect` is call-once: a second call on a connected (or currently
    /// connecting) client is [`WharfError::AlreadyConnected`]. Reconnection
    /// after a dropped connection happens inside [`Client::run`].
    pub async fn connect(&self) -> Result<(), WharfError> {
        self.options.validate()?;

        {
            let mut state = self.state.lock().expect("client state lock");
            if state.connecting || state.auth.is_some() {
                return Err(WharfError::AlreadyConnected);
            }
            state.connecting = true;
        }

        let result = async {
            let store = SessionStore::open(&self.options.store_path)?;
            let auth = Arc::new(SessionAuth::load(store, &self.options.session_id).await?);
            let events = self.establish(&auth).await?;
            Ok::<_, WharfError>((auth, events))
        }
        .await;

        let mut state = self.state.lock().expect("client state lock");
        state.connecting = false;
        let (auth, events) = result?;
        state.auth = Some(auth);
        state.pending_events = Some(events);
        Ok(())
    }

    /// Drive the event loop until the connection ends for good.
    ///
    /// Returns after a logged-out close, after the event stream ends, or
    /// with an error if reconnection fails. Must be called after
    /// [`Client::connect`].
    pub async fn run(&self) -> Result<(), WharfError> {
        let mut rx = self
            .state
            .lock()
            .expect("client state lock")
            .pending_events
            .take()
            .ok_or(WharfError::NotConnected)?;

        loop {
            let Some(event) = rx.recv().await else {
                info!("event stream ended");
                return Ok(());
            };

            match event {
                ProtocolEvent::ConnectionUpdate(update) => {
                    self.events.emit_connection_update(update.clone()).await;
                    if update.connection == Some(ConnectionState::Close) {
                        let reconnect = update
                            .last_disconnect
                            .map(|r| r.should_reconnect())
                            .unwrap_or(false);
                        if !reconnect {
                            info!("connection closed, not reconnecting");
                            return Ok(());
                        }
                        info!(reason = ?update.last_disconnect, "connection closed, reconnecting");
                        rx = self.reconnect().await?;
                    }
                }
                ProtocolEvent::CredsUpdate => {
                    if let Some(auth) = self.auth() {
                        auth.save();
                    }
                    self.events.emit_creds_update(()).await;
                }
                ProtocolEvent::MessagesUpsert(batch) => {
                    self.events.emit_messages_upsert(batch).await;
                }
                ProtocolEvent::GroupsUpdate(updates) => {
                    for update in &updates {
                        if let Some(id) = &update.id {
                            self.refresh_group(id).await;
                        }
                    }
                    self.events.emit_groups_update(updates).await;
                }
                ProtocolEvent::GroupParticipantsUpdate(update) => {
                    self.refresh_group(&update.id).await;
                    self.events.emit_group_participants_update(update).await;
                }
                ProtocolEvent::Call(calls) => {
                    self.events.emit_call(calls).await;
                }
            }
        }
    }

    /// Send a message to a chat.
    pub async fn send_message(
        &self,
        jid: &str,
        content: OutboundContent,
    ) -> Result<MessageInfo, WharfError> {
        let socket = self.socket()?;
        Ok(socket.send_message(jid, content).await?)
    }

    /// Reply in a message's chat, quoting it.
    pub async fn reply(
        &self,
        message: &MessageInfo,
        content: OutboundContent,
    ) -> Result<MessageInfo, WharfError> {
        let jid = message
            .key
            .remote_jid
            .as_deref()
            .ok_or_else(|| WharfError::InvalidMessage("message has no chat jid".into()))?;
        let socket = self.socket()?;
        Ok(socket
            .send_message(jid, content.quoting(message.key.clone()))
            .await?)
    }

    /// Close the connection.
    pub fn disconnect(&self) {
        if let Ok(socket) = self.socket() {
            socket.end();
        }
    }

    /// Build a socket via the provider and run the pairing check.
    async fn establish(
        &self,
        auth: &Arc<SessionAuth>,
    ) -> Result<mpsc::UnboundedReceiver<ProtocolEvent>, WharfError> {
        let lookup = self.group_cache.as_ref().map(GroupCache::lookup_fn);
        let handle = self.provider.connect(auth.clone(), lookup).await?;

        if let PairingMode::PhoneNumber { number } = &self.options.pairing {
            if !auth.creds().registered {
                let code = handle.socket.request_pairing_code(number).await?;
                info!(code = %code, "pairing code requested");
            }
        }

        self.state.lock().expect("client state lock").socket = Some(handle.socket);
        Ok(handle.events)
    }

    async fn reconnect(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<ProtocolEvent>, WharfError> {
        let auth = self.auth().ok_or(WharfError::NotConnected)?;
        self.establish(&auth).await
    }

    /// Fetch fresh metadata for a group and cache it.
    async fn refresh_group(&self, jid: &str) {
        let Some(cache) = &self.group_cache else {
            return;
        };
        let Ok(socket) = self.socket() else {
            return;
        };
        match socket.group_metadata(jid).await {
            Ok(metadata) => cache.insert(metadata),
            Err(e) => warn!(group = %jid, error = %e, "group metadata refresh failed"),
        }
    }
}
