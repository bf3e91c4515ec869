//! Fake socket and provider for exercising the client without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use wharf_bot::{
    GroupLookup, OutboundContent, ProtocolSocket, SocketError, SocketHandle, SocketProvider,
};
use wharf_session::SessionAuth;
use wharf_types::{GroupMetadata, MessageInfo, MessageKey, ProtocolEvent};

/// Records every call made through the socket.
#[derive(Default)]
pub struct FakeSocket {
    pub sent: Mutex<Vec<(String, OutboundContent)>>,
    pub groups: Mutex<HashMap<String, GroupMetadata>>,
    pub pairing_requests: Mutex<Vec<String>>,
    pub ended: AtomicBool,
}

impl FakeSocket {
    pub fn with_group(self, metadata: GroupMetadata) -> Self {
        self.groups
            .lock()
            .unwrap()
            .insert(metadata.id.clone(), metadata);
        self
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, c)| c.text.clone())
            .collect()
    }
}

#[async_trait]
impl ProtocolSocket for FakeSocket {
    async fn send_message(
        &self,
        jid: &str,
        content: OutboundContent,
    ) -> Result<MessageInfo, SocketError> {
        self.sent.lock().unwrap().push((jid.to_string(), content));
        Ok(MessageInfo {
            key: MessageKey {
                remote_jid: Some(jid.to_string()),
                from_me: true,
                id: "SENT".into(),
            },
            content: None,
            push_name: None,
        })
    }

    async fn group_metadata(&self, jid: &str) -> Result<GroupMetadata, SocketError> {
        self.groups
            .lock()
            .unwrap()
            .get(jid)
            .cloned()
            .ok_or_else(|| SocketError::Api(format!("unknown group {jid}")))
    }

    async fn request_pairing_code(&self, phone_number: &str) -> Result<String, SocketError> {
        self.pairing_requests
            .lock()
            .unwrap()
            .push(phone_number.to_string());
        Ok("ABCD-1234".into())
    }

    fn end(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }
}

/// Hands out one scripted event stream per connection attempt.
pub struct FakeProvider {
    scripts: Mutex<VecDeque<Vec<ProtocolEvent>>>,
    pub sockets: Mutex<Vec<Arc<FakeSocket>>>,
    pub connects: AtomicUsize,
    group_seed: Mutex<Vec<GroupMetadata>>,
}

impl FakeProvider {
    pub fn new(scripts: Vec<Vec<ProtocolEvent>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            sockets: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
            group_seed: Mutex::new(Vec::new()),
        }
    }

    /// Seed every connection's socket with this group's metadata.
    pub fn seed_group(self, metadata: GroupMetadata) -> Self {
        self.group_seed.lock().unwrap().push(metadata);
        self
    }

    pub fn socket(&self, index: usize) -> Arc<FakeSocket> {
        self.sockets.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl SocketProvider for FakeProvider {
    async fn connect(
        &self,
        _auth: Arc<SessionAuth>,
        _cached_group_metadata: Option<GroupLookup>,
    ) -> Result<SocketHandle, SocketError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let mut socket = FakeSocket::default();
        for g in self.group_seed.lock().unwrap().iter() {
            socket = socket.with_group(g.clone());
        }
        let socket = Arc::new(socket);
        self.sockets.lock().unwrap().push(socket.clone());

        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        let (tx, rx) = mpsc::unbounded_channel();
        for event in script {
            let _ = tx.send(event);
        }
        // Sender drops here: the stream ends once the script is drained.

        Ok(SocketHandle { socket, events: rx })
    }
}

/// A live inbound text message event.
pub fn inbound_text(jid: &str, text: &str) -> ProtocolEvent {
    ProtocolEvent::MessagesUpsert(wharf_types::MessagesUpsert {
        messages: vec![MessageInfo::text(jid, "IN", text)],
        upsert_type: wharf_types::UpsertType::Notify,
    })
}
