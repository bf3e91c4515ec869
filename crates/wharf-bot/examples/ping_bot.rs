//! A ping bot over a scripted loopback socket.
//!
//! Registers a `ping` command, greets newly added group participants, and
//! declines incoming calls. The loopback provider replays a short event
//! script so the whole flow runs without network access.
//!
//! Run with: `RUST_LOG=debug cargo run --example ping_bot`

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wharf_bot::{
    Bot, Client, Command, GroupLookup, OutboundContent, ProtocolSocket, SocketError, SocketHandle,
    SocketProvider,
};
use wharf_session::SessionAuth;
use wharf_types::{
    BotOptions, CallEvent, CallStatus, ConnectionOptions, GroupMetadata, GroupParticipantsUpdate,
    MessageInfo, MessageKey, MessagesUpsert, ParticipantAction, ProtocolEvent, UpsertType,
};

/// A socket that logs outbound messages instead of sending them.
struct LoopbackSocket;

#[async_trait]
impl ProtocolSocket for LoopbackSocket {
    async fn send_message(
        &self,
        jid: &str,
        content: OutboundContent,
    ) -> Result<MessageInfo, SocketError> {
        info!(to = %jid, text = %content.text, "outbound message");
        Ok(MessageInfo {
            key: MessageKey {
                remote_jid: Some(jid.to_string()),
                from_me: true,
                id: "LOOPBACK".into(),
            },
            content: None,
            push_name: None,
        })
    }

    async fn group_metadata(&self, jid: &str) -> Result<GroupMetadata, SocketError> {
        Ok(GroupMetadata::new(jid, "demo group"))
    }

    async fn request_pairing_code(&self, _phone_number: &str) -> Result<String, SocketError> {
        Ok("ABCD-1234".into())
    }

    fn end(&self) {}
}

/// Replays a scripted event stream once.
struct LoopbackProvider {
    script: Mutex<VecDeque<ProtocolEvent>>,
}

#[async_trait]
impl SocketProvider for LoopbackProvider {
    async fn connect(
        &self,
        _auth: Arc<SessionAuth>,
        _cached_group_metadata: Option<GroupLookup>,
    ) -> Result<SocketHandle, SocketError> {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in self.script.lock().expect("script lock").drain(..) {
            let _ = tx.send(event);
        }
        Ok(SocketHandle {
            socket: Arc::new(LoopbackSocket),
            events: rx,
        })
    }
}

fn script() -> VecDeque<ProtocolEvent> {
    VecDeque::from([
        ProtocolEvent::MessagesUpsert(MessagesUpsert {
            messages: vec![MessageInfo::text("123@s.whatsapp.net", "M1", "!ping")],
            upsert_type: UpsertType::Notify,
        }),
        ProtocolEvent::GroupParticipantsUpdate(GroupParticipantsUpdate {
            id: "4567@g.us".into(),
            action: ParticipantAction::Add,
            participants: vec!["888@s.whatsapp.net".into()],
        }),
        ProtocolEvent::Call(vec![CallEvent {
            chat_id: "999@s.whatsapp.net".into(),
            from: "999@s.whatsapp.net".into(),
            status: CallStatus::Offer,
        }]),
    ])
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let dir = std::env::temp_dir().join("wharf-ping-bot");
    std::fs::create_dir_all(&dir)?;

    let options = ConnectionOptions::qr(dir.join("sessions.db"))
        .session_id("ping_bot")
        .group_cache_ttl(Duration::from_secs(3600));

    let provider = LoopbackProvider {
        script: Mutex::new(script()),
    };
    let client = Arc::new(Client::new(provider, options));

    let bot = Bot::new(client.clone(), BotOptions::default());
    bot.command(
        Command::new("ping", |ctx| async move { ctx.reply("Pong!").await })
            .describe("liveness check")
            .alias("p"),
    );

    // Greet newly added participants, mentioning them.
    let greeter = client.clone();
    client.events().on_group_participants_update(move |update| {
        let client = greeter.clone();
        async move {
            if update.action != ParticipantAction::Add {
                return;
            }
            let names: Vec<String> = update
                .participants
                .iter()
                .map(|p| format!("@{}", p.split('@').next().unwrap_or(p)))
                .collect();
            let text = format!("Welcome to the group {}!", names.join(", "));
            let content = OutboundContent::text(text).with_mentions(update.participants.clone());
            if let Err(e) = client.send_message(&update.id, content).await {
                tracing::warn!(error = %e, "welcome message failed");
            }
        }
    });

    // Decline incoming calls.
    let decliner = client.clone();
    client.events().on_call(move |calls| {
        let client = decliner.clone();
        async move {
            for call in calls {
                if call.status != CallStatus::Offer {
                    continue;
                }
                let text = "Sorry, I don't accept calls. Please send a message instead.";
                if let Err(e) = client
                    .send_message(&call.chat_id, OutboundContent::text(text))
                    .await
                {
                    tracing::warn!(error = %e, "call decline failed");
                }
            }
        }
    });

    client.connect().await?;
    client.run().await?;

    if let Some(auth) = client.auth() {
        auth.flushed().await;
    }
    Ok(())
}
