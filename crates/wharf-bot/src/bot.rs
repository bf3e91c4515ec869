//! The user-facing bot facade.
//!
//! Ties a [`CommandRegistry`] to a [`Client`]: inbound message batches are
//! fed through the registry, and sends go out through the client. Commands
//! are registered at startup; dispatch reads the tables under a shared lock
//! and invokes handlers outside it.

use std::sync::{Arc, RwLock};

use wharf_types::{BotOptions, MessageInfo, WharfError};

use crate::client::Client;
use crate::command::{self, Command, CommandRegistry, RegistryError};
use crate::socket::OutboundContent;

/// A command bot over one client.
pub struct Bot {
    client: Arc<Client>,
    registry: Arc<RwLock<CommandRegistry>>,
}

impl Bot {
    /// Create a bot and hook its dispatcher into the client's message events.
    ///
    /// Only the first message of an upsert batch is considered, and only
    /// when it carries content.
    pub fn new(client: Arc<Client>, options: BotOptions) -> Self {
        let registry = Arc::new(RwLock::new(CommandRegistry::new(options)));

        let reg = Arc::clone(&registry);
        let cl = Arc::clone(&client);
        client.events().on_messages_upsert(move |batch| {
            let reg = Arc::clone(&reg);
            let cl = Arc::clone(&cl);
            async move {
                let Some(message) = batch.messages.into_iter().next() else {
                    return;
                };
                if message.content.is_none() {
                    return;
                }
                let Ok(socket) = cl.socket() else {
                    return;
                };
                let (resolution, policy) = {
                    let reg = reg.read().expect("command registry lock");
                    (reg.resolve(&message), reg.unresolved_policy().clone())
                };
                command::dispatch(&socket, &message, resolution, &policy).await;
            }
        });

        Self { client, registry }
    }

    /// Register a command. Returns the bot for chaining; invalid
    /// registrations are logged and skipped.
    pub fn command(&self, command: Command) -> &Self {
        self.registry
            .write()
            .expect("command registry lock")
            .register(command);
        self
    }

    /// Register a command, reporting validation failures.
    pub fn try_command(&self, command: Command) -> Result<(), RegistryError> {
        self.registry
            .write()
            .expect("command registry lock")
            .try_register(command)
    }

    /// Names and descriptions of the registered commands, sorted by name.
    pub fn command_list(&self) -> Vec<(String, Option<String>)> {
        self.registry
            .read()
            .expect("command registry lock")
            .commands()
            .iter()
            .map(|c| (c.name.clone(), c.description.clone()))
            .collect()
    }

    /// The underlying client.
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Send a message through the client.
    pub async fn send_message(
        &self,
        jid: &str,
        content: OutboundContent,
    ) -> Result<MessageInfo, WharfError> {
        self.client.send_message(jid, content).await
    }

    /// Reply to a message, quoting it.
    pub async fn reply(
        &self,
        message: &MessageInfo,
        content: OutboundContent,
    ) -> Result<MessageInfo, WharfError> {
        self.client.reply(message, content).await
    }

    /// Disconnect the underlying client.
    pub fn disconnect(&self) {
        self.client.disconnect();
    }
}
