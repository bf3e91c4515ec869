//! Command registry, alias resolution, and dispatch.
//!
//! Commands are registered once at startup and held immutable after that: a
//! name-keyed table plus a secondary alias-to-name table. Dispatch strips
//! the configured prefix, case-folds the command token, resolves directly or
//! through the alias table, and invokes the handler. Handler failures are
//! logged and never propagate; what happens to prefixed text that resolves
//! to nothing is a configuration choice
//! ([`UnresolvedCommandPolicy`](wharf_types::UnresolvedCommandPolicy)).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{debug, warn};

use wharf_types::{BotOptions, MessageInfo, UnresolvedCommandPolicy};

use crate::socket::{OutboundContent, ProtocolSocket, SocketError};

/// Everything a handler gets per invocation: the socket to respond on, the
/// original message, and the parsed argument tokens.
pub struct CommandContext {
    pub socket: Arc<dyn ProtocolSocket>,
    pub message: MessageInfo,
    pub args: Vec<String>,
}

impl CommandContext {
    /// Reply in the message's chat, quoting the original message.
    pub async fn reply(&self, text: impl Into<String>) -> Result<(), SocketError> {
        let jid = self
            .message
            .key
            .remote_jid
            .as_deref()
            .ok_or_else(|| SocketError::Api("message has no chat jid".into()))?;
        let content = OutboundContent::text(text).quoting(self.message.key.clone());
        self.socket.send_message(jid, content).await?;
        Ok(())
    }

    /// Send plain text in the message's chat without quoting.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), SocketError> {
        let jid = self
            .message
            .key
            .remote_jid
            .as_deref()
            .ok_or_else(|| SocketError::Api("message has no chat jid".into()))?;
        self.socket
            .send_message(jid, OutboundContent::text(text))
            .await?;
        Ok(())
    }
}

type Handler = Arc<dyn Fn(CommandContext) -> BoxFuture<'static, Result<(), SocketError>> + Send + Sync>;

/// A registered command.
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    handler: Handler,
}

impl Command {
    /// Create a command with a name and an async handler.
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), SocketError>> + Send + 'static,
    {
        Self {
            name: name.into().to_lowercase(),
            description: None,
            aliases: Vec::new(),
            handler: Arc::new(move |ctx| Box::pin(handler(ctx))),
        }
    }

    /// Set the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_lowercase());
        self
    }

    /// Invoke the handler.
    pub fn invoke(&self, ctx: CommandContext) -> BoxFuture<'static, Result<(), SocketError>> {
        (self.handler)(ctx)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

/// Registration failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command name must not be empty")]
    EmptyName,

    #[error("command '{0}' is already registered")]
    DuplicateName(String),

    #[error("alias '{alias}' collides with existing command or alias")]
    AliasCollision { alias: String },
}

/// What dispatch decided about one message.
#[derive(Debug)]
pub enum Resolution {
    /// The message carries no text or does not start with the prefix.
    NotACommand,
    /// Prefixed text with no command token (a bare prefix).
    BarePrefix,
    /// The token resolved to a command.
    Matched { command: Command, args: Vec<String> },
    /// The token resolved to nothing.
    Unresolved { token: String },
}

/// Lookup tables for registered commands.
pub struct CommandRegistry {
    prefix: String,
    unresolved: UnresolvedCommandPolicy,
    commands: HashMap<String, Command>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new(options: BotOptions) -> Self {
        Self {
            prefix: options.prefix,
            unresolved: options.unresolved,
            commands: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Register a command and its aliases. Returns the registry for
    /// chaining; a rejected registration is logged and skipped.
    pub fn register(&mut self, command: Command) -> &mut Self {
        if let Err(e) = self.try_register(command) {
            warn!(error = %e, "command registration rejected");
        }
        self
    }

    /// Register a command, reporting validation failures.
    ///
    /// Names are unique; aliases must not shadow an existing name or alias.
    /// A collision rejects the whole command, leaving the tables untouched.
    pub fn try_register(&mut self, command: Command) -> Result<(), RegistryError> {
        if command.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.commands.contains_key(&command.name) || self.aliases.contains_key(&command.name) {
            return Err(RegistryError::DuplicateName(command.name));
        }
        for alias in &command.aliases {
            if self.commands.contains_key(alias) || self.aliases.contains_key(alias) {
                return Err(RegistryError::AliasCollision {
                    alias: alias.clone(),
                });
            }
        }

        for alias in &command.aliases {
            self.aliases.insert(alias.clone(), command.name.clone());
        }
        debug!(command = %command.name, aliases = command.aliases.len(), "command registered");
        self.commands.insert(command.name.clone(), command);
        Ok(())
    }

    /// All registered commands, sorted by name.
    pub fn commands(&self) -> Vec<&Command> {
        let mut list: Vec<&Command> = self.commands.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// The unresolved-command policy in effect.
    pub fn unresolved_policy(&self) -> &UnresolvedCommandPolicy {
        &self.unresolved
    }

    /// Resolve a message's text against the tables.
    ///
    /// Strips the prefix, splits on whitespace into a case-folded command
    /// token and argument tokens, and looks the token up directly, then via
    /// the alias table.
    pub fn resolve(&self, message: &MessageInfo) -> Resolution {
        let Some(text) = message.text_content() else {
            return Resolution::NotACommand;
        };
        let Some(rest) = text.strip_prefix(&self.prefix) else {
            return Resolution::NotACommand;
        };

        let mut tokens = rest.trim().split_whitespace();
        let Some(token) = tokens.next() else {
            return Resolution::BarePrefix;
        };
        let token = token.to_lowercase();
        let args: Vec<String> = tokens.map(str::to_string).collect();

        let command = self.commands.get(&token).or_else(|| {
            self.aliases
                .get(&token)
                .and_then(|name| self.commands.get(name))
        });

        match command {
            Some(command) => Resolution::Matched {
                command: command.clone(),
                args,
            },
            None => Resolution::Unresolved { token },
        }
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("prefix", &self.prefix)
            .field("commands", &self.commands.len())
            .field("aliases", &self.aliases.len())
            .finish()
    }
}

/// Resolve and dispatch one message.
///
/// Matched handlers run to completion before this returns (handling is
/// strictly sequential); a handler error is logged and swallowed. Unresolved
/// tokens follow the configured policy: silent by default, or a templated
/// reply with `{command}` substituted.
pub async fn handle(
    registry: &CommandRegistry,
    socket: &Arc<dyn ProtocolSocket>,
    message: &MessageInfo,
) {
    let resolution = registry.resolve(message);
    dispatch(socket, message, resolution, registry.unresolved_policy()).await;
}

/// Dispatch a pre-computed [`Resolution`].
///
/// Split out from [`handle`] so callers keeping the registry behind a lock
/// can resolve under the lock and invoke the handler outside it.
pub async fn dispatch(
    socket: &Arc<dyn ProtocolSocket>,
    message: &MessageInfo,
    resolution: Resolution,
    policy: &UnresolvedCommandPolicy,
) {
    match resolution {
        Resolution::NotACommand | Resolution::BarePrefix => {}
        Resolution::Matched { command, args } => {
            let ctx = CommandContext {
                socket: socket.clone(),
                message: message.clone(),
                args,
            };
            let name = command.name.clone();
            if let Err(e) = command.invoke(ctx).await {
                warn!(command = %name, error = %e, "command handler failed");
            }
        }
        Resolution::Unresolved { token } => match policy {
            UnresolvedCommandPolicy::Silent => {
                debug!(command = %token, "unresolved command ignored");
            }
            UnresolvedCommandPolicy::Reply { template } => {
                let Some(jid) = message.key.remote_jid.as_deref() else {
                    return;
                };
                let text = template.replace("{command}", &token);
                if let Err(e) = socket.send_message(jid, OutboundContent::text(text)).await {
                    warn!(command = %token, error = %e, "unresolved-command reply failed");
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wharf_types::MessageContent;

    fn registry(prefix: &str) -> CommandRegistry {
        CommandRegistry::new(BotOptions {
            prefix: prefix.to_string(),
            unresolved: UnresolvedCommandPolicy::Silent,
        })
    }

    fn noop() -> Command {
        Command::new("ping", |_ctx| async { Ok(()) })
    }

    fn msg(text: &str) -> MessageInfo {
        MessageInfo::text("123@s.whatsapp.net", "ID", text)
    }

    #[test]
    fn resolve_matches_name_and_args() {
        let mut reg = registry("!");
        reg.register(noop());

        match reg.resolve(&msg("!ping arg1 arg2")) {
            Resolution::Matched { command, args } => {
                assert_eq!(command.name, "ping");
                assert_eq!(args, vec!["arg1", "arg2"]);
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let mut reg = registry("!");
        reg.register(noop());

        assert!(matches!(
            reg.resolve(&msg("!PING")),
            Resolution::Matched { .. }
        ));
        assert!(matches!(
            reg.resolve(&msg("!PiNg")),
            Resolution::Matched { .. }
        ));
    }

    #[test]
    fn resolve_via_alias_matches_canonical() {
        let mut reg = registry("!");
        reg.register(Command::new("ping", |_ctx| async { Ok(()) }).alias("p"));

        let by_alias = reg.resolve(&msg("!p x"));
        match by_alias {
            Resolution::Matched { command, args } => {
                assert_eq!(command.name, "ping");
                assert_eq!(args, vec!["x"]);
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn non_prefixed_text_is_not_a_command() {
        let mut reg = registry("!");
        reg.register(noop());

        assert!(matches!(
            reg.resolve(&msg("ping")),
            Resolution::NotACommand
        ));
        assert!(matches!(
            reg.resolve(&msg("hello !ping")),
            Resolution::NotACommand
        ));
    }

    #[test]
    fn bare_prefix_is_not_dispatched() {
        let mut reg = registry("!");
        reg.register(noop());
        assert!(matches!(reg.resolve(&msg("!")), Resolution::BarePrefix));
        assert!(matches!(reg.resolve(&msg("!   ")), Resolution::BarePrefix));
    }

    #[test]
    fn unknown_token_is_unresolved() {
        let reg = registry("!");
        match reg.resolve(&msg("!nope")) {
            Resolution::Unresolved { token } => assert_eq!(token, "nope"),
            other => panic!("expected unresolved, got {other:?}"),
        }
    }

    #[test]
    fn empty_content_is_not_a_command() {
        let reg = registry("!");
        let mut m = msg("!ping");
        m.content = Some(MessageContent::Image { caption: None });
        assert!(matches!(reg.resolve(&m), Resolution::NotACommand));
        m.content = None;
        assert!(matches!(reg.resolve(&m), Resolution::NotACommand));
    }

    #[test]
    fn image_caption_dispatches() {
        let mut reg = registry("!");
        reg.register(noop());
        let mut m = msg("");
        m.content = Some(MessageContent::Image {
            caption: Some("!ping from caption".into()),
        });
        match reg.resolve(&m) {
            Resolution::Matched { args, .. } => assert_eq!(args, vec!["from", "caption"]),
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn multi_char_prefix() {
        let mut reg = registry("::");
        reg.register(noop());
        assert!(matches!(
            reg.resolve(&msg("::ping")),
            Resolution::Matched { .. }
        ));
        assert!(matches!(
            reg.resolve(&msg("!ping")),
            Resolution::NotACommand
        ));
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut reg = registry("!");
        reg.try_register(noop()).unwrap();
        assert_eq!(
            reg.try_register(noop()),
            Err(RegistryError::DuplicateName("ping".into()))
        );
    }

    #[test]
    fn alias_shadowing_name_rejected() {
        let mut reg = registry("!");
        reg.try_register(noop()).unwrap();
        let cmd = Command::new("status", |_ctx| async { Ok(()) }).alias("ping");
        assert_eq!(
            reg.try_register(cmd),
            Err(RegistryError::AliasCollision {
                alias: "ping".into()
            })
        );
        // The rejected command must not be half-registered.
        assert!(matches!(
            reg.resolve(&msg("!status")),
            Resolution::Unresolved { .. }
        ));
    }

    #[test]
    fn name_shadowing_alias_rejected() {
        let mut reg = registry("!");
        reg.try_register(Command::new("ping", |_ctx| async { Ok(()) }).alias("p"))
            .unwrap();
        let cmd = Command::new("p", |_ctx| async { Ok(()) });
        assert_eq!(
            reg.try_register(cmd),
            Err(RegistryError::DuplicateName("p".into()))
        );
    }

    #[test]
    fn register_is_chainable_and_skips_bad_entries() {
        let mut reg = registry("!");
        reg.register(noop())
            .register(noop()) // duplicate, skipped
            .register(Command::new("status", |_ctx| async { Ok(()) }));
        assert_eq!(reg.commands().len(), 2);
    }

    #[test]
    fn commands_listed_sorted() {
        let mut reg = registry("!");
        reg.register(Command::new("status", |_ctx| async { Ok(()) }))
            .register(Command::new("about", |_ctx| async { Ok(()) }))
            .register(noop());
        let names: Vec<&str> = reg.commands().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["about", "ping", "status"]);
    }

    /// A socket that records sent texts.
    #[derive(Default)]
    struct MinimalSocket {
        sent: std::sync::Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl ProtocolSocket for MinimalSocket {
        async fn send_message(
            &self,
            jid: &str,
            content: OutboundContent,
        ) -> Result<MessageInfo, SocketError> {
            self.sent
                .lock()
                .unwrap()
                .push((jid.to_string(), content.text));
            Ok(msg("sent"))
        }
        async fn group_metadata(
            &self,
            jid: &str,
        ) -> Result<wharf_types::GroupMetadata, SocketError> {
            Err(SocketError::Api(format!("unknown group {jid}")))
        }
        async fn request_pairing_code(&self, _phone: &str) -> Result<String, SocketError> {
            Ok("0000-0000".into())
        }
        fn end(&self) {}
    }

    #[tokio::test]
    async fn handle_invokes_matched_handler() {
        let minimal = Arc::new(MinimalSocket::default());
        let socket: Arc<dyn ProtocolSocket> = minimal.clone();
        let mut reg = registry("!");
        reg.register(Command::new("ping", |ctx| async move { ctx.reply("Pong!").await }));

        handle(&reg, &socket, &msg("!ping")).await;

        let sent = minimal.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "123@s.whatsapp.net");
        assert_eq!(sent[0].1, "Pong!");
    }

    #[tokio::test]
    async fn handle_swallows_handler_errors() {
        let mut reg = registry("!");
        reg.register(Command::new("boom", |_ctx| async {
            Err(SocketError::Api("exploded".into()))
        }));
        let socket: Arc<dyn ProtocolSocket> = Arc::new(MinimalSocket::default());

        // Must not panic or propagate.
        handle(&reg, &socket, &msg("!boom")).await;
    }

    #[tokio::test]
    async fn handle_reply_policy_answers_unresolved() {
        let minimal = Arc::new(MinimalSocket::default());
        let socket: Arc<dyn ProtocolSocket> = minimal.clone();
        let reg = CommandRegistry::new(BotOptions {
            prefix: "!".into(),
            unresolved: UnresolvedCommandPolicy::Reply {
                template: "no such command: {command}".into(),
            },
        });

        handle(&reg, &socket, &msg("!missing")).await;

        let sent = minimal.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "no such command: missing");
    }

    #[tokio::test]
    async fn handle_silent_policy_sends_nothing() {
        let minimal = Arc::new(MinimalSocket::default());
        let socket: Arc<dyn ProtocolSocket> = minimal.clone();
        let reg = registry("!");

        handle(&reg, &socket, &msg("!missing")).await;

        assert!(minimal.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn registration_case_folds_names_and_aliases() {
        let mut reg = registry("!");
        reg.register(Command::new("Ping", |_ctx| async { Ok(()) }).alias("P"));
        assert!(matches!(
            reg.resolve(&msg("!ping")),
            Resolution::Matched { .. }
        ));
        assert!(matches!(
            reg.resolve(&msg("!p")),
            Resolution::Matched { .. }
        ));
    }
}
