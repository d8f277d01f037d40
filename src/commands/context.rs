//! Per-dispatch interaction context
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: One context per dispatch wrapping the inbound interaction and its session
//! - 1.0.0: Shared service context for command handlers

use std::sync::Arc;

use anyhow::Result;
use log::debug;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::model::permissions::Permissions;
use uuid::Uuid;

use super::arguments::ArgumentResolver;
use crate::commands::registry::CUSTOM_ID_SEPARATOR;
use crate::core::response::{chunk_for_message, truncate_for_message};
use crate::interaction::{InboundInteraction, InteractionKind};
use crate::session::{InteractionSession, MessagePayload, ModalPayload, Reply};

/// State of one in-flight interaction, handed to guards and handlers
///
/// Read-only apart from the reply state, which the session tracks.
pub struct InteractionContext {
    interaction: InboundInteraction,
    session: Arc<dyn InteractionSession>,
    args: ArgumentResolver,
    ephemeral: bool,
    client: Option<serenity::prelude::Context>,
    request_id: Uuid,
}

impl InteractionContext {
    pub fn new(
        interaction: InboundInteraction,
        session: Arc<dyn InteractionSession>,
        client: Option<serenity::prelude::Context>,
    ) -> Self {
        let args = ArgumentResolver::new(&interaction.options);
        Self {
            interaction,
            session,
            args,
            ephemeral: false,
            client,
            request_id: Uuid::new_v4(),
        }
    }

    /// Correlate this context's log lines with the dispatch that built it
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Default ephemeral flag for replies that don't set one
    pub fn with_ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn kind(&self) -> InteractionKind {
        self.interaction.kind
    }

    /// Command name or full custom id
    pub fn key(&self) -> &str {
        &self.interaction.key
    }

    pub fn interaction(&self) -> &InboundInteraction {
        &self.interaction
    }

    pub fn args(&self) -> &ArgumentResolver {
        &self.args
    }

    pub fn user_id(&self) -> UserId {
        self.interaction.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.interaction.user_name
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        self.interaction.guild_id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.interaction.channel_id
    }

    pub fn member_permissions(&self) -> Option<Permissions> {
        self.interaction.member_permissions
    }

    pub fn has_role(&self, role: RoleId) -> bool {
        self.interaction.member_roles.contains(&role)
    }

    /// Serenity context when dispatched from the gateway
    pub fn client(&self) -> Option<&serenity::prelude::Context> {
        self.client.as_ref()
    }

    /// Segments of the custom id after the routing prefix
    ///
    /// `page:abc:next` → `["abc", "next"]`; empty for commands and plain ids.
    pub fn custom_id_args(&self) -> Vec<&str> {
        if self.interaction.kind.is_command() {
            return Vec::new();
        }
        self.interaction
            .key
            .split(CUSTOM_ID_SEPARATOR)
            .skip(1)
            .collect()
    }

    /// Selected values of a select menu
    pub fn values(&self) -> &[String] {
        &self.interaction.values
    }

    /// Submitted text input of a modal
    pub fn field(&self, custom_id: &str) -> Option<&str> {
        self.interaction.fields.get(custom_id).map(String::as_str)
    }

    /// Target user or message of a context menu command
    pub fn target_id(&self) -> Option<u64> {
        self.interaction.target_id
    }

    pub fn is_replied(&self) -> bool {
        self.session.is_replied()
    }

    fn prepare(&self, reply: Reply) -> MessagePayload {
        let mut message = reply.into_payload();
        if let Some(content) = message.content.take() {
            message.content = Some(truncate_for_message(&content));
        }
        if message.ephemeral.is_none() {
            message.ephemeral = Some(self.ephemeral);
        }
        message
    }

    /// Respond with text, a payload or a builder closure
    ///
    /// Becomes an edit of the original response once the interaction has
    /// been replied to or deferred.
    pub async fn reply(&self, reply: impl Into<Reply>) -> Result<()> {
        let message = self.prepare(reply.into());
        if self.session.is_replied() || self.session.is_deferred() {
            debug!(
                "[{}] '{}' already acknowledged, editing reply",
                self.request_id,
                self.key()
            );
            self.session.edit_reply(message).await
        } else {
            self.session.reply(message).await
        }
    }

    pub async fn edit_reply(&self, reply: impl Into<Reply>) -> Result<()> {
        self.session.edit_reply(self.prepare(reply.into())).await
    }

    pub async fn follow_up(&self, reply: impl Into<Reply>) -> Result<()> {
        self.session.follow_up(self.prepare(reply.into())).await
    }

    /// Send long text as a reply plus as many follow-ups as needed
    pub async fn reply_chunked(&self, text: &str) -> Result<()> {
        let mut chunks = chunk_for_message(text).into_iter();
        if let Some(first) = chunks.next() {
            self.reply(first).await?;
        }
        for chunk in chunks {
            self.follow_up(chunk).await?;
        }
        Ok(())
    }

    pub async fn defer(&self) -> Result<()> {
        self.session.defer(self.ephemeral).await
    }

    /// Edit the message a component is attached to
    pub async fn update(&self, reply: impl Into<Reply>) -> Result<()> {
        let message = self.prepare(reply.into());
        if self.session.is_replied() || self.session.is_deferred() {
            self.session.edit_reply(message).await
        } else {
            self.session.update(message).await
        }
    }

    pub async fn defer_update(&self) -> Result<()> {
        self.session.defer_update().await
    }

    pub async fn show_modal(&self, modal: ModalPayload) -> Result<()> {
        self.session.show_modal(modal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::response::MESSAGE_LIMIT;
    use crate::test_utils::{Recorded, RecordingSession};

    fn ctx(kind: InteractionKind, key: &str, session: &Arc<RecordingSession>) -> InteractionContext {
        InteractionContext::new(
            InboundInteraction::new(kind, key, UserId(9)),
            session.clone(),
            None,
        )
    }

    #[tokio::test]
    async fn test_first_reply_then_edit() {
        let session = Arc::new(RecordingSession::default());
        let ctx = ctx(InteractionKind::ChatInputCommand, "ping", &session);

        ctx.reply("one").await.unwrap();
        ctx.reply("two").await.unwrap();

        let calls = session.calls();
        assert!(matches!(&calls[0], Recorded::Reply(m) if m.content.as_deref() == Some("one")));
        assert!(matches!(&calls[1], Recorded::EditReply(m) if m.content.as_deref() == Some("two")));
    }

    #[tokio::test]
    async fn test_reply_after_defer_edits() {
        let session = Arc::new(RecordingSession::default());
        let ctx = ctx(InteractionKind::ChatInputCommand, "slow", &session).with_ephemeral(true);

        ctx.defer().await.unwrap();
        ctx.reply("done").await.unwrap();

        let calls = session.calls();
        assert_eq!(calls[0], Recorded::Defer { ephemeral: true });
        assert!(matches!(&calls[1], Recorded::EditReply(_)));
    }

    #[tokio::test]
    async fn test_reply_shapes_normalize_to_same_payload() {
        let session = Arc::new(RecordingSession::default());
        let ctx = ctx(InteractionKind::ChatInputCommand, "ping", &session);

        ctx.follow_up("pong").await.unwrap();
        ctx.follow_up(MessagePayload::text("pong")).await.unwrap();
        ctx.follow_up(Reply::build(|m| m.content("pong"))).await.unwrap();

        let calls = session.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn test_handler_ephemeral_default_and_override() {
        let session = Arc::new(RecordingSession::default());
        let ctx = ctx(InteractionKind::ChatInputCommand, "secret", &session).with_ephemeral(true);

        ctx.follow_up("default").await.unwrap();
        ctx.follow_up(Reply::build(|m| m.content("public").ephemeral(false)))
            .await
            .unwrap();

        match session.calls().as_slice() {
            [Recorded::FollowUp(a), Recorded::FollowUp(b)] => {
                assert_eq!(a.ephemeral, Some(true));
                assert_eq!(b.ephemeral, Some(false));
            }
            other => panic!("unexpected calls: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_long_content_is_truncated() {
        let session = Arc::new(RecordingSession::default());
        let ctx = ctx(InteractionKind::ChatInputCommand, "long", &session);
        ctx.reply("x".repeat(5000)).await.unwrap();
        assert_eq!(session.reply_texts()[0].len(), MESSAGE_LIMIT);
    }

    #[tokio::test]
    async fn test_reply_chunked_uses_follow_ups() {
        let session = Arc::new(RecordingSession::default());
        let ctx = ctx(InteractionKind::ChatInputCommand, "long", &session);
        ctx.reply_chunked(&"y".repeat(4500)).await.unwrap();

        let calls = session.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], Recorded::Reply(_)));
        assert!(matches!(calls[1], Recorded::FollowUp(_)));
        assert!(matches!(calls[2], Recorded::FollowUp(_)));
    }

    #[tokio::test]
    async fn test_update_for_components() {
        let session = Arc::new(RecordingSession::default());
        let ctx = ctx(InteractionKind::ButtonPress, "page:abc:next", &session);

        assert_eq!(ctx.custom_id_args(), vec!["abc", "next"]);
        ctx.update("page 2").await.unwrap();
        ctx.update("page 3").await.unwrap();

        let calls = session.calls();
        assert!(matches!(calls[0], Recorded::Update(_)));
        assert!(matches!(calls[1], Recorded::EditReply(_)));
    }

    #[test]
    fn test_custom_id_args_empty_for_commands_and_plain_ids() {
        let session = Arc::new(RecordingSession::default());
        assert!(ctx(InteractionKind::ChatInputCommand, "a:b", &session)
            .custom_id_args()
            .is_empty());
        assert!(ctx(InteractionKind::ButtonPress, "confirm", &session)
            .custom_id_args()
            .is_empty());
    }

    #[test]
    fn test_modal_fields_and_select_values() {
        let session = Arc::new(RecordingSession::default());
        let modal = InteractionContext::new(
            InboundInteraction::new(InteractionKind::ModalSubmit, "bio", UserId(1))
                .with_field("text", "hello"),
            session.clone(),
            None,
        );
        assert_eq!(modal.field("text"), Some("hello"));
        assert_eq!(modal.field("missing"), None);

        let select = InteractionContext::new(
            InboundInteraction::new(InteractionKind::SelectMenuPress, "color", UserId(1))
                .with_values(vec!["red".to_string()]),
            session,
            None,
        );
        assert_eq!(select.values(), ["red".to_string()]);
    }
}
