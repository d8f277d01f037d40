//! # Dispatcher
//!
//! Routes one normalized interaction to its registered handler: registry
//! lookup, subcommand routing, guard evaluation, then the handler itself.
//! Every failure stays inside the dispatch that caused it.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Optional error reply to the user, panic isolation
//! - 1.1.0: Autocomplete routing
//! - 1.0.0: Commands, components and modals

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::commands::context::InteractionContext;
use crate::commands::descriptor::{CommandAction, CommandDescriptor, CommandKind, ComponentDescriptor, HandlerKind};
use crate::commands::handler::InteractionHandler;
use crate::commands::registry::HandlerRegistry;
use crate::core::error::DispatchError;
use crate::core::response::AUTOCOMPLETE_LIMIT;
use crate::events::EventBus;
use crate::guards::{GuardOutcome, GuardPipeline};
use crate::interaction::{InboundInteraction, InteractionKind};
use crate::session::{InteractionSession, MessagePayload};

pub const DEFAULT_ERROR_MESSAGE: &str =
    "❌ Sorry, I encountered an error processing your interaction. Please try again.";

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Log guard rejections at info instead of debug
    pub log_rejections: bool,
    /// Tell the user when a handler fails
    pub reply_on_error: bool,
    pub error_message: String,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            log_rejections: true,
            reply_on_error: false,
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran to completion
    Completed,
    /// A guard rejected the interaction and the user was answered
    Rejected { guard: String },
}

pub struct Dispatcher {
    registry: HandlerRegistry,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, options: DispatchOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        self.registry.events()
    }

    /// Handle one interaction end to end
    ///
    /// Never returns an error and never panics: lookup misses, guard
    /// failures, handler errors and handler panics are all logged here.
    pub async fn dispatch(
        &self,
        interaction: InboundInteraction,
        session: Arc<dyn InteractionSession>,
        client: Option<serenity::prelude::Context>,
    ) {
        let request_id = Uuid::new_v4();
        let kind = interaction.kind;
        let key = interaction.key.clone();
        info!(
            "[{request_id}] Received {kind} '{key}' from {} ({})",
            interaction.user_name, interaction.user_id
        );

        let result = AssertUnwindSafe(self.route(request_id, interaction, Arc::clone(&session), client))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(DispatchError::Panicked {
                    key: key.clone(),
                    message: panic_message(payload.as_ref()),
                })
            });

        match result {
            Ok(DispatchOutcome::Completed) => {
                debug!("[{request_id}] {kind} '{key}' completed");
            }
            Ok(DispatchOutcome::Rejected { guard }) => {
                if self.options.log_rejections {
                    info!("[{request_id}] {kind} '{key}' rejected by guard '{guard}'");
                } else {
                    debug!("[{request_id}] {kind} '{key}' rejected by guard '{guard}'");
                }
            }
            Err(e) if e.is_lookup() => {
                warn!("[{request_id}] {e}");
            }
            Err(e) => {
                error!("[{request_id}] Error handling {kind} '{key}': {e:#}");
                if self.options.reply_on_error && kind != InteractionKind::Autocomplete {
                    self.report_error(request_id, session.as_ref()).await;
                }
            }
        }
    }

    async fn report_error(&self, request_id: Uuid, session: &dyn InteractionSession) {
        let mut message = MessagePayload::text(self.options.error_message.as_str());
        message.ephemeral(true);

        let sent = if session.is_replied() || session.is_deferred() {
            session.follow_up(message).await
        } else {
            session.reply(message).await
        };
        if let Err(e) = sent {
            warn!("[{request_id}] Could not send error reply: {e:#}");
        }
    }

    /// Route and run, reporting the outcome to the caller
    pub async fn try_dispatch(
        &self,
        interaction: InboundInteraction,
        session: Arc<dyn InteractionSession>,
        client: Option<serenity::prelude::Context>,
    ) -> Result<DispatchOutcome, DispatchError> {
        self.route(Uuid::new_v4(), interaction, session, client).await
    }

    async fn route(
        &self,
        request_id: Uuid,
        interaction: InboundInteraction,
        session: Arc<dyn InteractionSession>,
        client: Option<serenity::prelude::Context>,
    ) -> Result<DispatchOutcome, DispatchError> {
        match interaction.kind {
            InteractionKind::ChatInputCommand | InteractionKind::ContextMenuCommand => {
                self.dispatch_command(request_id, interaction, session, client).await
            }
            InteractionKind::ButtonPress => {
                let component = self.registry.button(&interaction.key).ok_or_else(|| not_found(&interaction))?;
                let ctx = InteractionContext::new(interaction, session, client).with_request_id(request_id);
                run_component(component, HandlerKind::Button, ctx).await
            }
            InteractionKind::SelectMenuPress => {
                let component = self
                    .registry
                    .select_menu(&interaction.key)
                    .ok_or_else(|| not_found(&interaction))?;
                let ctx = InteractionContext::new(interaction, session, client).with_request_id(request_id);
                run_component(component, HandlerKind::SelectMenu, ctx).await
            }
            InteractionKind::ModalSubmit => {
                let modal = self.registry.modal(&interaction.key).ok_or_else(|| not_found(&interaction))?;
                let ctx = InteractionContext::new(interaction, session, client)
                    .with_request_id(request_id)
                    .with_ephemeral(modal.ephemeral);
                run_handler(modal.handler.as_ref(), HandlerKind::Modal, &ctx).await
            }
            InteractionKind::Autocomplete => {
                self.dispatch_autocomplete(request_id, interaction, session, client)
                    .await
            }
        }
    }

    /// Command registered under the interaction's name and serving its kind
    fn command_for(&self, interaction: &InboundInteraction) -> Result<&CommandDescriptor, DispatchError> {
        self.registry
            .command(&interaction.key)
            .filter(|command| serves(command.kind, interaction.kind))
            .ok_or_else(|| not_found(interaction))
    }

    async fn dispatch_command(
        &self,
        request_id: Uuid,
        interaction: InboundInteraction,
        session: Arc<dyn InteractionSession>,
        client: Option<serenity::prelude::Context>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let command = self.command_for(&interaction)?;

        match &command.action {
            // Subcommands are routed directly; the parent's guards do not apply
            CommandAction::Subcommands(_) => {
                let requested = interaction.subcommand().map(str::to_string);
                let subcommand = requested
                    .as_deref()
                    .and_then(|name| command.subcommand(name))
                    .ok_or_else(|| DispatchError::SubcommandNotFound {
                        command: command.name.clone(),
                        subcommand: requested.clone(),
                    })?;
                debug!(
                    "[{request_id}] Routing '{}' to subcommand '{}'",
                    command.name, subcommand.name
                );

                let ctx = InteractionContext::new(interaction, session, client)
                    .with_request_id(request_id)
                    .with_ephemeral(subcommand.ephemeral || command.ephemeral);
                run_handler(subcommand.handler.as_ref(), HandlerKind::Subcommand, &ctx).await
            }
            CommandAction::Run(handler) => {
                let ctx = InteractionContext::new(interaction, session, client)
                    .with_request_id(request_id)
                    .with_ephemeral(command.ephemeral);
                let outcome = GuardPipeline::new(&command.guards)
                    .with_denied_message(command.denied_message.as_deref())
                    .evaluate(&ctx)
                    .await?;
                if let GuardOutcome::Rejected { guard } = outcome {
                    return Ok(DispatchOutcome::Rejected { guard });
                }
                run_handler(handler.as_ref(), HandlerKind::Command, &ctx).await
            }
        }
    }

    /// Autocomplete is answered without guards; suggestions are capped
    async fn dispatch_autocomplete(
        &self,
        request_id: Uuid,
        interaction: InboundInteraction,
        session: Arc<dyn InteractionSession>,
        client: Option<serenity::prelude::Context>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let command = self.command_for(&interaction)?;
        let (handler, kind) = match &command.action {
            CommandAction::Run(_) => command
                .autocomplete
                .as_ref()
                .map(|handler| (handler, HandlerKind::Command)),
            CommandAction::Subcommands(_) => interaction
                .subcommand()
                .and_then(|name| command.subcommand(name))
                .and_then(|sub| sub.autocomplete.as_ref())
                .map(|handler| (handler, HandlerKind::Subcommand)),
        }
        .ok_or_else(|| not_found(&interaction))?;

        let key = interaction.key.clone();
        let ctx = InteractionContext::new(interaction, Arc::clone(&session), client).with_request_id(request_id);
        let mut choices = handler
            .complete(&ctx)
            .await
            .map_err(|source| DispatchError::Handler {
                key: key.clone(),
                kind,
                source,
            })?;

        if choices.len() > AUTOCOMPLETE_LIMIT {
            debug!(
                "[{request_id}] Trimming {} autocomplete choices for '{key}'",
                choices.len()
            );
            choices.truncate(AUTOCOMPLETE_LIMIT);
        }
        session
            .autocomplete(choices)
            .await
            .map_err(|source| DispatchError::Handler { key, kind, source })?;
        Ok(DispatchOutcome::Completed)
    }
}

/// Slash names and context menu names come from different command kinds
fn serves(command: CommandKind, interaction: InteractionKind) -> bool {
    match interaction {
        InteractionKind::ChatInputCommand | InteractionKind::Autocomplete => command == CommandKind::ChatInput,
        InteractionKind::ContextMenuCommand => command != CommandKind::ChatInput,
        InteractionKind::ButtonPress | InteractionKind::SelectMenuPress | InteractionKind::ModalSubmit => false,
    }
}

async fn run_component(
    component: &ComponentDescriptor,
    kind: HandlerKind,
    ctx: InteractionContext,
) -> Result<DispatchOutcome, DispatchError> {
    let ctx = ctx.with_ephemeral(component.ephemeral);
    let outcome = GuardPipeline::new(&component.guards)
        .with_denied_message(component.denied_message.as_deref())
        .evaluate(&ctx)
        .await?;
    if let GuardOutcome::Rejected { guard } = outcome {
        return Ok(DispatchOutcome::Rejected { guard });
    }
    run_handler(component.handler.as_ref(), kind, &ctx).await
}

async fn run_handler(
    handler: &dyn InteractionHandler,
    kind: HandlerKind,
    ctx: &InteractionContext,
) -> Result<DispatchOutcome, DispatchError> {
    handler
        .run(ctx)
        .await
        .map_err(|source| DispatchError::Handler {
            key: ctx.key().to_string(),
            kind,
            source,
        })?;
    Ok(DispatchOutcome::Completed)
}

fn not_found(interaction: &InboundInteraction) -> DispatchError {
    DispatchError::HandlerNotFound {
        kind: interaction.kind,
        key: interaction.key.clone(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
