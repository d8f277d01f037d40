//! Handler traits
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: One `InteractionHandler` for commands, components and modals
//! - 1.0.0: Initial slash command trait

use anyhow::Result;
use async_trait::async_trait;

use super::context::InteractionContext;
use crate::session::Choice;

/// Callback invoked once routing and guards have passed
///
/// Used for commands, subcommands, buttons, select menus and modals; the
/// context tells the handler which of those it is serving.
///
/// # Example
///
/// ```ignore
/// pub struct Ping;
///
/// #[async_trait]
/// impl InteractionHandler for Ping {
///     async fn run(&self, ctx: &InteractionContext) -> Result<()> {
///         ctx.reply("Pong!").await
///     }
/// }
/// ```
#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn run(&self, ctx: &InteractionContext) -> Result<()>;
}

/// Suggests values for the focused option of a command
#[async_trait]
pub trait AutocompleteHandler: Send + Sync {
    async fn complete(&self, ctx: &InteractionContext) -> Result<Vec<Choice>>;
}
