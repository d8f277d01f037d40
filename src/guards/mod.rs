//! # Guards
//!
//! Pre-conditions evaluated before a guarded handler runs. A guard either
//! passes, rejects (expected control flow, answered with a user-visible
//! message), or fails with an error (reported by the dispatcher).
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Add `Cooldown` backed by the shared rate limiter
//! - 1.1.0: Add `FnGuard` with per-target closures
//! - 1.0.0: Initial guard trait and fail-fast pipeline

pub mod builtin;
pub mod cooldown;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;

use crate::commands::context::InteractionContext;
use crate::core::error::GuardError;
use crate::interaction::InteractionKind;
use crate::session::MessagePayload;

pub use builtin::{GuildOnly, OwnerOnly, RequirePermissions};
pub use cooldown::{Cooldown, RateLimiter};

pub const DEFAULT_DENIED_MESSAGE: &str = "You are not allowed to use this.";

/// Interaction kinds a guard can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardTarget {
    Slash,
    ContextMenu,
    Button,
    SelectMenu,
}

impl GuardTarget {
    pub const ALL: &'static [GuardTarget] = &[
        GuardTarget::Slash,
        GuardTarget::ContextMenu,
        GuardTarget::Button,
        GuardTarget::SelectMenu,
    ];

    pub fn for_kind(kind: InteractionKind) -> Option<Self> {
        match kind {
            InteractionKind::ChatInputCommand => Some(GuardTarget::Slash),
            InteractionKind::ContextMenuCommand => Some(GuardTarget::ContextMenu),
            InteractionKind::ButtonPress => Some(GuardTarget::Button),
            InteractionKind::SelectMenuPress => Some(GuardTarget::SelectMenu),
            InteractionKind::ModalSubmit | InteractionKind::Autocomplete => None,
        }
    }
}

impl fmt::Display for GuardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuardTarget::Slash => "slash command",
            GuardTarget::ContextMenu => "context menu",
            GuardTarget::Button => "button",
            GuardTarget::SelectMenu => "select menu",
        };
        f.write_str(name)
    }
}

/// A named, reusable pre-condition
///
/// Guards are shared immutably between concurrent dispatches; `check`
/// takes `&self` and must not rely on per-call state of the guard value.
#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &str;

    /// Targets this guard has a check for; verified at registration
    fn targets(&self) -> &[GuardTarget];

    /// Message used for the default ephemeral rejection reply
    fn message(&self) -> Option<&str> {
        None
    }

    async fn check(&self, ctx: &InteractionContext) -> Result<bool>;

    /// Custom rejection response; return `true` once the guard has responded
    async fn on_reject(&self, _ctx: &InteractionContext) -> Result<bool> {
        Ok(false)
    }
}

/// Result of evaluating a guard list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Passed,
    Rejected { guard: String },
}

/// Sequential, fail-fast evaluation of a handler's guards
pub struct GuardPipeline<'a> {
    guards: &'a [Arc<dyn Guard>],
    denied_message: Option<&'a str>,
}

impl<'a> GuardPipeline<'a> {
    pub fn new(guards: &'a [Arc<dyn Guard>]) -> Self {
        Self {
            guards,
            denied_message: None,
        }
    }

    /// Handler-level override of the rejection message
    pub fn with_denied_message(mut self, message: Option<&'a str>) -> Self {
        self.denied_message = message;
        self
    }

    /// Run guards in declaration order, stopping at the first rejection
    ///
    /// Guards after the rejecting one are never called. Errors from a check
    /// or a rejection callback are returned as `GuardError`, distinct from
    /// a rejection.
    pub async fn evaluate(&self, ctx: &InteractionContext) -> Result<GuardOutcome, GuardError> {
        for guard in self.guards {
            let passed = guard.check(ctx).await.map_err(|source| GuardError {
                guard: guard.name().to_string(),
                source,
            })?;
            if passed {
                debug!(
                    "[{}] guard '{}' passed for '{}'",
                    ctx.request_id(),
                    guard.name(),
                    ctx.key()
                );
                continue;
            }

            self.reject(guard.as_ref(), ctx)
                .await
                .map_err(|source| GuardError {
                    guard: guard.name().to_string(),
                    source,
                })?;
            return Ok(GuardOutcome::Rejected {
                guard: guard.name().to_string(),
            });
        }
        Ok(GuardOutcome::Passed)
    }

    async fn reject(&self, guard: &dyn Guard, ctx: &InteractionContext) -> Result<()> {
        if guard.on_reject(ctx).await? {
            return Ok(());
        }
        let text = self
            .denied_message
            .or_else(|| guard.message())
            .unwrap_or(DEFAULT_DENIED_MESSAGE);
        let mut message = MessagePayload::text(text);
        message.ephemeral(true);
        ctx.reply(message).await
    }
}

type CheckFn = Box<dyn Fn(&InteractionContext) -> bool + Send + Sync>;

/// Guard assembled from one synchronous check per target
///
/// ```ignore
/// let staff = FnGuard::new("staff")
///     .message("Staff only.")
///     .slash(|ctx| ctx.has_role(STAFF_ROLE))
///     .button(|ctx| ctx.has_role(STAFF_ROLE));
/// ```
pub struct FnGuard {
    name: String,
    message: Option<String>,
    targets: Vec<GuardTarget>,
    checks: HashMap<GuardTarget, CheckFn>,
}

impl FnGuard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: None,
            targets: Vec::new(),
            checks: HashMap::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn on<F>(mut self, target: GuardTarget, check: F) -> Self
    where
        F: Fn(&InteractionContext) -> bool + Send + Sync + 'static,
    {
        if self.checks.insert(target, Box::new(check)).is_none() {
            self.targets.push(target);
        }
        self
    }

    pub fn slash<F>(self, check: F) -> Self
    where
        F: Fn(&InteractionContext) -> bool + Send + Sync + 'static,
    {
        self.on(GuardTarget::Slash, check)
    }

    pub fn context_menu<F>(self, check: F) -> Self
    where
        F: Fn(&InteractionContext) -> bool + Send + Sync + 'static,
    {
        self.on(GuardTarget::ContextMenu, check)
    }

    pub fn button<F>(self, check: F) -> Self
    where
        F: Fn(&InteractionContext) -> bool + Send + Sync + 'static,
    {
        self.on(GuardTarget::Button, check)
    }

    pub fn select_menu<F>(self, check: F) -> Self
    where
        F: Fn(&InteractionContext) -> bool + Send + Sync + 'static,
    {
        self.on(GuardTarget::SelectMenu, check)
    }
}

#[async_trait]
impl Guard for FnGuard {
    fn name(&self) -> &str {
        &self.name
    }

    fn targets(&self) -> &[GuardTarget] {
        &self.targets
    }

    fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    async fn check(&self, ctx: &InteractionContext) -> Result<bool> {
        let check = GuardTarget::for_kind(ctx.kind())
            .and_then(|target| self.checks.get(&target))
            .ok_or_else(|| anyhow!("no check for {} interactions", ctx.kind()))?;
        Ok(check(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{InboundInteraction, InteractionKind};
    use crate::test_utils::{context_for, CountingGuard, Recorded, RecordingSession};
    use serenity::model::id::UserId;
    use std::sync::atomic::Ordering;

    fn slash_ctx(session: &Arc<RecordingSession>) -> InteractionContext {
        context_for(
            InboundInteraction::new(InteractionKind::ChatInputCommand, "admin", UserId(7)),
            session.clone(),
        )
    }

    #[tokio::test]
    async fn test_empty_pipeline_passes() {
        let session = Arc::new(RecordingSession::default());
        let ctx = slash_ctx(&session);
        let outcome = GuardPipeline::new(&[]).evaluate(&ctx).await.unwrap();
        assert_eq!(outcome, GuardOutcome::Passed);
        assert!(session.calls().is_empty());
    }

    #[tokio::test]
    async fn test_guards_after_first_rejection_never_run() {
        for reject_at in 0..4 {
            let counters: Vec<Arc<CountingGuard>> = (0..4)
                .map(|i| Arc::new(CountingGuard::new(&format!("g{i}"), i != reject_at)))
                .collect();
            let guards: Vec<Arc<dyn Guard>> =
                counters.iter().map(|g| g.clone() as Arc<dyn Guard>).collect();

            let session = Arc::new(RecordingSession::default());
            let ctx = slash_ctx(&session);
            let outcome = GuardPipeline::new(&guards).evaluate(&ctx).await.unwrap();

            assert_eq!(
                outcome,
                GuardOutcome::Rejected {
                    guard: format!("g{reject_at}")
                }
            );
            for (i, counter) in counters.iter().enumerate() {
                let expected = usize::from(i <= reject_at);
                assert_eq!(counter.calls.load(Ordering::SeqCst), expected, "guard g{i}");
            }
        }
    }

    #[tokio::test]
    async fn test_rejection_replies_ephemerally_with_guard_message() {
        let guard: Arc<dyn Guard> = Arc::new(
            FnGuard::new("never")
                .message("Nope.")
                .slash(|_| false),
        );
        let session = Arc::new(RecordingSession::default());
        let ctx = slash_ctx(&session);
        GuardPipeline::new(&[guard]).evaluate(&ctx).await.unwrap();

        match session.calls().as_slice() {
            [Recorded::Reply(message)] => {
                assert_eq!(message.content.as_deref(), Some("Nope."));
                assert_eq!(message.ephemeral, Some(true));
            }
            other => panic!("unexpected calls: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handler_denied_message_overrides_guard_message() {
        let guard: Arc<dyn Guard> = Arc::new(FnGuard::new("never").message("Nope.").slash(|_| false));
        let session = Arc::new(RecordingSession::default());
        let ctx = slash_ctx(&session);
        GuardPipeline::new(&[guard])
            .with_denied_message(Some("Admins only."))
            .evaluate(&ctx)
            .await
            .unwrap();
        assert_eq!(session.reply_texts(), vec!["Admins only.".to_string()]);
    }

    #[tokio::test]
    async fn test_custom_rejection_callback_replaces_default_reply() {
        let guard = Arc::new(CountingGuard::new("custom", false).with_custom_reject());
        let guards: Vec<Arc<dyn Guard>> = vec![guard.clone()];
        let session = Arc::new(RecordingSession::default());
        let ctx = slash_ctx(&session);
        GuardPipeline::new(&guards).evaluate(&ctx).await.unwrap();

        assert_eq!(guard.rejections.load(Ordering::SeqCst), 1);
        assert_eq!(session.reply_texts(), vec!["custom rejection".to_string()]);
    }

    #[tokio::test]
    async fn test_check_error_is_not_a_rejection() {
        let failing = Arc::new(CountingGuard::new("broken", true).failing());
        let after = Arc::new(CountingGuard::new("after", true));
        let guards: Vec<Arc<dyn Guard>> = vec![failing, after.clone()];

        let session = Arc::new(RecordingSession::default());
        let ctx = slash_ctx(&session);
        let err = GuardPipeline::new(&guards).evaluate(&ctx).await.unwrap_err();

        assert_eq!(err.guard, "broken");
        assert_eq!(after.calls.load(Ordering::SeqCst), 0);
        assert!(session.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fn_guard_uses_check_for_context_kind() {
        let guard = FnGuard::new("split").slash(|_| true).button(|_| false);
        assert_eq!(guard.targets(), &[GuardTarget::Slash, GuardTarget::Button]);

        let session = Arc::new(RecordingSession::default());
        assert!(guard.check(&slash_ctx(&session)).await.unwrap());

        let button = context_for(
            InboundInteraction::new(InteractionKind::ButtonPress, "b", UserId(7)),
            session.clone(),
        );
        assert!(!guard.check(&button).await.unwrap());

        let select = context_for(
            InboundInteraction::new(InteractionKind::SelectMenuPress, "s", UserId(7)),
            session,
        );
        assert!(guard.check(&select).await.is_err());
    }

    #[test]
    fn test_guard_target_for_kind() {
        assert_eq!(
            GuardTarget::for_kind(InteractionKind::ContextMenuCommand),
            Some(GuardTarget::ContextMenu)
        );
        assert_eq!(GuardTarget::for_kind(InteractionKind::ModalSubmit), None);
        assert_eq!(GuardTarget::for_kind(InteractionKind::Autocomplete), None);
    }
}
