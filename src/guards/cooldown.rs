//! # Cooldowns
//!
//! Sliding-window rate limiting per (handler key, user). The window state
//! lives in a [`RateLimiter`] shared through an `Arc`; the [`Cooldown`]
//! guard only consults it.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Keyed by (handler key, user id), exposed as a guard
//! - 1.0.0: Per-user sliding window limiter

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::UserId;

use super::{Guard, GuardTarget};
use crate::commands::context::InteractionContext;

type RateLimitKey = (String, UserId);

pub struct RateLimiter {
    requests: DashMap<RateLimitKey, Vec<Instant>>,
    max_requests: usize,
    time_window: Duration,
    checks: AtomicUsize,
}

/// Checks between sweeps of idle (key, user) windows
const PRUNE_INTERVAL: usize = 1024;

impl RateLimiter {
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        Self {
            requests: DashMap::new(),
            max_requests,
            time_window,
            checks: AtomicUsize::new(0),
        }
    }

    /// Record a use and report whether it was within the limit
    pub fn check(&self, key: &str, user: UserId) -> bool {
        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_INTERVAL == PRUNE_INTERVAL - 1 {
            self.prune();
        }

        let now = Instant::now();
        let mut entry = self.requests.entry((key.to_string(), user)).or_default();

        entry.retain(|&time| now.duration_since(time) < self.time_window);

        if entry.len() >= self.max_requests {
            false
        } else {
            entry.push(now);
            true
        }
    }

    /// Drop windows with no use left inside the time window
    pub fn prune(&self) {
        let window = self.time_window;
        self.requests.retain(|_, uses| {
            uses.retain(|time| time.elapsed() < window);
            !uses.is_empty()
        });
    }

    /// Number of (key, user) pairs currently tracked
    pub fn tracked(&self) -> usize {
        self.requests.len()
    }

    /// Time until the oldest use in the window expires
    pub fn retry_after(&self, key: &str, user: UserId) -> Option<Duration> {
        let entry = self.requests.get(&(key.to_string(), user))?;
        let oldest = entry.first()?;
        self.time_window.checked_sub(oldest.elapsed())
    }
}

pub struct Cooldown {
    limiter: Arc<RateLimiter>,
}

impl Cooldown {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

#[async_trait]
impl Guard for Cooldown {
    fn name(&self) -> &str {
        "cooldown"
    }

    fn targets(&self) -> &[GuardTarget] {
        GuardTarget::ALL
    }

    fn message(&self) -> Option<&str> {
        Some("You're doing that too quickly! Please slow down.")
    }

    async fn check(&self, ctx: &InteractionContext) -> Result<bool> {
        Ok(self.limiter.check(ctx.key(), ctx.user_id()))
    }

    async fn on_reject(&self, ctx: &InteractionContext) -> Result<bool> {
        let Some(wait) = self.limiter.retry_after(ctx.key(), ctx.user_id()) else {
            return Ok(false);
        };
        let mut message = crate::session::MessagePayload::text(format!(
            "⏱️ Slow down! Try again in {:.1}s.",
            wait.as_secs_f32()
        ));
        message.ephemeral(true);
        ctx.reply(message).await?;
        Ok(true)
    }
}
