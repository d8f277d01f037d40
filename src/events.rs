//! # Event Bus
//!
//! Named event subscriptions with `on`/`once`/`off`. The gateway adapter
//! emits Discord gateway events here; applications can emit their own
//! events with a JSON payload.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Custom JSON events
//! - 1.0.0: Initial bus with one-shot subscriptions

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, error};
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, Member};

pub const READY: &str = "ready";
pub const MESSAGE_CREATE: &str = "message_create";
pub const GUILD_CREATE: &str = "guild_create";
pub const GUILD_MEMBER_ADD: &str = "guild_member_add";
pub const REACTION_ADD: &str = "reaction_add";

#[derive(Debug, Clone)]
pub enum EventPayload {
    Ready(Box<Ready>),
    Message(Box<Message>),
    GuildCreate { guild: Box<Guild>, is_new: bool },
    MemberAdd(Box<Member>),
    ReactionAdd(Box<Reaction>),
    Custom(serde_json::Value),
}

/// One emitted event
#[derive(Clone)]
pub struct GatewayEvent {
    pub name: String,
    pub payload: EventPayload,
    /// Present when emitted from the gateway
    pub client: Option<serenity::prelude::Context>,
}

impl GatewayEvent {
    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload: EventPayload::Custom(payload),
            client: None,
        }
    }
}

#[async_trait]
pub trait EventListener: Send + Sync {
    async fn handle(&self, event: &GatewayEvent) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    key: String,
    once: bool,
    listener: Arc<dyn EventListener>,
}

/// Cloneable handle; clones share the same subscriptions
#[derive(Clone, Default)]
pub struct EventBus {
    subscriptions: Arc<DashMap<String, Vec<Subscription>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribe(&self, event: &str, key: &str, once: bool, listener: Arc<dyn EventListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions
            .entry(event.to_string())
            .or_default()
            .push(Subscription {
                id,
                key: key.to_string(),
                once,
                listener,
            });
        debug!("subscribed '{key}' to '{event}' (once: {once})");
        id
    }

    pub fn on(&self, event: &str, key: &str, listener: Arc<dyn EventListener>) -> SubscriptionId {
        self.subscribe(event, key, false, listener)
    }

    /// Subscribe for the next emission only
    pub fn once(&self, event: &str, key: &str, listener: Arc<dyn EventListener>) -> SubscriptionId {
        self.subscribe(event, key, true, listener)
    }

    /// Remove a subscription; `false` if it was already gone
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for mut entry in self.subscriptions.iter_mut() {
            let before = entry.len();
            entry.retain(|sub| sub.id != id);
            if entry.len() != before {
                removed = true;
                break;
            }
        }
        removed
    }

    /// Whether a subscription is still attached (one-shots detach when fired)
    pub fn is_active(&self, id: SubscriptionId) -> bool {
        self.subscriptions
            .iter()
            .any(|entry| entry.iter().any(|sub| sub.id == id))
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.subscriptions.get(event).map(|subs| subs.len()).unwrap_or(0)
    }

    /// Deliver an event to its listeners in subscription order
    ///
    /// One-shot subscriptions are removed before any listener runs. A
    /// failing listener is logged and does not stop the others.
    pub async fn emit(&self, event: GatewayEvent) {
        let listeners: Vec<(String, Arc<dyn EventListener>)> =
            match self.subscriptions.get_mut(&event.name) {
                Some(mut subs) => {
                    let snapshot = subs
                        .iter()
                        .map(|sub| (sub.key.clone(), Arc::clone(&sub.listener)))
                        .collect();
                    subs.retain(|sub| !sub.once);
                    snapshot
                }
                None => Vec::new(),
            };

        if listeners.is_empty() {
            return;
        }
        debug!("emitting '{}' to {} listener(s)", event.name, listeners.len());

        for (key, listener) in listeners {
            if let Err(e) = listener.handle(&event).await {
                error!("Event listener '{key}' failed on '{}': {e:#}", event.name);
            }
        }
    }
}
