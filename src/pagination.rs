//! # Pagination
//!
//! Paged embed replies navigated with buttons. Every paginated message
//! gets its own session id carried in the button custom ids
//! (`page:<session>:<action>`), so a single registered `page` button
//! handler serves all of them.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 2.0.0: Per-message sessions keyed by uuid, owner-only navigation
//! - 1.0.0: Static first/prev/next/last buttons

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use serenity::model::id::UserId;
use uuid::Uuid;

use crate::commands::context::InteractionContext;
use crate::commands::descriptor::{ComponentDescriptor, HandlerDescriptor};
use crate::commands::handler::InteractionHandler;
use crate::core::embeds::EmbedPayload;
use crate::session::{ButtonSpec, ButtonStyle, ComponentSpec, MessagePayload};

/// Routing prefix of every pagination button
pub const PAGE_PREFIX: &str = "page";

const EXPIRED_MESSAGE: &str = "⌛ This menu has expired.";
const NOT_OWNER_MESSAGE: &str = "🔒 Only the person who opened this menu can use it.";

struct PageSession {
    owner: UserId,
    pages: Vec<EmbedPayload>,
    current: usize,
    last_used: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageAction {
    First,
    Prev,
    Next,
    Last,
}

impl PageAction {
    fn parse(action: &str) -> Option<Self> {
        match action {
            "first" => Some(PageAction::First),
            "prev" => Some(PageAction::Prev),
            "next" => Some(PageAction::Next),
            "last" => Some(PageAction::Last),
            _ => None,
        }
    }

    fn apply(self, current: usize, total: usize) -> usize {
        let last = total.saturating_sub(1);
        match self {
            PageAction::First => 0,
            PageAction::Prev => current.saturating_sub(1),
            PageAction::Next => (current + 1).min(last),
            PageAction::Last => last,
        }
    }
}

pub struct Paginator {
    sessions: DashMap<Uuid, PageSession>,
    ttl: Duration,
}

impl Paginator {
    /// Sessions idle for longer than `ttl` stop responding
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Button descriptor to register once at startup
    pub fn descriptor(self: &Arc<Self>) -> HandlerDescriptor {
        let handler: Arc<dyn InteractionHandler> = self.clone();
        HandlerDescriptor::Button(ComponentDescriptor::new(PAGE_PREFIX, handler))
    }

    /// Open a session and render its first page
    ///
    /// A single page is sent without navigation buttons and no session
    /// is kept for it.
    pub fn start(&self, owner: UserId, mut pages: Vec<EmbedPayload>) -> MessagePayload {
        match pages.len() {
            0 => MessagePayload::text("Nothing to show."),
            1 => {
                let mut message = MessagePayload::default();
                message.embed(pages.remove(0));
                message
            }
            total => {
                self.prune();
                let id = Uuid::new_v4();
                let message = render(id, &pages[0], 0, total);
                self.sessions.insert(
                    id,
                    PageSession {
                        owner,
                        pages,
                        current: 0,
                        last_used: Instant::now(),
                    },
                );
                debug!("Started pagination session {id} with {total} pages for {owner}");
                message
            }
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions past their idle timeout
    pub fn prune(&self) {
        let ttl = self.ttl;
        self.sessions.retain(|_, session| session.last_used.elapsed() < ttl);
    }

    fn navigate(&self, id: Uuid, user: UserId, action: PageAction) -> Navigation {
        let Some(mut session) = self.sessions.get_mut(&id) else {
            return Navigation::Expired;
        };
        if session.last_used.elapsed() >= self.ttl {
            drop(session);
            self.sessions.remove(&id);
            return Navigation::Expired;
        }
        if session.owner != user {
            return Navigation::NotOwner;
        }

        let total = session.pages.len();
        session.current = action.apply(session.current, total);
        session.last_used = Instant::now();
        let current = session.current;
        Navigation::Page(render(id, &session.pages[current], current, total))
    }
}

enum Navigation {
    Page(MessagePayload),
    NotOwner,
    Expired,
}

fn render(id: Uuid, page: &EmbedPayload, current: usize, total: usize) -> MessagePayload {
    let at_start = current == 0;
    let at_end = current + 1 >= total;
    let button = |action: &str, label: &str, disabled: bool| {
        ComponentSpec::Button(
            ButtonSpec::new(format!("{PAGE_PREFIX}:{id}:{action}"), label, ButtonStyle::Secondary)
                .disabled(disabled),
        )
    };

    let mut message = MessagePayload::default();
    message.embed(page.clone()).row(vec![
        button("first", "⏮️", at_start),
        button("prev", "⬅️", at_start),
        button("indicator", &format!("{}/{total}", current + 1), true),
        button("next", "➡️", at_end),
        button("last", "⏭️", at_end),
    ]);
    message
}

fn ephemeral(text: &str) -> MessagePayload {
    let mut message = MessagePayload::text(text);
    message.ephemeral(true);
    message
}

#[async_trait]
impl InteractionHandler for Paginator {
    async fn run(&self, ctx: &InteractionContext) -> Result<()> {
        let args = ctx.custom_id_args();
        let session = args.first().and_then(|raw| Uuid::parse_str(raw).ok());
        let action = args.get(1).and_then(|raw| PageAction::parse(raw));

        let (Some(id), Some(action)) = (session, action) else {
            debug!("[{}] Ignoring pagination press '{}'", ctx.request_id(), ctx.key());
            return ctx.defer_update().await;
        };

        match self.navigate(id, ctx.user_id(), action) {
            Navigation::Page(message) => ctx.update(message).await,
            Navigation::NotOwner => ctx.reply(ephemeral(NOT_OWNER_MESSAGE)).await,
            Navigation::Expired => ctx.reply(ephemeral(EXPIRED_MESSAGE)).await,
        }
    }
}
