//! Test doubles shared by the unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::commands::context::InteractionContext;
use crate::commands::handler::InteractionHandler;
use crate::events::{EventListener, GatewayEvent};
use crate::guards::{Guard, GuardTarget};
use crate::interaction::InboundInteraction;
use crate::session::{Choice, InteractionSession, MessagePayload, ModalPayload};

/// One call made on a [`RecordingSession`]
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Reply(MessagePayload),
    EditReply(MessagePayload),
    FollowUp(MessagePayload),
    Defer { ephemeral: bool },
    Update(MessagePayload),
    DeferUpdate,
    ShowModal(ModalPayload),
    Autocomplete(Vec<Choice>),
}

/// Session that records every response instead of sending it
#[derive(Default)]
pub struct RecordingSession {
    replied: AtomicBool,
    deferred: AtomicBool,
    calls: Mutex<Vec<Recorded>>,
}

impl RecordingSession {
    fn record(&self, call: Recorded) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    /// Content of replies and reply edits, in order
    pub fn reply_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Recorded::Reply(m) | Recorded::EditReply(m) => m.content,
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl InteractionSession for RecordingSession {
    fn is_replied(&self) -> bool {
        self.replied.load(Ordering::SeqCst)
    }

    fn is_deferred(&self) -> bool {
        self.deferred.load(Ordering::SeqCst)
    }

    async fn reply(&self, message: MessagePayload) -> Result<()> {
        self.replied.store(true, Ordering::SeqCst);
        self.record(Recorded::Reply(message));
        Ok(())
    }

    async fn edit_reply(&self, message: MessagePayload) -> Result<()> {
        self.record(Recorded::EditReply(message));
        Ok(())
    }

    async fn follow_up(&self, message: MessagePayload) -> Result<()> {
        self.record(Recorded::FollowUp(message));
        Ok(())
    }

    async fn defer(&self, ephemeral: bool) -> Result<()> {
        self.deferred.store(true, Ordering::SeqCst);
        self.record(Recorded::Defer { ephemeral });
        Ok(())
    }

    async fn update(&self, message: MessagePayload) -> Result<()> {
        self.replied.store(true, Ordering::SeqCst);
        self.record(Recorded::Update(message));
        Ok(())
    }

    async fn defer_update(&self) -> Result<()> {
        self.deferred.store(true, Ordering::SeqCst);
        self.record(Recorded::DeferUpdate);
        Ok(())
    }

    async fn show_modal(&self, modal: ModalPayload) -> Result<()> {
        self.replied.store(true, Ordering::SeqCst);
        self.record(Recorded::ShowModal(modal));
        Ok(())
    }

    async fn autocomplete(&self, choices: Vec<Choice>) -> Result<()> {
        self.replied.store(true, Ordering::SeqCst);
        self.record(Recorded::Autocomplete(choices));
        Ok(())
    }
}

pub fn context_for(interaction: InboundInteraction, session: Arc<RecordingSession>) -> InteractionContext {
    InteractionContext::new(interaction, session, None)
}

#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub enum HandlerMode {
    #[default]
    Ok,
    Fail,
    Panic,
}

/// Handler that counts runs and optionally fails or panics
#[derive(Default)]
pub struct CountingHandler {
    pub calls: AtomicUsize,
    pub mode: HandlerMode,
    pub reply: Option<String>,
}

impl CountingHandler {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: HandlerMode::Fail,
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            mode: HandlerMode::Panic,
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InteractionHandler for CountingHandler {
    async fn run(&self, ctx: &InteractionContext) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            HandlerMode::Ok => {}
            HandlerMode::Fail => bail!("handler failure"),
            HandlerMode::Panic => panic!("handler panic"),
        }
        if let Some(text) = &self.reply {
            ctx.reply(text.as_str()).await?;
        }
        Ok(())
    }
}

/// Guard with a fixed verdict that counts its checks
pub struct CountingGuard {
    name: String,
    verdict: bool,
    fail: bool,
    custom_reject: bool,
    pub calls: AtomicUsize,
    pub rejections: AtomicUsize,
}

impl CountingGuard {
    pub fn new(name: &str, verdict: bool) -> Self {
        Self {
            name: name.to_string(),
            verdict,
            fail: false,
            custom_reject: false,
            calls: AtomicUsize::new(0),
            rejections: AtomicUsize::new(0),
        }
    }

    pub fn with_custom_reject(mut self) -> Self {
        self.custom_reject = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Guard for CountingGuard {
    fn name(&self) -> &str {
        &self.name
    }

    fn targets(&self) -> &[GuardTarget] {
        GuardTarget::ALL
    }

    async fn check(&self, _ctx: &InteractionContext) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("guard lookup failed");
        }
        Ok(self.verdict)
    }

    async fn on_reject(&self, ctx: &InteractionContext) -> Result<bool> {
        if !self.custom_reject {
            return Ok(false);
        }
        self.rejections.fetch_add(1, Ordering::SeqCst);
        ctx.reply("custom rejection").await?;
        Ok(true)
    }
}

#[derive(Default)]
pub struct CountingListener {
    pub calls: AtomicUsize,
}

#[async_trait]
impl EventListener for CountingListener {
    async fn handle(&self, _event: &GatewayEvent) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
