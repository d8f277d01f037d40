//! Outbound side of an interaction
//!
//! [`InteractionSession`] is the seam between the framework and the
//! platform SDK: the gateway adapter implements it over serenity, tests
//! implement it with a recorder. Payload types here are plain data so
//! handlers never have to touch serenity builders.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Select menus in component rows, modal payloads
//! - 1.0.0: Initial session trait with reply/edit/follow-up/defer

use anyhow::Result;
use async_trait::async_trait;

use crate::core::embeds::EmbedPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonSpec {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl ButtonSpec {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOptionSpec {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectMenuSpec {
    pub custom_id: String,
    pub placeholder: Option<String>,
    pub options: Vec<SelectOptionSpec>,
    pub min_values: u64,
    pub max_values: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentSpec {
    Button(ButtonSpec),
    SelectMenu(SelectMenuSpec),
}

/// One action row of components
pub type ComponentRow = Vec<ComponentSpec>;

/// A message as handlers describe it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePayload {
    pub content: Option<String>,
    pub embeds: Vec<EmbedPayload>,
    /// `None` leaves existing components untouched on edits
    pub components: Option<Vec<ComponentRow>>,
    /// `None` falls back to the handler's ephemeral default
    pub ephemeral: Option<bool>,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn content(&mut self, content: impl Into<String>) -> &mut Self {
        self.content = Some(content.into());
        self
    }

    pub fn embed(&mut self, embed: EmbedPayload) -> &mut Self {
        self.embeds.push(embed);
        self
    }

    pub fn row(&mut self, row: ComponentRow) -> &mut Self {
        self.components.get_or_insert_with(Vec::new).push(row);
        self
    }

    /// Remove all components from the message when applied
    pub fn clear_components(&mut self) -> &mut Self {
        self.components = Some(Vec::new());
        self
    }

    pub fn ephemeral(&mut self, ephemeral: bool) -> &mut Self {
        self.ephemeral = Some(ephemeral);
        self
    }
}

type PayloadBuilder = Box<dyn FnOnce(&mut MessagePayload) -> &mut MessagePayload + Send>;

/// The three accepted reply shapes, normalized by [`Reply::into_payload`]
pub enum Reply {
    Text(String),
    Message(MessagePayload),
    Build(PayloadBuilder),
}

impl Reply {
    /// Defer construction to a builder closure, serenity style
    ///
    /// ```ignore
    /// ctx.reply(Reply::build(|m| m.content("hi").ephemeral(true))).await?;
    /// ```
    pub fn build<F>(f: F) -> Self
    where
        F: FnOnce(&mut MessagePayload) -> &mut MessagePayload + Send + 'static,
    {
        Reply::Build(Box::new(f))
    }

    pub fn into_payload(self) -> MessagePayload {
        match self {
            Reply::Text(content) => MessagePayload::text(content),
            Reply::Message(payload) => payload,
            Reply::Build(build) => {
                let mut payload = MessagePayload::default();
                build(&mut payload);
                payload
            }
        }
    }
}

impl From<&str> for Reply {
    fn from(value: &str) -> Self {
        Reply::Text(value.to_string())
    }
}

impl From<String> for Reply {
    fn from(value: String) -> Self {
        Reply::Text(value)
    }
}

impl From<MessagePayload> for Reply {
    fn from(value: MessagePayload) -> Self {
        Reply::Message(value)
    }
}

impl From<EmbedPayload> for Reply {
    fn from(value: EmbedPayload) -> Self {
        let mut payload = MessagePayload::default();
        payload.embed(value);
        Reply::Message(payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStyle {
    Short,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextInputSpec {
    pub custom_id: String,
    pub label: String,
    pub style: InputStyle,
    pub required: bool,
    pub placeholder: Option<String>,
}

/// A modal form to present in response to a command or component
#[derive(Debug, Clone, PartialEq)]
pub struct ModalPayload {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInputSpec>,
}

impl ModalPayload {
    pub fn new(custom_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.into(),
            title: title.into(),
            inputs: Vec::new(),
        }
    }

    pub fn input(
        mut self,
        custom_id: impl Into<String>,
        label: impl Into<String>,
        style: InputStyle,
        required: bool,
    ) -> Self {
        self.inputs.push(TextInputSpec {
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            required,
            placeholder: None,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceValue {
    String(String),
    Integer(i64),
    Number(f64),
}

/// One autocomplete suggestion
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub name: String,
    pub value: ChoiceValue,
}

impl Choice {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ChoiceValue::String(value.into()),
        }
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value: ChoiceValue::Integer(value),
        }
    }
}

/// Live handle on one interaction's response lifecycle
///
/// Implementations own the "already replied" and "deferred" flags; the
/// framework only reads them to decide between replying and editing.
#[async_trait]
pub trait InteractionSession: Send + Sync {
    fn is_replied(&self) -> bool;

    fn is_deferred(&self) -> bool;

    /// Initial response with a new message
    async fn reply(&self, message: MessagePayload) -> Result<()>;

    /// Edit the original response (after a reply or defer)
    async fn edit_reply(&self, message: MessagePayload) -> Result<()>;

    async fn follow_up(&self, message: MessagePayload) -> Result<()>;

    /// Acknowledge now, respond later via [`InteractionSession::edit_reply`]
    async fn defer(&self, ephemeral: bool) -> Result<()>;

    /// Initial response that edits the message a component is attached to
    async fn update(&self, message: MessagePayload) -> Result<()>;

    async fn defer_update(&self) -> Result<()>;

    async fn show_modal(&self, modal: ModalPayload) -> Result<()>;

    async fn autocomplete(&self, choices: Vec<Choice>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_reply_normalizes_to_content() {
        let payload = Reply::from("pong").into_payload();
        assert_eq!(payload.content.as_deref(), Some("pong"));
        assert!(payload.embeds.is_empty());
        assert_eq!(payload.ephemeral, None);
    }

    #[test]
    fn test_builder_reply_runs_closure() {
        let payload = Reply::build(|m| m.content("built").ephemeral(true)).into_payload();
        assert_eq!(payload.content.as_deref(), Some("built"));
        assert_eq!(payload.ephemeral, Some(true));
    }

    #[test]
    fn test_payload_reply_passes_through() {
        let mut message = MessagePayload::text("as is");
        message.row(vec![ComponentSpec::Button(ButtonSpec::new(
            "confirm",
            "Confirm",
            ButtonStyle::Success,
        ))]);
        let payload = Reply::from(message.clone()).into_payload();
        assert_eq!(payload, message);
    }

    #[test]
    fn test_embed_reply_wraps_embed() {
        let payload = Reply::from(EmbedPayload::new().title("Hi")).into_payload();
        assert_eq!(payload.content, None);
        assert_eq!(payload.embeds.len(), 1);
    }
}
