//! Embed payloads and shared presets
//!
//! Handlers describe embeds as plain data; the gateway adapter converts
//! them into serenity `CreateEmbed`s when a reply goes out.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Platform-neutral `EmbedPayload` replaces direct `CreateEmbed` construction
//! - 1.0.0: Success/error presets

use crate::core::response::truncate_for_embed;

pub const COLOR_SUCCESS: u32 = 0x57F287;
pub const COLOR_ERROR: u32 = 0xED4245;
pub const COLOR_INFO: u32 = 0x5865F2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl EmbedPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Description is truncated to the embed limit
    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(truncate_for_embed(text));
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }
}

pub fn success_embed(text: &str) -> EmbedPayload {
    EmbedPayload::new().color(COLOR_SUCCESS).description(text)
}

pub fn error_embed(text: &str) -> EmbedPayload {
    EmbedPayload::new().color(COLOR_ERROR).description(text)
}

pub fn info_embed(title: &str, text: &str) -> EmbedPayload {
    EmbedPayload::new()
        .title(title)
        .color(COLOR_INFO)
        .description(text)
}
