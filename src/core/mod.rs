//! # Core Module
//!
//! Configuration, error taxonomy and outbound content helpers shared by
//! every other layer.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Add error taxonomy and platform-neutral embeds
//! - 1.0.0: Initial creation with config and response modules

pub mod config;
pub mod embeds;
pub mod error;
pub mod response;

pub use config::{Config, RunMode};
pub use embeds::{error_embed, info_embed, success_embed, EmbedPayload};
pub use error::{ConfigError, DispatchError, GuardError, RegistryError};
pub use response::{
    chunk_for_message, chunk_text, truncate_for_embed, truncate_for_message, EMBED_LIMIT,
    MESSAGE_LIMIT,
};
