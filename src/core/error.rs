//! Framework error taxonomy
//!
//! Configuration and registry errors abort startup. Dispatch errors are
//! scoped to one inbound interaction and only ever get logged.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Add `Panicked` dispatch variant
//! - 1.0.0: Initial taxonomy

use thiserror::Error;

use crate::commands::descriptor::{HandlerKind, Namespace};
use crate::guards::GuardTarget;
use crate::interaction::InteractionKind;

/// Invalid or missing startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("development mode requires at least one guild id in DEV_GUILD_IDS")]
    EmptyDevGuilds,
}

/// Rejected handler registration
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate {namespace} key '{key}'")]
    DuplicateKey { namespace: Namespace, key: String },

    #[error("guard '{guard}' on '{key}' has no check for {target} interactions")]
    UnsupportedGuard {
        guard: String,
        key: String,
        target: GuardTarget,
    },

    #[error("invalid descriptor '{key}': {reason}")]
    InvalidDescriptor { key: String, reason: String },
}

/// A guard check or rejection callback failed (as opposed to rejecting)
#[derive(Debug, Error)]
#[error("guard '{guard}' failed: {source:#}")]
pub struct GuardError {
    pub guard: String,
    #[source]
    pub source: anyhow::Error,
}

/// Failure of a single dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no {kind} handler registered for '{key}'")]
    HandlerNotFound { kind: InteractionKind, key: String },

    #[error("command '{command}' has no subcommand {}", .subcommand.as_deref().map(|s| format!("'{s}'")).unwrap_or_else(|| "selected".to_string()))]
    SubcommandNotFound {
        command: String,
        subcommand: Option<String>,
    },

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("{kind} handler '{key}' failed: {source:#}")]
    Handler {
        key: String,
        kind: HandlerKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("handler '{key}' panicked: {message}")]
    Panicked { key: String, message: String },
}

impl DispatchError {
    /// Whether this is a registry miss rather than an execution failure
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            DispatchError::HandlerNotFound { .. } | DispatchError::SubcommandNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_errors_are_classified() {
        let miss = DispatchError::HandlerNotFound {
            kind: InteractionKind::ButtonPress,
            key: "nope".to_string(),
        };
        assert!(miss.is_lookup());

        let failure = DispatchError::Handler {
            key: "ping".to_string(),
            kind: HandlerKind::Command,
            source: anyhow::anyhow!("boom"),
        };
        assert!(!failure.is_lookup());
    }

    #[test]
    fn test_error_messages_name_the_key() {
        let err = RegistryError::DuplicateKey {
            namespace: Namespace::Command,
            key: "profile".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate command key 'profile'");

        let err = DispatchError::SubcommandNotFound {
            command: "profile".to_string(),
            subcommand: Some("delete".to_string()),
        };
        assert_eq!(err.to_string(), "command 'profile' has no subcommand 'delete'");

        let err = DispatchError::SubcommandNotFound {
            command: "profile".to_string(),
            subcommand: None,
        };
        assert_eq!(err.to_string(), "command 'profile' has no subcommand selected");
    }
}
