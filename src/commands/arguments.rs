//! Typed access to command options
//!
//! Every accessor returns `None` for an option that was not supplied (or
//! was supplied with a different type); nothing here fails.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: `ArgumentResolver` with subcommand hoisting, replaces free `get_*_option` helpers

use serenity::model::id::{AttachmentId, ChannelId, RoleId, UserId};

use crate::interaction::{CommandOption, OptionValue};

#[derive(Debug, Clone, Default)]
pub struct ArgumentResolver {
    subcommand: Option<String>,
    options: Vec<CommandOption>,
}

impl ArgumentResolver {
    /// Options of an invoked subcommand are hoisted to the top level
    pub fn new(options: &[CommandOption]) -> Self {
        for opt in options {
            if let Some(OptionValue::SubCommand(inner)) = &opt.value {
                return Self {
                    subcommand: Some(opt.name.clone()),
                    options: inner.clone(),
                };
            }
        }
        Self {
            subcommand: None,
            options: options.to_vec(),
        }
    }

    pub fn subcommand(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }

    fn value(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|opt| opt.name == name)
            .and_then(|opt| opt.value.as_ref())
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.value(name)? {
            OptionValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.value(name)? {
            OptionValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numbers also accept integer values
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.value(name)? {
            OptionValue::Number(n) => Some(*n),
            OptionValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.value(name)? {
            OptionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn user(&self, name: &str) -> Option<UserId> {
        match self.value(name)? {
            OptionValue::User(id) => Some(*id),
            _ => None,
        }
    }

    pub fn channel(&self, name: &str) -> Option<ChannelId> {
        match self.value(name)? {
            OptionValue::Channel(id) => Some(*id),
            _ => None,
        }
    }

    pub fn role(&self, name: &str) -> Option<RoleId> {
        match self.value(name)? {
            OptionValue::Role(id) => Some(*id),
            _ => None,
        }
    }

    /// User or role id picked through a mentionable option
    pub fn mentionable(&self, name: &str) -> Option<u64> {
        match self.value(name)? {
            OptionValue::Mentionable(id) => Some(*id),
            OptionValue::User(id) => Some(id.0),
            OptionValue::Role(id) => Some(id.0),
            _ => None,
        }
    }

    pub fn attachment(&self, name: &str) -> Option<AttachmentId> {
        match self.value(name)? {
            OptionValue::Attachment(id) => Some(*id),
            _ => None,
        }
    }

    /// The option the user is currently typing (autocomplete)
    pub fn focused(&self) -> Option<&CommandOption> {
        self.options.iter().find(|opt| opt.focused)
    }

    /// Raw text of the focused option, empty when nothing is typed yet
    pub fn focused_text(&self) -> Option<String> {
        let opt = self.focused()?;
        Some(match &opt.value {
            Some(OptionValue::String(s)) => s.clone(),
            Some(OptionValue::Integer(i)) => i.to_string(),
            Some(OptionValue::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }
}
