//! Normalized inbound interaction
//!
//! The dispatcher never looks at serenity interaction types directly. The
//! gateway adapter classifies each raw interaction into one
//! [`InboundInteraction`], which is also what tests construct by hand.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use std::collections::HashMap;
use std::fmt;

use serenity::model::id::{AttachmentId, ChannelId, GuildId, RoleId, UserId};
use serenity::model::permissions::Permissions;

/// The six interaction kinds the dispatcher routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    ChatInputCommand,
    ContextMenuCommand,
    ButtonPress,
    SelectMenuPress,
    ModalSubmit,
    Autocomplete,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::ChatInputCommand => "chat input command",
            InteractionKind::ContextMenuCommand => "context menu command",
            InteractionKind::ButtonPress => "button",
            InteractionKind::SelectMenuPress => "select menu",
            InteractionKind::ModalSubmit => "modal",
            InteractionKind::Autocomplete => "autocomplete",
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(
            self,
            InteractionKind::ChatInputCommand | InteractionKind::ContextMenuCommand
        )
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed value of one supplied command option
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(UserId),
    Channel(ChannelId),
    Role(RoleId),
    Mentionable(u64),
    Attachment(AttachmentId),
    SubCommand(Vec<CommandOption>),
}

/// One option as supplied by the invoking user
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    pub name: String,
    pub value: Option<OptionValue>,
    /// Set on the option currently being typed (autocomplete only)
    pub focused: bool,
}

impl CommandOption {
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            focused: false,
        }
    }

    pub fn subcommand(name: impl Into<String>, options: Vec<CommandOption>) -> Self {
        Self::new(name, OptionValue::SubCommand(options))
    }

    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }
}

/// Platform-independent view of one interaction
#[derive(Debug, Clone)]
pub struct InboundInteraction {
    pub kind: InteractionKind,
    /// Command name, or custom id for components and modals
    pub key: String,
    pub user_id: UserId,
    pub user_name: String,
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub member_permissions: Option<Permissions>,
    pub member_roles: Vec<RoleId>,
    pub options: Vec<CommandOption>,
    pub values: Vec<String>,
    pub fields: HashMap<String, String>,
    pub target_id: Option<u64>,
}

impl InboundInteraction {
    pub fn new(kind: InteractionKind, key: impl Into<String>, user_id: UserId) -> Self {
        Self {
            kind,
            key: key.into(),
            user_id,
            user_name: String::new(),
            guild_id: None,
            channel_id: ChannelId(0),
            member_permissions: None,
            member_roles: Vec::new(),
            options: Vec::new(),
            values: Vec::new(),
            fields: HashMap::new(),
            target_id: None,
        }
    }

    pub fn with_guild(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.member_permissions = Some(permissions);
        self
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }

    pub fn with_field(mut self, custom_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(custom_id.into(), value.into());
        self
    }

    /// Name of the invoked subcommand, if the first option is one
    pub fn subcommand(&self) -> Option<&str> {
        self.options.iter().find_map(|opt| match opt.value {
            Some(OptionValue::SubCommand(_)) => Some(opt.name.as_str()),
            _ => None,
        })
    }
}
