//! Handler descriptors
//!
//! A descriptor is everything the registry needs to know about one
//! reactable unit. Descriptors are built once at startup and never change
//! after registration.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Autocomplete handlers on commands and subcommands
//! - 1.0.0: Initial descriptors

use std::fmt;
use std::sync::Arc;

use super::handler::{AutocompleteHandler, InteractionHandler};
use crate::events::EventListener;
use crate::guards::{Guard, GuardTarget};
use crate::session::ChoiceValue;

/// Registry namespaces; keys are unique within one namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Command,
    Subcommand,
    Button,
    SelectMenu,
    Modal,
    Event,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Namespace::Command => "command",
            Namespace::Subcommand => "subcommand",
            Namespace::Button => "button",
            Namespace::SelectMenu => "select menu",
            Namespace::Modal => "modal",
            Namespace::Event => "event",
        };
        f.write_str(name)
    }
}

/// What kind of unit a handler is, for logs and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Command,
    Subcommand,
    Button,
    SelectMenu,
    Modal,
    Event,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlerKind::Command => "command",
            HandlerKind::Subcommand => "subcommand",
            HandlerKind::Button => "button",
            HandlerKind::SelectMenu => "select menu",
            HandlerKind::Modal => "modal",
            HandlerKind::Event => "event",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ChatInput,
    /// Context menu on a user
    User,
    /// Context menu on a message
    Message,
}

impl CommandKind {
    pub fn guard_target(&self) -> GuardTarget {
        match self {
            CommandKind::ChatInput => GuardTarget::Slash,
            CommandKind::User | CommandKind::Message => GuardTarget::ContextMenu,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Number,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Attachment,
}

/// Declared option of a command, used when registering with Discord
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
    pub autocomplete: bool,
    pub choices: Vec<(String, ChoiceValue)>,
}

impl OptionSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            autocomplete: false,
            choices: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn autocomplete(mut self) -> Self {
        self.autocomplete = true;
        self
    }

    pub fn choice(mut self, name: impl Into<String>, value: ChoiceValue) -> Self {
        self.choices.push((name.into(), value));
        self
    }
}

pub struct SubcommandDescriptor {
    pub name: String,
    pub description: String,
    pub options: Vec<OptionSpec>,
    pub ephemeral: bool,
    pub handler: Arc<dyn InteractionHandler>,
    pub autocomplete: Option<Arc<dyn AutocompleteHandler>>,
}

impl SubcommandDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn InteractionHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            ephemeral: false,
            handler,
            autocomplete: None,
        }
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn autocomplete(mut self, handler: Arc<dyn AutocompleteHandler>) -> Self {
        self.autocomplete = Some(handler);
        self
    }
}

/// Either a primary callback or a subcommand map, never both
pub enum CommandAction {
    Run(Arc<dyn InteractionHandler>),
    Subcommands(Vec<SubcommandDescriptor>),
}

pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub kind: CommandKind,
    pub options: Vec<OptionSpec>,
    /// Not evaluated for commands with subcommands
    pub guards: Vec<Arc<dyn Guard>>,
    pub ephemeral: bool,
    pub denied_message: Option<String>,
    pub action: CommandAction,
    pub autocomplete: Option<Arc<dyn AutocompleteHandler>>,
}

impl CommandDescriptor {
    fn with_action(name: String, description: String, kind: CommandKind, action: CommandAction) -> Self {
        Self {
            name,
            description,
            kind,
            options: Vec::new(),
            guards: Vec::new(),
            ephemeral: false,
            denied_message: None,
            action,
            autocomplete: None,
        }
    }

    /// Slash command with a primary callback
    pub fn slash(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn InteractionHandler>,
    ) -> Self {
        Self::with_action(
            name.into(),
            description.into(),
            CommandKind::ChatInput,
            CommandAction::Run(handler),
        )
    }

    /// Slash command routed to subcommands
    pub fn group(
        name: impl Into<String>,
        description: impl Into<String>,
        subcommands: Vec<SubcommandDescriptor>,
    ) -> Self {
        Self::with_action(
            name.into(),
            description.into(),
            CommandKind::ChatInput,
            CommandAction::Subcommands(subcommands),
        )
    }

    /// User or message context menu command
    pub fn context_menu(
        name: impl Into<String>,
        kind: CommandKind,
        handler: Arc<dyn InteractionHandler>,
    ) -> Self {
        Self::with_action(name.into(), String::new(), kind, CommandAction::Run(handler))
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn denied_message(mut self, message: impl Into<String>) -> Self {
        self.denied_message = Some(message.into());
        self
    }

    pub fn autocomplete(mut self, handler: Arc<dyn AutocompleteHandler>) -> Self {
        self.autocomplete = Some(handler);
        self
    }

    pub fn subcommands(&self) -> Option<&[SubcommandDescriptor]> {
        match &self.action {
            CommandAction::Subcommands(subs) => Some(subs),
            CommandAction::Run(_) => None,
        }
    }

    pub fn subcommand(&self, name: &str) -> Option<&SubcommandDescriptor> {
        self.subcommands()?.iter().find(|sub| sub.name == name)
    }
}

/// Button or select menu handler, keyed by custom id (or its prefix)
pub struct ComponentDescriptor {
    pub custom_id: String,
    pub guards: Vec<Arc<dyn Guard>>,
    pub ephemeral: bool,
    pub denied_message: Option<String>,
    pub handler: Arc<dyn InteractionHandler>,
}

impl ComponentDescriptor {
    pub fn new(custom_id: impl Into<String>, handler: Arc<dyn InteractionHandler>) -> Self {
        Self {
            custom_id: custom_id.into(),
            guards: Vec::new(),
            ephemeral: false,
            denied_message: None,
            handler,
        }
    }

    pub fn guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn denied_message(mut self, message: impl Into<String>) -> Self {
        self.denied_message = Some(message.into());
        self
    }
}

/// Modal submit handler; modals carry no guards
pub struct ModalDescriptor {
    pub custom_id: String,
    pub ephemeral: bool,
    pub handler: Arc<dyn InteractionHandler>,
}

impl ModalDescriptor {
    pub fn new(custom_id: impl Into<String>, handler: Arc<dyn InteractionHandler>) -> Self {
        Self {
            custom_id: custom_id.into(),
            ephemeral: false,
            handler,
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

pub struct EventDescriptor {
    /// Unique listener name
    pub key: String,
    /// Gateway or custom event name
    pub event: String,
    pub once: bool,
    pub listener: Arc<dyn EventListener>,
}

impl EventDescriptor {
    pub fn on(key: impl Into<String>, event: impl Into<String>, listener: Arc<dyn EventListener>) -> Self {
        Self {
            key: key.into(),
            event: event.into(),
            once: false,
            listener,
        }
    }

    pub fn once(key: impl Into<String>, event: impl Into<String>, listener: Arc<dyn EventListener>) -> Self {
        Self {
            once: true,
            ..Self::on(key, event, listener)
        }
    }
}

/// Tagged union of everything the registry accepts
pub enum HandlerDescriptor {
    Command(CommandDescriptor),
    Button(ComponentDescriptor),
    SelectMenu(ComponentDescriptor),
    Modal(ModalDescriptor),
    Event(EventDescriptor),
}

impl HandlerDescriptor {
    pub fn namespace(&self) -> Namespace {
        match self {
            HandlerDescriptor::Command(_) => Namespace::Command,
            HandlerDescriptor::Button(_) => Namespace::Button,
            HandlerDescriptor::SelectMenu(_) => Namespace::SelectMenu,
            HandlerDescriptor::Modal(_) => Namespace::Modal,
            HandlerDescriptor::Event(_) => Namespace::Event,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            HandlerDescriptor::Command(cmd) => &cmd.name,
            HandlerDescriptor::Button(c) | HandlerDescriptor::SelectMenu(c) => &c.custom_id,
            HandlerDescriptor::Modal(m) => &m.custom_id,
            HandlerDescriptor::Event(e) => &e.key,
        }
    }
}

impl From<CommandDescriptor> for HandlerDescriptor {
    fn from(value: CommandDescriptor) -> Self {
        HandlerDescriptor::Command(value)
    }
}

impl From<ModalDescriptor> for HandlerDescriptor {
    fn from(value: ModalDescriptor) -> Self {
        HandlerDescriptor::Modal(value)
    }
}

impl From<EventDescriptor> for HandlerDescriptor {
    fn from(value: EventDescriptor) -> Self {
        HandlerDescriptor::Event(value)
    }
}
