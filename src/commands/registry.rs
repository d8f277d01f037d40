//! Handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Namespaced descriptors, registration-time validation, event subscriptions
//! - 1.0.0: Initial name → handler map

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use super::descriptor::{
    CommandAction, CommandDescriptor, CommandKind, ComponentDescriptor, EventDescriptor,
    HandlerDescriptor, ModalDescriptor, Namespace,
};
use crate::core::error::RegistryError;
use crate::events::{EventBus, SubscriptionId};
use crate::guards::{Guard, GuardTarget};

/// Separates the routing prefix of a custom id from its arguments
pub const CUSTOM_ID_SEPARATOR: char = ':';

struct RegisteredEvent {
    descriptor: EventDescriptor,
    subscription: SubscriptionId,
}

/// Keyed store of every registered handler descriptor
///
/// Filled sequentially at startup and read-only while dispatching.
///
/// # Example
///
/// ```ignore
/// let mut registry = HandlerRegistry::new(EventBus::new());
/// registry.register(CommandDescriptor::slash("ping", "Pong!", Arc::new(Ping)))?;
/// registry.register(HandlerDescriptor::Button(ComponentDescriptor::new("confirm", Arc::new(Confirm))))?;
///
/// assert!(registry.command("ping").is_some());
/// ```
pub struct HandlerRegistry {
    commands: HashMap<String, CommandDescriptor>,
    buttons: HashMap<String, ComponentDescriptor>,
    select_menus: HashMap<String, ComponentDescriptor>,
    modals: HashMap<String, ModalDescriptor>,
    events: HashMap<String, RegisteredEvent>,
    bus: EventBus,
}

impl HandlerRegistry {
    pub fn new(bus: EventBus) -> Self {
        Self {
            commands: HashMap::new(),
            buttons: HashMap::new(),
            select_menus: HashMap::new(),
            modals: HashMap::new(),
            events: HashMap::new(),
            bus,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Validate and store a descriptor
    ///
    /// Fails without modifying the registry if the key is taken in its
    /// namespace or the descriptor is malformed. Event descriptors are
    /// subscribed on the bus immediately.
    pub fn register(&mut self, descriptor: impl Into<HandlerDescriptor>) -> Result<(), RegistryError> {
        let descriptor = descriptor.into();
        let namespace = descriptor.namespace();
        let key = descriptor.key().to_string();

        if self.contains(namespace, &key) {
            return Err(RegistryError::DuplicateKey { namespace, key });
        }

        match descriptor {
            HandlerDescriptor::Command(cmd) => {
                validate_command(&cmd)?;
                self.commands.insert(key.clone(), cmd);
            }
            HandlerDescriptor::Button(component) => {
                validate_guards(&component.guards, &key, GuardTarget::Button)?;
                self.buttons.insert(key.clone(), component);
            }
            HandlerDescriptor::SelectMenu(component) => {
                validate_guards(&component.guards, &key, GuardTarget::SelectMenu)?;
                self.select_menus.insert(key.clone(), component);
            }
            HandlerDescriptor::Modal(modal) => {
                self.modals.insert(key.clone(), modal);
            }
            HandlerDescriptor::Event(event) => {
                let listener = Arc::clone(&event.listener);
                let subscription = if event.once {
                    self.bus.once(&event.event, &event.key, listener)
                } else {
                    self.bus.on(&event.event, &event.key, listener)
                };
                self.events.insert(
                    key.clone(),
                    RegisteredEvent {
                        descriptor: event,
                        subscription,
                    },
                );
            }
        }

        debug!("Registered {namespace} '{key}'");
        Ok(())
    }

    /// Register a batch, stopping at the first invalid descriptor
    pub fn register_all<I>(&mut self, descriptors: I) -> Result<(), RegistryError>
    where
        I: IntoIterator,
        I::Item: Into<HandlerDescriptor>,
    {
        for descriptor in descriptors {
            self.register(descriptor)?;
        }
        Ok(())
    }

    /// Detach a descriptor; event listeners are unsubscribed
    pub fn remove(&mut self, namespace: Namespace, key: &str) -> bool {
        match namespace {
            Namespace::Command => self.commands.remove(key).is_some(),
            Namespace::Button => self.buttons.remove(key).is_some(),
            Namespace::SelectMenu => self.select_menus.remove(key).is_some(),
            Namespace::Modal => self.modals.remove(key).is_some(),
            Namespace::Event => self
                .events
                .remove(key)
                .is_some_and(|registered| self.bus.off(registered.subscription)),
            Namespace::Subcommand => false,
        }
    }

    pub fn contains(&self, namespace: Namespace, key: &str) -> bool {
        match namespace {
            Namespace::Command => self.commands.contains_key(key),
            Namespace::Button => self.buttons.contains_key(key),
            Namespace::SelectMenu => self.select_menus.contains_key(key),
            Namespace::Modal => self.modals.contains_key(key),
            Namespace::Event => self.event(key).is_some(),
            Namespace::Subcommand => false,
        }
    }

    pub fn command(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    /// Exact custom id first, then the part before the first `:`
    pub fn button(&self, custom_id: &str) -> Option<&ComponentDescriptor> {
        lookup_custom_id(&self.buttons, custom_id)
    }

    pub fn select_menu(&self, custom_id: &str) -> Option<&ComponentDescriptor> {
        lookup_custom_id(&self.select_menus, custom_id)
    }

    pub fn modal(&self, custom_id: &str) -> Option<&ModalDescriptor> {
        lookup_custom_id(&self.modals, custom_id)
    }

    /// Live event descriptor; spent one-shot listeners are not reported
    pub fn event(&self, key: &str) -> Option<&EventDescriptor> {
        self.events
            .get(key)
            .filter(|registered| self.bus.is_active(registered.subscription))
            .map(|registered| &registered.descriptor)
    }

    fn live_events(&self) -> usize {
        self.events
            .values()
            .filter(|registered| self.bus.is_active(registered.subscription))
            .count()
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
            + self.buttons.len()
            + self.select_menus.len()
            + self.modals.len()
            + self.live_events()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len_of(&self, namespace: Namespace) -> usize {
        match namespace {
            Namespace::Command => self.commands.len(),
            Namespace::Button => self.buttons.len(),
            Namespace::SelectMenu => self.select_menus.len(),
            Namespace::Modal => self.modals.len(),
            Namespace::Event => self.live_events(),
            Namespace::Subcommand => self
                .commands
                .values()
                .filter_map(|cmd| cmd.subcommands())
                .map(<[_]>::len)
                .sum(),
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new(EventBus::new())
    }
}

fn lookup_custom_id<'a, T>(map: &'a HashMap<String, T>, custom_id: &str) -> Option<&'a T> {
    map.get(custom_id).or_else(|| {
        let (prefix, _) = custom_id.split_once(CUSTOM_ID_SEPARATOR)?;
        map.get(prefix)
    })
}

fn validate_guards(guards: &[Arc<dyn Guard>], key: &str, target: GuardTarget) -> Result<(), RegistryError> {
    match guards.iter().find(|guard| !guard.targets().contains(&target)) {
        Some(guard) => Err(RegistryError::UnsupportedGuard {
            guard: guard.name().to_string(),
            key: key.to_string(),
            target,
        }),
        None => Ok(()),
    }
}

fn validate_command(cmd: &CommandDescriptor) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidDescriptor {
        key: cmd.name.clone(),
        reason: reason.to_string(),
    };

    if cmd.name.is_empty() {
        return Err(invalid("command name is empty"));
    }
    validate_guards(&cmd.guards, &cmd.name, cmd.kind.guard_target())?;

    if cmd.kind != CommandKind::ChatInput {
        if !cmd.options.is_empty() {
            return Err(invalid("context menu commands take no options"));
        }
        if cmd.subcommands().is_some() {
            return Err(invalid("context menu commands take no subcommands"));
        }
        if cmd.autocomplete.is_some() {
            return Err(invalid("context menu commands cannot autocomplete"));
        }
    }

    if let CommandAction::Subcommands(subs) = &cmd.action {
        if subs.is_empty() {
            return Err(invalid("subcommand list is empty"));
        }
        if !cmd.options.is_empty() {
            return Err(invalid("options belong on the subcommands"));
        }
        if !cmd.guards.is_empty() {
            warn!(
                "Command '{}' has subcommands; its {} guard(s) will not be evaluated",
                cmd.name,
                cmd.guards.len()
            );
        }
        for (i, sub) in subs.iter().enumerate() {
            if subs[..i].iter().any(|earlier| earlier.name == sub.name) {
                return Err(RegistryError::DuplicateKey {
                    namespace: Namespace::Subcommand,
                    key: format!("{} {}", cmd.name, sub.name),
                });
            }
        }
    }
    Ok(())
}
