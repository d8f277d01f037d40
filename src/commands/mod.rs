//! # Command System
//!
//! Handler descriptors, the keyed registry, per-dispatch context and
//! command registration with Discord.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Descriptor-based registry covering commands, components, modals and events
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 2.0.0: Slash-only command system

pub mod arguments;
pub mod context;
pub mod descriptor;
pub mod handler;
pub mod registry;
pub mod sync;

pub use arguments::ArgumentResolver;
pub use context::InteractionContext;
pub use descriptor::{
    CommandAction, CommandDescriptor, CommandKind, ComponentDescriptor, EventDescriptor,
    HandlerDescriptor, HandlerKind, ModalDescriptor, Namespace, OptionKind, OptionSpec,
    SubcommandDescriptor,
};
pub use handler::{AutocompleteHandler, InteractionHandler};
pub use registry::{HandlerRegistry, CUSTOM_ID_SEPARATOR};
pub use sync::{build_application_commands, register_commands};
