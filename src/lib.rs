//! Interaction dispatch framework for Discord bots built on serenity.
//!
//! Handlers are described once at startup, stored in a keyed registry and
//! routed per inbound interaction through guards by the dispatcher. The
//! gateway adapter is the only place that touches serenity interaction
//! types.

// Core layer - shared types and configuration
pub mod core;

// Interaction model
pub mod interaction;
pub mod session;

// Handlers, guards and events
pub mod commands;
pub mod events;
pub mod guards;

// Routing and platform adapter
pub mod dispatcher;
pub mod gateway;

// Reusable interaction flows
pub mod pagination;

#[cfg(test)]
mod test_utils;

pub use crate::core::Config;
pub use commands::{
    CommandDescriptor, ComponentDescriptor, EventDescriptor, HandlerDescriptor, HandlerRegistry,
    InteractionContext, InteractionHandler, ModalDescriptor, SubcommandDescriptor,
};
pub use dispatcher::{DispatchOptions, Dispatcher};
pub use events::{EventBus, GatewayEvent};
pub use gateway::GatewayHandler;
pub use guards::{Guard, GuardTarget};
pub use pagination::Paginator;
pub use session::{MessagePayload, Reply};
