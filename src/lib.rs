// Ductile - a structural-typing event bus for Rust
//
// This library ties the lifetime-aware resolver to the event bus: handlers
// are registered in the container, callers resolve a broadcast proxy per
// event interface, and calls fan out to every handler whose methods line up.

// Re-export core functionality
pub use ductile_core::*;

// Re-export the event bus
pub use ductile_events::*;

pub mod prelude {
    pub use crate::{
        AsEventHandler,
        AsShapedEventHandler,
        Container,
        ContainerBuilder,
        Error,
        EventError,
        EventHandler,
        EventInterface,
        EventsConfig,
        EventsModule,
        HandlerError,
        HandlerShape,
        Lifetime,
        Module,
        Provider,
        ResolveEventsExt,
        Scope,
        TypeRef,
        event_interface,
    };
}
