//! Structural-typing event bus for Ductile
//!
//! Callers declare an event interface, handlers describe their methods, and
//! a broadcast proxy fans every call out to each registered handler whose
//! methods line up with the interface by name and signature. Handlers never
//! need to name the interface they serve, so independently written modules
//! can take part in the same event.
//!
//! ## Features
//!
//! - **Structural matching** - name, parameter and return shapes, no shared trait
//! - **Generic interfaces** - handlers matched per type argument
//! - **Lifetimes** - singleton, scoped and transient handlers via `ductile-core`
//! - **Deterministic** - registration order, fail-fast errors, last-write returns
//!
//! ## Quick Start
//!
//! ```rust
//! use ductile_core::{Container, Provider};
//! use ductile_events::*;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! // Caller side
//! event_interface! {
//!     pub interface OrderEvents {
//!         fn order_processed(order_id: i32);
//!     }
//! }
//!
//! // Handler side, with no reference to `OrderEvents`
//! #[derive(Default)]
//! struct Invoicing {
//!     invoiced: AtomicUsize,
//! }
//! impl Provider for Invoicing {}
//!
//! impl EventHandler for Invoicing {
//!     fn shape() -> HandlerShape {
//!         HandlerShape::builder::<Self>()
//!             .method("order_processed", |h: &Self, (_id,): (i32,)| {
//!                 h.invoiced.fetch_add(1, Ordering::SeqCst);
//!                 Ok(())
//!             })
//!             .build()
//!     }
//! }
//!
//! let mut builder = Container::builder();
//! builder.register(|_| Ok(Invoicing::default())).singleton().as_self().as_event_handler();
//! builder.register_module(EventsModule::new().interface::<OrderEvents>());
//! let container = builder.build();
//!
//! container.resolve::<OrderEvents>()?.order_processed(10)?;
//! assert_eq!(container.resolve::<Invoicing>()?.invoiced.load(Ordering::SeqCst), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use ductile_events::{EventsConfig, EventsModule};
//!
//! let config = EventsConfig::builder()
//!     .cache_matches(true)   // Cache matches per contract
//!     .warn_on_empty(true)   // Warn when nobody listens
//!     .build();
//! let module = EventsModule::with_config(config);
//! ```

mod error;
mod macros;

pub mod broadcast;
pub mod config;
pub mod contract;
pub mod generic;
pub mod handler;
pub mod interface;
pub mod matcher;
pub mod module;
pub mod runtime;
pub mod shape;

pub use broadcast::Broadcaster;
pub use config::{EventsConfig, EventsConfigBuilder};
pub use contract::{Contract, ContractKey};
pub use error::{ConfigError, EventError, HandlerError};
pub use handler::{
    Args, AsEventHandler, AsShapedEventHandler, EventHandler, EventHandlerCapability,
    FamilyBinding, HandlerShape, HandlerShapeBuilder, Invoker, Params, Value,
};
pub use interface::{EventInterface, ResolveEventsExt, create_proxy};
pub use matcher::{MatchDescriptor, MethodMatch};
pub use module::EventsModule;
pub use runtime::{EventsRuntime, HandlerMatch};
pub use shape::{MethodShape, TypeRef};

#[doc(hidden)]
pub mod __private {
    pub use ductile_core::Provider;
}
