// Event interfaces and proxy resolution

use crate::broadcast::Broadcaster;
use crate::contract::Contract;
use crate::runtime::EventsRuntime;
use crate::EventError;
use ductile_core::{Container, Provider, Scope};
use std::sync::Arc;
use tracing::trace;

/// A typed event interface backed by a [`Broadcaster`].
///
/// Implementations are normally generated with
/// [`event_interface!`](crate::event_interface).
pub trait EventInterface: Provider + Sized {
    /// Shape of the interface, with type arguments for generic interfaces
    fn contract() -> Contract;

    fn from_broadcaster(broadcaster: Broadcaster) -> Self;

    fn broadcaster(&self) -> &Broadcaster;
}

/// Build a proxy for `I` bound to `scope`
pub fn create_proxy<I: EventInterface>(scope: &Scope, runtime: Arc<EventsRuntime>) -> Result<I, EventError> {
    let broadcaster = Broadcaster::new(I::contract(), scope.clone(), runtime)?;
    Ok(I::from_broadcaster(broadcaster))
}

/// Resolve event interface proxies without declaring them up front.
pub trait ResolveEventsExt {
    fn resolve_events<I: EventInterface>(&self) -> Result<Arc<I>, EventError>;
}

impl ResolveEventsExt for Scope {
    /// Uses the container's [`EventsRuntime`] when one is registered and a
    /// default runtime otherwise.
    ///
    /// The default runtime lives only as long as the returned proxy, so its
    /// match cache is never shared. Install [`EventsModule`](crate::EventsModule)
    /// to have every proxy of a container reuse one cache.
    fn resolve_events<I: EventInterface>(&self) -> Result<Arc<I>, EventError> {
        let runtime = if self.has::<EventsRuntime>() {
            self.resolve::<EventsRuntime>()?
        } else {
            trace!(interface = std::any::type_name::<I>(), "No events runtime registered, using defaults");
            Arc::new(EventsRuntime::default())
        };
        Ok(Arc::new(create_proxy::<I>(self, runtime)?))
    }
}

impl ResolveEventsExt for Container {
    fn resolve_events<I: EventInterface>(&self) -> Result<Arc<I>, EventError> {
        self.root().resolve_events::<I>()
    }
}
