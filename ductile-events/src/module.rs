// Container integration for event interfaces

use crate::interface::{EventInterface, create_proxy};
use crate::runtime::EventsRuntime;
use crate::{EventError, EventsConfig};
use ductile_core::{ContainerBuilder, Instance, Module, RegistrationSource, Scope, TypeKey};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

type ProxyFactory = fn(&Scope, Arc<EventsRuntime>) -> Result<Instance, EventError>;

fn build_proxy<I: EventInterface>(scope: &Scope, runtime: Arc<EventsRuntime>) -> Result<Instance, EventError> {
    Ok(Arc::new(create_proxy::<I>(scope, runtime)?) as Instance)
}

/// Installs the events runtime into a container.
///
/// Interfaces declared with [`EventsModule::interface`] become resolvable
/// with a plain `resolve::<I>()`; each resolution builds a fresh proxy bound
/// to the resolving scope.
///
/// ```
/// use ductile_core::Container;
/// use ductile_events::{event_interface, EventsModule};
///
/// event_interface! {
///     pub interface AuditEvents {
///         fn user_signed_in(user: String);
///     }
/// }
///
/// let mut builder = Container::builder();
/// builder.register_module(EventsModule::new().interface::<AuditEvents>());
/// let container = builder.build();
///
/// let audit = container.resolve::<AuditEvents>().unwrap();
/// audit.user_signed_in("ada".to_string()).unwrap();
/// ```
pub struct EventsModule {
    config: EventsConfig,
    interfaces: Vec<(TypeKey, ProxyFactory)>,
}

impl EventsModule {
    pub fn new() -> Self {
        Self::with_config(EventsConfig::default())
    }

    pub fn with_config(config: EventsConfig) -> Self {
        Self {
            config,
            interfaces: Vec::new(),
        }
    }

    /// Make `I` resolvable from the container
    pub fn interface<I: EventInterface>(mut self) -> Self {
        self.interfaces.push((TypeKey::of::<I>(), build_proxy::<I>));
        self
    }
}

impl Default for EventsModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for EventsModule {
    fn name(&self) -> &'static str {
        "events"
    }

    fn load(&self, builder: &mut ContainerBuilder) {
        let runtime = Arc::new(EventsRuntime::new(self.config.clone()));
        builder.register_shared(Arc::clone(&runtime)).as_self();

        for (key, _) in &self.interfaces {
            debug!(interface = key.name(), "Event interface declared");
        }

        builder.register_source(EventsSource {
            runtime,
            interfaces: self
                .interfaces
                .iter()
                .map(|(key, factory)| (key.id(), *factory))
                .collect(),
        });

        info!(interfaces = self.interfaces.len(), "Events module loaded");
    }
}

/// Answers resolutions of declared event interfaces with a proxy.
struct EventsSource {
    runtime: Arc<EventsRuntime>,
    interfaces: HashMap<TypeId, ProxyFactory>,
}

impl RegistrationSource for EventsSource {
    fn resolve(&self, service: &TypeKey, scope: &Scope) -> Option<ductile_core::Result<Instance>> {
        let factory = self.interfaces.get(&service.id())?;
        Some(
            factory(scope, Arc::clone(&self.runtime))
                .map_err(|e| ductile_core::Error::Source(Box::new(e))),
        )
    }

    fn provides(&self, service: &TypeKey) -> bool {
        self.interfaces.contains_key(&service.id())
    }
}
