// Handler discovery and match caching

use crate::contract::{Contract, ContractKey};
use crate::handler::{EventHandlerCapability, HandlerShape};
use crate::matcher::{self, MatchDescriptor};
use crate::EventsConfig;
use dashmap::DashMap;
use ductile_core::{Lifetime, Provider, RegistrationId, Scope, TypeKey};
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// A registration that structurally matches a contract.
#[derive(Debug, Clone)]
pub struct HandlerMatch {
    pub registration: RegistrationId,
    pub implementation: TypeKey,
    pub lifetime: Lifetime,
    pub shape: Arc<HandlerShape>,
    pub descriptor: MatchDescriptor,
    /// Type arguments the instance is resolved with; empty unless the
    /// registration is generic
    pub instance_args: Vec<TypeKey>,
}

type MatchCache = DashMap<(Uuid, ContractKey), Arc<Vec<HandlerMatch>>>;

/// Finds the handlers serving a contract.
///
/// Registrations are immutable once a container is built, so matches are
/// cached per container and closed contract.
pub struct EventsRuntime {
    config: EventsConfig,
    cache: MatchCache,
}

impl Provider for EventsRuntime {}

impl EventsRuntime {
    pub fn new(config: EventsConfig) -> Self {
        Self {
            config,
            cache: DashMap::new(),
        }
    }

    pub fn config(&self) -> &EventsConfig {
        &self.config
    }

    /// Matching registrations for a closed contract, in registration order
    pub fn handlers_for(&self, contract: &Contract, scope: &Scope) -> Arc<Vec<HandlerMatch>> {
        if !self.config.cache_matches {
            return Arc::new(Self::discover(contract, scope));
        }

        let key = (scope.container_id(), contract.cache_key());
        if let Some(cached) = self.cache.get(&key) {
            trace!(contract = contract.name(), handlers = cached.len(), "Match cache hit");
            return Arc::clone(cached.value());
        }

        let matches = Arc::new(Self::discover(contract, scope));
        Arc::clone(self.cache.entry(key).or_insert(matches).value())
    }

    /// Drop every cached match
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of contracts with cached matches
    pub fn cached_contracts(&self) -> usize {
        self.cache.len()
    }

    fn discover(contract: &Contract, scope: &Scope) -> Vec<HandlerMatch> {
        let candidates = scope.registrations_with::<EventHandlerCapability>();
        let considered = candidates.len();

        let matches: Vec<HandlerMatch> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let shape = Arc::clone(candidate.capability.shape());
                let Some(descriptor) = matcher::matches(contract, &shape) else {
                    trace!(
                        contract = contract.name(),
                        handler = candidate.implementation.name(),
                        registration = %candidate.id,
                        "Candidate does not match"
                    );
                    return None;
                };

                let generic = scope
                    .registration(candidate.id)
                    .is_some_and(|registration| registration.is_generic());
                let instance_args = if generic {
                    descriptor.instance_args()
                } else {
                    Vec::new()
                };

                Some(HandlerMatch {
                    registration: candidate.id,
                    implementation: candidate.implementation,
                    lifetime: candidate.lifetime,
                    shape,
                    descriptor,
                    instance_args,
                })
            })
            .collect();

        debug!(
            contract = contract.name(),
            considered = considered,
            matched = matches.len(),
            "Event handlers discovered"
        );
        matches
    }
}

impl Default for EventsRuntime {
    fn default() -> Self {
        Self::new(EventsConfig::default())
    }
}

impl std::fmt::Debug for EventsRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventsRuntime")
            .field("config", &self.config)
            .field("cached_contracts", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{AsEventHandler, EventHandler, HandlerShape};
    use crate::shape::TypeRef;
    use ductile_core::ContainerBuilder;

    struct Billing;
    impl Provider for Billing {}
    impl EventHandler for Billing {
        fn shape() -> HandlerShape {
            HandlerShape::builder::<Self>()
                .method("order_processed", |_: &Self, (_id,): (i32,)| Ok(()))
                .build()
        }
    }

    struct Unrelated;
    impl Provider for Unrelated {}
    impl EventHandler for Unrelated {
        fn shape() -> HandlerShape {
            HandlerShape::builder::<Self>()
                .method("user_created", |_: &Self, (_name,): (String,)| Ok(()))
                .build()
        }
    }

    fn orders() -> Contract {
        Contract::new("OrderEvents").method("order_processed", vec![TypeRef::of::<i32>()], TypeRef::Unit)
    }

    fn container() -> ductile_core::Container {
        let mut builder = ContainerBuilder::new();
        builder.register(|_| Ok(Billing)).as_event_handler();
        builder.register(|_| Ok(Unrelated)).as_event_handler();
        builder.register(|_| Ok(Billing)).singleton().as_event_handler();
        builder.register(|_| Ok(Billing));
        builder.build()
    }

    #[test]
    fn test_discovers_in_registration_order() {
        let container = container();
        let runtime = EventsRuntime::default();

        let handlers = runtime.handlers_for(&orders(), container.root());
        let ids: Vec<usize> = handlers.iter().map(|h| h.registration.index()).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(handlers[1].lifetime, Lifetime::Singleton);
        assert!(handlers[0].instance_args.is_empty());
    }

    #[test]
    fn test_matches_are_cached_per_container() {
        let runtime = EventsRuntime::default();
        let first = container();
        let second = container();

        let a = runtime.handlers_for(&orders(), first.root());
        let b = runtime.handlers_for(&orders(), &first.begin_scope());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(runtime.cached_contracts(), 1);

        runtime.handlers_for(&orders(), second.root());
        assert_eq!(runtime.cached_contracts(), 2);

        runtime.clear_cache();
        assert_eq!(runtime.cached_contracts(), 0);
    }

    #[test]
    fn test_cache_can_be_disabled() {
        let runtime = EventsRuntime::new(EventsConfig::builder().cache_matches(false).build());
        let container = container();

        let a = runtime.handlers_for(&orders(), container.root());
        let b = runtime.handlers_for(&orders(), container.root());
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), b.len());
        assert_eq!(runtime.cached_contracts(), 0);
    }
}
