// Dependency injection container

use crate::logging::{debug, info, trace};
use crate::registration::Factory;
use crate::{
    Capable, Instance, Lifetime, Module, Provider, Registration, RegistrationBuilder,
    RegistrationId, RegistrationSource, Result, Scope, TypeKey,
};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Key of a cached instance: the registration plus the closed type
/// arguments it was created for (empty for non-generic registrations).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct InstanceKey {
    pub(crate) registration: RegistrationId,
    pub(crate) type_args: Vec<TypeKey>,
}

pub(crate) type InstanceCache = DashMap<InstanceKey, Arc<OnceCell<Instance>>>;

/// State shared by a container and every scope created from it.
pub(crate) struct ContainerInner {
    pub(crate) registrations: Vec<Registration>,
    pub(crate) services: HashMap<TypeId, Vec<RegistrationId>>,
    pub(crate) sources: Vec<Arc<dyn RegistrationSource>>,
    pub(crate) singletons: InstanceCache,
}

/// Collects registrations, sources and modules, then freezes them into a
/// [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    registrations: Vec<Registration>,
    sources: Vec<Arc<dyn RegistrationSource>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider created by `factory`
    pub fn register<T, F>(&mut self, factory: F) -> RegistrationBuilder<'_, T>
    where
        T: Provider,
        F: Fn(&Scope) -> Result<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |scope: &Scope, _: &[TypeKey]| {
            Ok(Arc::new(factory(scope)?) as Instance)
        });
        self.push::<T>(Lifetime::Transient, false, factory)
    }

    /// Register a provider serving any number of closed type arguments.
    ///
    /// The factory receives the type arguments the instance is requested
    /// for; instances are cached per `(registration, type arguments)`.
    pub fn register_generic<T, F>(&mut self, factory: F) -> RegistrationBuilder<'_, T>
    where
        T: Provider,
        F: Fn(&Scope, &[TypeKey]) -> Result<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |scope: &Scope, type_args: &[TypeKey]| {
            Ok(Arc::new(factory(scope, type_args)?) as Instance)
        });
        self.push::<T>(Lifetime::Transient, true, factory)
    }

    /// Register an already constructed provider instance
    pub fn register_instance<T: Provider>(&mut self, instance: T) -> RegistrationBuilder<'_, T> {
        self.register_shared(Arc::new(instance))
    }

    /// Register a provider instance the caller keeps a handle to
    pub fn register_shared<T: Provider>(&mut self, instance: Arc<T>) -> RegistrationBuilder<'_, T> {
        let factory: Factory = Arc::new(move |_: &Scope, _: &[TypeKey]| Ok(Arc::clone(&instance) as Instance));
        self.push::<T>(Lifetime::Singleton, false, factory)
    }

    /// Add a fallback source for services without a registration
    pub fn register_source<S: RegistrationSource>(&mut self, source: S) -> &mut Self {
        trace!(
            source = std::any::type_name::<S>(),
            "Registration source added"
        );
        self.sources.push(Arc::new(source));
        self
    }

    /// Let a module add its registrations
    pub fn register_module<M: Module>(&mut self, module: M) -> &mut Self {
        let before = self.registrations.len();
        module.load(self);
        debug!(
            module = module.name(),
            registrations = self.registrations.len() - before,
            "Module loaded"
        );
        self
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// Freeze the registrations into a container
    pub fn build(self) -> Container {
        let mut services: HashMap<TypeId, Vec<RegistrationId>> = HashMap::new();
        for registration in &self.registrations {
            for service in &registration.services {
                services
                    .entry(service.id())
                    .or_default()
                    .push(registration.id);
            }
        }

        info!(
            registrations = self.registrations.len(),
            services = services.len(),
            sources = self.sources.len(),
            "Container built"
        );

        let inner = Arc::new(ContainerInner {
            registrations: self.registrations,
            services,
            sources: self.sources,
            singletons: DashMap::new(),
        });

        Container {
            root: Scope::root(inner),
        }
    }

    fn push<T: Provider>(
        &mut self,
        lifetime: Lifetime,
        generic: bool,
        factory: Factory,
    ) -> RegistrationBuilder<'_, T> {
        let id = RegistrationId(self.registrations.len());
        let implementation = TypeKey::of::<T>();

        self.registrations.push(Registration {
            id,
            implementation,
            lifetime,
            services: Vec::new(),
            capabilities: HashMap::new(),
            generic,
            factory,
        });

        debug!(
            registration = %id,
            provider = implementation.name(),
            generic = generic,
            "Provider registered"
        );

        RegistrationBuilder::new(&mut self.registrations[id.0])
    }
}

/// The dependency injection container
///
/// A container is the root [`Scope`]: it resolves services directly and
/// hands out child scopes with [`Container::begin_scope`]. Cloning is cheap
/// and every clone shares the same singletons.
#[derive(Clone)]
pub struct Container {
    root: Scope,
}

impl Container {
    /// Create a container without registrations
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// The root scope
    pub fn root(&self) -> &Scope {
        &self.root
    }

    /// Open a child scope of the root scope
    pub fn begin_scope(&self) -> Scope {
        self.root.begin_scope()
    }

    /// Resolve a provider from the root scope
    pub fn resolve<T: Provider>(&self) -> Result<Arc<T>> {
        self.root.resolve::<T>()
    }

    /// Check if a provider is resolvable; see [`Scope::has`]
    pub fn has<T: Provider>(&self) -> bool {
        self.root.has::<T>()
    }

    pub fn registration(&self, id: RegistrationId) -> Option<&Registration> {
        self.root.registration(id)
    }

    /// Registrations carrying a capability of type `M`, in declaration order
    pub fn registrations_with<M: Send + Sync + 'static>(&self) -> Vec<Capable<M>> {
        self.root.registrations_with::<M>()
    }

    pub fn registration_count(&self) -> usize {
        self.root.registration_count()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
