//! Resolution scopes.
//!
//! Every container has a root scope; child scopes are opened with
//! [`Scope::begin_scope`] and may be nested arbitrarily deep. Instances are
//! owned according to their registration's [`Lifetime`]:
//!
//! - **Singleton** instances live in the container-wide registry and are
//!   shared by every scope.
//! - **Scoped** instances live in the arena of the scope that first resolved
//!   them and are dropped together with the last handle to that scope.
//! - **Transient** instances are created on every resolution and never
//!   cached.
//!
//! Singletons are always constructed against the root scope so they never
//! capture a shorter-lived scope.

use crate::container::{ContainerInner, InstanceCache, InstanceKey};
use crate::logging::{debug, trace};
use crate::{Capable, Error, Instance, Lifetime, Provider, Registration, RegistrationId, Result, TypeKey};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A handle to a resolution scope. Cloning shares the same scope.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    id: Uuid,
    depth: usize,
    parent: Option<Scope>,
    container: Arc<ContainerInner>,
    instances: InstanceCache,
}

impl Scope {
    pub(crate) fn root(container: Arc<ContainerInner>) -> Self {
        Self::with_parent(container, None)
    }

    fn with_parent(container: Arc<ContainerInner>, parent: Option<Scope>) -> Self {
        let depth = parent.as_ref().map_or(0, |p| p.depth() + 1);
        let scope = Self {
            inner: Arc::new(ScopeInner {
                id: Uuid::new_v4(),
                depth,
                parent,
                container,
                instances: DashMap::new(),
            }),
        };
        trace!(scope = %scope.id(), depth = depth, "Scope opened");
        scope
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Nesting depth; the root scope is 0
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    /// Id of the container's root scope, shared by every scope of a container
    pub fn container_id(&self) -> Uuid {
        self.root_scope().id()
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.inner.parent.as_ref()
    }

    /// Open a nested scope sharing this scope's singletons
    pub fn begin_scope(&self) -> Scope {
        Self::with_parent(Arc::clone(&self.inner.container), Some(self.clone()))
    }

    /// Resolve a provider by type
    pub fn resolve<T: Provider>(&self) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        trace!(provider = key.name(), scope = %self.id(), "Attempting to resolve provider");

        let instance = self.resolve_key(&key)?;
        instance.downcast::<T>().map_err(|_| Error::TypeMismatch {
            expected: key.name(),
            registration: format!("service {}", key.name()),
        })
    }

    /// Resolve a service by key without downcasting.
    ///
    /// Explicit registrations win over registration sources; among several
    /// registrations of the same service the last one wins.
    pub fn resolve_key(&self, key: &TypeKey) -> Result<Instance> {
        let registered = self
            .inner
            .container
            .services
            .get(&key.id())
            .and_then(|ids| ids.last().copied());

        if let Some(id) = registered {
            return self.instance(id, &[]);
        }

        for source in &self.inner.container.sources {
            if let Some(result) = source.resolve(key, self) {
                debug!(provider = key.name(), "Provider resolved from registration source");
                return result;
            }
        }

        debug!(provider = key.name(), "Provider not found in container");
        Err(Error::ProviderNotFound(format!(
            "Provider not found: {}",
            key.name()
        )))
    }

    /// Produce the instance of a registration honouring its lifetime.
    ///
    /// `type_args` selects the closed variant of a generic registration and
    /// must be empty for every other registration.
    pub fn instance(&self, id: RegistrationId, type_args: &[TypeKey]) -> Result<Instance> {
        let registration = self.registration(id).ok_or_else(|| {
            Error::ProviderNotFound(format!("No registration with id {id}"))
        })?;

        if !type_args.is_empty() && !registration.generic {
            return Err(Error::InvalidRegistration(format!(
                "{} ({id}) is not generic but was requested with {} type arguments",
                registration.implementation.name(),
                type_args.len()
            )));
        }

        let key = InstanceKey {
            registration: id,
            type_args: type_args.to_vec(),
        };

        match registration.lifetime {
            Lifetime::Transient => {
                trace!(registration = %id, "Creating transient instance");
                (registration.factory)(self, type_args)
            }
            Lifetime::Scoped => Self::cached(&self.inner.instances, key, || {
                debug!(registration = %id, scope = %self.id(), "Creating scoped instance");
                (registration.factory)(self, type_args)
            }),
            Lifetime::Singleton => {
                let root = self.root_scope();
                Self::cached(&self.inner.container.singletons, key, || {
                    debug!(registration = %id, "Creating singleton instance");
                    (registration.factory)(root, type_args)
                })
            }
        }
    }

    /// Check if a provider is resolvable, either registered as a service or
    /// answered by a registration source
    pub fn has<T: Provider>(&self) -> bool {
        let key = TypeKey::of::<T>();
        let container = &self.inner.container;
        let exists = container.services.contains_key(&key.id())
            || container.sources.iter().any(|source| source.provides(&key));
        trace!(provider = std::any::type_name::<T>(), exists = exists, "Checked provider existence");
        exists
    }

    pub fn registration(&self, id: RegistrationId) -> Option<&Registration> {
        self.inner.container.registrations.get(id.0)
    }

    /// Registrations carrying a capability of type `M`, in declaration order
    pub fn registrations_with<M: Send + Sync + 'static>(&self) -> Vec<Capable<M>> {
        self.inner
            .container
            .registrations
            .iter()
            .filter_map(|registration| {
                registration.capability::<M>().map(|capability| Capable {
                    id: registration.id,
                    implementation: registration.implementation,
                    lifetime: registration.lifetime,
                    capability,
                })
            })
            .collect()
    }

    pub fn registration_count(&self) -> usize {
        self.inner.container.registrations.len()
    }

    /// Number of scoped instances currently owned by this scope
    pub fn cached_instances(&self) -> usize {
        self.inner.instances.len()
    }

    /// Whether two handles refer to the same scope
    pub fn same_scope(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn root_scope(&self) -> &Scope {
        let mut scope = self;
        while let Some(parent) = scope.parent() {
            scope = parent;
        }
        scope
    }

    // The cell is cloned out of the map before initialisation so the shard
    // lock is not held while the factory runs.
    fn cached(
        cache: &InstanceCache,
        key: InstanceKey,
        create: impl FnOnce() -> Result<Instance>,
    ) -> Result<Instance> {
        let cell = Arc::clone(&cache.entry(key).or_default());
        cell.get_or_try_init(create).cloned()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("depth", &self.inner.depth)
            .field("cached_instances", &self.inner.instances.len())
            .finish()
    }
}
