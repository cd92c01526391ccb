//! Registration records and the fluent registration builder.
//!
//! A [`Registration`] is created while the container is being built and is
//! immutable afterwards. It ties an implementation type to a factory, a
//! [`Lifetime`], the service keys it answers to, and an open set of
//! capability markers that other crates attach and later query with
//! [`Scope::registrations_with`](crate::Scope::registrations_with).

use crate::logging::{debug, trace};
use crate::{Provider, Result, Scope, TypeKey};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type-erased, shared service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory = Arc<dyn Fn(&Scope, &[TypeKey]) -> Result<Instance> + Send + Sync>;

/// How long a resolved instance is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// One instance for the whole container, shared by every scope
    Singleton,
    /// One instance per scope
    Scoped,
    /// A new instance for every resolution
    #[default]
    Transient,
}

/// Position of a registration in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(pub(crate) usize);

impl RegistrationId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single registration owned by the container.
pub struct Registration {
    pub(crate) id: RegistrationId,
    pub(crate) implementation: TypeKey,
    pub(crate) lifetime: Lifetime,
    pub(crate) services: Vec<TypeKey>,
    pub(crate) capabilities: HashMap<TypeId, Instance>,
    pub(crate) generic: bool,
    pub(crate) factory: Factory,
}

impl Registration {
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn implementation(&self) -> TypeKey {
        self.implementation
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Service keys this registration can be resolved as
    pub fn services(&self) -> &[TypeKey] {
        &self.services
    }

    /// Whether one registration serves many closed type arguments
    pub fn is_generic(&self) -> bool {
        self.generic
    }

    /// Capability marker of type `M`, if one was attached
    pub fn capability<M: Send + Sync + 'static>(&self) -> Option<Arc<M>> {
        self.capabilities
            .get(&TypeId::of::<M>())
            .and_then(|marker| Arc::clone(marker).downcast::<M>().ok())
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("implementation", &self.implementation)
            .field("lifetime", &self.lifetime)
            .field("services", &self.services)
            .field("capabilities", &self.capabilities.len())
            .field("generic", &self.generic)
            .finish()
    }
}

/// A registration carrying a capability marker, as returned by
/// [`Scope::registrations_with`](crate::Scope::registrations_with).
#[derive(Debug)]
pub struct Capable<M> {
    pub id: RegistrationId,
    pub implementation: TypeKey,
    pub lifetime: Lifetime,
    pub capability: Arc<M>,
}

impl<M> Clone for Capable<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            implementation: self.implementation,
            lifetime: self.lifetime,
            capability: Arc::clone(&self.capability),
        }
    }
}

/// Fluent configuration for a registration that was just added.
///
/// ```
/// use ductile_core::{ContainerBuilder, Provider};
///
/// struct Clock;
/// impl Provider for Clock {}
///
/// let mut builder = ContainerBuilder::new();
/// builder.register(|_| Ok(Clock)).singleton().as_self();
/// let container = builder.build();
/// assert!(container.has::<Clock>());
/// ```
pub struct RegistrationBuilder<'a, T> {
    registration: &'a mut Registration,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Provider> RegistrationBuilder<'a, T> {
    pub(crate) fn new(registration: &'a mut Registration) -> Self {
        Self {
            registration,
            _marker: PhantomData,
        }
    }

    /// Share one instance across the container
    pub fn singleton(self) -> Self {
        self.lifetime(Lifetime::Singleton)
    }

    /// Reuse one instance per scope
    pub fn scoped(self) -> Self {
        self.lifetime(Lifetime::Scoped)
    }

    /// Create a new instance on every resolution
    pub fn transient(self) -> Self {
        self.lifetime(Lifetime::Transient)
    }

    pub fn lifetime(self, lifetime: Lifetime) -> Self {
        trace!(
            registration = %self.registration.id,
            lifetime = ?lifetime,
            "Setting registration lifetime"
        );
        self.registration.lifetime = lifetime;
        self
    }

    /// Make the registration resolvable as its own implementation type
    pub fn as_self(self) -> Self {
        let key = TypeKey::of::<T>();
        if !self.registration.services.contains(&key) {
            self.registration.services.push(key);
        }
        debug!(
            registration = %self.registration.id,
            service = key.name(),
            "Registration exposed as service"
        );
        self
    }

    /// Attach a capability marker; a later marker of the same type replaces it
    pub fn with_capability<M: Send + Sync + 'static>(self, marker: M) -> Self {
        self.registration
            .capabilities
            .insert(TypeId::of::<M>(), Arc::new(marker));
        debug!(
            registration = %self.registration.id,
            capability = std::any::type_name::<M>(),
            "Capability attached to registration"
        );
        self
    }

    pub fn id(&self) -> RegistrationId {
        self.registration.id
    }
}
