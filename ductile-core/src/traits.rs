// Core traits for the Ductile resolver

use crate::{ContainerBuilder, Instance, Result, Scope, TypeKey};

/// Trait for types that can be provided by the container
pub trait Provider: Send + Sync + 'static {
    /// Returns the key of the provider type
    fn provider_key(&self) -> TypeKey {
        TypeKey::of::<Self>()
    }
}

/// Trait for modules that contribute registrations to a container
pub trait Module: Send + Sync + 'static {
    /// Human readable module name, used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Add this module's registrations and sources to the builder
    fn load(&self, builder: &mut ContainerBuilder);
}

/// Fallback resolution for services without an explicit registration.
///
/// Sources are consulted in the order they were registered, after the
/// container has failed to find a registration exposing the requested
/// service. Returning `None` means "not mine".
pub trait RegistrationSource: Send + Sync + 'static {
    fn resolve(&self, service: &TypeKey, scope: &Scope) -> Option<Result<Instance>>;

    /// Whether [`resolve`](Self::resolve) answers for `service`
    fn provides(&self, service: &TypeKey) -> bool;
}
