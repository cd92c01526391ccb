//! Broadcaster: the dispatch loop behind every event interface proxy.
//!
//! A [`Broadcaster`] is bound to one closed contract and one scope. Each
//! call looks up the matching registrations, resolves their instances in
//! the bound scope and invokes the matched method on each, in registration
//! order.
//!
//! # Return values
//!
//! When the contract method returns a value, the caller observes the value
//! of the **last** handler invoked; earlier values are discarded. `None`
//! means no handler ran.
//!
//! # Errors
//!
//! The first failing handler aborts the broadcast. Handlers after it are not
//! invoked and nothing is rolled back.

use crate::contract::Contract;
use crate::handler::{Args, Value};
use crate::runtime::EventsRuntime;
use crate::shape::TypeRef;
use crate::EventError;
use ductile_core::Scope;
use std::any::{Any, type_name};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Broadcaster {
    contract: Arc<Contract>,
    scope: Scope,
    runtime: Arc<EventsRuntime>,
}

impl Broadcaster {
    /// Bind `contract` to `scope`, failing if the contract cannot back a
    /// proxy
    pub fn new(contract: Contract, scope: Scope, runtime: Arc<EventsRuntime>) -> Result<Self, EventError> {
        contract.validate()?;
        let contract = Arc::new(contract.close());

        debug!(
            contract = contract.name(),
            methods = contract.methods().len(),
            scope = %scope.id(),
            "Broadcast proxy created"
        );

        Ok(Self {
            contract,
            scope,
            runtime,
        })
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Number of handlers a broadcast would currently reach
    pub fn handler_count(&self) -> usize {
        self.runtime.handlers_for(&self.contract, &self.scope).len()
    }

    /// Broadcast `method` with `args` to every matching handler.
    pub fn invoke(&self, method: &str, args: &[&(dyn Any + Send + Sync)]) -> Result<Option<Value>, EventError> {
        let (index, shape) = self
            .contract
            .find_method(method)
            .ok_or_else(|| EventError::UnknownMethod {
                contract: self.contract.name().to_string(),
                method: method.to_string(),
            })?;

        if args.len() != shape.arity() {
            return Err(EventError::ArityMismatch {
                contract: self.contract.name().to_string(),
                method: method.to_string(),
                expected: shape.arity(),
                actual: args.len(),
            });
        }

        for (position, (arg, param)) in args.iter().zip(shape.params()).enumerate() {
            if let TypeRef::Concrete(key) = param {
                let value: &dyn Any = *arg;
                if value.type_id() != key.id() {
                    return Err(EventError::ArgumentMismatch {
                        contract: self.contract.name().to_string(),
                        method: method.to_string(),
                        index: position,
                        expected: key.name().to_string(),
                    });
                }
            }
        }

        let handlers = self.runtime.handlers_for(&self.contract, &self.scope);
        if handlers.is_empty() && self.runtime.config().warn_on_empty {
            warn!(
                contract = self.contract.name(),
                method = method,
                "Broadcast reached no handlers"
            );
        }

        let args = Args::new(args);
        let mut last = None;

        for handler in handlers.iter() {
            let Some(candidate) = handler.descriptor.candidate_index(index) else {
                continue;
            };
            let instance = self.scope.instance(handler.registration, &handler.instance_args)?;
            let value = handler
                .shape
                .invoke(candidate, &*instance, &args)
                .map_err(|source| EventError::Handler {
                    handler: handler.implementation.name(),
                    method: method.to_string(),
                    source,
                })?;

            if value.is_some() {
                last = value;
            }
        }

        if self.runtime.config().log_broadcasts {
            debug!(
                contract = self.contract.name(),
                method = method,
                handlers = handlers.len(),
                scope = %self.scope.id(),
                "Event broadcast"
            );
        }

        Ok(last)
    }

    /// Broadcast and downcast the last handler's return value
    pub fn call<R: 'static>(&self, method: &str, args: &[&(dyn Any + Send + Sync)]) -> Result<Option<R>, EventError> {
        match self.invoke(method, args)? {
            None => Ok(None),
            Some(value) => value
                .downcast::<R>()
                .map(|value| Some(*value))
                .map_err(|_| EventError::ReturnTypeMismatch {
                    contract: self.contract.name().to_string(),
                    method: method.to_string(),
                    expected: type_name::<R>(),
                }),
        }
    }

    /// Broadcast a method without a return value
    pub fn notify(&self, method: &str, args: &[&(dyn Any + Send + Sync)]) -> Result<(), EventError> {
        self.invoke(method, args).map(|_| ())
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("contract", &self.contract.name())
            .field("scope", &self.scope)
            .finish()
    }
}
