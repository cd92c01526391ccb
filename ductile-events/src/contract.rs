//! Event contracts: the caller-side description of an event interface.

use crate::shape::{MethodShape, TypeRef};
use crate::EventError;
use ductile_core::simple_name;
use std::borrow::Cow;
use std::collections::HashSet;

/// The shape of an event interface a caller broadcasts through.
///
/// A contract is either plain, or generic over `generic_params` type
/// parameters referenced as [`TypeRef::Param`] inside its methods. A generic
/// contract must be given its type arguments before a proxy can be built.
///
/// ```
/// use ductile_events::{Contract, TypeRef};
///
/// let contract = Contract::generic("repository::EntityEvents", 1)
///     .method("entity_added", vec![TypeRef::Param(0)], TypeRef::Unit)
///     .with_type_args(vec![TypeRef::of::<String>()]);
///
/// let closed = contract.close();
/// assert_eq!(closed.methods()[0].params()[0], TypeRef::of::<String>());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    name: Cow<'static, str>,
    generic_params: usize,
    type_args: Vec<TypeRef>,
    methods: Vec<MethodShape>,
}

/// Cache identity of a closed contract.
///
/// Names are not unique across independently declared interfaces, so the
/// closed method shapes are part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractKey {
    name: Cow<'static, str>,
    type_args: Vec<TypeRef>,
    methods: Vec<MethodShape>,
}

impl Contract {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self::generic(name, 0)
    }

    pub fn generic(name: impl Into<Cow<'static, str>>, generic_params: usize) -> Self {
        Self {
            name: name.into(),
            generic_params,
            type_args: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn method(
        mut self,
        name: impl Into<Cow<'static, str>>,
        params: Vec<TypeRef>,
        ret: TypeRef,
    ) -> Self {
        self.methods.push(MethodShape::new(name, params, ret));
        self
    }

    pub fn with_type_args(mut self, type_args: Vec<TypeRef>) -> Self {
        self.type_args = type_args;
        self
    }

    /// Qualified name, e.g. `orders::events::OrderEvents`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without module qualification, used to pair generic families
    pub fn simple_name(&self) -> String {
        simple_name(&self.name)
    }

    pub fn generic_params(&self) -> usize {
        self.generic_params
    }

    pub fn is_generic(&self) -> bool {
        self.generic_params > 0
    }

    pub fn type_args(&self) -> &[TypeRef] {
        &self.type_args
    }

    pub fn methods(&self) -> &[MethodShape] {
        &self.methods
    }

    /// Method by name together with its declaration index
    pub fn find_method(&self, name: &str) -> Option<(usize, &MethodShape)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, method)| method.name() == name)
    }

    /// Substitute the type arguments into every method
    pub fn close(&self) -> Contract {
        Contract {
            name: self.name.clone(),
            generic_params: self.generic_params,
            type_args: self.type_args.clone(),
            methods: self
                .methods
                .iter()
                .map(|method| method.substitute(&self.type_args))
                .collect(),
        }
    }

    pub fn cache_key(&self) -> ContractKey {
        ContractKey {
            name: self.name.clone(),
            type_args: self.type_args.clone(),
            methods: self
                .methods
                .iter()
                .map(|method| method.substitute(&self.type_args))
                .collect(),
        }
    }

    /// Check the contract can back a proxy.
    ///
    /// Rejects contracts without methods, with duplicated method names,
    /// with missing or open type arguments, or whose methods still mention
    /// a generic parameter after substitution.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.methods.is_empty() {
            return Err(EventError::invalid(&self.name, "declares no methods"));
        }

        if self.type_args.len() != self.generic_params {
            return Err(EventError::invalid(
                &self.name,
                format!(
                    "expects {} type arguments, got {}",
                    self.generic_params,
                    self.type_args.len()
                ),
            ));
        }

        if let Some(open) = self.type_args.iter().find(|arg| !arg.is_closed()) {
            return Err(EventError::invalid(
                &self.name,
                format!("type argument {open} is not a concrete type"),
            ));
        }

        let mut seen = HashSet::new();
        for method in &self.methods {
            if !seen.insert(method.name()) {
                return Err(EventError::invalid(
                    &self.name,
                    format!("method `{}` is declared more than once", method.name()),
                ));
            }
            if !method.substitute(&self.type_args).is_closed() {
                return Err(EventError::invalid(
                    &self.name,
                    format!("method `{method}` refers to an undeclared type parameter"),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Contract {
        Contract::new("shop::orders::OrderEvents")
            .method("order_processed", vec![TypeRef::of::<i32>()], TypeRef::Unit)
            .method("order_total", vec![TypeRef::of::<i32>()], TypeRef::of::<u64>())
    }

    #[test]
    fn test_names() {
        let contract = orders();
        assert_eq!(contract.name(), "shop::orders::OrderEvents");
        assert_eq!(contract.simple_name(), "OrderEvents");
        assert!(!contract.is_generic());
    }

    #[test]
    fn test_find_method() {
        let contract = orders();
        let (index, method) = contract.find_method("order_total").unwrap();
        assert_eq!(index, 1);
        assert_eq!(method.ret(), &TypeRef::of::<u64>());
        assert!(contract.find_method("OrderTotal").is_none());
    }

    #[test]
    fn test_valid_contracts() {
        assert!(orders().validate().is_ok());

        let generic = Contract::generic("Repo", 1)
            .method("added", vec![TypeRef::Param(0)], TypeRef::Unit)
            .with_type_args(vec![TypeRef::of::<String>()]);
        assert!(generic.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_contract() {
        let err = Contract::new("Empty").validate().unwrap_err();
        assert!(err.to_string().contains("declares no methods"));
    }

    #[test]
    fn test_rejects_missing_type_args() {
        let open = Contract::generic("Repo", 1).method("added", vec![TypeRef::Param(0)], TypeRef::Unit);
        assert!(matches!(open.validate(), Err(EventError::InvalidContract { .. })));

        let unbound = open.clone().with_type_args(vec![TypeRef::Param(0)]);
        assert!(unbound.validate().is_err());
    }

    #[test]
    fn test_rejects_undeclared_parameter() {
        let contract = Contract::new("Broken").method("f", vec![TypeRef::Param(0)], TypeRef::Unit);
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("undeclared type parameter"));
    }

    #[test]
    fn test_rejects_duplicate_methods() {
        let contract = orders().method("order_processed", vec![], TypeRef::Unit);
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_cache_key_includes_type_args() {
        let base = Contract::generic("Repo", 1).method("added", vec![TypeRef::Param(0)], TypeRef::Unit);
        let strings = base.clone().with_type_args(vec![TypeRef::of::<String>()]);
        let ints = base.with_type_args(vec![TypeRef::of::<i32>()]);
        assert_ne!(strings.cache_key(), ints.cache_key());
        assert_eq!(strings.cache_key(), strings.close().cache_key());
    }

    #[test]
    fn test_cache_key_includes_methods() {
        let shipped = Contract::new("alerts::Alerts").method("shipped", vec![TypeRef::of::<u32>()], TypeRef::Unit);
        let billed = Contract::new("alerts::Alerts").method("billed", vec![TypeRef::of::<u32>()], TypeRef::Unit);
        assert_ne!(shipped.cache_key(), billed.cache_key());
    }
}
