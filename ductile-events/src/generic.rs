//! Generic interface resolution.
//!
//! A generic contract such as `EntityEvents<String>` is served by handlers
//! that declare the `EntityEvents` family: either for one concrete argument
//! (`EntityEvents<String>`) or open over their own parameters
//! (`EntityEvents<T>`). The family arguments are unified with the requested
//! arguments, the resulting bindings are substituted into the candidate's
//! methods, and the structural matcher decides on the concrete shapes.

use crate::contract::Contract;
use crate::handler::HandlerShape;
use crate::matcher::{match_methods, MatchDescriptor};
use crate::shape::{MethodShape, TypeRef};
use tracing::trace;

/// Bind a candidate's generic parameters so that `candidate_args` equals
/// `target_args`.
///
/// `arity` is the number of candidate parameters; every one of them must be
/// bound by the unification, otherwise the candidate is underdetermined and
/// `None` is returned.
pub fn unify(candidate_args: &[TypeRef], target_args: &[TypeRef], arity: usize) -> Option<Vec<TypeRef>> {
    if candidate_args.len() != target_args.len() {
        return None;
    }

    let mut bindings: Vec<Option<TypeRef>> = vec![None; arity];
    for (candidate, target) in candidate_args.iter().zip(target_args) {
        if !target.is_closed() {
            return None;
        }
        match candidate {
            TypeRef::Param(index) => {
                let slot = bindings.get_mut(*index)?;
                match slot {
                    Some(bound) if bound != target => return None,
                    Some(_) => {}
                    None => *slot = Some(target.clone()),
                }
            }
            closed if closed == target => {}
            _ => return None,
        }
    }

    bindings.into_iter().collect()
}

/// Match a handler against a generic contract.
///
/// The first declared family that unifies and structurally matches wins.
pub fn match_generic(contract: &Contract, shape: &HandlerShape) -> Option<MatchDescriptor> {
    let target = contract.close();
    let family = contract.simple_name();

    shape
        .families()
        .iter()
        .filter(|binding| binding.simple_name() == family)
        .find_map(|binding| {
            let bindings = unify(binding.args(), target.type_args(), shape.generic_params())?;
            let candidates: Vec<MethodShape> = shape
                .methods()
                .iter()
                .map(|method| method.substitute(&bindings))
                .collect();

            let methods = match_methods(target.methods(), &candidates)?;
            trace!(
                contract = contract.name(),
                handler = shape.implementation().name(),
                family = binding.name(),
                "Generic family unified"
            );
            Some(MatchDescriptor::new(methods, bindings))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ductile_core::Provider;

    struct EntityCounter;
    impl Provider for EntityCounter {}

    fn entity_events<T: 'static>() -> Contract {
        Contract::generic("storage::EntityEvents", 1)
            .method("entity_added", vec![TypeRef::Param(0)], TypeRef::Unit)
            .with_type_args(vec![TypeRef::of::<T>()])
    }

    fn open_handler() -> HandlerShape {
        HandlerShape::builder::<EntityCounter>()
            .generic_params(1)
            .implements("handlers::EntityEvents", vec![TypeRef::Param(0)])
            .method_raw("entity_added", vec![TypeRef::Param(0)], TypeRef::Unit, |_, _| Ok(None))
            .build()
    }

    fn string_handler() -> HandlerShape {
        HandlerShape::builder::<EntityCounter>()
            .implements("EntityEvents", vec![TypeRef::of::<String>()])
            .method("entity_added", |_: &EntityCounter, (_name,): (String,)| Ok(()))
            .build()
    }

    #[test]
    fn test_unify_binds_parameters() {
        let target = [TypeRef::of::<String>(), TypeRef::of::<i32>()];

        let bound = unify(&[TypeRef::Param(1), TypeRef::Param(0)], &target, 2).unwrap();
        assert_eq!(bound, vec![TypeRef::of::<i32>(), TypeRef::of::<String>()]);

        let mixed = unify(&[TypeRef::of::<String>(), TypeRef::Param(0)], &target, 1).unwrap();
        assert_eq!(mixed, vec![TypeRef::of::<i32>()]);
    }

    #[test]
    fn test_unify_rejects_conflicts() {
        let target = [TypeRef::of::<String>(), TypeRef::of::<i32>()];
        assert!(unify(&[TypeRef::Param(0), TypeRef::Param(0)], &target, 1).is_none());
        assert!(unify(&[TypeRef::of::<i32>(), TypeRef::Param(0)], &target, 1).is_none());
        assert!(unify(&[TypeRef::Param(0)], &target, 1).is_none());
    }

    #[test]
    fn test_unify_requires_every_parameter_bound() {
        let target = [TypeRef::of::<String>()];
        assert!(unify(&[TypeRef::Param(0)], &target, 2).is_none());
        assert!(unify(&[TypeRef::Param(3)], &target, 1).is_none());
    }

    #[test]
    fn test_open_handler_matches_any_argument() {
        for contract in [entity_events::<String>(), entity_events::<u64>()] {
            let descriptor = match_generic(&contract, &open_handler()).unwrap();
            assert_eq!(descriptor.bindings(), contract.type_args());
            assert_eq!(descriptor.instance_args().len(), 1);
        }
    }

    #[test]
    fn test_concrete_handler_matches_only_its_argument() {
        assert!(match_generic(&entity_events::<String>(), &string_handler()).is_some());
        assert!(match_generic(&entity_events::<i32>(), &string_handler()).is_none());
    }

    #[test]
    fn test_family_name_must_agree() {
        let shape = HandlerShape::builder::<EntityCounter>()
            .implements("AuditEvents", vec![TypeRef::of::<String>()])
            .method("entity_added", |_: &EntityCounter, (_name,): (String,)| Ok(()))
            .build();
        assert!(match_generic(&entity_events::<String>(), &shape).is_none());
    }
}
