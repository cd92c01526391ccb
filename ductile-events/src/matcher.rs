//! Structural matcher.
//!
//! A candidate handler matches a contract when every contract method has
//! exactly one compatible candidate method. Names are compared
//! case-sensitively and module qualification is never consulted. A
//! mismatch is not an error: the candidate is left out of the broadcast.

use crate::contract::Contract;
use crate::generic;
use crate::handler::HandlerShape;
use crate::shape::{MethodShape, TypeRef};
use ductile_core::TypeKey;

/// Pairing of one contract method with the candidate method serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMatch {
    pub target: MethodShape,
    pub candidate: MethodShape,
    /// Position of the candidate method in the handler's method table
    pub candidate_index: usize,
}

/// Result of a successful match between a contract and a handler shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDescriptor {
    methods: Vec<MethodMatch>,
    bindings: Vec<TypeRef>,
}

impl MatchDescriptor {
    pub(crate) fn new(methods: Vec<MethodMatch>, bindings: Vec<TypeRef>) -> Self {
        Self { methods, bindings }
    }

    /// One entry per contract method, in contract order
    pub fn methods(&self) -> &[MethodMatch] {
        &self.methods
    }

    /// Types bound to the candidate's generic parameters
    pub fn bindings(&self) -> &[TypeRef] {
        &self.bindings
    }

    /// Candidate method serving contract method `target_index`
    pub fn candidate_index(&self, target_index: usize) -> Option<usize> {
        self.methods.get(target_index).map(|m| m.candidate_index)
    }

    /// Type arguments to instantiate a generic candidate with
    pub fn instance_args(&self) -> Vec<TypeKey> {
        self.bindings.iter().filter_map(TypeRef::key).collect()
    }
}

/// Whether `candidate` can serve calls made through `target`
pub fn method_compatible(target: &MethodShape, candidate: &MethodShape) -> bool {
    target.name() == candidate.name()
        && target.arity() == candidate.arity()
        && candidate
            .params()
            .iter()
            .zip(target.params())
            .all(|(candidate, target)| candidate.accepts(target))
        && candidate.ret().returns_into(target.ret())
}

/// Pair every target method with its single compatible candidate.
///
/// Returns `None` if any target method has no compatible candidate or more
/// than one.
pub fn match_methods(target: &[MethodShape], candidates: &[MethodShape]) -> Option<Vec<MethodMatch>> {
    target
        .iter()
        .map(|method| {
            let mut compatible = candidates
                .iter()
                .enumerate()
                .filter(|(_, candidate)| method_compatible(method, candidate));

            let (candidate_index, candidate) = compatible.next()?;
            if compatible.next().is_some() {
                return None;
            }

            Some(MethodMatch {
                target: method.clone(),
                candidate: candidate.clone(),
                candidate_index,
            })
        })
        .collect()
}

/// Match a handler shape against a contract.
///
/// Generic contracts go through the generic resolver. Open generic handlers
/// never match a plain contract, since nothing would bind their parameters.
pub fn matches(contract: &Contract, shape: &HandlerShape) -> Option<MatchDescriptor> {
    if contract.is_generic() {
        return generic::match_generic(contract, shape);
    }
    if shape.is_open_generic() {
        return None;
    }
    match_methods(contract.methods(), shape.methods())
        .map(|methods| MatchDescriptor::new(methods, Vec::new()))
}
