//! Canonical shape descriptors.
//!
//! Structural matching never compares Rust traits or nominal interface
//! identity. Both sides of a match are reduced to [`MethodShape`]s: a method
//! name, ordered parameter [`TypeRef`]s and a return [`TypeRef`].

use ductile_core::TypeKey;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

/// A parameter or return type inside a method shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value; the return of a notification method
    Unit,
    /// Top type: accepts every argument
    Any,
    Concrete(TypeKey),
    /// The n-th generic parameter of the declaring contract or handler
    Param(usize),
}

impl TypeRef {
    /// Shape of `T`; `()` maps to [`TypeRef::Unit`] and trait-object `Any`
    /// to [`TypeRef::Any`].
    pub fn of<T: ?Sized + 'static>() -> Self {
        let id = TypeId::of::<T>();
        if id == TypeId::of::<()>() {
            TypeRef::Unit
        } else if id == TypeId::of::<dyn Any>() || id == TypeId::of::<dyn Any + Send + Sync>() {
            TypeRef::Any
        } else {
            TypeRef::Concrete(TypeKey::of::<T>())
        }
    }

    pub fn param(index: usize) -> Self {
        TypeRef::Param(index)
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self, TypeRef::Param(_))
    }

    /// Replace a generic parameter with its argument; closed types and
    /// parameters without an argument are returned unchanged.
    pub fn substitute(&self, args: &[TypeRef]) -> TypeRef {
        match self {
            TypeRef::Param(index) => args.get(*index).cloned().unwrap_or_else(|| self.clone()),
            closed => closed.clone(),
        }
    }

    /// Parameter rule: can a candidate parameter of this type receive every
    /// argument the target parameter `target` would pass?
    pub fn accepts(&self, target: &TypeRef) -> bool {
        if !self.is_closed() || !target.is_closed() {
            return false;
        }
        match self {
            TypeRef::Any => *target != TypeRef::Unit,
            _ => self == target,
        }
    }

    /// Return rule: can a candidate returning this type stand in for a
    /// target returning `target`?
    pub fn returns_into(&self, target: &TypeRef) -> bool {
        if !self.is_closed() || !target.is_closed() {
            return false;
        }
        self == target || (*target == TypeRef::Any && *self != TypeRef::Unit)
    }

    /// Runtime key of a closed type
    pub fn key(&self) -> Option<TypeKey> {
        match self {
            TypeRef::Unit => Some(TypeKey::of::<()>()),
            TypeRef::Any => Some(TypeKey::of::<dyn Any + Send + Sync>()),
            TypeRef::Concrete(key) => Some(*key),
            TypeRef::Param(_) => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Unit => f.write_str("()"),
            TypeRef::Any => f.write_str("any"),
            TypeRef::Concrete(key) => write!(f, "{key}"),
            TypeRef::Param(index) => write!(f, "T{index}"),
        }
    }
}

/// Name, ordered parameters and return type of one method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodShape {
    name: Cow<'static, str>,
    params: Vec<TypeRef>,
    ret: TypeRef,
}

impl MethodShape {
    pub fn new(name: impl Into<Cow<'static, str>>, params: Vec<TypeRef>, ret: TypeRef) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    pub fn ret(&self) -> &TypeRef {
        &self.ret
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_closed(&self) -> bool {
        self.ret.is_closed() && self.params.iter().all(TypeRef::is_closed)
    }

    pub fn substitute(&self, args: &[TypeRef]) -> MethodShape {
        MethodShape {
            name: self.name.clone(),
            params: self.params.iter().map(|p| p.substitute(args)).collect(),
            ret: self.ret.substitute(args),
        }
    }
}

impl fmt::Display for MethodShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}
