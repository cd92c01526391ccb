//! Handler shapes: the candidate side of a structural match.
//!
//! A handler type describes itself as a [`HandlerShape`], a table of method
//! shapes plus one type-erased invoker per method. The table is attached to
//! the handler's registration as an [`EventHandlerCapability`] marker, which
//! is how the events runtime discovers candidates in the container.

use crate::shape::{MethodShape, TypeRef};
use crate::HandlerError;
use ductile_core::{Provider, RegistrationBuilder, TypeKey};
use std::any::{Any, type_name};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{trace, warn};

/// A type-erased value returned by a handler method.
pub type Value = Box<dyn Any + Send + Sync>;

/// Type-erased call of one handler method against a resolved instance.
pub type Invoker =
    Arc<dyn Fn(&(dyn Any + Send + Sync), &Args<'_>) -> Result<Option<Value>, HandlerError> + Send + Sync>;

/// Borrowed, type-erased arguments of a broadcast call.
#[derive(Clone, Copy)]
pub struct Args<'a> {
    values: &'a [&'a (dyn Any + Send + Sync)],
}

impl<'a> Args<'a> {
    pub fn new(values: &'a [&'a (dyn Any + Send + Sync)]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument `index` without a type check
    pub fn raw(&self, index: usize) -> Option<&'a (dyn Any + Send + Sync)> {
        self.values.get(index).copied()
    }

    /// Argument `index` as a `T`
    pub fn get<T: 'static>(&self, index: usize) -> Result<&'a T, HandlerError> {
        self.raw(index)
            .and_then(|value| value.downcast_ref::<T>())
            .ok_or(HandlerError::ArgumentMismatch {
                index,
                expected: type_name::<T>(),
            })
    }
}

impl fmt::Debug for Args<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.values.len()).finish()
    }
}

/// Parameter lists a typed handler method can take, as tuples.
pub trait Params: Sized + 'static {
    fn shapes() -> Vec<TypeRef>;
    fn extract(args: &Args<'_>) -> Result<Self, HandlerError>;
}

impl Params for () {
    fn shapes() -> Vec<TypeRef> {
        Vec::new()
    }

    fn extract(_: &Args<'_>) -> Result<Self, HandlerError> {
        Ok(())
    }
}

macro_rules! impl_params {
    ($($ty:ident => $index:tt),+) => {
        impl<$($ty),+> Params for ($($ty,)+)
        where
            $($ty: Clone + Send + Sync + 'static),+
        {
            fn shapes() -> Vec<TypeRef> {
                vec![$(TypeRef::of::<$ty>()),+]
            }

            fn extract(args: &Args<'_>) -> Result<Self, HandlerError> {
                Ok(($(args.get::<$ty>($index)?.clone(),)+))
            }
        }
    };
}

impl_params!(A => 0);
impl_params!(A => 0, B => 1);
impl_params!(A => 0, B => 1, C => 2);
impl_params!(A => 0, B => 1, C => 2, D => 3);

/// A generic interface family a handler serves, e.g. `EntityEvents<String>`.
///
/// Arguments may refer to the handler's own generic parameters with
/// [`TypeRef::Param`]; those are bound when the family is unified with a
/// requested interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyBinding {
    name: Cow<'static, str>,
    args: Vec<TypeRef>,
}

impl FamilyBinding {
    pub fn new(name: impl Into<Cow<'static, str>>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn simple_name(&self) -> String {
        ductile_core::simple_name(&self.name)
    }

    pub fn args(&self) -> &[TypeRef] {
        &self.args
    }
}

/// Method table of a handler implementation.
#[derive(Clone)]
pub struct HandlerShape {
    implementation: TypeKey,
    generic_params: usize,
    families: Vec<FamilyBinding>,
    methods: Vec<MethodShape>,
    invokers: Vec<Invoker>,
}

impl HandlerShape {
    pub fn builder<T: Provider>() -> HandlerShapeBuilder<T> {
        HandlerShapeBuilder {
            shape: HandlerShape {
                implementation: TypeKey::of::<T>(),
                generic_params: 0,
                families: Vec::new(),
                methods: Vec::new(),
                invokers: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    pub fn implementation(&self) -> TypeKey {
        self.implementation
    }

    /// Number of generic parameters; non-zero for open generic handlers
    pub fn generic_params(&self) -> usize {
        self.generic_params
    }

    pub fn is_open_generic(&self) -> bool {
        self.generic_params > 0
    }

    pub fn families(&self) -> &[FamilyBinding] {
        &self.families
    }

    pub fn methods(&self) -> &[MethodShape] {
        &self.methods
    }

    /// Call method `index` on `instance`
    pub fn invoke(
        &self,
        index: usize,
        instance: &(dyn Any + Send + Sync),
        args: &Args<'_>,
    ) -> Result<Option<Value>, HandlerError> {
        let invoker = self.invokers.get(index).ok_or_else(|| {
            HandlerError::failed(format!(
                "{} has no method at index {index}",
                self.implementation.name()
            ))
        })?;
        invoker(instance, args)
    }
}

impl fmt::Debug for HandlerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerShape")
            .field("implementation", &self.implementation)
            .field("generic_params", &self.generic_params)
            .field("families", &self.families)
            .field("methods", &self.methods)
            .finish()
    }
}

/// Builds a [`HandlerShape`] for handler type `T`.
///
/// ```
/// use ductile_core::Provider;
/// use ductile_events::{HandlerError, HandlerShape, TypeRef};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct ShippingHandler {
///     shipped: AtomicUsize,
/// }
/// impl Provider for ShippingHandler {}
///
/// let shape = HandlerShape::builder::<ShippingHandler>()
///     .method("order_processed", |h: &ShippingHandler, (_id,): (i32,)| {
///         h.shipped.fetch_add(1, Ordering::SeqCst);
///         Ok::<_, HandlerError>(())
///     })
///     .build();
///
/// assert_eq!(shape.methods()[0].params(), &[TypeRef::of::<i32>()]);
/// ```
pub struct HandlerShapeBuilder<T> {
    shape: HandlerShape,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Provider> HandlerShapeBuilder<T> {
    /// Add a typed method. Parameters are taken as a tuple and cloned out of
    /// the broadcast arguments.
    pub fn method<P, R, F>(self, name: impl Into<Cow<'static, str>>, method: F) -> Self
    where
        P: Params,
        R: Send + Sync + 'static,
        F: Fn(&T, P) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        let ret = TypeRef::of::<R>();
        let returns_value = ret != TypeRef::Unit;
        let invoker: Invoker = Arc::new(move |instance: &(dyn Any + Send + Sync), args: &Args<'_>| {
            let handler = instance
                .downcast_ref::<T>()
                .ok_or(HandlerError::InstanceMismatch(type_name::<T>()))?;
            let value = method(handler, P::extract(args)?)?;
            Ok(returns_value.then(|| Box::new(value) as Value))
        });
        self.push(MethodShape::new(name, P::shapes(), ret), invoker)
    }

    /// Add a method with an explicit shape working on raw arguments.
    ///
    /// This is the only way to declare parameters of type [`TypeRef::Any`]
    /// or [`TypeRef::Param`], as used by open generic handlers.
    pub fn method_raw<F>(
        self,
        name: impl Into<Cow<'static, str>>,
        params: Vec<TypeRef>,
        ret: TypeRef,
        method: F,
    ) -> Self
    where
        F: Fn(&T, &Args<'_>) -> Result<Option<Value>, HandlerError> + Send + Sync + 'static,
    {
        let invoker: Invoker = Arc::new(move |instance: &(dyn Any + Send + Sync), args: &Args<'_>| {
            let handler = instance
                .downcast_ref::<T>()
                .ok_or(HandlerError::InstanceMismatch(type_name::<T>()))?;
            method(handler, args)
        });
        self.push(MethodShape::new(name, params, ret), invoker)
    }

    /// Declare the handler open over `count` generic parameters
    pub fn generic_params(mut self, count: usize) -> Self {
        self.shape.generic_params = count;
        self
    }

    /// Declare a generic interface family this handler serves
    pub fn implements(mut self, family: impl Into<Cow<'static, str>>, args: Vec<TypeRef>) -> Self {
        self.shape.families.push(FamilyBinding::new(family, args));
        self
    }

    pub fn build(self) -> HandlerShape {
        trace!(
            handler = self.shape.implementation.name(),
            methods = self.shape.methods.len(),
            families = self.shape.families.len(),
            "Handler shape built"
        );
        self.shape
    }

    fn push(mut self, shape: MethodShape, invoker: Invoker) -> Self {
        self.shape.methods.push(shape);
        self.shape.invokers.push(invoker);
        self
    }
}

/// A type that can take part in broadcasts.
pub trait EventHandler: Provider {
    fn shape() -> HandlerShape;
}

/// Capability marker attached to event handler registrations.
#[derive(Debug, Clone)]
pub struct EventHandlerCapability {
    shape: Arc<HandlerShape>,
}

impl EventHandlerCapability {
    pub fn new(shape: HandlerShape) -> Self {
        Self {
            shape: Arc::new(shape),
        }
    }

    pub fn shape(&self) -> &Arc<HandlerShape> {
        &self.shape
    }
}

/// Mark a registration as an event handler using the type's own shape.
pub trait AsEventHandler {
    fn as_event_handler(self) -> Self;
}

impl<T: EventHandler> AsEventHandler for RegistrationBuilder<'_, T> {
    fn as_event_handler(self) -> Self {
        self.with_capability(EventHandlerCapability::new(T::shape()))
    }
}

/// Mark a registration as an event handler with an explicitly built shape.
pub trait AsShapedEventHandler {
    fn as_event_handler_with(self, shape: HandlerShape) -> Self;
}

impl<T: Provider> AsShapedEventHandler for RegistrationBuilder<'_, T> {
    fn as_event_handler_with(self, shape: HandlerShape) -> Self {
        if shape.implementation() != TypeKey::of::<T>() {
            warn!(
                registration = %self.id(),
                provider = type_name::<T>(),
                shape = shape.implementation().name(),
                "Handler shape was built for a different type"
            );
        }
        self.with_capability(EventHandlerCapability::new(shape))
    }
}
