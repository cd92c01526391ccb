//! Declarative macros for event interfaces

/// Declare an event interface and generate its broadcast proxy.
///
/// Every method becomes a forwarding method on the generated struct.
/// Methods without a return type return `Result<(), EventError>`; methods
/// returning `R` return `Result<Option<R>, EventError>` holding the value of
/// the last handler invoked. Argument types must be `Send + Sync + 'static`.
///
/// A single type parameter turns the interface into a generic family whose
/// handlers are matched per type argument.
///
/// # Examples
///
/// ```
/// use ductile_events::event_interface;
///
/// event_interface! {
///     /// Order lifecycle
///     pub interface OrderEvents {
///         fn order_processed(order_id: i32);
///         fn order_total(order_id: i32) -> u64;
///     }
/// }
///
/// event_interface! {
///     pub interface EntityEvents<T> {
///         fn entity_added(entity: T);
///     }
/// }
/// ```
#[macro_export]
macro_rules! event_interface {
    (
        $(#[$meta:meta])*
        $vis:vis interface $name:ident < $param_ty:ident > {
            $(
                $(#[$method_meta:meta])*
                fn $method:ident ( $($arg:ident : $arg_ty:ty),* $(,)? ) $(-> $ret:ty)? ;
            )+
        }
    ) => {
        $(#[$meta])*
        $vis struct $name<$param_ty> {
            broadcaster: $crate::Broadcaster,
            _marker: ::std::marker::PhantomData<fn() -> $param_ty>,
        }

        impl<$param_ty: Send + Sync + 'static> $crate::__private::Provider for $name<$param_ty> {}

        impl<$param_ty: Send + Sync + 'static> $crate::EventInterface for $name<$param_ty> {
            fn contract() -> $crate::Contract {
                $crate::Contract::generic(concat!(module_path!(), "::", stringify!($name)), 1)
                    $(
                        .method(
                            stringify!($method),
                            vec![$($crate::TypeRef::of::<$arg_ty>()),*],
                            $crate::__event_ret_shape!($($ret)?),
                        )
                    )+
                    .with_type_args(vec![$crate::TypeRef::of::<$param_ty>()])
            }

            fn from_broadcaster(broadcaster: $crate::Broadcaster) -> Self {
                Self {
                    broadcaster,
                    _marker: ::std::marker::PhantomData,
                }
            }

            fn broadcaster(&self) -> &$crate::Broadcaster {
                &self.broadcaster
            }
        }

        impl<$param_ty: Send + Sync + 'static> $name<$param_ty> {
            $(
                $(#[$method_meta])*
                pub fn $method(&self, $($arg: $arg_ty),*) -> $crate::__event_ret_type!($($ret)?) {
                    $crate::__event_dispatch!(&self.broadcaster, $method, [$($arg),*] $(, $ret)?)
                }
            )+
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis interface $name:ident {
            $(
                $(#[$method_meta:meta])*
                fn $method:ident ( $($arg:ident : $arg_ty:ty),* $(,)? ) $(-> $ret:ty)? ;
            )+
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            broadcaster: $crate::Broadcaster,
        }

        impl $crate::__private::Provider for $name {}

        impl $crate::EventInterface for $name {
            fn contract() -> $crate::Contract {
                $crate::Contract::new(concat!(module_path!(), "::", stringify!($name)))
                    $(
                        .method(
                            stringify!($method),
                            vec![$($crate::TypeRef::of::<$arg_ty>()),*],
                            $crate::__event_ret_shape!($($ret)?),
                        )
                    )+
            }

            fn from_broadcaster(broadcaster: $crate::Broadcaster) -> Self {
                Self { broadcaster }
            }

            fn broadcaster(&self) -> &$crate::Broadcaster {
                &self.broadcaster
            }
        }

        impl $name {
            $(
                $(#[$method_meta])*
                pub fn $method(&self, $($arg: $arg_ty),*) -> $crate::__event_ret_type!($($ret)?) {
                    $crate::__event_dispatch!(&self.broadcaster, $method, [$($arg),*] $(, $ret)?)
                }
            )+
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __event_ret_shape {
    () => {
        $crate::TypeRef::Unit
    };
    ($ret:ty) => {
        $crate::TypeRef::of::<$ret>()
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __event_ret_type {
    () => {
        ::std::result::Result<(), $crate::EventError>
    };
    ($ret:ty) => {
        ::std::result::Result<::std::option::Option<$ret>, $crate::EventError>
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __event_dispatch {
    ($broadcaster:expr, $method:ident, [$($arg:ident),*]) => {
        $broadcaster.notify(
            stringify!($method),
            &[$(&$arg as &(dyn ::std::any::Any + Send + Sync)),*],
        )
    };
    ($broadcaster:expr, $method:ident, [$($arg:ident),*], $ret:ty) => {
        $broadcaster.call::<$ret>(
            stringify!($method),
            &[$(&$arg as &(dyn ::std::any::Any + Send + Sync)),*],
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::{Contract, EventInterface, TypeRef};

    event_interface! {
        interface Inventory {
            fn restocked(sku: String, quantity: u32);
            fn stock_level(sku: String) -> u32;
            fn flushed();
        }
    }

    event_interface! {
        interface Changes<T> {
            fn changed(before: T, after: T,);
        }
    }

    #[test]
    fn test_plain_contract() {
        let contract: Contract = Inventory::contract();
        assert!(contract.name().ends_with("::Inventory"));
        assert!(!contract.is_generic());

        let methods = contract.methods();
        assert_eq!(methods.len(), 3);
        assert_eq!(
            methods[0].params(),
            &[TypeRef::of::<String>(), TypeRef::of::<u32>()]
        );
        assert_eq!(methods[1].ret(), &TypeRef::of::<u32>());
        assert_eq!(methods[2].arity(), 0);
        assert!(contract.validate().is_ok());
    }

    #[test]
    fn test_generic_contract() {
        let contract = Changes::<u64>::contract();
        assert_eq!(contract.simple_name(), "Changes");
        assert_eq!(contract.type_args(), &[TypeRef::of::<u64>()]);
        assert_eq!(contract.methods()[0].params()[1], TypeRef::of::<u64>());
        assert!(contract.validate().is_ok());
        assert_ne!(
            Changes::<u64>::contract().cache_key(),
            Changes::<String>::contract().cache_key()
        );
    }
}
