// Broadcast behaviour through a real container

use ductile_core::{Container, ContainerBuilder, Provider};
use ductile_events::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

event_interface! {
    pub interface PaymentEvents {
        fn payment_received(amount: u64, currency: String);
        fn payment_refunded(amount: u64);
    }
}

event_interface! {
    pub interface QuoteEvents {
        fn quote(sku: String) -> u64;
    }
}

event_interface! {
    pub interface NoticeBoard {
        fn posted(message: String);
    }
}

/// Serves both payment methods with exact types
#[derive(Default)]
struct Accounting {
    received: AtomicUsize,
    refunded: AtomicUsize,
}
impl Provider for Accounting {}

impl EventHandler for Accounting {
    fn shape() -> HandlerShape {
        HandlerShape::builder::<Self>()
            .method("payment_received", |h: &Self, (amount, _currency): (u64, String)| {
                h.received.fetch_add(amount as usize, Ordering::SeqCst);
                Ok(())
            })
            .method("payment_refunded", |h: &Self, (amount,): (u64,)| {
                h.refunded.fetch_add(amount as usize, Ordering::SeqCst);
                Ok(())
            })
            .build()
    }
}

/// Only knows about refunds, so never matches the whole interface
#[derive(Default)]
struct RefundDesk {
    calls: AtomicUsize,
}
impl Provider for RefundDesk {}

impl EventHandler for RefundDesk {
    fn shape() -> HandlerShape {
        HandlerShape::builder::<Self>()
            .method("payment_refunded", |h: &Self, (_amount,): (u64,)| {
                h.calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
    }
}

/// Takes any payload for every method
#[derive(Default)]
struct AuditTrail {
    entries: AtomicUsize,
}
impl Provider for AuditTrail {}

fn record(h: &AuditTrail, args: &Args<'_>) -> Result<Option<Value>, HandlerError> {
    h.entries.fetch_add(args.len(), Ordering::SeqCst);
    Ok(None)
}

fn audit_shape() -> HandlerShape {
    HandlerShape::builder::<AuditTrail>()
        .method_raw("payment_received", vec![TypeRef::Any, TypeRef::Any], TypeRef::Unit, record)
        .method_raw("payment_refunded", vec![TypeRef::Any], TypeRef::Unit, record)
        .build()
}

fn payments(builder: &mut ContainerBuilder) {
    builder.register_module(EventsModule::new().interface::<PaymentEvents>());
}

#[test]
fn test_structural_match_requires_every_method() {
    let accounting = Arc::new(Accounting::default());
    let refunds = Arc::new(RefundDesk::default());

    let mut builder = Container::builder();
    builder.register_shared(Arc::clone(&accounting)).as_event_handler();
    builder.register_shared(Arc::clone(&refunds)).as_event_handler();
    payments(&mut builder);
    let container = builder.build();

    let proxy = container.resolve::<PaymentEvents>().unwrap();
    proxy.payment_received(40, "EUR".to_string()).unwrap();
    proxy.payment_refunded(15).unwrap();

    assert_eq!(accounting.received.load(Ordering::SeqCst), 40);
    assert_eq!(accounting.refunded.load(Ordering::SeqCst), 15);
    assert_eq!(refunds.calls.load(Ordering::SeqCst), 0);
    assert_eq!(proxy.broadcaster().handler_count(), 1);
}

#[test]
fn test_any_parameters_accept_every_argument() {
    let audit = Arc::new(AuditTrail::default());

    let mut builder = Container::builder();
    builder
        .register_shared(Arc::clone(&audit))
        .as_event_handler_with(audit_shape());
    payments(&mut builder);
    let container = builder.build();

    let proxy = container.resolve::<PaymentEvents>().unwrap();
    proxy.payment_received(1, "USD".to_string()).unwrap();
    proxy.payment_refunded(1).unwrap();

    assert_eq!(audit.entries.load(Ordering::SeqCst), 3);
}

#[test]
fn test_ambiguous_handler_is_skipped() {
    let audit = Arc::new(AuditTrail::default());
    let shape = HandlerShape::builder::<AuditTrail>()
        .method_raw("posted", vec![TypeRef::Any], TypeRef::Unit, |h, _| {
            h.entries.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        })
        .method("posted", |h: &AuditTrail, (_message,): (String,)| {
            h.entries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build();

    let mut builder = Container::builder();
    builder.register_shared(Arc::clone(&audit)).as_event_handler_with(shape);
    let container = builder.build();

    let board = container.resolve_events::<NoticeBoard>().unwrap();
    board.posted("closed on friday".to_string()).unwrap();

    assert_eq!(board.broadcaster().handler_count(), 0);
    assert_eq!(audit.entries.load(Ordering::SeqCst), 0);
}

struct PriceList {
    price: u64,
}
impl Provider for PriceList {}

impl EventHandler for PriceList {
    fn shape() -> HandlerShape {
        HandlerShape::builder::<Self>()
            .method("quote", |h: &Self, (_sku,): (String,)| Ok(h.price))
            .build()
    }
}

struct Failing;
impl Provider for Failing {}

impl EventHandler for Failing {
    fn shape() -> HandlerShape {
        HandlerShape::builder::<Self>()
            .method("quote", |_: &Self, (sku,): (String,)| -> Result<u64, HandlerError> {
                Err(HandlerError::failed(format!("no price for {sku}")))
            })
            .build()
    }
}

#[test]
fn test_value_of_last_handler_is_returned() {
    let mut builder = Container::builder();
    builder.register_instance(PriceList { price: 10 }).as_event_handler();
    builder.register_instance(PriceList { price: 12 }).as_event_handler();
    let container = builder.build();

    let quotes = container.resolve_events::<QuoteEvents>().unwrap();
    assert_eq!(quotes.quote("sku-1".to_string()).unwrap(), Some(12));
}

#[test]
fn test_no_handler_returns_none() {
    let container = Container::new();
    let quotes = container.resolve_events::<QuoteEvents>().unwrap();
    assert_eq!(quotes.quote("sku-1".to_string()).unwrap(), None);
}

#[test]
fn test_handler_error_stops_broadcast() {
    let mut builder = Container::builder();
    builder.register_instance(PriceList { price: 10 }).as_event_handler();
    builder.register(|_| Ok(Failing)).as_event_handler();
    builder.register_instance(PriceList { price: 12 }).as_event_handler();
    let container = builder.build();

    let quotes = container.resolve_events::<QuoteEvents>().unwrap();
    let err = quotes.quote("sku-9".to_string()).unwrap_err();

    match err {
        EventError::Handler { handler, method, source } => {
            assert!(handler.ends_with("Failing"));
            assert_eq!(method, "quote");
            assert!(source.to_string().contains("no price for sku-9"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_scoped_handlers_follow_the_proxy_scope() {
    #[derive(Default)]
    struct RequestLog {
        lines: AtomicUsize,
    }
    impl Provider for RequestLog {}
    impl EventHandler for RequestLog {
        fn shape() -> HandlerShape {
            HandlerShape::builder::<Self>()
                .method("posted", |h: &Self, (_message,): (String,)| {
                    h.lines.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build()
        }
    }

    let mut builder = Container::builder();
    builder
        .register(|_| Ok(RequestLog::default()))
        .scoped()
        .as_self()
        .as_event_handler();
    builder.register_module(EventsModule::new().interface::<NoticeBoard>());
    let container = builder.build();

    let first = container.begin_scope();
    let second = container.begin_scope();

    first.resolve::<NoticeBoard>().unwrap().posted("a".to_string()).unwrap();
    first.resolve::<NoticeBoard>().unwrap().posted("b".to_string()).unwrap();
    second.resolve::<NoticeBoard>().unwrap().posted("c".to_string()).unwrap();

    assert_eq!(first.resolve::<RequestLog>().unwrap().lines.load(Ordering::SeqCst), 2);
    assert_eq!(second.resolve::<RequestLog>().unwrap().lines.load(Ordering::SeqCst), 1);
}

#[test]
fn test_runtime_is_registered_once_with_config() {
    let config = EventsConfig::builder().cache_matches(false).build();
    let mut builder = Container::builder();
    builder.register_module(EventsModule::with_config(config).interface::<NoticeBoard>());
    let container = builder.build();

    let runtime = container.resolve::<EventsRuntime>().unwrap();
    assert!(!runtime.config().cache_matches);

    container.resolve::<NoticeBoard>().unwrap().posted("x".to_string()).unwrap();
    assert_eq!(runtime.cached_contracts(), 0);
}

#[test]
fn test_undeclared_interface_is_not_resolvable() {
    let mut builder = Container::builder();
    builder.register_module(EventsModule::new().interface::<NoticeBoard>());
    let container = builder.build();

    assert!(container.has::<NoticeBoard>());
    assert!(!container.has::<QuoteEvents>());
    assert!(container.resolve::<QuoteEvents>().is_err());
    assert!(container.resolve_events::<QuoteEvents>().is_ok());
}

#[derive(Default)]
struct Shipping {
    shipped: AtomicUsize,
}
impl Provider for Shipping {}

impl EventHandler for Shipping {
    fn shape() -> HandlerShape {
        HandlerShape::builder::<Self>()
            .method("shipped", |h: &Self, (_id,): (u32,)| {
                h.shipped.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
    }
}

#[derive(Default)]
struct Billing {
    billed: AtomicUsize,
}
impl Provider for Billing {}

impl EventHandler for Billing {
    fn shape() -> HandlerShape {
        HandlerShape::builder::<Self>()
            .method("billed", |h: &Self, (_id,): (u32,)| {
                h.billed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
    }
}

fn ship(container: &Container) -> Result<usize, EventError> {
    event_interface! {
        interface Alerts {
            fn shipped(id: u32);
        }
    }

    let alerts = container.resolve_events::<Alerts>()?;
    alerts.shipped(1)?;
    Ok(alerts.broadcaster().handler_count())
}

fn bill(container: &Container) -> Result<usize, EventError> {
    event_interface! {
        interface Alerts {
            fn billed(id: u32);
        }
    }

    let alerts = container.resolve_events::<Alerts>()?;
    alerts.billed(1)?;
    Ok(alerts.broadcaster().handler_count())
}

#[test]
fn test_same_named_interfaces_keep_their_own_handlers() {
    let shipping = Arc::new(Shipping::default());
    let billing = Arc::new(Billing::default());

    let mut builder = Container::builder();
    builder.register_shared(Arc::clone(&shipping)).as_event_handler();
    builder.register_shared(Arc::clone(&billing)).as_event_handler();
    builder.register_module(EventsModule::new());
    let container = builder.build();

    assert_eq!(ship(&container).unwrap(), 1);
    assert_eq!(bill(&container).unwrap(), 1);

    assert_eq!(shipping.shipped.load(Ordering::SeqCst), 1);
    assert_eq!(billing.billed.load(Ordering::SeqCst), 1);
    assert_eq!(container.resolve::<EventsRuntime>().unwrap().cached_contracts(), 2);
}

#[test]
fn test_module_runtime_cache_is_shared_by_proxies() {
    let mut builder = Container::builder();
    builder.register_instance(PriceList { price: 7 }).as_event_handler();
    builder.register_module(EventsModule::new());
    let container = builder.build();
    let runtime = container.resolve::<EventsRuntime>().unwrap();

    assert_eq!(container.resolve_events::<QuoteEvents>().unwrap().quote("a".to_string()).unwrap(), Some(7));
    let scope = container.begin_scope();
    assert_eq!(scope.resolve_events::<QuoteEvents>().unwrap().quote("b".to_string()).unwrap(), Some(7));

    assert_eq!(runtime.cached_contracts(), 1);
}
