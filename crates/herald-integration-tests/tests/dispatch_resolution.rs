//! Integration tests for handler resolution through the synchronous emitter.

use std::any::type_name;
use std::sync::{Arc, Mutex};

use herald_events::{
    Delivery, DispatchError, EmitReport, Emitter, EmitterId, EventEmitter, Listener,
};
use herald_test::{
    Alert, Critical, Ping, RecordingListener, Tick, setup_test_logging, test_alert, test_critical,
    test_ping,
};

#[test]
fn test_hierarchy_resolution_across_listeners() {
    setup_test_logging("herald_events=trace");

    let emitter = Emitter::new();
    let pings = Arc::new(RecordingListener::builder("pings").record::<Ping>().build());
    let alerts = Arc::new(
        RecordingListener::builder("alerts")
            .record::<Ping>()
            .record::<Alert>()
            .build(),
    );
    let catch_all = Arc::new(RecordingListener::builder("all").record_any().build());
    for listener in [&pings, &alerts, &catch_all] {
        emitter.add_listener(Arc::clone(listener) as Arc<dyn Listener>);
    }

    let report = emitter.emit(&test_critical(3, "db-down"));
    assert!(report.is_clean());
    assert_eq!(report.delivered, 3);

    assert_eq!(pings.handler_types(), vec![type_name::<Ping>()]);
    assert_eq!(pings.received()[0].event, "Ping { seq: 3 }");
    assert_eq!(alerts.handler_types(), vec![type_name::<Alert>()]);
    assert_eq!(catch_all.handler_types(), vec!["*"]);
    assert!(catch_all.received()[0].event.starts_with("Critical {"));
}

#[test]
fn test_resolution_is_stable_across_emits() {
    let emitter = Emitter::new();
    let listener = Arc::new(
        RecordingListener::builder("stable")
            .record::<Alert>()
            .record_any()
            .build(),
    );
    emitter.add_listener(Arc::clone(&listener) as Arc<dyn Listener>);

    for seq in 0..10 {
        emitter.emit(&test_critical(seq, "x"));
    }
    assert!(
        listener
            .handler_types()
            .iter()
            .all(|handler| *handler == type_name::<Alert>())
    );
}

#[test]
fn test_failures_isolated_and_reported() {
    let failures = Arc::new(Mutex::new(Vec::new()));
    let failures_clone = Arc::clone(&failures);
    let emitter = Emitter::builder()
        .catch_exceptions(true)
        .failure_hook(move |error: &DispatchError, delivery: &Delivery| {
            failures_clone.lock().unwrap().push((
                error.listener().to_string(),
                error.is_invocation(),
                delivery.sequence(),
            ));
        })
        .build();

    let failing = Arc::new(RecordingListener::builder("l1").failing::<Ping>("l1 broke").build());
    let panicking = Arc::new(RecordingListener::builder("l2").panicking::<Alert>("l2 broke").build());
    let deaf = Arc::new(RecordingListener::builder("l3").record::<Tick>().build());
    let healthy = Arc::new(RecordingListener::builder("l4").record::<Ping>().build());
    for listener in [&failing, &panicking, &deaf, &healthy] {
        emitter.add_listener(Arc::clone(listener) as Arc<dyn Listener>);
    }

    let report = emitter.emit(&test_alert(1, 2));
    assert_eq!(
        report,
        EmitReport {
            attempted: 4,
            delivered: 1,
            unhandled: 1,
            failed: 2,
        }
    );
    assert_eq!(healthy.count(), 1);

    let mut failures = failures.lock().unwrap().clone();
    failures.sort();
    assert_eq!(
        failures,
        vec![
            ("l1".to_string(), true, 0),
            ("l2".to_string(), true, 0),
            ("l3".to_string(), false, 0),
        ]
    );
}

#[test]
fn test_identity_through_trait_object() {
    let identity = EmitterId::new();
    let emitter: Box<dyn EventEmitter> = Box::new(Emitter::with_identity(identity));
    let listener = Arc::new(RecordingListener::builder("ctx").record::<Ping>().build());
    emitter.add_listener(Arc::clone(&listener) as Arc<dyn Listener>);

    emitter.emit(Arc::new(test_ping(1)));
    emitter.emit(Arc::new(test_alert(2, 1)));

    let received = listener.received();
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|r| r.delivery.emitter() == identity));
    assert_eq!(emitter.identity(), identity);
}

#[test]
fn test_handler_can_reenter_emitter() {
    let emitter = Arc::new(Emitter::new());
    let nested = Arc::new(RecordingListener::builder("nested").record::<Tick>().build());
    emitter.add_listener(Arc::clone(&nested) as Arc<dyn Listener>);

    let weak = Arc::downgrade(&emitter);
    emitter.add_listener(Arc::new(herald_events::FnListener::new(
        "relay",
        herald_events::Handlers::new().on(move |_: &Critical, _| {
            if let Some(emitter) = weak.upgrade() {
                emitter.emit(&Tick);
            }
            Ok(())
        }),
    )));

    emitter.emit(&test_critical(1, "relay"));
    assert_eq!(nested.count(), 1);
    assert_eq!(nested.received()[0].delivery.sequence(), 1);
}
