//! Integration tests for the asynchronous emitter.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use herald_events::{AsyncEmitter, Delivery, DispatchError, EmitterId, Listener, PriorityScheduler};
use herald_test::{
    ConcurrencyGauge, Job, Ping, RecordingListener, Tick, assert_idle, setup_test_logging_default,
    test_job, test_ping,
};

#[test]
fn test_concurrent_producers_never_overlap_deliveries() {
    setup_test_logging_default();

    let emitter = Arc::new(AsyncEmitter::new());
    let gauge = Arc::new(ConcurrencyGauge::with_delay(Duration::from_micros(20)));
    emitter.add_listener(Arc::clone(&gauge) as Arc<dyn Listener>);

    let producers: Vec<_> = (0..8)
        .map(|_| {
            let emitter = Arc::clone(&emitter);
            thread::spawn(move || {
                for seq in 0..50 {
                    emitter.emit(test_ping(seq));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert_idle(&emitter);
    assert_eq!(gauge.total(), 400);
    assert_eq!(gauge.max_active(), 1);
}

#[test]
fn test_concurrent_producers_with_priority_scheduler() {
    let emitter = Arc::new(AsyncEmitter::with_scheduler(PriorityScheduler::<i64>::new()));
    let gauge = Arc::new(ConcurrencyGauge::new());
    emitter.add_listener(Arc::clone(&gauge) as Arc<dyn Listener>);

    let producers: Vec<_> = (0..4_i64)
        .map(|worker| {
            let emitter = Arc::clone(&emitter);
            thread::spawn(move || {
                for n in 0..25_i64 {
                    emitter.emit(test_job(format!("w{worker}-{n}"), n));
                    emitter.emit(Tick);
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert_idle(&emitter);
    assert_eq!(gauge.total(), 200);
    assert_eq!(gauge.max_active(), 1);
}

#[test]
fn test_priority_backlog_delivered_plain_first_then_by_key() {
    let emitter = AsyncEmitter::with_scheduler(PriorityScheduler::<i64>::new());
    let recorder = Arc::new(
        RecordingListener::builder("order")
            .record::<Ping>()
            .record::<Job>()
            .record::<Tick>()
            .build(),
    );
    let blocker = Arc::new(ConcurrencyGauge::with_delay(Duration::from_millis(200)));

    // The gauge stalls the worker on the first event so the rest pile up.
    emitter.add_listener(Arc::clone(&blocker) as Arc<dyn Listener>);
    emitter.emit(Tick);
    emitter.add_listener(Arc::clone(&recorder) as Arc<dyn Listener>);

    emitter.emit(test_job("p2", 2));
    emitter.emit(test_job("p1", 1));
    emitter.emit(test_ping(1));
    emitter.emit(test_job("p1-late", 1));
    emitter.emit(test_ping(2));
    assert_idle(&emitter);

    let events: Vec<String> = recorder
        .received()
        .into_iter()
        .map(|received| received.event)
        .collect();
    let tail: Vec<&str> = events.iter().rev().take(5).rev().map(String::as_str).collect();
    assert_eq!(
        tail,
        vec![
            "Ping { seq: 1 }",
            "Ping { seq: 2 }",
            r#"Job { name: "p1", priority: 1 }"#,
            r#"Job { name: "p1-late", priority: 1 }"#,
            r#"Job { name: "p2", priority: 2 }"#,
        ]
    );
}

#[test]
fn test_deliveries_share_worker_thread_and_identity() {
    let identity = EmitterId::new();
    let emitter = AsyncEmitter::builder()
        .identity(identity)
        .worker_name("it-drain")
        .build()
        .unwrap();
    let recorder = Arc::new(RecordingListener::builder("ctx").record::<Ping>().build());
    emitter.add_listener(Arc::clone(&recorder) as Arc<dyn Listener>);

    for seq in 0..5 {
        emitter.emit(test_ping(seq));
    }
    assert_idle(&emitter);

    let received = recorder.received();
    assert_eq!(received.len(), 5);
    for (expected_seq, received) in (0_u64..).zip(&received) {
        assert_eq!(received.delivery.emitter(), identity);
        assert_eq!(received.delivery.sequence(), expected_seq);
        assert_eq!(received.thread.as_deref(), Some("it-drain"));
    }
}

#[test]
fn test_drop_delivers_everything_queued() {
    let recorder = Arc::new(RecordingListener::builder("late").record::<Ping>().build());
    {
        let emitter = AsyncEmitter::new();
        emitter.add_listener(Arc::clone(&recorder) as Arc<dyn Listener>);
        for seq in 0..200 {
            emitter.emit(test_ping(seq));
        }
    }
    assert_eq!(recorder.count(), 200);
}

#[test]
fn test_emitter_usable_after_going_idle() {
    let emitter = AsyncEmitter::new();
    let recorder = Arc::new(RecordingListener::builder("rec").record::<Ping>().build());
    emitter.add_listener(Arc::clone(&recorder) as Arc<dyn Listener>);

    emitter.emit(test_ping(1));
    assert_idle(&emitter);
    assert!(!emitter.is_draining());

    emitter.emit(test_ping(2));
    assert_idle(&emitter);
    assert_eq!(recorder.count(), 2);
}

fn exploding_hook(_: &DispatchError, _: &Delivery) {
    panic!("hook exploded");
}

#[test]
fn test_panicking_hook_does_not_starve_healthy_listener() {
    let emitter = AsyncEmitter::builder()
        .catch_exceptions(true)
        .failure_hook(exploding_hook)
        .build()
        .unwrap();
    for n in 0..8 {
        let ticks = RecordingListener::builder(format!("ticks-{n}"))
            .record::<Tick>()
            .build();
        emitter.add_listener(Arc::new(ticks));
    }
    let healthy = Arc::new(RecordingListener::builder("healthy").record::<Ping>().build());
    emitter.add_listener(Arc::clone(&healthy) as Arc<dyn Listener>);

    for seq in 0..20 {
        emitter.emit(test_ping(seq));
    }
    assert_idle(&emitter);

    assert_eq!(healthy.count(), 20);
}
