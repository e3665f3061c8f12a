//! Integration tests for building emitters from configuration files.

use std::sync::Arc;

use herald_events::{AsyncEmitterBuilder, ConfigError, EmitterConfig, Listener, SchedulerKind};
use herald_test::{Job, RecordingListener, Tick, assert_idle, test_config_file, test_job};

#[test]
fn test_priority_emitter_from_file() {
    let file = test_config_file(
        r#"
        scheduler = "priority"
        catch_exceptions = true
        worker_name = "config-drain"
        "#,
    );
    let config = EmitterConfig::load_file(file.path()).unwrap();
    assert_eq!(config.scheduler, SchedulerKind::Priority);

    let emitter = AsyncEmitterBuilder::from_config(config).build().unwrap();
    assert_eq!(emitter.worker_name(), "config-drain");

    let recorder = Arc::new(
        RecordingListener::builder("jobs")
            .record::<Job>()
            .record::<Tick>()
            .build(),
    );
    emitter.add_listener(Arc::clone(&recorder) as Arc<dyn Listener>);

    emitter.emit(test_job("only", 5));
    assert_idle(&emitter);
    assert_eq!(recorder.count(), 1);
    assert_eq!(recorder.received()[0].thread.as_deref(), Some("config-drain"));
}

#[test]
fn test_invalid_file_rejected() {
    let file = test_config_file("scheduler = 3\n");
    let err = EmitterConfig::load_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_blank_worker_name_in_file_rejected() {
    let file = test_config_file("worker_name = \"\"\n");
    let err = EmitterConfig::load_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));
}
