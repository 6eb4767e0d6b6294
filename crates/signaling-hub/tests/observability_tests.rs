//! Logging setup and metric emission through real hub operations.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use common::config::ObservabilityConfig;
use common::observability::{init_tracing, ObservabilityError};
use hub_test_utils::{ready, FailingWriter, TestClient};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use signaling_hub::{Client, MemoryAdapter, RoomAdapter};
use std::sync::Arc;

const ROOM: &str = "metrics-room";

#[test]
fn test_init_tracing_installs_once() {
    let config = ObservabilityConfig {
        log_level: "signaling_hub=debug".to_string(),
        json_logs: true,
    };

    assert!(init_tracing(&config).is_ok());
    assert!(matches!(
        init_tracing(&config),
        Err(ObservabilityError::AlreadyInstalled(_))
    ));
}

#[test]
fn test_adapter_operations_emit_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let adapter = MemoryAdapter::new(ROOM);
            let (a, _written_a) = TestClient::new().build();
            let b = Client::new(FailingWriter::new());

            adapter.add(Arc::clone(&a)).await.unwrap();
            adapter.add(Arc::clone(&b)).await.unwrap();
            adapter.broadcast(ready(ROOM, "test")).await.unwrap();
        });
    });

    let snapshot = snapshotter.snapshot().into_vec();
    let value_of = |name: &str, label: Option<&str>| {
        snapshot
            .iter()
            .find(|(key, _, _, _)| {
                key.key().name() == name
                    && label.map_or(true, |label| {
                        key.key().labels().any(|l| l.value() == label)
                    })
            })
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(v) => DebugValue::Counter(*v),
                DebugValue::Gauge(v) => DebugValue::Gauge(*v),
                DebugValue::Histogram(v) => DebugValue::Histogram(v.clone()),
            })
    };

    assert_eq!(
        value_of("hub_clients_joined_total", None),
        Some(DebugValue::Counter(2))
    );
    // a: join(a), join(b), ready. b: every write fails.
    assert_eq!(
        value_of("hub_messages_delivered_total", Some("room-join")),
        Some(DebugValue::Counter(2))
    );
    assert_eq!(
        value_of("hub_messages_delivered_total", Some("ready")),
        Some(DebugValue::Counter(1))
    );
    assert_eq!(
        value_of("hub_write_failures_total", None),
        Some(DebugValue::Counter(2))
    );
}
