use std::time::Duration;

use bytes_counter::CounterConfig;
use bytes_counter::SizeCoordinator;
use bytes_counter::SizeEvent;
use tokio::sync::mpsc;

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

pub fn enable_logger() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Coordinator wired to the built-in body host.
pub fn native_coordinator(
    config: CounterConfig,
) -> (SizeCoordinator, mpsc::UnboundedReceiver<SizeEvent>) {
    enable_logger();
    let coordinator = SizeCoordinator::builder(config)
        .build()
        .expect("tests run inside a runtime");
    let events = coordinator.subscribe();
    (coordinator, events)
}

pub async fn settled_size(events: &mut mpsc::UnboundedReceiver<SizeEvent>) -> u64 {
    match tokio::time::timeout(EVENT_TIMEOUT, events.recv()).await {
        Ok(Some(SizeEvent::SizeChanged { value })) => value,
        other => panic!("expected a settled size, got {other:?}"),
    }
}

/// Length of a `multipart/form-data` body holding text fields only.
pub fn multipart_text_len(
    config: &CounterConfig,
    fields: &[(&str, &str)],
) -> u64 {
    let boundary = config.serializer.boundary_prefix.len() + config.serializer.boundary_length;
    let mut len = 0;
    for (name, value) in fields {
        len += 2 + boundary + 2;
        len += format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").len();
        len += value.len() + 2;
    }
    len += 2 + boundary + 4;
    len as u64
}
