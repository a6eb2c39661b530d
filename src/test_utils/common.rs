use std::time::Duration;

use tokio::sync::mpsc;

use crate::SizeEvent;

pub(crate) const EVENT_TIMEOUT: Duration = Duration::from_secs(1);
pub(crate) const QUIET_PERIOD: Duration = Duration::from_millis(50);

/// Waits for the next event, failing the test if none arrives.
pub(crate) async fn next_event(rx: &mut mpsc::UnboundedReceiver<SizeEvent>) -> SizeEvent {
    tokio::time::timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a size event")
        .expect("coordinator dropped the listener")
}

/// Asserts nothing is emitted during a quiet period.
pub(crate) async fn assert_no_event(rx: &mut mpsc::UnboundedReceiver<SizeEvent>) {
    if let Ok(event) = tokio::time::timeout(QUIET_PERIOD, rx.recv()).await {
        panic!("unexpected event: {event:?}");
    }
}

pub(crate) fn size_changed(value: u64) -> SizeEvent {
    SizeEvent::SizeChanged { value }
}
