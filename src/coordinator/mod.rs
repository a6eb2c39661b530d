//! Owns the value → size relationship.
//!
//! Value assignments are debounced: a burst of assignments arms a single timer
//! and only the value current when it fires is measured. Every accepted
//! assignment bumps a generation counter; a computation whose captured
//! generation is no longer current when it completes is stale, and its result
//! is dropped without touching the published size or notifying anyone.
//!
//! ```text
//!            set_value              timer fires            live result
//!   Idle ───────────────▶ Scheduled ───────────▶ Computing ───────────▶ Publishing ──▶ Idle
//!    ▲                    │  ▲   set_value                │ set_value
//!    └── cancel_pending ──┘  └─────────────────────────────┘ (result marked stale)
//! ```
mod builder;
pub use builder::*;


use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::encoder;
use crate::metrics;
use crate::CompositeSerializer;
use crate::SerializeError;
use crate::Value;

/// Notifications emitted by a [`SizeCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeEvent {
    /// A settled, non-superseded value was measured
    SizeChanged { value: u64 },
    /// The composite serializer failed
    ComputationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No computation pending
    Idle,
    /// A timer is armed for the current value
    Scheduled,
    /// The live computation is running
    Computing,
    /// The live result is being published
    Publishing,
}

/// The value under evaluation when a computation was dispatched.
#[derive(Debug, Clone)]
pub(crate) struct ComputationRequest {
    pub(crate) generation: u64,
    pub(crate) value: Arc<Value>,
}

struct CoordinatorState {
    /// `None` until the first assignment
    value: Option<Arc<Value>>,
    generation: u64,
    size: Option<u64>,
    phase: Phase,
    /// Present only while Scheduled
    timer: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<CoordinatorState>,
    listeners: Mutex<Vec<mpsc::UnboundedSender<SizeEvent>>>,
    serializer: CompositeSerializer,
    debounce: Option<Duration>,
    runtime: Handle,
}

/// Keeps a published byte size in sync with a rapidly changing value.
///
/// Cloning yields another handle to the same coordinator.
#[derive(Clone)]
pub struct SizeCoordinator {
    shared: Arc<Shared>,
}

impl SizeCoordinator {
    pub(crate) fn new(
        serializer: CompositeSerializer,
        debounce: Option<Duration>,
        runtime: Handle,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CoordinatorState {
                    value: None,
                    generation: 0,
                    size: None,
                    phase: Phase::Idle,
                    timer: None,
                }),
                listeners: Mutex::new(Vec::new()),
                serializer,
                debounce,
                runtime,
            }),
        }
    }

    /// Tracks `value`, scheduling a recomputation if it differs from the
    /// current one.
    ///
    /// `Absent` publishes `0` immediately without dispatching anything. Never
    /// fails.
    pub fn set_value(
        &self,
        value: impl Into<Value>,
    ) {
        let value = value.into();
        let mut state = self.shared.state.lock();
        if state.value.as_deref() == Some(&value) {
            trace!("set_value: unchanged {:?} value, skipping", value.kind());
            return;
        }

        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            trace!("set_value: superseding scheduled computation");
            timer.abort();
        }

        if value.is_absent() {
            state.value = Some(Arc::new(value));
            state.size = Some(0);
            state.phase = Phase::Idle;
            self.shared.notify(SizeEvent::SizeChanged { value: 0 });
            return;
        }

        if state.phase == Phase::Computing {
            debug!("set_value: in-flight computation is now stale");
        }
        state.value = Some(Arc::new(value));
        state.phase = Phase::Scheduled;
        let generation = state.generation;
        let shared = Arc::clone(&self.shared);
        state.timer = Some(self.shared.runtime.spawn(shared.run_scheduled(generation)));
    }

    /// The currently tracked value.
    pub fn value(&self) -> Arc<Value> {
        match &self.shared.state.lock().value {
            Some(value) => Arc::clone(value),
            None => Arc::new(Value::Absent),
        }
    }

    /// Last published size, `None` before anything settled or after a failed
    /// computation.
    pub fn size(&self) -> Option<u64> {
        self.shared.state.lock().size
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    /// Clears an armed timer before it fires.
    ///
    /// A computation that already started cannot be aborted. Returns whether
    /// a pending schedule was cleared.
    pub fn cancel_pending(&self) -> bool {
        let mut state = self.shared.state.lock();
        match state.timer.take() {
            Some(timer) => {
                timer.abort();
                // a timer past its await may still be waiting for the lock
                state.generation += 1;
                state.phase = Phase::Idle;
                debug!("cancel_pending: cleared scheduled computation");
                true
            }
            None => false,
        }
    }

    /// Computes the size of `value` right away, bypassing the debounce timer.
    ///
    /// Never emits [`SizeEvent::SizeChanged`]. A composite serializer failure
    /// resolves to `None` and emits one [`SizeEvent::ComputationError`].
    pub async fn calculate(
        &self,
        value: impl Into<Value>,
    ) -> Option<u64> {
        let value = value.into();
        match dispatch(&self.shared.serializer, &value).await {
            Ok(size) => Some(size),
            Err(e) => {
                warn!("calculate: {:?} value could not be measured: {}", value.kind(), e);
                metrics::COMPUTATION_FAILURES.with_label_values(&[e.reason()]).inc();
                self.shared.notify(SizeEvent::ComputationError { message: e.to_string() });
                None
            }
        }
    }

    /// Registers a listener for [`SizeEvent`]s. Dropped receivers are pruned
    /// on the next emission.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SizeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.register_listener(tx);
        rx
    }

    pub fn register_listener(
        &self,
        tx: mpsc::UnboundedSender<SizeEvent>,
    ) {
        self.shared.listeners.lock().push(tx);
    }
}

impl Shared {
    async fn run_scheduled(
        self: Arc<Self>,
        generation: u64,
    ) {
        match self.debounce {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        let request = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            let Some(value) = state.value.clone() else {
                return;
            };
            state.timer = None;
            state.phase = Phase::Computing;
            ComputationRequest { generation, value }
        };

        let result = dispatch(&self.serializer, &request.value).await;

        let mut state = self.state.lock();
        if state.generation != request.generation {
            debug!(
                "discarding stale result for generation {} (current {})",
                request.generation, state.generation
            );
            metrics::STALE_RESULTS_DISCARDED.inc();
            return;
        }

        state.phase = Phase::Publishing;
        match result {
            Ok(size) => {
                state.size = Some(size);
                metrics::COMPUTED_SIZE_BYTES.observe(size as f64);
                self.notify(SizeEvent::SizeChanged { value: size });
            }
            Err(e) => {
                warn!("{:?} value could not be measured: {}", request.value.kind(), e);
                metrics::COMPUTATION_FAILURES.with_label_values(&[e.reason()]).inc();
                state.size = None;
                self.notify(SizeEvent::ComputationError { message: e.to_string() });
            }
        }
        state.phase = Phase::Idle;
    }

    fn notify(
        &self,
        event: SizeEvent,
    ) {
        trace!("notify: {:?}", event);
        self.listeners.lock().retain(|tx| match tx.send(event.clone()) {
            Ok(()) => true,
            Err(_) => {
                debug!("notify: dropping closed listener");
                false
            }
        });
    }
}

/// Maps a value kind to the component that measures it.
pub(crate) async fn dispatch(
    serializer: &CompositeSerializer,
    value: &Value,
) -> std::result::Result<u64, SerializeError> {
    metrics::COMPUTATIONS_DISPATCHED
        .with_label_values(&[value.kind().as_str()])
        .inc();
    match value {
        Value::Composite(composite) => serializer.byte_length(composite).await,
        other => Ok(encoder::measure_sync(other).unwrap_or_default()),
    }
}
