use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;


lazy_static! {
    pub static ref COMPUTATIONS_DISPATCHED: IntCounterVec = IntCounterVec::new(
        Opts::new("computations_dispatched", "Size computations dispatched, by value kind"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref STALE_RESULTS_DISCARDED: IntCounter = IntCounter::new(
        "stale_results_discarded",
        "Computations whose value was superseded before they completed"
    )
    .expect("metric can not be created");

    pub static ref COMPUTATION_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("computation_failures", "Composite serialization failures, by reason"),
        &["reason"]
    )
    .expect("metric can not be created");

    pub static ref COMPUTED_SIZE_BYTES: Histogram = Histogram::with_opts(
        HistogramOpts::new("computed_size_bytes", "Published sizes in bytes")
            .buckets(exponential_buckets(1.0, 4.0, 12).expect("valid buckets"))
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new_custom(Some("bytes_counter".to_string()), None)
            .expect("registry can be created");
        register_custom_metrics(&registry);
        registry
    };
}

fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(COMPUTATIONS_DISPATCHED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(STALE_RESULTS_DISCARDED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(COMPUTATION_FAILURES.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(COMPUTED_SIZE_BYTES.clone()))
        .expect("collector can be registered");
}

/// Renders all pipeline metrics in the Prometheus text format.
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
