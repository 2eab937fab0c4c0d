//! Prometheus collectors of the reconciliation pipeline and the `/metrics`
//! endpoint serving them.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Encoder;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::Error;

lazy_static! {
    pub static ref EVENTS_PRODUCED: IntCounterVec = IntCounterVec::new(
        Opts::new("events_produced_total", "Events produced by diffing and classification"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref COALESCE_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("coalesce_outcomes_total", "How enqueued events were merged into the pending queue"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref PENDING_EVENTS: IntGauge =
        IntGauge::new("pending_events", "Events waiting for the next flush")
            .expect("metric can not be created");

    pub static ref BATCHES_DELIVERED: IntCounter =
        IntCounter::new("batches_delivered_total", "Batches accepted by the adaptor")
            .expect("metric can not be created");

    pub static ref DELIVERY_FAILURES: IntCounter =
        IntCounter::new("delivery_failures_total", "Batches dropped after a delivery failure")
            .expect("metric can not be created");

    pub static ref BATCH_SIZE: Histogram = Histogram::with_opts(
        HistogramOpts::new("batch_size", "Number of events per flushed batch")
            .buckets(exponential_buckets(1.0, 2.0, 12).expect("valid buckets"))
    )
    .expect("metric can not be created");

    pub static ref REGISTRY_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("registry_failures_total", "Failed registry calls"),
        &["operation"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER_ONCE: Once = Once::new();

pub fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(EVENTS_PRODUCED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(COALESCE_OUTCOMES.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(PENDING_EVENTS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(BATCHES_DELIVERED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(DELIVERY_FAILURES.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(BATCH_SIZE.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(REGISTRY_FAILURES.clone()))
        .expect("collector can be registered");
}

/// Serves `/metrics` until `shutdown` fires. Fails when the port cannot be
/// bound.
pub async fn start_server(
    port: u16,
    shutdown: CancellationToken,
) -> crate::Result<()> {
    REGISTER_ONCE.call_once(|| register_custom_metrics(&REGISTRY));

    let metrics_route = warp::path!("metrics")
        .map(|| REGISTRY.clone())
        .and_then(metrics_handler);

    let (addr, server) = warp::serve(metrics_route)
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            shutdown.cancelled().await;
        })
        .map_err(|e| Error::Fatal(format!("cannot serve metrics on port {port}: {e}")))?;

    info!(%addr, "serving metrics");
    server.await;
    Ok(())
}

async fn metrics_handler(registry: Registry) -> Result<impl Reply, Rejection> {
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!(error = %e, "could not encode metrics");
    }

    let body = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "metrics are not valid utf-8");
            String::default()
        }
    };

    Ok(body)
}
