//! # Prometheus Metrics
//!
//! HTTP request counts and latency are recorded by the middleware. Domain
//! counters (publishes, publish failures, compliance rejections and
//! auto-fixes) are bumped by the handlers and the publish sweeper.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,

    posts_published_total: IntCounter,
    publish_failures_total: IntCounter,
    compliance_rejections_total: IntCounter,
    compliance_auto_fixes_total: IntCounter,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("published", &self.published())
            .field("publish_failures", &self.publish_failures())
            .finish()
    }
}

fn counter(name: &str, help: &str) -> IntCounter {
    IntCounter::new(name, help).expect("metric can be created")
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("cadence_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "cadence_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let posts_published_total =
            counter("cadence_posts_published_total", "Posts successfully published");
        let publish_failures_total =
            counter("cadence_publish_failures_total", "Publish attempts that failed");
        let compliance_rejections_total = counter(
            "cadence_compliance_rejections_total",
            "Posts refused by the compliance gate",
        );
        let compliance_auto_fixes_total = counter(
            "cadence_compliance_auto_fixes_total",
            "Posts whose text was rewritten by compliance fixes",
        );

        let collectors: [Box<dyn Collector>; 6] = [
            Box::new(http_requests_total.clone()),
            Box::new(http_request_duration_seconds.clone()),
            Box::new(posts_published_total.clone()),
            Box::new(publish_failures_total.clone()),
            Box::new(compliance_rejections_total.clone()),
            Box::new(compliance_auto_fixes_total.clone()),
        ];
        for c in collectors {
            registry.register(c).expect("metric can be registered");
        }

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                posts_published_total,
                publish_failures_total,
                compliance_rejections_total,
                compliance_auto_fixes_total,
            }),
        }
    }

    /// Total request count across all labels.
    pub fn requests(&self) -> u64 {
        let mut total = 0u64;
        for mf in &self.inner.http_requests_total.collect() {
            for m in mf.get_metric() {
                total += m.get_counter().get_value() as u64;
            }
        }
        total
    }

    pub fn published(&self) -> u64 {
        self.inner.posts_published_total.get()
    }

    pub fn publish_failures(&self) -> u64 {
        self.inner.publish_failures_total.get()
    }

    pub fn compliance_rejections(&self) -> u64 {
        self.inner.compliance_rejections_total.get()
    }

    pub fn compliance_auto_fixes(&self) -> u64 {
        self.inner.compliance_auto_fixes_total.get()
    }

    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status])
            .inc();
        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path, &status])
            .observe(duration_secs);
    }

    /// Count one publish attempt.
    pub fn record_publish(&self, succeeded: bool) {
        if succeeded {
            self.inner.posts_published_total.inc();
        } else {
            self.inner.publish_failures_total.inc();
        }
    }

    /// Count one pipeline compliance outcome.
    pub fn record_compliance(&self, rejected: bool, auto_fixed: bool) {
        if rejected {
            self.inner.compliance_rejections_total.inc();
        }
        if auto_fixed {
            self.inner.compliance_auto_fixes_total.inc();
        }
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace numeric path segments with `{id}` to bound label cardinality.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware that records HTTP request metrics.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        m.record_request(&method, &path, response.status().as_u16(), duration);
    }

    response
}
