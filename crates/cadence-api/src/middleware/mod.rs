//! # Middleware Stack
//!
//! - [`metrics`]: Prometheus request and domain metrics.
//!
//! Request tracing uses `tower_http::trace::TraceLayer` directly and bearer
//! auth lives in [`crate::auth`].

pub mod metrics;
