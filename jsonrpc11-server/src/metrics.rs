//! OpenTelemetry metrics for the dispatcher
//!
//! Instruments:
//!
//! | Name | Kind | Attributes |
//! |------|------|------------|
//! | `jsonrpc11.dispatch.requests.total` | counter | `method`, `status` |
//! | `jsonrpc11.dispatch.request.duration` | histogram (seconds) | `method`, `status` |
//! | `jsonrpc11.dispatch.batch.size` | histogram | `mode` |
//! | `jsonrpc11.dispatch.errors.total` | counter | `code` |
//! | `jsonrpc11.dispatch.notifications.total` | counter | `method`, `status` |
//!
//! Requests that never resolve to a registered method are recorded under the
//! method name `unknown`, so caller-controlled names cannot blow up metric
//! cardinality.
//!
//! Instruments record through whatever meter provider is installed; with no
//! provider (see `jsonrpc11_core::init_observability`) they are no-ops.

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    InstrumentationScope, KeyValue,
};

/// Method label for requests that did not resolve
pub const UNKNOWN_METHOD: &str = "unknown";

/// Dispatcher instruments
pub struct DispatchMetrics {
    pub requests_total: Counter<u64>,
    pub request_duration: Histogram<f64>,
    pub batch_size: Histogram<u64>,
    pub errors_total: Counter<u64>,
    pub notifications_total: Counter<u64>,
}

impl DispatchMetrics {
    /// Create instruments on the global meter provider
    pub fn new(service_name: impl Into<String>) -> Self {
        let scope = InstrumentationScope::builder(service_name.into())
            .with_version(env!("CARGO_PKG_VERSION"))
            .build();
        let meter = global::meter_with_scope(scope);
        Self::new_with_meter(&meter)
    }

    /// Create instruments on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("jsonrpc11.dispatch.requests.total")
                .with_description("Total number of calls dispatched")
                .build(),
            request_duration: meter
                .f64_histogram("jsonrpc11.dispatch.request.duration")
                .with_description("Time from envelope validation to response, in seconds")
                .with_unit("s")
                .build(),
            batch_size: meter
                .u64_histogram("jsonrpc11.dispatch.batch.size")
                .with_description("Number of entries in batch requests")
                .build(),
            errors_total: meter
                .u64_counter("jsonrpc11.dispatch.errors.total")
                .with_description("Total number of failed calls and notifications, by error code")
                .build(),
            notifications_total: meter
                .u64_counter("jsonrpc11.dispatch.notifications.total")
                .with_description("Total number of notifications dispatched")
                .build(),
        }
    }

    /// Record one dispatched entry
    ///
    /// `error_code` is `None` for success.
    pub fn record_request(
        &self,
        method: &str,
        notification: bool,
        error_code: Option<i32>,
        duration_secs: f64,
    ) {
        let status = if error_code.is_some() { "error" } else { "success" };
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status),
        ];

        if notification {
            self.notifications_total.add(1, attributes);
        } else {
            self.requests_total.add(1, attributes);
            self.request_duration.record(duration_secs, attributes);
        }

        if let Some(code) = error_code {
            self.errors_total
                .add(1, &[KeyValue::new("code", i64::from(code))]);
        }
    }

    pub fn record_batch(&self, size: u64, mode: &str) {
        let attributes = &[KeyValue::new("mode", mode.to_string())];
        self.batch_size.record(size, attributes);
    }
}

impl std::fmt::Debug for DispatchMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMetrics").finish_non_exhaustive()
    }
}
