use shared::metrics_defs::{MetricDef, MetricType};

pub const RESPONSES: MetricDef = MetricDef {
    name: "responses.produced",
    metric_type: MetricType::Counter,
    description: "Merged documents successfully written to callers",
};

pub const UPSTREAM_REQUESTS_FAILED: MetricDef = MetricDef {
    name: "upstream.requests.failed",
    metric_type: MetricType::Counter,
    description: "Upstream calls that returned a non-200 status or no response. Tagged with service.",
};

pub const DEGRADED_REQUESTS: MetricDef = MetricDef {
    name: "requests.degraded",
    metric_type: MetricType::Counter,
    description: "Requests served without a best-effort source's contribution. Tagged with service.",
};

pub const ERRORS: MetricDef = MetricDef {
    name: "errors",
    metric_type: MetricType::Counter,
    description: "Hard failures (aborted requests) and expansion fallbacks",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "End-to-end aggregation request duration in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    RESPONSES,
    UPSTREAM_REQUESTS_FAILED,
    DEGRADED_REQUESTS,
    ERRORS,
    REQUEST_DURATION,
];

/// Registers descriptions with the installed recorder.
pub fn describe_all() {
    for def in ALL_METRICS {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}
