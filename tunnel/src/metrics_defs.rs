use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS_FORWARDED: MetricDef = MetricDef {
    name: "requests.forwarded",
    metric_type: MetricType::Counter,
    description: "Envelopes that passed validation and reached the upstream",
};

pub const REQUESTS_REJECTED: MetricDef = MetricDef {
    name: "requests.rejected",
    metric_type: MetricType::Counter,
    description: "Requests answered with an error. Tagged with reason.",
};

pub const UPSTREAM_DURATION: MetricDef = MetricDef {
    name: "upstream.duration",
    metric_type: MetricType::Histogram,
    description: "Upstream round trip in seconds, including the response body. Tagged with status.",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUESTS_FORWARDED, REQUESTS_REJECTED, UPSTREAM_DURATION];
