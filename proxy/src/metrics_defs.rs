use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "requests",
    metric_type: MetricType::Counter,
    description: "Gateway requests handled. Tagged with route, status.",
};

pub const UPSTREAM_DURATION: MetricDef = MetricDef {
    name: "upstream.duration",
    metric_type: MetricType::Histogram,
    description: "Time until the provider answered or the call failed, in seconds. Tagged with route.",
};

pub const UPSTREAM_FAILURES: MetricDef = MetricDef {
    name: "upstream.failures",
    metric_type: MetricType::Counter,
    description: "Failed upstream calls. Tagged with route, kind (transport, upstream, internal).",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUESTS, UPSTREAM_DURATION, UPSTREAM_FAILURES];
