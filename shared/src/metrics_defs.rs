//! Common types for metrics definitions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

impl MetricType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "Counter",
            MetricType::Histogram => "Histogram",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

/// Registers descriptions for every metric with the installed recorder.
pub fn describe_metrics(defs: &[MetricDef]) {
    for def in defs {
        tracing::debug!(
            metric = def.name,
            kind = def.metric_type.as_str(),
            "Describing metric"
        );
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        metrics::counter!($def.name)
    };
    ($def:expr, $($labels:tt)+) => {
        metrics::counter!($def.name, $($labels)+)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        metrics::histogram!($def.name)
    };
    ($def:expr, $($labels:tt)+) => {
        metrics::histogram!($def.name, $($labels)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_METRICS: &[MetricDef] = &[
        MetricDef {
            name: "test.requests",
            metric_type: MetricType::Counter,
            description: "Requests seen",
        },
        MetricDef {
            name: "test.duration",
            metric_type: MetricType::Histogram,
            description: "Request duration",
        },
    ];

    #[test]
    fn test_describe_metrics_without_recorder() {
        describe_metrics(TEST_METRICS);
        counter!(TEST_METRICS[0], "reason" => "test").increment(1);
        histogram!(TEST_METRICS[1]).record(0.5);

        let kinds: Vec<&str> = TEST_METRICS.iter().map(|d| d.metric_type.as_str()).collect();
        assert_eq!(kinds, ["Counter", "Histogram"]);
    }
}
