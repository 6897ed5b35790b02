//! Common types for metric definitions.
//!
//! Services declare their metrics as `MetricDef` constants so names, types
//! and descriptions live in one reviewable place, and emit them through the
//! `counter!`/`histogram!` macros below.

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

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        metrics::counter!($def.name)
    };
    ($def:expr, $($label_key:expr => $label_value:expr),+) => {
        metrics::counter!($def.name, $($label_key => $label_value),+)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        metrics::histogram!($def.name)
    };
    ($def:expr, $($label_key:expr => $label_value:expr),+) => {
        metrics::histogram!($def.name, $($label_key => $label_value),+)
    };
}
