//! HTTP surface for vidsync: control and inspection API over the job
//! coordinator, plus Prometheus metrics.

pub mod api;
pub mod metrics;
pub mod state;
