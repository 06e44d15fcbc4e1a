//! # Freightlens Reports
//!
//! External-facing aggregation over the rerate pipeline's output contract:
//! per-shipment cost metrics and exception flags, lane-level summaries, and
//! the audit-level rollup. This crate consumes only
//! [`Shipment`](freightlens_common::Shipment) records and
//! [`RerateResult`](freightlens_common::RerateResult) values; it never
//! touches the tariff cache.

pub mod metrics;
pub mod summary;

pub use metrics::{compute_cost_metrics, compute_flags, CostMetrics, ExceptionFlag};
pub use summary::{
    audit_summary, lane_summaries, list_exceptions, top_outliers, AuditSummary, ExceptionRecord,
    LaneSummary,
};
