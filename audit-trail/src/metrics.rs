//! Prometheus metrics for the audit trail

use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

lazy_static! {
    /// Publish outcomes by status (success / exhausted)
    pub static ref AUDIT_PUBLISH_TOTAL: CounterVec = register_counter_vec!(
        "audit_publish_total",
        "Audit proof publish outcomes",
        &["status"]
    )
    .unwrap();

    /// Individual submit attempts by outcome
    pub static ref AUDIT_SUBMIT_ATTEMPTS_TOTAL: CounterVec = register_counter_vec!(
        "audit_submit_attempts_total",
        "Ledger submit attempts",
        &["status"]
    )
    .unwrap();

    /// Events dropped because the background queue was full
    pub static ref AUDIT_QUEUE_DROPPED_TOTAL: Counter = register_counter!(
        "audit_queue_dropped_total",
        "Events dropped because the audit queue was full"
    )
    .unwrap();
}
