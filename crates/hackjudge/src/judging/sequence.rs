use std::sync::atomic::{AtomicU64, Ordering};

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique identifier such as `eval-000042`.
pub(crate) fn next_record_id(prefix: &str) -> String {
    let id = RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}
