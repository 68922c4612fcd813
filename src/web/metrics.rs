use std::sync::atomic::{AtomicU64, Ordering};

static WATCH_ITEMS_CREATED: AtomicU64 = AtomicU64::new(0);
static WATCH_ITEMS_UPDATED: AtomicU64 = AtomicU64::new(0);
static WATCH_ITEMS_DELETED: AtomicU64 = AtomicU64::new(0);
static STORE_FAILURES: AtomicU64 = AtomicU64::new(0);
static FORMS_REJECTED: AtomicU64 = AtomicU64::new(0);
static AUDIT_ENTRIES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static AUDIT_ENTRIES_FAILED: AtomicU64 = AtomicU64::new(0);
static AUDIT_ENTRIES_DROPPED: AtomicU64 = AtomicU64::new(0);
static AUDIT_QUEUE_SIZE: AtomicU64 = AtomicU64::new(0);

pub struct Metrics;

impl Metrics {
    pub fn watch_item_created() {
        WATCH_ITEMS_CREATED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn watch_item_updated() {
        WATCH_ITEMS_UPDATED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn watch_item_deleted() {
        WATCH_ITEMS_DELETED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn store_failure() {
        STORE_FAILURES.fetch_add(1, Ordering::Relaxed);
    }

    pub fn form_rejected() {
        FORMS_REJECTED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn audit_entry_written() {
        AUDIT_ENTRIES_WRITTEN.fetch_add(1, Ordering::Relaxed);
    }

    pub fn audit_entry_failed() {
        AUDIT_ENTRIES_FAILED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn audit_entry_dropped() {
        AUDIT_ENTRIES_DROPPED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_audit_queue_size(size: u64) {
        AUDIT_QUEUE_SIZE.store(size, Ordering::Relaxed);
    }

    pub fn audit_entries_dropped() -> u64 {
        AUDIT_ENTRIES_DROPPED.load(Ordering::Relaxed)
    }
}

pub fn format_prometheus(uptime_seconds: u64) -> String {
    format!(
        r#"# HELP panel_uptime_seconds Number of seconds the panel has been running
# TYPE panel_uptime_seconds gauge
panel_uptime_seconds {}

# HELP watch_items_created_total Subreddit watch items created
# TYPE watch_items_created_total counter
watch_items_created_total {}

# HELP watch_items_updated_total Subreddit watch items updated
# TYPE watch_items_updated_total counter
watch_items_updated_total {}

# HELP watch_items_deleted_total Subreddit watch items deleted
# TYPE watch_items_deleted_total counter
watch_items_deleted_total {}

# HELP store_failures_total Config store calls that failed
# TYPE store_failures_total counter
store_failures_total {}

# HELP forms_rejected_total Submitted forms that failed validation
# TYPE forms_rejected_total counter
forms_rejected_total {}

# HELP audit_entries_written_total Audit log entries persisted
# TYPE audit_entries_written_total counter
audit_entries_written_total {}

# HELP audit_entries_failed_total Audit log entries the store rejected
# TYPE audit_entries_failed_total counter
audit_entries_failed_total {}

# HELP audit_entries_dropped_total Audit log entries dropped because the queue was full or closed
# TYPE audit_entries_dropped_total counter
audit_entries_dropped_total {}

# HELP audit_queue_size Audit log entries waiting to be written
# TYPE audit_queue_size gauge
audit_queue_size {}
"#,
        uptime_seconds,
        WATCH_ITEMS_CREATED.load(Ordering::Relaxed),
        WATCH_ITEMS_UPDATED.load(Ordering::Relaxed),
        WATCH_ITEMS_DELETED.load(Ordering::Relaxed),
        STORE_FAILURES.load(Ordering::Relaxed),
        FORMS_REJECTED.load(Ordering::Relaxed),
        AUDIT_ENTRIES_WRITTEN.load(Ordering::Relaxed),
        AUDIT_ENTRIES_FAILED.load(Ordering::Relaxed),
        AUDIT_ENTRIES_DROPPED.load(Ordering::Relaxed),
        AUDIT_QUEUE_SIZE.load(Ordering::Relaxed),
    )
}
