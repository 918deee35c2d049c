use moka::future::Cache;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::time::Duration;

/// Payroll reports are expensive to hydrate, so finished ones are kept
/// for a few minutes, keyed by month. Every attendance or payroll
/// mutation drops the whole cache; precision is not worth staleness.
static REPORT_CACHE: Lazy<Cache<String, Value>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(64)
        .time_to_live(Duration::from_secs(300))
        .build()
});

pub async fn get(month: &str) -> Option<Value> {
    REPORT_CACHE.get(month).await
}

pub async fn put(month: &str, report: Value) {
    REPORT_CACHE.insert(month.to_string(), report).await;
}

pub fn invalidate_all() {
    REPORT_CACHE.invalidate_all();
}
