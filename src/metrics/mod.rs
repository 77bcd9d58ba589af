use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct DockMetrics {
    created: u64,
    evicted: u64,
    expired: u64,
    removed: u64,
    destroyed: u64,
    ticks: u64,
    stale_ticks: u64,
    listener_failures: u64,
}

impl DockMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&mut self) {
        self.created = self.created.saturating_add(1);
    }

    pub fn record_evicted(&mut self) {
        self.evicted = self.evicted.saturating_add(1);
    }

    pub fn record_expired(&mut self) {
        self.expired = self.expired.saturating_add(1);
    }

    pub fn record_removed(&mut self) {
        self.removed = self.removed.saturating_add(1);
    }

    pub fn record_destroyed(&mut self) {
        self.destroyed = self.destroyed.saturating_add(1);
    }

    pub fn record_ticks(&mut self, fired: usize, stale: u64) {
        self.ticks = self.ticks.saturating_add(fired as u64);
        self.stale_ticks = self.stale_ticks.saturating_add(stale);
    }

    pub fn record_listener_failure(&mut self) {
        self.listener_failures = self.listener_failures.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            created: self.created,
            evicted: self.evicted,
            expired: self.expired,
            removed: self.removed,
            destroyed: self.destroyed,
            ticks: self.ticks,
            stale_ticks: self.stale_ticks,
            listener_failures: self.listener_failures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub created: u64,
    pub evicted: u64,
    pub expired: u64,
    pub removed: u64,
    pub destroyed: u64,
    pub ticks: u64,
    pub stale_ticks: u64,
    pub listener_failures: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "dock_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("created".to_string(), json!(self.created));
        map.insert("evicted".to_string(), json!(self.evicted));
        map.insert("expired".to_string(), json!(self.expired));
        map.insert("removed".to_string(), json!(self.removed));
        map.insert("destroyed".to_string(), json!(self.destroyed));
        map.insert("ticks".to_string(), json!(self.ticks));
        map.insert("stale_ticks".to_string(), json!(self.stale_ticks));
        map.insert(
            "listener_failures".to_string(),
            json!(self.listener_failures),
        );
        map
    }
}
