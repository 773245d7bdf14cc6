// Log bus - Append-only operational log with read-side filtering
use crate::domain::log_entry::{LevelFilter, LogEntry, LogLevel};
use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct LogBus {
    entries: Vec<LogEntry>,
}

impl LogBus {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log shown while no session is active.
    pub fn idle_banner() -> Self {
        let now = Utc::now().timestamp_millis();
        let banner = [
            (100_000, LogLevel::Info, "System initialized successfully."),
            (80_000, LogLevel::Info, "Connected to HVAC controller."),
            (60_000, LogLevel::Warn, "Latency detected on Sensor Node 4."),
        ];

        let entries = banner
            .into_iter()
            .map(|(age_ms, level, message)| {
                LogEntry::new(new_entry_id(), now - age_ms, level, message.to_string())
            })
            .collect();

        Self { entries }
    }

    pub fn append(&mut self, level: LogLevel, message: impl Into<String>) -> LogEntry {
        let entry = LogEntry::new(
            new_entry_id(),
            Utc::now().timestamp_millis(),
            level,
            message.into(),
        );
        tracing::debug!("log [{}] {}", entry.level, entry.message);
        self.entries.push(entry.clone());
        entry
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn query(&self, filter: LevelFilter, search: &str) -> Vec<LogEntry> {
        query(&self.entries, filter, search)
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

/// Entries matching both the level filter and a case-insensitive substring
/// search on the message, in their original order. An empty search matches
/// everything.
pub fn query(entries: &[LogEntry], filter: LevelFilter, search: &str) -> Vec<LogEntry> {
    let needle = search.to_lowercase();
    entries
        .iter()
        .filter(|e| filter.matches(e.level))
        .filter(|e| needle.is_empty() || e.message.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

fn new_entry_id() -> String {
    Uuid::new_v4().simple().to_string()
}
