// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;
use time::macros::format_description;

pub const DEFAULT_LOG_CAPACITY: usize = 200;

/// The in-memory activity feed, most recent entry first. Entries are plain
/// strings prefixed with a wall-clock timestamp; appending is fire-and-forget
/// and the oldest entries fall off once capacity is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLog {
    entries: Vec<String>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, message: impl AsRef<str>) {
        self.push_at(OffsetDateTime::now_utc(), message);
    }

    pub fn push_at(&mut self, at: OffsetDateTime, message: impl AsRef<str>) {
        let stamp = at
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_else(|_| "--:--:--".to_owned());
        self.entries
            .insert(0, format!("[{stamp}] {}", message.as_ref()));
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ActivityLog;
    use time::macros::datetime;

    #[test]
    fn entries_are_most_recent_first_and_timestamped() {
        let mut log = ActivityLog::default();
        log.push_at(datetime!(2026-03-05 09:30:00 UTC), "first");
        log.push_at(datetime!(2026-03-05 09:30:02 UTC), "second");

        assert_eq!(log.entries()[0], "[09:30:02] second");
        assert_eq!(log.entries()[1], "[09:30:00] first");
    }

    #[test]
    fn capacity_drops_the_oldest_entries() {
        let mut log = ActivityLog::with_capacity(2);
        log.push("one");
        log.push("two");
        log.push("three");

        assert_eq!(log.len(), 2);
        assert!(log.entries()[0].ends_with("three"));
        assert!(log.entries()[1].ends_with("two"));
    }
}
