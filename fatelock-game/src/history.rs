//! Append-only event log.
use serde::{Deserialize, Serialize};

/// Kind of event recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogKind {
    Roll,
    Unlock,
    Pity,
}

/// Outcome attached to roll entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollResult {
    Success,
    Fail,
}

/// One persisted log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: LogKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RollResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Entry under construction; the history assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    kind: LogKind,
    source: Option<String>,
    result: Option<RollResult>,
    roll_value: Option<u32>,
    threshold: Option<u32>,
    message: String,
    details: Option<String>,
}

impl NewEntry {
    fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            source: None,
            result: None,
            roll_value: None,
            threshold: None,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn roll(result: RollResult, message: impl Into<String>) -> Self {
        Self {
            result: Some(result),
            ..Self::new(LogKind::Roll, message)
        }
    }

    #[must_use]
    pub fn unlock(message: impl Into<String>) -> Self {
        Self::new(LogKind::Unlock, message)
    }

    #[must_use]
    pub fn pity(message: impl Into<String>) -> Self {
        Self::new(LogKind::Pity, message)
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub const fn dice(mut self, roll_value: u32, threshold: u32) -> Self {
        self.roll_value = Some(roll_value);
        self.threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Ordered event log. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct History {
    entries: Vec<LogEntry>,
    next_seq: u64,
}

impl History {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Adopt entries from a snapshot; new ids continue after them.
    #[must_use]
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        let next_seq = u64::try_from(entries.len()).unwrap_or(u64::MAX);
        Self { entries, next_seq }
    }

    /// Stamp and append an entry, returning its id.
    pub fn push(&mut self, entry: NewEntry, timestamp: i64) -> &LogEntry {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        let id = format!("{timestamp:x}-{seq:04x}");
        let index = self.entries.len();
        self.entries.push(LogEntry {
            id,
            timestamp,
            kind: entry.kind,
            source: entry.source,
            result: entry.result,
            roll_value: entry.roll_value,
            threshold: entry.threshold,
            message: entry.message,
            details: entry.details,
        });
        &self.entries[index]
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Number of entries of the given kind.
    #[must_use]
    pub fn count(&self, kind: LogKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_even_within_one_millisecond() {
        let mut history = History::new();
        let a = history.push(NewEntry::pity("one"), 1_000).id.clone();
        let b = history.push(NewEntry::pity("two"), 1_000).id.clone();
        assert_ne!(a, b);
        assert_eq!(history.len(), 2);
        assert_eq!(history.count(LogKind::Pity), 2);
    }

    #[test]
    fn imported_history_continues_sequence() {
        let mut seed = History::new();
        seed.push(NewEntry::unlock("first"), 5);
        let imported = seed.clone().into_entries();
        let mut history = History::from_entries(imported);
        let id = history.push(NewEntry::unlock("first"), 5).id.clone();
        assert_ne!(id, seed.entries()[0].id);
    }

    #[test]
    fn roll_entries_serialize_in_camel_case() {
        let mut history = History::new();
        history.push(
            NewEntry::roll(RollResult::Fail, "No Key.")
                .source("Quest (Novice)")
                .dice(73, 20)
                .details("Fate Points: 1/50"),
            1_700_000_000_000,
        );
        let json = serde_json::to_value(&history.entries()[0]).unwrap();
        assert_eq!(json["type"], "ROLL");
        assert_eq!(json["result"], "FAIL");
        assert_eq!(json["rollValue"], 73);
        assert_eq!(json["threshold"], 20);
        assert_eq!(json["source"], "Quest (Novice)");
    }

    #[test]
    fn absent_optionals_are_omitted() {
        let mut history = History::new();
        history.push(NewEntry::pity("The Fates take pity on you."), 0);
        let json = serde_json::to_value(&history.entries()[0]).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("rollValue"));
        assert!(!object.contains_key("details"));
        assert!(!object.contains_key("result"));
        assert_eq!(json["type"], "PITY");
    }

    #[test]
    fn entries_parse_without_optional_fields() {
        let entry: LogEntry = serde_json::from_str(
            r#"{"id":"x","timestamp":1,"type":"UNLOCK","message":"Unlocked Boss: Zulrah"}"#,
        )
        .unwrap();
        assert_eq!(entry.kind, LogKind::Unlock);
        assert!(entry.details.is_none());
    }
}
