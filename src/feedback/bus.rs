//! Severity-tagged message collection.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::Serialize;

/// Message severity. Doubles as the bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Success,
    Diagnostic,
}

/// Where an entry was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub file: &'static str,
    pub line: u32,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackEntry {
    pub severity: Severity,
    pub text: String,
    pub origin: Origin,
}

type Buckets = BTreeMap<Severity, Vec<FeedbackEntry>>;

/// Feedback of every tagged test run, isolated per run id.
#[derive(Debug, Default)]
pub struct TestFeedbackStore {
    runs: DashMap<String, Buckets>,
}

impl TestFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries recorded under `test_id`, optionally filtered by severity.
    pub fn entries(&self, test_id: &str, severity: Option<Severity>) -> Vec<FeedbackEntry> {
        self.runs
            .get(test_id)
            .map(|buckets| collect(&buckets, severity))
            .unwrap_or_default()
    }

    /// Forget a finished run.
    pub fn clear(&self, test_id: &str) {
        self.runs.remove(test_id);
    }

    fn push(&self, test_id: &str, entry: FeedbackEntry) {
        self.runs
            .entry(test_id.to_string())
            .or_default()
            .entry(entry.severity)
            .or_default()
            .push(entry);
    }
}

#[derive(Debug)]
enum Sink {
    Request(Mutex<Buckets>),
    Test {
        test_id: String,
        store: Arc<TestFeedbackStore>,
    },
}

/// Request-scoped feedback accumulator, injected into the request context.
#[derive(Debug)]
pub struct FeedbackBus {
    sink: Sink,
}

impl Default for FeedbackBus {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackBus {
    /// A bus backed by a fresh per-request store.
    pub fn new() -> Self {
        Self {
            sink: Sink::Request(Mutex::new(Buckets::new())),
        }
    }

    /// A bus writing into `store` under `test_id` instead of the request store.
    pub fn for_test(store: Arc<TestFeedbackStore>, test_id: impl Into<String>) -> Self {
        Self {
            sink: Sink::Test {
                test_id: test_id.into(),
                store,
            },
        }
    }

    pub fn test_id(&self) -> Option<&str> {
        match &self.sink {
            Sink::Request(_) => None,
            Sink::Test { test_id, .. } => Some(test_id),
        }
    }

    /// Record a message tagged with the caller's location.
    #[track_caller]
    pub fn record(&self, severity: Severity, text: impl AsRef<str>) {
        let caller = Location::caller();
        let origin = Origin {
            file: caller.file(),
            line: caller.line(),
        };
        let entry = FeedbackEntry {
            severity,
            text: format!("{} — recorded at {}", text.as_ref(), origin),
            origin,
        };

        match &self.sink {
            Sink::Request(buckets) => buckets
                .lock()
                .expect("feedback mutex poisoned")
                .entry(severity)
                .or_default()
                .push(entry),
            Sink::Test { test_id, store } => store.push(test_id, entry),
        }
    }

    #[track_caller]
    pub fn error(&self, text: impl AsRef<str>) {
        self.record(Severity::Error, text);
    }

    #[track_caller]
    pub fn warning(&self, text: impl AsRef<str>) {
        self.record(Severity::Warning, text);
    }

    #[track_caller]
    pub fn success(&self, text: impl AsRef<str>) {
        self.record(Severity::Success, text);
    }

    #[track_caller]
    pub fn diagnostic(&self, text: impl AsRef<str>) {
        self.record(Severity::Diagnostic, text);
    }

    /// Entries so far, optionally for one severity. Entries are kept.
    pub fn drain(&self, severity: Option<Severity>) -> Vec<FeedbackEntry> {
        match &self.sink {
            Sink::Request(buckets) => collect(&buckets.lock().expect("feedback mutex poisoned"), severity),
            Sink::Test { test_id, store } => store.entries(test_id, severity),
        }
    }

    /// Severity-partitioned view of all entries.
    pub fn snapshot(&self) -> BTreeMap<Severity, Vec<FeedbackEntry>> {
        let mut out = BTreeMap::new();
        for entry in self.drain(None) {
            out.entry(entry.severity).or_insert_with(Vec::new).push(entry);
        }
        out
    }

    /// Drop every entry of this request without surfacing it.
    ///
    /// Test stores are kept; a test run spans many requests.
    pub fn discard(&self) {
        if let Sink::Request(buckets) = &self.sink {
            buckets.lock().expect("feedback mutex poisoned").clear();
        }
    }
}

fn collect(buckets: &Buckets, severity: Option<Severity>) -> Vec<FeedbackEntry> {
    match severity {
        Some(s) => buckets.get(&s).cloned().unwrap_or_default(),
        None => buckets.values().flatten().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_captures_location() {
        let bus = FeedbackBus::new();
        bus.warning("quota nearly used");
        let line = line!() - 1;

        let entries = bus.drain(Some(Severity::Warning));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].origin.line, line);
        assert!(entries[0].origin.file.ends_with("bus.rs"));
        assert_eq!(
            entries[0].text,
            format!("quota nearly used — recorded at {}", entries[0].origin)
        );
    }

    #[test]
    fn test_drain_does_not_clear() {
        let bus = FeedbackBus::new();
        bus.error("a");
        bus.success("b");

        assert_eq!(bus.drain(None).len(), 2);
        assert_eq!(bus.drain(None).len(), 2);
        assert_eq!(bus.drain(Some(Severity::Error)).len(), 1);
        assert!(bus.drain(Some(Severity::Diagnostic)).is_empty());
    }

    #[test]
    fn test_discard() {
        let bus = FeedbackBus::new();
        bus.diagnostic("partial");
        bus.discard();
        assert!(bus.drain(None).is_empty());
    }

    #[test]
    fn test_snapshot_is_partitioned() {
        let bus = FeedbackBus::new();
        bus.error("e1");
        bus.error("e2");
        bus.success("s1");

        let snapshot = bus.snapshot();
        assert_eq!(snapshot[&Severity::Error].len(), 2);
        assert_eq!(snapshot[&Severity::Success].len(), 1);
        assert!(!snapshot.contains_key(&Severity::Warning));
    }

    #[test]
    fn test_test_runs_are_isolated() {
        let store = Arc::new(TestFeedbackStore::new());
        let a = FeedbackBus::for_test(store.clone(), "run-a");
        let b = FeedbackBus::for_test(store.clone(), "run-b");

        a.error("from a");
        b.success("from b");
        b.success("again b");

        assert_eq!(a.drain(None).len(), 1);
        assert_eq!(b.drain(None).len(), 2);
        assert_eq!(store.entries("run-a", Some(Severity::Success)).len(), 0);
        assert_eq!(a.test_id(), Some("run-a"));

        // A plain request bus never sees test entries.
        assert!(FeedbackBus::new().drain(None).is_empty());

        store.clear("run-a");
        assert!(a.drain(None).is_empty());
        assert_eq!(b.drain(None).len(), 2);
    }

    #[test]
    fn test_concurrent_runs_do_not_interleave() {
        let store = Arc::new(TestFeedbackStore::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let bus = FeedbackBus::for_test(store, format!("run-{i}"));
                    for n in 0..50 {
                        bus.diagnostic(format!("{i}:{n}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for i in 0..4 {
            let entries = store.entries(&format!("run-{i}"), None);
            assert_eq!(entries.len(), 50);
            assert!(entries.iter().all(|e| e.text.starts_with(&format!("{i}:"))));
        }
    }
}
