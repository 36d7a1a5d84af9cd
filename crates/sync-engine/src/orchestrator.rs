//! # Sync Orchestrator
//!
//! This module coordinates a whole sync run:
//! 1. Fan the watchlist entries out to at most `workers` concurrent tasks
//! 2. For each entry, search for the movie
//! 3. If it was found, request it
//! 4. Collect one outcome per entry and log a summary
//!
//! Each entry runs in its own tokio task, so a panic while processing one
//! entry surfaces as a join error for that entry only.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio::task::JoinError;
use tracing::{debug, error, info};

use feed::WatchlistEntry;

use crate::traits::MediaService;

/// Number of entries processed concurrently unless configured otherwise
pub const DEFAULT_WORKERS: usize = 4;

/// What happened to one watchlist entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub entry: WatchlistEntry,
    pub matched: bool,
    pub requested: bool,
    pub error: Option<String>,
}

impl RequestOutcome {
    fn not_found(entry: WatchlistEntry) -> Self {
        Self {
            entry,
            matched: false,
            requested: false,
            error: None,
        }
    }

    fn requested(entry: WatchlistEntry) -> Self {
        Self {
            entry,
            matched: true,
            requested: true,
            error: None,
        }
    }

    fn request_failed(entry: WatchlistEntry, reason: String) -> Self {
        Self {
            entry,
            matched: true,
            requested: false,
            error: Some(reason),
        }
    }

    fn aborted(entry: WatchlistEntry, matched: bool, reason: String) -> Self {
        Self {
            entry,
            matched,
            requested: false,
            error: Some(reason),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// All outcomes of one run, in completion order
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub outcomes: Vec<RequestOutcome>,
    pub elapsed: Duration,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn requested(&self) -> usize {
        self.outcomes.iter().filter(|o| o.requested).count()
    }

    /// Entries whose search came back empty (including swallowed search errors)
    pub fn not_found(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.matched && !o.is_failure())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

/// Drives every watchlist entry through search and request
pub struct SyncOrchestrator<S: ?Sized> {
    service: Arc<S>,
    workers: usize,
}

impl<S: ?Sized> Clone for SyncOrchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            workers: self.workers,
        }
    }
}

impl<S> SyncOrchestrator<S>
where
    S: MediaService + ?Sized + 'static,
{
    /// Create an orchestrator with [`DEFAULT_WORKERS`] workers
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Set the number of concurrent workers (at least one)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every entry and wait for all of them to finish
    ///
    /// Never fails: per-entry problems are logged and recorded in the
    /// returned report.
    pub async fn run(&self, entries: Vec<WatchlistEntry>) -> SyncReport {
        let start_time = Instant::now();
        info!(
            "Syncing {} watchlist entries with {} ({} workers)",
            entries.len(),
            self.service.name(),
            self.workers
        );

        let outcomes: Vec<RequestOutcome> = stream::iter(entries)
            .map(|entry| {
                let service = Arc::clone(&self.service);
                async move {
                    // Outlives the task, so a panic after the search still
                    // reports whether the movie was matched
                    let matched = Arc::new(AtomicBool::new(false));

                    // Spawned lazily, so at most `workers` tasks exist at once
                    let task = tokio::spawn(process_entry(
                        service,
                        entry.clone(),
                        Arc::clone(&matched),
                    ));
                    match task.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            let reason = describe_join_error(e);
                            error!("Error while processing {}: {}", entry, reason);
                            RequestOutcome::aborted(entry, matched.load(Ordering::SeqCst), reason)
                        }
                    }
                }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let report = SyncReport {
            outcomes,
            elapsed: start_time.elapsed(),
        };

        info!(
            "Sync finished in {:.2?}: {} entries, {} requested, {} not found, {} failed",
            report.elapsed,
            report.total(),
            report.requested(),
            report.not_found(),
            report.failed()
        );

        report
    }
}

/// Search, then request if found
async fn process_entry<S>(
    service: Arc<S>,
    entry: WatchlistEntry,
    matched: Arc<AtomicBool>,
) -> RequestOutcome
where
    S: MediaService + ?Sized,
{
    debug!("Processing {}", entry);

    let Some(found) = service.search(&entry).await else {
        return RequestOutcome::not_found(entry);
    };
    matched.store(true, Ordering::SeqCst);

    if service.request(&found).await {
        RequestOutcome::requested(entry)
    } else {
        let reason = format!("request for media {} failed", found.media_id);
        RequestOutcome::request_failed(entry, reason)
    }
}

fn describe_join_error(error: JoinError) -> String {
    if error.is_panic() {
        format!("task panicked: {}", panic_message(error.into_panic()))
    } else {
        error.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use overseerr_client::{MediaId, MediaMatch};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    // ============================================================================
    // Mock Service
    // ============================================================================

    #[derive(Clone, Copy)]
    enum Behavior {
        Found(MediaId),
        FoundButRequestFails(MediaId),
        NotFound,
        PanicOnSearch,
        PanicOnRequest(MediaId),
    }

    /// In-memory service keyed by entry title
    struct MockService {
        behaviors: HashMap<String, Behavior>,
        delay: Duration,
        searched: Mutex<Vec<String>>,
        requested: Mutex<Vec<MediaId>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockService {
        fn new(behaviors: &[(&str, Behavior)]) -> Self {
            Self {
                behaviors: behaviors
                    .iter()
                    .map(|(title, behavior)| (title.to_string(), *behavior))
                    .collect(),
                delay: Duration::ZERO,
                searched: Mutex::new(Vec::new()),
                requested: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn behavior(&self, title: &str) -> Behavior {
            self.behaviors.get(title).copied().unwrap_or(Behavior::NotFound)
        }

        fn requested_ids(&self) -> Vec<MediaId> {
            let mut ids = self.requested.lock().unwrap().clone();
            ids.sort();
            ids
        }
    }

    #[async_trait]
    impl MediaService for MockService {
        fn name(&self) -> &str {
            "mock"
        }

        async fn search(&self, entry: &WatchlistEntry) -> Option<MediaMatch> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.searched.lock().unwrap().push(entry.title().to_string());

            match self.behavior(entry.title()) {
                Behavior::Found(id)
                | Behavior::FoundButRequestFails(id)
                | Behavior::PanicOnRequest(id) => Some(MediaMatch::movie(id)),
                Behavior::NotFound => None,
                Behavior::PanicOnSearch => panic!("search exploded for {}", entry.title()),
            }
        }

        async fn request(&self, media: &MediaMatch) -> bool {
            let behavior = self
                .behaviors
                .values()
                .find(|b| match b {
                    Behavior::Found(id)
                    | Behavior::FoundButRequestFails(id)
                    | Behavior::PanicOnRequest(id) => *id == media.media_id,
                    _ => false,
                })
                .copied();

            match behavior {
                Some(Behavior::PanicOnRequest(_)) => panic!("request exploded"),
                Some(Behavior::FoundButRequestFails(_)) => false,
                _ => {
                    self.requested.lock().unwrap().push(media.media_id);
                    true
                }
            }
        }
    }

    fn entries(titles: &[&str]) -> Vec<WatchlistEntry> {
        titles
            .iter()
            .map(|title| WatchlistEntry::new(*title, "2000"))
            .collect()
    }

    fn outcome_for<'a>(report: &'a SyncReport, title: &str) -> &'a RequestOutcome {
        report
            .outcomes
            .iter()
            .find(|o| o.entry.title() == title)
            .expect("outcome should be recorded")
    }

    // ============================================================================
    // Tests
    // ============================================================================

    #[tokio::test]
    async fn test_found_entries_are_requested() {
        let service = Arc::new(MockService::new(&[
            ("A", Behavior::Found(1)),
            ("B", Behavior::Found(2)),
        ]));
        let orchestrator = SyncOrchestrator::new(service.clone());

        let report = orchestrator.run(entries(&["A", "B"])).await;

        assert_eq!(report.total(), 2);
        assert_eq!(report.requested(), 2);
        assert_eq!(service.requested_ids(), vec![1, 2]);
        assert!(outcome_for(&report, "A").matched);
    }

    #[tokio::test]
    async fn test_not_found_entries_are_skipped() {
        let service = Arc::new(MockService::new(&[("A", Behavior::Found(1))]));
        let orchestrator = SyncOrchestrator::new(service.clone());

        let report = orchestrator.run(entries(&["A", "Missing"])).await;

        assert_eq!(report.not_found(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(service.requested_ids(), vec![1]);

        let missing = outcome_for(&report, "Missing");
        assert!(!missing.matched);
        assert!(!missing.requested);
        assert!(missing.error.is_none());
    }

    #[tokio::test]
    async fn test_panicking_entry_does_not_affect_others() {
        let service = Arc::new(MockService::new(&[
            ("A", Behavior::PanicOnSearch),
            ("B", Behavior::Found(2)),
            ("C", Behavior::Found(3)),
            ("D", Behavior::Found(4)),
        ]));
        let orchestrator = SyncOrchestrator::new(service.clone());

        let report = orchestrator.run(entries(&["A", "B", "C", "D"])).await;

        assert_eq!(report.total(), 4);
        assert_eq!(report.requested(), 3);
        assert_eq!(report.failed(), 1);
        assert_eq!(service.requested_ids(), vec![2, 3, 4]);

        let failed = outcome_for(&report, "A");
        assert!(!failed.matched);
        assert!(failed.error.as_deref().unwrap().contains("search exploded"));
    }

    #[tokio::test]
    async fn test_panic_during_request_is_isolated() {
        let service = Arc::new(MockService::new(&[
            ("A", Behavior::PanicOnRequest(1)),
            ("B", Behavior::Found(2)),
        ]));
        let orchestrator = SyncOrchestrator::new(service.clone());

        let report = orchestrator.run(entries(&["A", "B"])).await;

        assert_eq!(report.requested(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.not_found(), 0);

        let failed = outcome_for(&report, "A");
        assert!(failed.is_failure());
        assert!(failed.matched, "the search succeeded before the panic");
        assert!(!failed.requested);
        assert!(failed.error.as_deref().unwrap().contains("request exploded"));
    }

    #[tokio::test]
    async fn test_failed_request_is_recorded() {
        let service = Arc::new(MockService::new(&[("A", Behavior::FoundButRequestFails(9))]));
        let orchestrator = SyncOrchestrator::new(service.clone());

        let report = orchestrator.run(entries(&["A"])).await;

        let outcome = outcome_for(&report, "A");
        assert!(outcome.matched);
        assert!(!outcome.requested);
        assert_eq!(outcome.error.as_deref(), Some("request for media 9 failed"));
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded_by_workers() {
        let titles: Vec<String> = (0..12).map(|i| format!("Movie {}", i)).collect();
        let behaviors: Vec<(&str, Behavior)> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| (title.as_str(), Behavior::Found(i as MediaId)))
            .collect();
        let service = Arc::new(
            MockService::new(&behaviors).with_delay(Duration::from_millis(20)),
        );
        let orchestrator = SyncOrchestrator::new(service.clone()).with_workers(4);

        let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let report = orchestrator.run(entries(&title_refs)).await;

        assert_eq!(report.requested(), 12);
        let max = service.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 4, "at most 4 searches in flight, saw {}", max);
        assert!(max >= 2, "searches should overlap, saw {}", max);
    }

    #[tokio::test]
    async fn test_every_entry_is_searched_including_duplicates() {
        let service = Arc::new(MockService::new(&[("Dune", Behavior::Found(1))]));
        let orchestrator = SyncOrchestrator::new(service.clone()).with_workers(1);

        let report = orchestrator.run(entries(&["Dune", "Dune"])).await;

        assert_eq!(report.total(), 2);
        assert_eq!(service.searched.lock().unwrap().len(), 2);
        assert_eq!(service.requested_ids(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_empty_run() {
        let service = Arc::new(MockService::new(&[]));
        let orchestrator = SyncOrchestrator::new(service);

        let report = orchestrator.run(Vec::new()).await;

        assert_eq!(report.total(), 0);
        assert_eq!(report.requested(), 0);
    }

    #[test]
    fn test_zero_workers_is_clamped() {
        let service = Arc::new(MockService::new(&[]));
        let orchestrator = SyncOrchestrator::new(service).with_workers(0);
        assert_eq!(orchestrator.workers(), 1);
    }

    #[tokio::test]
    async fn test_works_with_trait_objects() {
        let service: Arc<dyn MediaService> = Arc::new(MockService::new(&[("A", Behavior::Found(5))]));
        let orchestrator = SyncOrchestrator::new(service);

        let report = orchestrator.run(entries(&["A"])).await;
        assert_eq!(report.requested(), 1);
    }
}
