use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::corpus::{AggregateGateway, CoOccurrenceRow, EntityRow, EntitySort, SortOrder};

/// Co-occurrence pairs fetched per request, most significant first.
const CO_OCCURRENCE_FETCH_LIMIT: usize = 500;
/// Entities fetched per request, top mention counts first.
const ENTITY_FETCH_LIMIT: usize = 200;
/// A threshold change must hold still this long before a fetch fires.
const THRESHOLD_QUIESCENCE_SECS: f64 = 0.3;

/// Raw gateway rows for one fetch generation. The graph builder consumes
/// these; the loader never interprets them.
pub(in crate::app) struct RawSnapshot {
    pub(in crate::app) entities: Vec<EntityRow>,
    pub(in crate::app) pairs: Vec<CoOccurrenceRow>,
}

/// Fetches the entity/pair snapshot for the current minimum co-occurrence
/// threshold on a background thread. Requests are tagged with a generation
/// number; a response from a superseded generation is dropped on the floor so
/// a slow stale fetch can never overwrite fresher state.
pub(in crate::app) struct SnapshotLoader {
    gateway: Arc<dyn AggregateGateway>,
    tx: Sender<(u64, Result<RawSnapshot, String>)>,
    rx: Receiver<(u64, Result<RawSnapshot, String>)>,
    generation: u64,
    requested_threshold: u64,
    pending_threshold: Option<(u64, f64)>,
    loading: bool,
    error: Option<String>,
}

impl SnapshotLoader {
    pub(in crate::app) fn new(gateway: Arc<dyn AggregateGateway>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            gateway,
            tx,
            rx,
            generation: 0,
            requested_threshold: 0,
            pending_threshold: None,
            loading: false,
            error: None,
        }
    }

    /// Records a threshold change; the fetch fires from `tick` once the value
    /// has been quiescent for the debounce window. Returning to the already
    /// requested value cancels the pending fetch instead of re-arming it.
    pub(in crate::app) fn set_threshold(&mut self, min_co_occurrences: u64, now: f64) {
        if min_co_occurrences == self.requested_threshold {
            self.pending_threshold = None;
            return;
        }
        self.pending_threshold = Some((min_co_occurrences, now));
    }

    pub(in crate::app) fn tick(&mut self, now: f64) {
        if let Some((threshold, since)) = self.pending_threshold
            && now - since >= THRESHOLD_QUIESCENCE_SECS
        {
            self.pending_threshold = None;
            self.request_now(threshold);
        }
    }

    /// Issues a fetch immediately, superseding any in-flight one.
    pub(in crate::app) fn request_now(&mut self, min_co_occurrences: u64) {
        self.generation = self.generation.wrapping_add(1);
        self.requested_threshold = min_co_occurrences;
        self.pending_threshold = None;
        self.loading = true;
        self.error = None;

        let generation = self.generation;
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = fetch_snapshot(gateway.as_ref(), min_co_occurrences);
            let _ = tx.send((generation, result));
        });
    }

    pub(in crate::app) fn retry(&mut self) {
        self.request_now(self.requested_threshold);
    }

    /// Drains responses; returns the snapshot if the current generation
    /// resolved successfully this frame.
    pub(in crate::app) fn poll(&mut self) -> Option<RawSnapshot> {
        let mut fresh = None;
        while let Ok((generation, result)) = self.rx.try_recv() {
            if let Some(raw) = self.accept(generation, result) {
                fresh = Some(raw);
            }
        }
        fresh
    }

    fn accept(
        &mut self,
        generation: u64,
        result: Result<RawSnapshot, String>,
    ) -> Option<RawSnapshot> {
        if generation != self.generation {
            return None;
        }

        self.loading = false;
        match result {
            Ok(raw) => {
                self.error = None;
                Some(raw)
            }
            Err(error) => {
                self.error = Some(error);
                None
            }
        }
    }

    pub(in crate::app) fn is_loading(&self) -> bool {
        self.loading
    }

    pub(in crate::app) fn has_pending_threshold(&self) -> bool {
        self.pending_threshold.is_some()
    }

    pub(in crate::app) fn requested_threshold(&self) -> u64 {
        self.requested_threshold
    }

    pub(in crate::app) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// The entity and pair requests are independent reads, so they run in
/// parallel and the slower one bounds the fetch.
fn fetch_snapshot(
    gateway: &dyn AggregateGateway,
    min_co_occurrences: u64,
) -> Result<RawSnapshot, String> {
    thread::scope(|scope| {
        let entity_task = scope.spawn(|| {
            gateway.top_entities(EntitySort::Mentions, SortOrder::Descending, ENTITY_FETCH_LIMIT)
        });
        let pairs = gateway.co_occurrence_pairs(min_co_occurrences, CO_OCCURRENCE_FETCH_LIMIT);
        let entities = entity_task
            .join()
            .map_err(|_| "entity fetch worker panicked".to_owned())?;

        Ok(RawSnapshot {
            entities: entities.map_err(|error| error.to_string())?,
            pairs: pairs.map_err(|error| error.to_string())?,
        })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use anyhow::{Result, anyhow};

    use super::*;
    use crate::corpus::SectionCount;

    struct StubGateway {
        pair_fetches: AtomicUsize,
        fail_entities: bool,
    }

    impl StubGateway {
        fn new() -> Self {
            Self {
                pair_fetches: AtomicUsize::new(0),
                fail_entities: false,
            }
        }

        fn failing() -> Self {
            Self {
                pair_fetches: AtomicUsize::new(0),
                fail_entities: true,
            }
        }
    }

    impl AggregateGateway for StubGateway {
        fn top_entities(
            &self,
            _sort: EntitySort,
            _order: SortOrder,
            _limit: usize,
        ) -> Result<Vec<EntityRow>> {
            if self.fail_entities {
                return Err(anyhow!("gateway unreachable"));
            }
            Ok(Vec::new())
        }

        fn co_occurrence_pairs(
            &self,
            min_co_occurrences: u64,
            _limit: usize,
        ) -> Result<Vec<CoOccurrenceRow>> {
            self.pair_fetches.fetch_add(1, Ordering::SeqCst);
            // Encode the requested threshold in the row count so tests can
            // tell which request a response belongs to.
            Ok((0..min_co_occurrences)
                .map(|index| CoOccurrenceRow {
                    entity_a: format!("a{index}"),
                    entity_b: format!("b{index}"),
                    co_occurrences: min_co_occurrences,
                    shared_documents: 1,
                })
                .collect())
        }

        fn section_breakdown(&self, _entity_id: &str) -> Result<Vec<SectionCount>> {
            Ok(Vec::new())
        }

        fn search_entities(&self, _query: &str, _limit: usize) -> Result<Vec<EntityRow>> {
            Ok(Vec::new())
        }
    }

    fn wait_until_settled(loader: &mut SnapshotLoader) -> Option<RawSnapshot> {
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut latest = None;
        while loader.is_loading() {
            if let Some(raw) = loader.poll() {
                latest = Some(raw);
            }
            assert!(Instant::now() < deadline, "loader never settled");
            thread::sleep(Duration::from_millis(5));
        }
        if let Some(raw) = loader.poll() {
            latest = Some(raw);
        }
        latest
    }

    fn raw(count: usize) -> RawSnapshot {
        RawSnapshot {
            entities: Vec::new(),
            pairs: (0..count)
                .map(|index| CoOccurrenceRow {
                    entity_a: format!("a{index}"),
                    entity_b: format!("b{index}"),
                    co_occurrences: 1,
                    shared_documents: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut loader = SnapshotLoader::new(Arc::new(StubGateway::new()));
        loader.generation = 2;
        loader.loading = true;

        // Generation 2 resolves first; generation 1 straggles in afterwards.
        let fresh = loader.accept(2, Ok(raw(2)));
        assert_eq!(fresh.map(|r| r.pairs.len()), Some(2));
        assert!(!loader.is_loading());

        let stale = loader.accept(1, Ok(raw(1)));
        assert!(stale.is_none());
        assert!(loader.error().is_none());
    }

    #[test]
    fn stale_error_does_not_clobber_fresh_state() {
        let mut loader = SnapshotLoader::new(Arc::new(StubGateway::new()));
        loader.generation = 3;
        loader.loading = true;

        assert!(loader.accept(3, Ok(raw(1))).is_some());
        assert!(loader.accept(2, Err("slow failure".to_owned())).is_none());
        assert!(loader.error().is_none());
    }

    #[test]
    fn superseded_request_loses_to_newer_one() {
        let gateway = Arc::new(StubGateway::new());
        let mut loader = SnapshotLoader::new(gateway.clone());

        loader.request_now(1);
        loader.request_now(4);

        let raw = wait_until_settled(&mut loader).expect("newest generation resolves");
        assert_eq!(raw.pairs.len(), 4);
        assert_eq!(loader.requested_threshold(), 4);
    }

    #[test]
    fn threshold_change_waits_for_quiescence() {
        let gateway = Arc::new(StubGateway::new());
        let mut loader = SnapshotLoader::new(gateway.clone());

        loader.set_threshold(5, 0.0);
        loader.tick(0.1);
        assert!(!loader.is_loading());
        assert_eq!(gateway.pair_fetches.load(Ordering::SeqCst), 0);

        // A new value resets the quiescence timer.
        loader.set_threshold(6, 0.2);
        loader.tick(0.45);
        assert!(!loader.is_loading());

        loader.tick(0.55);
        assert!(loader.is_loading());

        wait_until_settled(&mut loader);
        assert_eq!(gateway.pair_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(loader.requested_threshold(), 6);
    }

    #[test]
    fn unchanged_threshold_does_not_refetch() {
        let gateway = Arc::new(StubGateway::new());
        let mut loader = SnapshotLoader::new(gateway.clone());

        loader.request_now(3);
        wait_until_settled(&mut loader);
        assert_eq!(gateway.pair_fetches.load(Ordering::SeqCst), 1);

        loader.set_threshold(3, 10.0);
        loader.tick(11.0);
        assert!(!loader.is_loading());
        assert_eq!(gateway.pair_fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn returning_to_active_threshold_cancels_pending_fetch() {
        let gateway = Arc::new(StubGateway::new());
        let mut loader = SnapshotLoader::new(gateway.clone());

        loader.request_now(3);
        wait_until_settled(&mut loader);
        assert_eq!(gateway.pair_fetches.load(Ordering::SeqCst), 1);

        // Slider drifts to 6 and back to 3 inside the debounce window; the
        // value never effectively changed, so nothing may fire.
        loader.set_threshold(6, 10.0);
        loader.set_threshold(3, 10.1);
        assert!(!loader.has_pending_threshold());

        loader.tick(11.0);
        assert!(!loader.is_loading());
        assert_eq!(gateway.pair_fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fetch_failure_surfaces_recoverable_error() {
        let mut loader = SnapshotLoader::new(Arc::new(StubGateway::failing()));

        loader.request_now(2);
        let raw = wait_until_settled(&mut loader);
        assert!(raw.is_none());
        assert!(loader.error().is_some_and(|e| e.contains("unreachable")));

        // Retry clears the error and issues a new generation.
        loader.retry();
        assert!(loader.is_loading());
        assert!(loader.error().is_none());
        wait_until_settled(&mut loader);
        assert!(loader.error().is_some());
    }
}
