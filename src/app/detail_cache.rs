use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::corpus::{AggregateGateway, SectionCount};

/// Per-entity section breakdowns, fetched lazily and memoized for the life of
/// the view. The pending set deduplicates concurrent interest (hover racing
/// visible-window prefetch): an id that is already resolved or in flight
/// never triggers a second fetch. A failed fetch leaves no entry behind, so
/// the id stays retryable.
pub(in crate::app) struct SectionBreakdownCache {
    gateway: Arc<dyn AggregateGateway>,
    resolved: HashMap<String, Vec<SectionCount>>,
    pending: HashSet<String>,
    failed: HashMap<String, String>,
    tx: Sender<(String, Result<Vec<SectionCount>, String>)>,
    rx: Receiver<(String, Result<Vec<SectionCount>, String>)>,
}

impl SectionBreakdownCache {
    pub(in crate::app) fn new(gateway: Arc<dyn AggregateGateway>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            gateway,
            resolved: HashMap::new(),
            pending: HashSet::new(),
            failed: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Requests one entity's breakdown unless it is already resolved or in
    /// flight. A previous failure is cleared and retried.
    pub(in crate::app) fn request(&mut self, entity_id: &str) {
        if self.resolved.contains_key(entity_id) || self.pending.contains(entity_id) {
            return;
        }

        self.failed.remove(entity_id);
        self.pending.insert(entity_id.to_owned());

        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        let entity_id = entity_id.to_owned();
        thread::spawn(move || {
            let result = gateway
                .section_breakdown(&entity_id)
                .map_err(|error| error.to_string());
            let _ = tx.send((entity_id, result));
        });
    }

    /// Batch variant for the ids currently in the viewport. Each uncached id
    /// fetches independently; one failing id does not fail the batch.
    pub(in crate::app) fn request_visible<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            // Visible-window prefetch must not hammer ids that already
            // failed once this session; hover/explicit requests retry them.
            if self.failed.contains_key(id) {
                continue;
            }
            self.request(id);
        }
    }

    /// Drains finished fetches. Returns true if anything resolved or failed,
    /// so the caller can repaint.
    pub(in crate::app) fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok((entity_id, result)) = self.rx.try_recv() {
            // Pending bookkeeping is cleared on both outcomes; a stuck entry
            // would block every future retry for this id.
            self.pending.remove(&entity_id);
            match result {
                Ok(sections) => {
                    self.resolved.insert(entity_id, sections);
                }
                Err(error) => {
                    self.failed.insert(entity_id, error);
                }
            }
            changed = true;
        }
        changed
    }

    pub(in crate::app) fn get(&self, entity_id: &str) -> Option<&[SectionCount]> {
        self.resolved.get(entity_id).map(Vec::as_slice)
    }

    pub(in crate::app) fn is_pending(&self, entity_id: &str) -> bool {
        self.pending.contains(entity_id)
    }

    pub(in crate::app) fn failure(&self, entity_id: &str) -> Option<&str> {
        self.failed.get(entity_id).map(String::as_str)
    }

    pub(in crate::app) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
