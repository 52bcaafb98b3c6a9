use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{Color32, Context, Pos2, Vec2};

use crate::corpus::{AggregateGateway, EntityKind};

mod detail_cache;
mod graph;
mod highlight;
mod layout;
mod loader;
mod render_utils;
mod ui;

use detail_cache::SectionBreakdownCache;
use graph::interaction::{ClickArbiter, ClickOutcome};
use loader::SnapshotLoader;

pub struct ExplorerApp {
    snapshot_path: String,
    view: ViewModel,
}

struct ViewModel {
    gateway: Arc<dyn AggregateGateway>,
    loader: SnapshotLoader,
    detail_cache: SectionBreakdownCache,
    raw: Option<loader::RawSnapshot>,

    min_co_occurrences: u64,
    min_mentions: u64,
    search: String,
    search_match_cache: Option<SearchMatchCache>,

    selected: Option<String>,
    inspected: Option<String>,
    click_arbiter: ClickArbiter,

    pan: Vec2,
    zoom: f32,
    canvas_drag: bool,

    graph: CoMentionGraph,
    graph_revision: u64,
    graph_dirty: bool,
    view_scratch: ViewScratch,
    visible_node_count: usize,
    visible_edge_count: usize,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

/// Bounded node/edge snapshot built for the current thresholds. Rebuilt in
/// full on every threshold or data change, never patched incrementally.
#[derive(Debug, Default, PartialEq)]
pub(in crate::app) struct CoMentionGraph {
    pub(in crate::app) nodes: Vec<GraphNode>,
    pub(in crate::app) edges: Vec<GraphEdge>,
    pub(in crate::app) index_by_id: HashMap<String, usize>,
    pub(in crate::app) neighbors: Vec<Vec<usize>>,
    pub(in crate::app) max_co_occurrences: u64,
}

impl CoMentionGraph {
    pub(in crate::app) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct GraphNode {
    pub(in crate::app) id: String,
    pub(in crate::app) name: String,
    pub(in crate::app) kind: EntityKind,
    pub(in crate::app) mentions: u64,
    pub(in crate::app) documents: u64,
    pub(in crate::app) radius: f32,
    pub(in crate::app) color: Color32,
    pub(in crate::app) pos: Vec2,
}

/// Non-directional; `source < target` after canonicalization in the builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) struct GraphEdge {
    pub(in crate::app) source: usize,
    pub(in crate::app) target: usize,
    pub(in crate::app) co_occurrences: u64,
    pub(in crate::app) shared_documents: u64,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
    visible_mask: Vec<bool>,
    draw_order: Vec<usize>,
    draw_order_dirty: bool,
}

impl ExplorerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        snapshot_path: String,
        gateway: Arc<dyn AggregateGateway>,
    ) -> Self {
        Self {
            snapshot_path,
            view: ViewModel::new(gateway),
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|input| input.time);

        self.view.process_background(now);
        self.view.show(ctx, &self.snapshot_path, now);

        if self.view.loader.is_loading()
            || self.view.loader.has_pending_threshold()
            || self.view.detail_cache.has_pending()
            || self.view.click_arbiter.has_pending()
        {
            ctx.request_repaint_after(Duration::from_millis(40));
        }
    }
}

impl ViewModel {
    const DEFAULT_MIN_CO_OCCURRENCES: u64 = 3;
    const DEFAULT_MIN_MENTIONS: u64 = 5;

    fn new(gateway: Arc<dyn AggregateGateway>) -> Self {
        let mut loader = SnapshotLoader::new(Arc::clone(&gateway));
        loader.request_now(Self::DEFAULT_MIN_CO_OCCURRENCES);

        Self {
            detail_cache: SectionBreakdownCache::new(Arc::clone(&gateway)),
            gateway,
            loader,
            raw: None,
            min_co_occurrences: Self::DEFAULT_MIN_CO_OCCURRENCES,
            min_mentions: Self::DEFAULT_MIN_MENTIONS,
            search: String::new(),
            search_match_cache: None,
            selected: None,
            inspected: None,
            click_arbiter: ClickArbiter::default(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            canvas_drag: false,
            graph: CoMentionGraph::default(),
            graph_revision: 0,
            graph_dirty: false,
            view_scratch: ViewScratch::default(),
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    /// Drains background channels; called once per frame before drawing.
    fn process_background(&mut self, now: f64) {
        self.loader.tick(now);

        if let Some(raw) = self.loader.poll() {
            self.raw = Some(raw);
            self.graph_dirty = true;
        }

        self.detail_cache.poll();
    }

    fn rebuild_graph(&mut self) {
        self.graph_revision = self.graph_revision.wrapping_add(1);
        self.search_match_cache = None;

        let mut graph = match &self.raw {
            Some(raw) => graph::build::build_comention_graph(
                &raw.entities,
                &raw.pairs,
                self.min_mentions,
            ),
            None => CoMentionGraph::default(),
        };

        layout::run_layout(&mut graph.nodes, &graph.edges, &layout::LayoutParams::default());

        self.graph = graph;
        self.view_scratch.draw_order_dirty = true;
        self.visible_node_count = self.graph.nodes.len();
        self.visible_edge_count = self.graph.edges.len();
        self.graph_dirty = false;
    }

    fn apply_click_outcome(&mut self, outcome: ClickOutcome) {
        match outcome {
            ClickOutcome::ToggleSelection(id) => {
                if self.selected.as_deref() == Some(id.as_str()) {
                    self.selected = None;
                } else {
                    self.selected = Some(id);
                }
            }
            ClickOutcome::Inspect(id) => {
                // Double click pins the entity in the inspector without
                // touching the selection.
                self.detail_cache.request(&id);
                self.inspected = Some(id);
            }
        }
    }

    fn select_entity(&mut self, id: Option<String>) {
        self.selected = id;
    }

    fn reset_view(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
        self.selected = None;
        self.click_arbiter.clear();
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        if self.selected.is_some() {
            return None;
        }

        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.graph_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let hits = self.gateway.search_entities(query, 50).unwrap_or_default();
        let matches = hits
            .iter()
            .filter_map(|entity| self.graph.index_by_id.get(&entity.id).copied())
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.graph_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::corpus::{CoOccurrenceRow, EntityRow, EntitySort, SectionCount, SortOrder};

    struct EmptyGateway;

    impl AggregateGateway for EmptyGateway {
        fn top_entities(
            &self,
            _sort: EntitySort,
            _order: SortOrder,
            _limit: usize,
        ) -> Result<Vec<EntityRow>> {
            Ok(Vec::new())
        }

        fn co_occurrence_pairs(
            &self,
            _min_co_occurrences: u64,
            _limit: usize,
        ) -> Result<Vec<CoOccurrenceRow>> {
            Ok(Vec::new())
        }

        fn section_breakdown(&self, _entity_id: &str) -> Result<Vec<SectionCount>> {
            Ok(Vec::new())
        }

        fn search_entities(&self, _query: &str, _limit: usize) -> Result<Vec<EntityRow>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn inspect_outcome_leaves_selection_untouched() {
        let mut view = ViewModel::new(Arc::new(EmptyGateway));
        view.selected = Some("a".to_owned());

        view.apply_click_outcome(ClickOutcome::Inspect("b".to_owned()));

        // A double click pins the inspector and must not move the selection.
        assert_eq!(view.selected.as_deref(), Some("a"));
        assert_eq!(view.inspected.as_deref(), Some("b"));

        view.inspected = None;
        view.selected = None;
        view.apply_click_outcome(ClickOutcome::Inspect("b".to_owned()));
        assert_eq!(view.selected, None);
        assert_eq!(view.inspected.as_deref(), Some("b"));
    }

    #[test]
    fn toggle_outcome_selects_and_deselects() {
        let mut view = ViewModel::new(Arc::new(EmptyGateway));

        view.apply_click_outcome(ClickOutcome::ToggleSelection("a".to_owned()));
        assert_eq!(view.selected.as_deref(), Some("a"));

        view.apply_click_outcome(ClickOutcome::ToggleSelection("a".to_owned()));
        assert_eq!(view.selected, None);
    }
}
