use std::collections::HashSet;

use super::CoMentionGraph;

/// Active-node highlight: the node itself, its direct co-mention partners,
/// and the edges joining them. Everything outside these sets is dimmed by
/// the draw pass, never hidden.
pub(in crate::app) struct HighlightState {
    pub(in crate::app) nodes: HashSet<usize>,
    pub(in crate::app) edges: HashSet<(usize, usize)>,
}

pub(in crate::app) fn neighbor_highlight(
    graph: &CoMentionGraph,
    active: usize,
) -> Option<HighlightState> {
    if active >= graph.nodes.len() {
        return None;
    }

    let mut nodes = HashSet::new();
    let mut edges = HashSet::new();
    nodes.insert(active);

    // Edge keys use the builder's canonical (low, high) index order.
    for &other in &graph.neighbors[active] {
        nodes.insert(other);
        edges.insert((active.min(other), active.max(other)));
    }

    Some(HighlightState { nodes, edges })
}
