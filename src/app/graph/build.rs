use std::collections::HashMap;
use std::f32::consts::TAU;

use eframe::egui::vec2;

use crate::corpus::{CoOccurrenceRow, EntityRow};
use crate::util::stable_pair;

use super::super::render_utils::{node_radius, section_color};
use super::super::{CoMentionGraph, GraphEdge, GraphNode};

/// Initial placement ring radius grows with node count so the simulation
/// starts spread out rather than collapsed.
const PLACEMENT_RING_SCALE: f32 = 60.0;
const PLACEMENT_JITTER: f32 = 14.0;

/// Builds the bounded co-mention graph for one filter snapshot.
///
/// Admission: an entity becomes a node only if it is an endpoint of at least
/// one surviving pair and meets the mention threshold; a pair becomes an edge
/// only if both endpoints were admitted. Edges are therefore computed after
/// the node set is fixed and can never dangle. Symmetric duplicates collapse
/// on the canonical id pair, first occurrence (the most significant row,
/// given the gateway's ordering) winning.
pub(in crate::app) fn build_comention_graph(
    entities: &[EntityRow],
    pairs: &[CoOccurrenceRow],
    min_mentions: u64,
) -> CoMentionGraph {
    let qualified: HashMap<&str, &EntityRow> = entities
        .iter()
        .filter(|entity| entity.mention_count >= min_mentions)
        .map(|entity| (entity.id.as_str(), entity))
        .collect();

    // Pairs whose endpoints both qualify; ids referencing entities missing
    // from the fetched set are a filtering outcome, not an error.
    let mut surviving: Vec<&CoOccurrenceRow> = Vec::new();
    let mut seen_pairs = HashMap::new();
    for pair in pairs {
        if pair.entity_a == pair.entity_b {
            continue;
        }
        if !qualified.contains_key(pair.entity_a.as_str())
            || !qualified.contains_key(pair.entity_b.as_str())
        {
            continue;
        }
        if seen_pairs.insert(pair.canonical_key(), ()).is_some() {
            continue;
        }
        surviving.push(pair);
    }

    if surviving.is_empty() {
        return CoMentionGraph::default();
    }

    let mut admitted: Vec<&EntityRow> = {
        let mut by_id: HashMap<&str, &EntityRow> = HashMap::new();
        for pair in &surviving {
            for id in [pair.entity_a.as_str(), pair.entity_b.as_str()] {
                if let Some(&entity) = qualified.get(id) {
                    by_id.insert(id, entity);
                }
            }
        }
        by_id.into_values().collect()
    };

    // Mentions descending, id ascending: stable order means stable initial
    // angular placement, which keeps rebuilds reproducible.
    admitted.sort_by(|a, b| {
        b.mention_count
            .cmp(&a.mention_count)
            .then_with(|| a.id.cmp(&b.id))
    });

    let max_mentions = admitted
        .iter()
        .map(|entity| entity.mention_count)
        .max()
        .unwrap_or(0);

    let node_count = admitted.len();
    let ring_radius = (node_count as f32).sqrt() * PLACEMENT_RING_SCALE;
    let nodes = admitted
        .iter()
        .enumerate()
        .map(|(index, entity)| {
            let angle = (index as f32 / node_count as f32) * TAU;
            let (jx, jy) = stable_pair(&entity.id);
            let pos = vec2(angle.cos(), angle.sin()) * ring_radius
                + vec2(jx * PLACEMENT_JITTER, jy * PLACEMENT_JITTER);

            GraphNode {
                id: entity.id.clone(),
                name: entity.name.clone(),
                kind: entity.kind,
                mentions: entity.mention_count,
                documents: entity.document_count,
                radius: node_radius(entity.mention_count, max_mentions),
                color: section_color(entity.dominant_section()),
                pos,
            }
        })
        .collect::<Vec<GraphNode>>();

    let index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.clone(), index))
        .collect::<HashMap<_, _>>();

    let mut edges = Vec::with_capacity(surviving.len());
    let mut neighbors = vec![Vec::new(); nodes.len()];
    let mut max_co_occurrences = 0u64;
    for pair in surviving {
        let (Some(&a), Some(&b)) = (
            index_by_id.get(&pair.entity_a),
            index_by_id.get(&pair.entity_b),
        ) else {
            continue;
        };

        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        edges.push(GraphEdge {
            source,
            target,
            co_occurrences: pair.co_occurrences,
            shared_documents: pair.shared_documents,
        });
        neighbors[source].push(target);
        neighbors[target].push(source);
        max_co_occurrences = max_co_occurrences.max(pair.co_occurrences);
    }

    CoMentionGraph {
        nodes,
        edges,
        index_by_id,
        neighbors,
        max_co_occurrences,
    }
}
