mod forces;
mod quadtree;

use eframe::egui::Vec2;

use forces::{accumulate_collisions, accumulate_repulsion};
use quadtree::QuadCell;

use super::{GraphEdge, GraphNode};

const BARNES_HUT_THETA: f32 = 0.72;

/// Fixed layout configuration; not tuned per snapshot.
pub(in crate::app) struct LayoutParams {
    pub(in crate::app) iterations: usize,
    pub(in crate::app) link_distance: f32,
    pub(in crate::app) link_strength: f32,
    pub(in crate::app) repulsion_strength: f32,
    pub(in crate::app) center_pull: f32,
    pub(in crate::app) collision_margin: f32,
    pub(in crate::app) collision_strength: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            iterations: 300,
            link_distance: 80.0,
            link_strength: 0.3,
            repulsion_strength: 120.0,
            center_pull: 0.0015,
            collision_margin: 3.0,
            collision_strength: 1.8,
        }
    }
}

/// One-shot force simulation: runs a fixed number of iterations over the node
/// positions seeded by the builder and writes the settled positions back.
/// Deterministic for a given input graph; no convergence detection, just a
/// cooling displacement clamp. Edges attract, everything repels, the whole
/// layout is pulled weakly to the origin, and overlapping circles push apart.
pub(in crate::app) fn run_layout(
    nodes: &mut [GraphNode],
    edges: &[GraphEdge],
    params: &LayoutParams,
) {
    let n = nodes.len();
    if n <= 1 {
        // A lone node keeps its (finite) seeded position.
        return;
    }

    let mut positions = nodes.iter().map(|node| node.pos).collect::<Vec<_>>();
    let radii = nodes.iter().map(|node| node.radius).collect::<Vec<_>>();

    let repulsion = params.repulsion_strength * params.link_distance;
    let mut temperature = (params.link_distance * 5.0).max(140.0);
    let mut disp = vec![Vec2::ZERO; n];

    for _ in 0..params.iterations {
        disp.fill(Vec2::ZERO);

        if let Some(tree) = QuadCell::build(&positions) {
            for (index, force) in disp.iter_mut().enumerate() {
                accumulate_repulsion(
                    &tree,
                    index,
                    &positions,
                    repulsion,
                    BARNES_HUT_THETA,
                    force,
                );
            }
        }

        for edge in edges {
            if edge.source >= n || edge.target >= n || edge.source == edge.target {
                continue;
            }

            let delta = positions[edge.source] - positions[edge.target];
            let distance = delta.length().max(0.5);
            let direction = delta / distance;
            let preferred = params.link_distance + radii[edge.source] + radii[edge.target];
            let pull = (distance - preferred) * params.link_strength;

            disp[edge.source] -= direction * pull;
            disp[edge.target] += direction * pull;
        }

        accumulate_collisions(
            &positions,
            &radii,
            params.collision_margin,
            params.collision_strength,
            &mut disp,
        );

        for (index, force) in disp.iter_mut().enumerate() {
            *force -= positions[index] * params.center_pull;
        }

        for (position, force) in positions.iter_mut().zip(disp.iter()) {
            let length = force.length();
            if length > 0.0 {
                *position += (*force / length) * length.min(temperature) * 0.9;
            }
        }

        temperature = (temperature * 0.965).max(0.5);
    }

    let centroid = positions.iter().copied().fold(Vec2::ZERO, |acc, p| acc + p) / n as f32;
    for (node, position) in nodes.iter_mut().zip(positions) {
        let settled = position - centroid;
        debug_assert!(
            settled.x.is_finite() && settled.y.is_finite(),
            "force computation produced a non-finite position"
        );
        node.pos = settled;
    }
}
