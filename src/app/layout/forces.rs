use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadCell;

/// Deterministic push-apart direction for (near-)coincident points.
fn separation_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin())
}

fn repulsion_between(point: Vec2, other: Vec2, strength: f32, mass: f32) -> Vec2 {
    let delta = point - other;
    let distance = delta.length();
    if distance <= 0.0001 {
        return vec2(1.0, 0.0) * (strength * mass);
    }
    (delta / distance) * ((strength * mass) / distance.max(0.5))
}

/// Barnes-Hut traversal: a cell far enough away (side/distance < theta) acts
/// as one aggregate body; otherwise recurse into its children.
pub(super) fn accumulate_repulsion(
    cell: &QuadCell,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    force: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other in &cell.indices {
            if other == index {
                continue;
            }
            *force += repulsion_between(point, positions[other], strength, 1.0);
        }
        return;
    }

    let delta = point - cell.center_of_mass;
    let distance = delta.length().max(0.0001);
    let can_approximate = !cell.bounds.contains(point)
        && (cell.bounds.side_length() / distance) < theta
        && cell.mass > 1.0;

    if can_approximate {
        *force += repulsion_between(point, cell.center_of_mass, strength, cell.mass);
        return;
    }

    for child in cell.children.iter().flatten() {
        accumulate_repulsion(child, index, positions, strength, theta, force);
    }
}

/// Pairwise minimum-separation push: nodes closer than the sum of their radii
/// plus the margin are driven apart. Exact O(n^2) scan; the graph is capped
/// at a few hundred nodes.
pub(super) fn accumulate_collisions(
    positions: &[Vec2],
    radii: &[f32],
    margin: f32,
    strength: f32,
    forces: &mut [Vec2],
) {
    let n = positions.len();
    for from in 0..n {
        for to in (from + 1)..n {
            let min_distance = radii[from] + radii[to] + margin;
            let delta = positions[from] - positions[to];
            let distance_sq = delta.length_sq();
            if distance_sq >= min_distance * min_distance {
                continue;
            }

            let distance = distance_sq.sqrt();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                separation_direction(from, to)
            };

            let push = (min_distance - distance) * strength;
            forces[from] += direction * push;
            forces[to] -= direction * push;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repulsion_pushes_points_apart() {
        let positions = vec![vec2(-10.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadCell::build(&positions).unwrap();

        let mut left = Vec2::ZERO;
        accumulate_repulsion(&tree, 0, &positions, 9_600.0, 0.72, &mut left);
        let mut right = Vec2::ZERO;
        accumulate_repulsion(&tree, 1, &positions, 9_600.0, 0.72, &mut right);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left.x + right.x).abs() < 0.001);
    }

    #[test]
    fn collision_only_acts_inside_min_separation() {
        let positions = vec![vec2(0.0, 0.0), vec2(100.0, 0.0), vec2(8.0, 0.0)];
        let radii = vec![6.0, 6.0, 6.0];
        let mut forces = vec![Vec2::ZERO; 3];

        accumulate_collisions(&positions, &radii, 3.0, 1.8, &mut forces);

        // Far pair untouched, overlapping pair pushed apart.
        assert!(forces[1].length() < 0.001);
        assert!(forces[0].x < 0.0);
        assert!(forces[2].x > 0.0);
    }

    #[test]
    fn coincident_nodes_still_separate() {
        let positions = vec![vec2(0.0, 0.0), vec2(0.0, 0.0)];
        let radii = vec![6.0, 6.0];
        let mut forces = vec![Vec2::ZERO; 2];

        accumulate_collisions(&positions, &radii, 3.0, 1.8, &mut forces);
        assert!(forces[0].length() > 0.0);
        assert!((forces[0] + forces[1]).length() < 0.001);
    }
}
