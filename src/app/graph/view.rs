use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, Vec2, vec2};

use crate::util::format_count;

use super::super::highlight::neighbor_highlight;
use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, edge_visible, edge_width,
    world_to_screen,
};
use super::super::{CoMentionGraph, ViewModel, ViewScratch};

const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const HOVER_COLOR: Color32 = Color32::from_rgb(255, 164, 101);
const HIGHLIGHT_EDGE_COLOR: Color32 = Color32::from_rgb(241, 146, 94);
const SEARCH_MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

impl ViewModel {
    fn update_screen_space(
        rect: Rect,
        pan: Vec2,
        zoom: f32,
        graph: &CoMentionGraph,
        scratch: &mut ViewScratch,
    ) {
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in &graph.nodes {
            scratch
                .screen_positions
                .push(world_to_screen(rect, pan, zoom, node.pos));
            scratch
                .screen_radii
                .push((node.radius * zoom.powf(0.40)).clamp(2.5, 46.0));
        }

        scratch.visible_indices.clear();
        scratch.visible_mask.clear();
        scratch.visible_mask.resize(graph.nodes.len(), false);
        for index in 0..graph.nodes.len() {
            if circle_visible(
                rect,
                scratch.screen_positions[index],
                scratch.screen_radii[index],
            ) {
                scratch.visible_indices.push(index);
                scratch.visible_mask[index] = true;
            }
        }
    }

    /// Small nodes first so heavily mentioned entities draw on top.
    fn ensure_draw_order(graph: &CoMentionGraph, scratch: &mut ViewScratch) {
        if !scratch.draw_order_dirty && scratch.draw_order.len() == graph.nodes.len() {
            return;
        }

        scratch.draw_order.clear();
        scratch.draw_order.extend(0..graph.nodes.len());
        scratch
            .draw_order
            .sort_by(|a, b| graph.nodes[*a].mentions.cmp(&graph.nodes[*b].mentions));
        scratch.draw_order_dirty = false;
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui, now: f64) {
        let search_matches = self.cached_search_matches();

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);
        self.handle_graph_zoom(ui, rect, &response);

        let pan = self.pan;
        let zoom = self.zoom;
        Self::update_screen_space(rect, pan, zoom, &self.graph, &mut self.view_scratch);
        Self::ensure_draw_order(&self.graph, &mut self.view_scratch);
        self.visible_node_count = self.view_scratch.visible_indices.len();

        let hovered = Self::hovered_index(
            ui,
            &self.view_scratch.visible_indices,
            &self.view_scratch.screen_positions,
            &self.view_scratch.screen_radii,
        );
        self.handle_graph_pan(&response, hovered.is_some());

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            match hovered {
                Some(index) => {
                    let node_id = self.graph.nodes[index].id.clone();
                    if let Some(outcome) = self.click_arbiter.press(&node_id, now) {
                        self.apply_click_outcome(outcome);
                    }
                }
                None => {
                    self.click_arbiter.clear();
                    self.select_entity(None);
                }
            }
        }
        if let Some(outcome) = self.click_arbiter.poll(now) {
            self.apply_click_outcome(outcome);
        }

        // Breakdowns for everything on screen warm up in the background so
        // hover details are usually ready before the pointer arrives.
        let visible_ids = self
            .view_scratch
            .visible_indices
            .iter()
            .map(|&index| self.graph.nodes[index].id.clone())
            .collect::<Vec<_>>();
        self.detail_cache
            .request_visible(visible_ids.iter().map(String::as_str));
        if let Some(index) = hovered {
            let hovered_id = self.graph.nodes[index].id.clone();
            self.detail_cache.request(&hovered_id);
        }

        let active = self
            .selected
            .as_ref()
            .and_then(|id| self.graph.index_by_id.get(id).copied())
            .or(hovered);
        let highlight = active.and_then(|index| neighbor_highlight(&self.graph, index));
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        let graph = &self.graph;
        let scratch = &self.view_scratch;

        let mut visible_edge_count = 0usize;
        for edge in &graph.edges {
            let start = scratch.screen_positions[edge.source];
            let end = scratch.screen_positions[edge.target];
            if !scratch.visible_mask[edge.source]
                && !scratch.visible_mask[edge.target]
                && !edge_visible(rect, start, end, 2.5)
            {
                continue;
            }

            let is_highlighted = highlight
                .as_ref()
                .is_some_and(|state| state.edges.contains(&(edge.source, edge.target)));
            let width = edge_width(edge.co_occurrences, graph.max_co_occurrences, zoom);
            let (width, color) = if is_highlighted {
                (width.max(1.4), HIGHLIGHT_EDGE_COLOR)
            } else if highlight.is_some() || search_active {
                (width, Color32::from_rgba_unmultiplied(74, 82, 94, 46))
            } else {
                (width, Color32::from_rgba_unmultiplied(96, 104, 118, 150))
            };

            painter.line_segment([start, end], Stroke::new(width, color));
            visible_edge_count += 1;
        }
        self.visible_edge_count = visible_edge_count;

        for &index in &self.view_scratch.draw_order {
            if !self.view_scratch.visible_mask[index] {
                continue;
            }

            let node = &self.graph.nodes[index];
            let position = self.view_scratch.screen_positions[index];
            let radius = self.view_scratch.screen_radii[index];

            let is_selected = self.selected.as_deref() == Some(node.id.as_str());
            let is_hovered = hovered == Some(index);
            let in_highlight = highlight
                .as_ref()
                .is_some_and(|state| state.nodes.contains(&index));
            let is_search_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let color = if is_selected {
                blend_color(node.color, SELECTED_COLOR, 0.65)
            } else if is_hovered {
                blend_color(node.color, HOVER_COLOR, 0.55)
            } else if in_highlight {
                node.color
            } else if is_search_match {
                blend_color(node.color, SEARCH_MATCH_COLOR, 0.6)
            } else if highlight.is_some() {
                dim_color(node.color, 0.4)
            } else if search_active {
                dim_color(node.color, 0.35)
            } else {
                node.color
            };

            painter.circle_filled(position, radius, color);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    if is_selected { 2.2 } else { 1.0 },
                    if is_selected {
                        SELECTED_COLOR
                    } else {
                        Color32::from_rgba_unmultiplied(12, 14, 18, 190)
                    },
                ),
            );

            if (is_hovered || is_selected) && self.detail_cache.is_pending(&node.id) {
                painter.text(
                    position + vec2(0.0, radius + 4.0),
                    Align2::CENTER_TOP,
                    "...",
                    FontId::proportional(10.0),
                    Color32::from_gray(160),
                );
            }

            let show_label = is_selected
                || is_hovered
                || in_highlight
                || (is_search_match && zoom > 0.35)
                || radius > 16.0
                || zoom > 1.3;
            if show_label {
                let label_color = if highlight.is_some() && !in_highlight && !is_hovered {
                    Color32::from_gray(120)
                } else {
                    Color32::from_gray(235)
                };
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    &node.name,
                    FontId::proportional(12.0),
                    label_color,
                );
            }
        }

        if let Some(index) = hovered {
            let node = &self.graph.nodes[index];
            let mut overlay = format!(
                "{}  |  {}  |  {} mentions in {} documents",
                node.name,
                node.kind.label(),
                format_count(node.mentions),
                format_count(node.documents),
            );
            if let Some(sections) = self.detail_cache.get(&node.id) {
                let top = sections
                    .iter()
                    .take(3)
                    .map(|entry| entry.section.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                if !top.is_empty() {
                    overlay.push_str("  |  sections: ");
                    overlay.push_str(&top);
                }
            } else if self.detail_cache.is_pending(&node.id) {
                overlay.push_str("  |  sections: loading...");
            }

            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                overlay,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.dragged() || self.click_arbiter.has_pending() {
            ui.ctx().request_repaint();
        }
    }
}
