use eframe::egui::{self, Sense, Ui, vec2};

use super::super::ViewModel;
use super::super::render_utils::SECTION_PALETTE;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, now: f64) {
        ui.heading("Filters");
        ui.add_space(6.0);

        ui.label("Search entities");
        ui.text_edit_singleline(&mut self.search);
        if !self.search.trim().is_empty() && self.selected.is_some() {
            ui.small("Search highlight is paused while a node is selected.");
        }

        ui.add_space(8.0);

        // The fetch itself is debounced in the loader, so dragging the slider
        // only fires one request once the value settles.
        let threshold_slider = ui.add(
            egui::Slider::new(&mut self.min_co_occurrences, 1..=25)
                .text("Min co-occurrences")
                .clamping(egui::SliderClamping::Always),
        );
        if threshold_slider.changed() {
            self.loader.set_threshold(self.min_co_occurrences, now);
        }
        if self.loader.has_pending_threshold() {
            ui.small(format!(
                "Applying... (active: {})",
                self.loader.requested_threshold()
            ));
        }

        let mentions_slider = ui.add(
            egui::Slider::new(&mut self.min_mentions, 0..=200)
                .text("Min mentions")
                .clamping(egui::SliderClamping::Always),
        );
        if mentions_slider.changed() {
            // Mention filtering is local; no refetch, just a rebuild.
            self.graph_dirty = true;
        }

        ui.add_space(8.0);
        if ui.button("Reset view").clicked() {
            self.reset_view();
        }

        ui.separator();
        ui.label("Section colors");
        ui.add_space(4.0);
        for (label, color) in SECTION_PALETTE {
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
                ui.painter().circle_filled(rect.center(), 5.0, color);
                ui.label(label);
            });
        }

        ui.separator();
        ui.small("Click: select. Double-click: inspect. Drag empty canvas or use the middle/right button to pan; scroll to zoom.");
    }
}
