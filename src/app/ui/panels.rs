use eframe::egui::{self, Align, Context, Layout};

use crate::util::format_count;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context, snapshot_path: &str, now: f64) {
        if self.graph_dirty {
            self.rebuild_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Co-mention Explorer");
                    ui.separator();
                    ui.label(format!("snapshot: {snapshot_path}"));
                    if let Some(raw) = &self.raw {
                        ui.label(format!("entities: {}", format_count(raw.entities.len() as u64)));
                        ui.label(format!("pairs: {}", format_count(raw.pairs.len() as u64)));
                    }

                    let reload_button =
                        ui.add_enabled(!self.loader.is_loading(), egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        self.loader.request_now(self.min_co_occurrences);
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} nodes / {} edges",
                            self.visible_node_count, self.visible_edge_count
                        ));
                        if self.loader.is_loading() || self.loader.has_pending_threshold() {
                            ui.spinner();
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_controls(ui, now));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        let load_error = self.loader.error().map(str::to_owned);
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(error) = load_error {
                // A failed fetch replaces the graph rather than leaving a
                // stale one up with an error tucked in a corner.
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Snapshot fetch failed");
                    ui.add_space(8.0);
                    ui.label(error);
                    ui.add_space(12.0);
                    if ui.button("Retry").clicked() {
                        self.loader.retry();
                    }
                });
            } else if self.raw.is_none() {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Loading co-mention snapshot...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else if self.graph.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("No co-mentions at these thresholds");
                    ui.add_space(8.0);
                    ui.label("Lower the minimum co-occurrences or minimum mentions to see more.");
                });
            } else {
                self.draw_graph(ui, now);
            }
        });
    }
}
