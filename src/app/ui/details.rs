use eframe::egui::{self, Align, Layout, RichText, Ui};

use crate::util::format_count;

use super::super::ViewModel;

struct PartnerEntry {
    id: String,
    name: String,
    co_occurrences: u64,
    shared_documents: u64,
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        // A pinned (double-clicked) entity owns the panel until closed; plain
        // selection shows here only when nothing is pinned.
        if let Some(inspected_id) = self.inspected.clone() {
            ui.horizontal(|ui| {
                ui.heading("Inspector");
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("Close").clicked() {
                        self.inspected = None;
                    }
                });
            });
            ui.add_space(6.0);
            self.entity_card(ui, &inspected_id);
            return;
        }

        ui.heading("Selection");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a node to select it; double-click to pin it here.");
            return;
        };
        self.entity_card(ui, &selected_id);
    }

    fn entity_card(&mut self, ui: &mut Ui, entity_id: &str) {
        let Some((name, kind, mentions, documents)) = self.entity_summary(entity_id) else {
            ui.label("This entity is not part of the current snapshot.");
            return;
        };

        ui.label(RichText::new(name).strong());
        ui.small(format!("{kind}  |  {entity_id}"));
        ui.add_space(6.0);
        ui.label(format!("Mentions: {}", format_count(mentions)));
        ui.label(format!("Documents: {}", format_count(documents)));

        ui.separator();
        ui.label(RichText::new("Section breakdown").strong());
        self.draw_section_breakdown(ui, entity_id);

        ui.separator();
        ui.label(RichText::new("Co-mention partners").strong());
        let partners = self.partner_entries(entity_id, 40);
        if partners.is_empty() {
            ui.label("No partners above the current thresholds.");
        } else {
            egui::ScrollArea::vertical()
                .id_salt("partner_scroll")
                .max_height(300.0)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for partner in &partners {
                        let label = format!(
                            "{}  ({} co-occurrences, {} shared docs)",
                            partner.name,
                            format_count(partner.co_occurrences),
                            format_count(partner.shared_documents)
                        );
                        if ui.link(label).on_hover_text(partner.id.as_str()).clicked() {
                            self.select_entity(Some(partner.id.clone()));
                        }
                    }
                });
        }
    }

    fn draw_section_breakdown(&mut self, ui: &mut Ui, entity_id: &str) {
        if let Some(sections) = self.detail_cache.get(entity_id) {
            if sections.is_empty() {
                ui.label("No section data recorded for this entity.");
                return;
            }

            let mut sections = sections.to_vec();
            sections.sort_by(|a, b| {
                b.mentions
                    .cmp(&a.mentions)
                    .then_with(|| a.section.cmp(&b.section))
            });
            let total = sections.iter().map(|entry| entry.mentions).sum::<u64>().max(1);

            for entry in &sections {
                let share = (entry.mentions as f64 / total as f64) * 100.0;
                ui.label(format!(
                    "{}: {} ({share:.0}%)",
                    entry.section,
                    format_count(entry.mentions)
                ));
            }
            return;
        }

        if self.detail_cache.is_pending(entity_id) {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading sections...");
            });
            return;
        }

        if let Some(error) = self.detail_cache.failure(entity_id).map(str::to_owned) {
            ui.label(format!("Section fetch failed: {error}"));
            if ui.button("Retry").clicked() {
                self.detail_cache.request(entity_id);
            }
            return;
        }

        // First frame with this entity in the panel: kick off the fetch.
        self.detail_cache.request(entity_id);
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading sections...");
        });
    }

    /// Display fields from the render graph, falling back to the raw rows for
    /// entities the current thresholds filtered out.
    fn entity_summary(&self, entity_id: &str) -> Option<(String, &'static str, u64, u64)> {
        if let Some(&index) = self.graph.index_by_id.get(entity_id) {
            let node = &self.graph.nodes[index];
            return Some((node.name.clone(), node.kind.label(), node.mentions, node.documents));
        }

        let raw = self.raw.as_ref()?;
        raw.entities
            .iter()
            .find(|entity| entity.id == entity_id)
            .map(|entity| {
                (
                    entity.name.clone(),
                    entity.kind.label(),
                    entity.mention_count,
                    entity.document_count,
                )
            })
    }

    fn partner_entries(&self, entity_id: &str, limit: usize) -> Vec<PartnerEntry> {
        let Some(&index) = self.graph.index_by_id.get(entity_id) else {
            return Vec::new();
        };

        let mut partners = self
            .graph
            .edges
            .iter()
            .filter(|edge| edge.source == index || edge.target == index)
            .map(|edge| {
                let other = if edge.source == index {
                    edge.target
                } else {
                    edge.source
                };
                let node = &self.graph.nodes[other];
                PartnerEntry {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    co_occurrences: edge.co_occurrences,
                    shared_documents: edge.shared_documents,
                }
            })
            .collect::<Vec<_>>();

        partners.sort_by(|a, b| {
            b.co_occurrences
                .cmp(&a.co_occurrences)
                .then_with(|| a.name.cmp(&b.name))
        });
        partners.truncate(limit);
        partners
    }
}
