use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::ViewModel;
use super::super::render_utils::screen_to_world;

/// Second click within this window turns a pending single click into a
/// double click.
pub(in crate::app) const CLICK_WINDOW_SECS: f64 = 0.3;

/// What a resolved click means for the view model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) enum ClickOutcome {
    /// Single click settled: select the node, or deselect if it already was.
    ToggleSelection(String),
    /// Double click: pin the entity in the inspector. Never paired with a
    /// selection change from the same gesture.
    Inspect(String),
}

/// Single/double-click disambiguation as a pure reducer over press events and
/// an injected clock, so the timer logic tests without a UI. One global
/// pending click: pressing a different node supersedes the pending one.
#[derive(Default)]
pub(in crate::app) struct ClickArbiter {
    pending: Option<(String, f64)>,
}

impl ClickArbiter {
    pub(in crate::app) fn press(&mut self, node_id: &str, now: f64) -> Option<ClickOutcome> {
        match self.pending.take() {
            Some((pending_id, since))
                if pending_id == node_id && now - since <= CLICK_WINDOW_SECS =>
            {
                Some(ClickOutcome::Inspect(pending_id))
            }
            _ => {
                self.pending = Some((node_id.to_owned(), now));
                None
            }
        }
    }

    /// Fires the deferred single-click action once the window has passed with
    /// no second press.
    pub(in crate::app) fn poll(&mut self, now: f64) -> Option<ClickOutcome> {
        if let Some((_, since)) = &self.pending
            && now - since > CLICK_WINDOW_SECS
        {
            let (node_id, _) = self.pending.take()?;
            return Some(ClickOutcome::ToggleSelection(node_id));
        }
        None
    }

    pub(in crate::app) fn clear(&mut self) {
        self.pending = None;
    }

    pub(in crate::app) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        // Keep the world point under the cursor fixed while zooming.
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    /// Primary drag pans only when it started on empty canvas; a drag that
    /// started on a node is node interaction, not navigation. Middle and
    /// secondary drags always pan.
    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response, over_node: bool) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.canvas_drag = !over_node;
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.canvas_drag = false;
        }

        if (self.canvas_drag && response.dragged_by(egui::PointerButton::Primary))
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        visible_indices: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = screen_positions[index].distance(pointer);
                (distance <= screen_radii[index]).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_click_toggles_after_the_window() {
        let mut arbiter = ClickArbiter::default();

        assert_eq!(arbiter.press("a", 0.0), None);
        assert_eq!(arbiter.poll(0.1), None);
        assert_eq!(arbiter.poll(0.3), None);
        assert_eq!(
            arbiter.poll(0.31),
            Some(ClickOutcome::ToggleSelection("a".to_owned()))
        );
        assert!(!arbiter.has_pending());
        assert_eq!(arbiter.poll(1.0), None);
    }

    #[test]
    fn double_click_inspects_and_suppresses_the_toggle() {
        let mut arbiter = ClickArbiter::default();

        assert_eq!(arbiter.press("a", 0.0), None);
        assert_eq!(
            arbiter.press("a", 0.2),
            Some(ClickOutcome::Inspect("a".to_owned()))
        );
        // The single-click action must never fire afterwards.
        assert_eq!(arbiter.poll(0.31), None);
        assert_eq!(arbiter.poll(10.0), None);
    }

    #[test]
    fn slow_second_click_is_a_new_single_click() {
        let mut arbiter = ClickArbiter::default();

        assert_eq!(arbiter.press("a", 0.0), None);
        // First click already resolved to a toggle by the time of the second.
        assert_eq!(
            arbiter.poll(0.5),
            Some(ClickOutcome::ToggleSelection("a".to_owned()))
        );
        assert_eq!(arbiter.press("a", 0.6), None);
        assert_eq!(
            arbiter.poll(1.0),
            Some(ClickOutcome::ToggleSelection("a".to_owned()))
        );
    }

    #[test]
    fn click_on_another_node_supersedes_the_pending_one() {
        let mut arbiter = ClickArbiter::default();

        assert_eq!(arbiter.press("a", 0.0), None);
        assert_eq!(arbiter.press("b", 0.1), None);
        // Only b's single click fires; a's was superseded.
        assert_eq!(
            arbiter.poll(0.45),
            Some(ClickOutcome::ToggleSelection("b".to_owned()))
        );
        assert_eq!(arbiter.poll(5.0), None);
    }

    #[test]
    fn clear_cancels_a_pending_click() {
        let mut arbiter = ClickArbiter::default();
        arbiter.press("a", 0.0);
        arbiter.clear();
        assert_eq!(arbiter.poll(1.0), None);
    }
}
