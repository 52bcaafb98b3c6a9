use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

pub(super) const NODE_BASE_RADIUS: f32 = 6.0;
pub(super) const NODE_RADIUS_RANGE: f32 = 26.0;

/// Logarithmic radius so mention counts spanning orders of magnitude stay
/// visually comparable: `base + log2(m+1)/log2(max+1) * range`.
pub(super) fn node_radius(mentions: u64, max_mentions: u64) -> f32 {
    let denominator = ((max_mentions + 1) as f32).log2();
    if denominator <= f32::EPSILON {
        return NODE_BASE_RADIUS;
    }
    let normalized = (((mentions + 1) as f32).log2() / denominator).clamp(0.0, 1.0);
    NODE_BASE_RADIUS + normalized * NODE_RADIUS_RANGE
}

const DEFAULT_SECTION_COLOR: Color32 = Color32::from_rgb(130, 140, 155);

/// Fixed category palette keyed by an entity's dominant section label; also
/// rendered as the legend in the controls panel.
pub(super) const SECTION_PALETTE: [(&str, Color32); 8] = [
    ("summary", Color32::from_rgb(96, 165, 250)),
    ("background", Color32::from_rgb(52, 211, 153)),
    ("testimony", Color32::from_rgb(251, 146, 92)),
    ("correspondence", Color32::from_rgb(232, 121, 249)),
    ("financial", Color32::from_rgb(250, 204, 21)),
    ("operations", Color32::from_rgb(248, 113, 113)),
    ("analysis", Color32::from_rgb(45, 212, 191)),
    ("appendix", Color32::from_rgb(148, 163, 253)),
];

pub(super) fn section_color(section: Option<&str>) -> Color32 {
    let Some(section) = section else {
        return DEFAULT_SECTION_COLOR;
    };

    let lower = section.to_ascii_lowercase();
    SECTION_PALETTE
        .iter()
        .find(|(label, _)| *label == lower)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_SECTION_COLOR)
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

/// Dimmed but not hidden: dimmed nodes stay hoverable and clickable.
pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.35 + (factor * 0.5))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(16, 20, 27));

    let step = (64.0 * zoom.clamp(0.6, 1.8)).max(22.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(56, 66, 78, 60)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(56, 66, 78, 60)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Bounding-box cull; with at most a few hundred edges a precise
/// segment/viewport intersection test is not worth its cost.
pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

/// Edge stroke width from the pair's weight relative to the snapshot maximum.
pub(super) fn edge_width(co_occurrences: u64, max_co_occurrences: u64, zoom: f32) -> f32 {
    let normalized = if max_co_occurrences == 0 {
        0.0
    } else {
        (co_occurrences as f32 / max_co_occurrences as f32).clamp(0.0, 1.0)
    };
    ((0.7 + normalized * 3.0) * zoom.sqrt()).clamp(0.4, 5.0)
}
