// Grid map rendering module
//
// Replays the scene display list onto a Braille canvas. The canvas shares
// the scene's 800x600 coordinate space with the y axis flipped. Braille
// dots have no stroke width or fill, so wide strokes become parallel lines,
// discs become concentric circles and polygons are filled with scanlines.

use crate::app::AppState;
use crate::scene::{DrawOp, Path, Point, SceneRect, SCENE_HEIGHT, SCENE_WIDTH};
use crate::theme::{GRID_VIOLET, IDLE_GRAY, LOAD_AMBER};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, BorderType, Borders, Paragraph,
    },
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Distance between parallel lines approximating a wide stroke
pub const LINE_SPACING: f64 = 3.0;

/// Step between concentric circles and scanlines when filling
pub const FILL_STEP: f64 = 2.0;

/// Upper bound on parallel lines for one stroke
const MAX_PARALLEL_LINES: usize = 4;

/// Gap between a selected building's disc and its highlight ring
const SELECTION_MARGIN: f64 = 8.0;

/// Primitive the canvas knows how to paint
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasShape {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        color: Color,
    },
    Label {
        x: f64,
        y: f64,
        text: String,
        color: Color,
    },
}

/// Scene point to canvas coordinates (canvas y grows upward)
fn flip(p: Point) -> (f64, f64) {
    (p.x, SCENE_HEIGHT - p.y)
}

fn line(a: Point, b: Point, color: Color) -> CanvasShape {
    let (x1, y1) = flip(a);
    let (x2, y2) = flip(b);
    CanvasShape::Line { x1, y1, x2, y2, color }
}

/// Perpendicular offsets of the parallel lines standing in for `width`
pub fn parallel_offsets(width: f64) -> Vec<f64> {
    let count = (width / LINE_SPACING).ceil().max(1.0).min(MAX_PARALLEL_LINES as f64) as usize;
    let center = (count - 1) as f64 / 2.0;
    (0..count)
        .map(|i| (i as f64 - center) * LINE_SPACING)
        .collect()
}

/// Convert a display list into canvas primitives
///
/// `cell_width` is the width of one terminal cell in scene units and is
/// used to center labels. Ops with non-finite geometry are dropped.
pub fn rasterize(ops: &[DrawOp], cell_width: f64) -> Vec<CanvasShape> {
    let mut shapes = Vec::new();
    for op in ops {
        match op {
            DrawOp::Stroke { path, color, width } => stroke(path, *color, *width, &mut shapes),
            DrawOp::Fill { path, color } => fill(path, *color, &mut shapes),
            DrawOp::FillRect { rect, color } => fill_rect(*rect, *color, &mut shapes),
            DrawOp::Text { at, text, color } => {
                if !at.is_finite() {
                    continue;
                }
                let (x, y) = flip(*at);
                let half = text.width() as f64 * cell_width / 2.0;
                shapes.push(CanvasShape::Label {
                    x: x - half,
                    y,
                    text: text.clone(),
                    color: *color,
                });
            }
        }
    }
    shapes
}

fn stroke(path: &Path, color: Color, width: f64, out: &mut Vec<CanvasShape>) {
    match path {
        Path::Segment(a, b) => stroke_segment(*a, *b, color, width, out),
        Path::Polygon(points) => {
            for (i, &a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                stroke_segment(a, b, color, width, out);
            }
        }
        Path::Circle { center, radius } => {
            if !center.is_finite() || !radius.is_finite() {
                return;
            }
            let (x, y) = flip(*center);
            for offset in parallel_offsets(width) {
                let radius = radius + offset;
                if radius > 0.0 {
                    out.push(CanvasShape::Circle { x, y, radius, color });
                }
            }
        }
    }
}

fn stroke_segment(a: Point, b: Point, color: Color, width: f64, out: &mut Vec<CanvasShape>) {
    if !a.is_finite() || !b.is_finite() {
        return;
    }
    let length = a.distance(b);
    if length == 0.0 {
        out.push(line(a, b, color));
        return;
    }

    // Unit normal to the segment
    let nx = -(b.y - a.y) / length;
    let ny = (b.x - a.x) / length;
    for offset in parallel_offsets(width) {
        let shift = |p: Point| Point::new(p.x + nx * offset, p.y + ny * offset);
        out.push(line(shift(a), shift(b), color));
    }
}

fn fill(path: &Path, color: Color, out: &mut Vec<CanvasShape>) {
    match path {
        Path::Segment(a, b) => stroke_segment(*a, *b, color, 1.0, out),
        Path::Polygon(points) => {
            if points.iter().all(|p| p.is_finite()) {
                scanline_fill(points, color, out);
                // Outline keeps small shapes visible between scanlines
                stroke(path, color, 1.0, out);
            }
        }
        Path::Circle { center, radius } => {
            if !center.is_finite() || !radius.is_finite() {
                return;
            }
            let (x, y) = flip(*center);
            let mut r = *radius;
            while r > 0.0 {
                out.push(CanvasShape::Circle { x, y, radius: r, color });
                r -= FILL_STEP;
            }
            out.push(line(*center, *center, color));
        }
    }
}

/// Fill a polygon with horizontal lines, even-odd rule
fn scanline_fill(points: &[Point], color: Color, out: &mut Vec<CanvasShape>) {
    if points.len() < 3 {
        return;
    }
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let rows = ((max_y - min_y) / FILL_STEP).floor() as usize;
    for row in 0..=rows {
        let y = min_y + row as f64 * FILL_STEP;
        let mut crossings: Vec<f64> = Vec::new();
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            let spans_row = (a.y <= y && y < b.y) || (b.y <= y && y < a.y);
            if spans_row {
                crossings.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_by(f64::total_cmp);
        for pair in crossings.chunks_exact(2) {
            out.push(line(Point::new(pair[0], y), Point::new(pair[1], y), color));
        }
    }
}

fn fill_rect(rect: SceneRect, color: Color, out: &mut Vec<CanvasShape>) {
    let finite = [rect.x, rect.y, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite || rect.width < 0.0 || rect.height < 0.0 {
        return;
    }
    let rows = (rect.height / FILL_STEP).floor() as usize;
    for row in 0..=rows {
        let y = (rect.y + row as f64 * FILL_STEP).min(rect.y + rect.height);
        out.push(line(
            Point::new(rect.x, y),
            Point::new(rect.x + rect.width, y),
            color,
        ));
    }
}

pub fn render_grid_map(f: &mut Frame, area: Rect, app: &AppState) {
    // Split: summary line + canvas
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    let summary = match app.snapshot() {
        Some(snapshot) => format!(
            " {} buildings | {} lines drawn | {} skipped{}",
            snapshot.active_buildings().count(),
            app.render_stats.edges_drawn,
            app.render_stats.edges_skipped,
            if app.is_refreshing() { " | syncing" } else { "" },
        ),
        None => " No snapshot yet".to_string(),
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " Grid Map ",
            Style::default().fg(GRID_VIOLET).add_modifier(Modifier::BOLD),
        ),
        Span::styled(summary, Style::default().fg(IDLE_GRAY)),
    ]))
    .block(
        Block::default()
            .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(GRID_VIOLET)),
    );
    f.render_widget(header, chunks[0]);

    let block = Block::default()
        .borders(Borders::BOTTOM | Borders::LEFT | Borders::RIGHT)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(GRID_VIOLET));

    if app.snapshot().is_none() {
        let message = match &app.refresh_error {
            Some(err) => format!("Waiting for the simulator: {}", err),
            None => "Waiting for the simulator...".to_string(),
        };
        let placeholder = Paragraph::new(message)
            .style(Style::default().fg(IDLE_GRAY))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(placeholder, chunks[1]);
        return;
    }

    let inner_width = chunks[1].width.saturating_sub(2).max(1) as f64;
    let cell_width = SCENE_WIDTH / inner_width;
    let mut shapes = rasterize(app.display_list().ops(), cell_width);

    // Highlight the building shown in the inspector
    if let Some(building) = app.selected_building() {
        let center = app.scene_transform().place(building);
        let radius = crate::scene::encoding::node_radius(building.supply) + SELECTION_MARGIN;
        stroke(
            &Path::Circle { center, radius },
            LOAD_AMBER,
            1.0,
            &mut shapes,
        );
    }

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, SCENE_WIDTH])
        .y_bounds([0.0, SCENE_HEIGHT])
        .paint(move |ctx| {
            for shape in &shapes {
                match shape {
                    CanvasShape::Line { x1, y1, x2, y2, color } => ctx.draw(&CanvasLine {
                        x1: *x1,
                        y1: *y1,
                        x2: *x2,
                        y2: *y2,
                        color: *color,
                    }),
                    CanvasShape::Circle { x, y, radius, color } => ctx.draw(&Circle {
                        x: *x,
                        y: *y,
                        radius: *radius,
                        color: *color,
                    }),
                    CanvasShape::Label { x, y, text, color } => ctx.print(
                        *x,
                        *y,
                        Span::styled(text.clone(), Style::default().fg(*color)),
                    ),
                }
            }
        });

    f.render_widget(canvas, chunks[1]);
}
