// Scene rendering module
//
// Maps a Snapshot onto an abstract 2-D draw surface. Geometry and the
// visual encoding policy are pure; the renderer is the only place that
// issues draw calls. The terminal canvas and the tests both consume the
// recorded DisplayList, so nothing here depends on a real display.

pub mod encoding;

use crate::model::{Building, PowerLine, Snapshot};
use crate::theme::{edge_color, node_color, BATTERY_DARK, BATTERY_FILL, LABEL_WHITE, SOLAR_GOLD};
use encoding::{
    arrow_head, battery_gauge, classify_edge, classify_node, edge_width, has_solar, node_radius,
    SOLAR_RING_MARGIN, SOLAR_RING_WIDTH,
};
use ratatui::style::Color;

/// Scene canvas size matching the simulator's web canvas
pub const SCENE_WIDTH: f64 = 800.0;
pub const SCENE_HEIGHT: f64 = 600.0;

/// A point in scene space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle in scene space, anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SceneRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Fixed affine transform from simulation space to scene space
///
/// `scene = sim * scale + offset`. Nodes and line endpoints go through the
/// same transform so lines terminate exactly at node centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl SceneTransform {
    pub const fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    pub fn to_scene(&self, x: f64, y: f64) -> Point {
        Point::new(x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }

    /// Scene position of a building's center
    pub fn place(&self, building: &Building) -> Point {
        self.to_scene(building.x, building.y)
    }
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self::new(0.8, 50.0, 50.0)
    }
}

/// Shape handed to a draw surface
#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    Segment(Point, Point),
    Polygon(Vec<Point>),
    Circle { center: Point, radius: f64 },
}

/// Minimal drawing capability the renderer needs
pub trait DrawSurface {
    fn clear(&mut self);
    fn stroke_path(&mut self, path: &Path, color: Color, width: f64);
    fn fill_path(&mut self, path: &Path, color: Color);
    fn fill_rect(&mut self, rect: SceneRect, color: Color);
    /// Draw `text` centered on `at`
    fn draw_text(&mut self, at: Point, text: &str, color: Color);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Stroke {
        path: Path,
        color: Color,
        width: f64,
    },
    Fill {
        path: Path,
        color: Color,
    },
    FillRect {
        rect: SceneRect,
        color: Color,
    },
    Text {
        at: Point,
        text: String,
        color: Color,
    },
}

/// Recording draw surface
///
/// `clear` drops everything recorded so far, so after a render the list
/// holds exactly one complete frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }
}

impl DrawSurface for DisplayList {
    fn clear(&mut self) {
        self.ops.clear();
    }

    fn stroke_path(&mut self, path: &Path, color: Color, width: f64) {
        self.ops.push(DrawOp::Stroke {
            path: path.clone(),
            color,
            width,
        });
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        self.ops.push(DrawOp::Fill {
            path: path.clone(),
            color,
        });
    }

    fn fill_rect(&mut self, rect: SceneRect, color: Color) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn draw_text(&mut self, at: Point, text: &str, color: Color) {
        self.ops.push(DrawOp::Text {
            at,
            text: text.to_string(),
            color,
        });
    }
}

/// Counters from one full repaint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub edges_drawn: usize,
    /// Non-removed lines skipped for missing/removed endpoints or bad geometry
    pub edges_skipped: usize,
    pub nodes_drawn: usize,
}

/// Full-repaint renderer for grid snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneRenderer {
    transform: SceneTransform,
}

impl SceneRenderer {
    pub fn transform(&self) -> &SceneTransform {
        &self.transform
    }

    /// Clear the surface, then draw all lines, then all buildings
    ///
    /// Lines go first so building glyphs are never covered by strokes.
    /// Malformed elements are skipped; the rest of the frame is still drawn.
    pub fn render<S: DrawSurface + ?Sized>(&self, snapshot: &Snapshot, surface: &mut S) -> RenderStats {
        let mut stats = RenderStats::default();
        surface.clear();

        for line in snapshot.power_lines().iter().filter(|l| !l.removed) {
            if self.draw_line(snapshot, line, surface) {
                stats.edges_drawn += 1;
            } else {
                stats.edges_skipped += 1;
            }
        }

        for building in snapshot.buildings() {
            if self.draw_building(building, surface) {
                stats.nodes_drawn += 1;
            }
        }

        tracing::debug!(
            edges_drawn = stats.edges_drawn,
            edges_skipped = stats.edges_skipped,
            nodes_drawn = stats.nodes_drawn,
            "scene.render"
        );
        stats
    }

    fn draw_line<S: DrawSurface + ?Sized>(
        &self,
        snapshot: &Snapshot,
        line: &PowerLine,
        surface: &mut S,
    ) -> bool {
        let Some((from, to)) = snapshot.resolve_line(line) else {
            return false;
        };
        let start = self.transform.place(from);
        let end = self.transform.place(to);
        if !start.is_finite() || !end.is_finite() {
            return false;
        }

        let color = edge_color(classify_edge(line.flow, line.capacity));
        surface.stroke_path(&Path::Segment(start, end), color, edge_width(line.capacity));

        if let Some(triangle) = arrow_head(start, end, line.flow) {
            surface.fill_path(&Path::Polygon(triangle.to_vec()), color);
        }
        true
    }

    fn draw_building<S: DrawSurface + ?Sized>(&self, building: &Building, surface: &mut S) -> bool {
        if !building.is_visible() {
            return false;
        }
        let center = self.transform.place(building);
        if !center.is_finite() {
            return false;
        }
        let radius = node_radius(building.supply);

        surface.fill_path(
            &Path::Circle { center, radius },
            node_color(classify_node(building)),
        );

        if has_solar(building) {
            surface.stroke_path(
                &Path::Circle {
                    center,
                    radius: radius + SOLAR_RING_MARGIN,
                },
                SOLAR_GOLD,
                SOLAR_RING_WIDTH,
            );
        }

        if let Some(gauge) = battery_gauge(center, radius, building) {
            surface.fill_rect(gauge.frame, BATTERY_DARK);
            surface.fill_rect(gauge.fill, BATTERY_FILL);
        }

        surface.draw_text(center, &building.id.to_string(), LABEL_WHITE);
        true
    }
}
