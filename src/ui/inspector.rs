// Building Inspector rendering module
//
// Renders the detail panel for the building selected with Left/Right.
// Data extraction lives in a view model so it can be tested without a
// terminal.

use crate::app::AppState;
use crate::model::{Building, Snapshot};
use crate::scene::encoding::{battery_fill_ratio, classify_edge, classify_node, EdgeLoad, NodeKind};
use crate::theme::{edge_color, node_color, GRID_VIOLET, IDLE_GRAY, NEUTRAL_SILVER, SOLAR_GOLD};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

// ============================================================================
// Building Inspector View Model
// ============================================================================

/// One power line attached to the inspected building
#[derive(Debug, Clone, PartialEq)]
pub struct LineInfo {
    /// Building on the other end
    pub peer: i64,
    /// Flow out of the inspected building (negative = inbound)
    pub outflow: f64,
    pub capacity: f64,
    pub load: EdgeLoad,
}

/// Everything the inspector shows about one building
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingView {
    pub id: i64,
    pub kind: NodeKind,
    pub type_label: Option<String>,
    pub supply: f64,
    pub base_supply: Option<f64>,
    pub solar_capacity: f64,
    /// (charge, capacity, fill ratio) when the building has storage
    pub battery: Option<(f64, f64, f64)>,
    pub lines: Vec<LineInfo>,
}

pub fn role_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Blackout => "Blackout",
        NodeKind::Generator => "Generator",
        NodeKind::Prosumer => "Prosumer",
        NodeKind::Consumer => "Consumer",
        NodeKind::Neutral => "Neutral",
    }
}

fn load_label(load: EdgeLoad) -> &'static str {
    match load {
        EdgeLoad::Overloaded => "overloaded",
        EdgeLoad::HighLoad => "high",
        EdgeLoad::NormalFlow => "normal",
        EdgeLoad::Negligible => "idle",
    }
}

/// Build the view for `building` from the snapshot it belongs to
pub fn build_building_view(snapshot: &Snapshot, building: &Building) -> BuildingView {
    let lines = snapshot
        .power_lines()
        .iter()
        .filter(|line| snapshot.resolve_line(line).is_some())
        .filter_map(|line| {
            let (peer, outflow) = if line.u == building.id {
                (line.v, line.flow)
            } else if line.v == building.id {
                (line.u, -line.flow)
            } else {
                return None;
            };
            Some(LineInfo {
                peer,
                outflow,
                capacity: line.capacity,
                load: classify_edge(line.flow, line.capacity),
            })
        })
        .collect();

    let battery = (building.battery_capacity > 0.0).then(|| {
        let ratio = battery_fill_ratio(building.battery_charge, building.battery_capacity)
            .unwrap_or(0.0);
        (building.battery_charge, building.battery_capacity, ratio)
    });

    BuildingView {
        id: building.id,
        kind: classify_node(building),
        type_label: building.kind.clone(),
        supply: building.supply,
        base_supply: building.base_supply,
        solar_capacity: building.solar_capacity,
        battery,
        lines,
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn field(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<9}", label), Style::default().fg(IDLE_GRAY)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn view_lines(view: &BuildingView) -> Vec<Line<'static>> {
    let role_color = node_color(view.kind);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" Building #{} ", view.id),
                Style::default().fg(NEUTRAL_SILVER).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("[{}]", role_label(view.kind)),
                Style::default().fg(role_color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
    ];

    if let Some(label) = &view.type_label {
        lines.push(field("Type", label.clone(), NEUTRAL_SILVER));
    }
    lines.push(field("Supply", format!("{:+.2}", view.supply), role_color));
    if let Some(base) = view.base_supply {
        lines.push(field("Base", format!("{:+.2}", base), NEUTRAL_SILVER));
    }
    if view.solar_capacity > 0.0 {
        lines.push(field("Solar", format!("{:.2}", view.solar_capacity), SOLAR_GOLD));
    }
    if let Some((charge, capacity, ratio)) = view.battery {
        lines.push(field(
            "Battery",
            format!("{:.1}/{:.1} ({:.0}%)", charge, capacity, ratio * 100.0),
            NEUTRAL_SILVER,
        ));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" Lines ({})", view.lines.len()),
        Style::default().fg(GRID_VIOLET).add_modifier(Modifier::BOLD),
    )));
    for info in &view.lines {
        let arrow = if info.outflow > 0.0 { "->" } else { "<-" };
        lines.push(Line::from(vec![
            Span::styled(format!("  {} #{:<5}", arrow, info.peer), Style::default().fg(NEUTRAL_SILVER)),
            Span::styled(
                format!(
                    "{:.2}/{:.2} {}",
                    info.outflow.abs(),
                    info.capacity,
                    load_label(info.load)
                ),
                Style::default().fg(edge_color(info.load)),
            ),
        ]));
    }

    lines
}

pub fn render_building_inspector(f: &mut Frame, area: Rect, app: &AppState) {
    let body = match (app.snapshot(), app.selected_building()) {
        (Some(snapshot), Some(building)) => view_lines(&build_building_view(snapshot, building)),
        (Some(_), None) => vec![Line::from(Span::styled(
            " Left/Right to pick a building",
            Style::default().fg(IDLE_GRAY),
        ))],
        (None, _) => vec![Line::from(Span::styled(
            " No snapshot yet",
            Style::default().fg(IDLE_GRAY),
        ))],
    };

    let panel = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(Span::styled(
                    " Building Inspector ",
                    Style::default().fg(GRID_VIOLET).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(GRID_VIOLET)),
        );

    f.render_widget(panel, area);
}
