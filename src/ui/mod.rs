// UI rendering module
//
// This module contains all UI rendering components for gridscope.
// The main draw() function orchestrates rendering of all UI panels.

mod grid_map;
mod inspector;
mod notices;
mod report;
mod scenarios;
mod status_bar;
mod summary;

use crate::app::AppState;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use grid_map::render_grid_map;
use inspector::render_building_inspector;
use notices::render_notices;
use report::render_report;
use scenarios::render_scenarios;
use status_bar::render_status_bar;
use summary::render_summary;

/// Main UI drawing function
pub fn draw(f: &mut Frame, app: &mut AppState) {
    let size = f.area();

    // Main layout: summary, body, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Summary
            Constraint::Min(0),    // Body
            Constraint::Length(3), // Status bar
        ])
        .split(size);

    render_summary(f, chunks[0], app);

    // Body: grid map + right panels
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(65), // Grid map
            Constraint::Percentage(35), // Right panels
        ])
        .split(chunks[1]);

    if app.report.is_open() {
        render_report(f, body_chunks[0], app);
    } else {
        render_grid_map(f, body_chunks[0], app);
    }

    // Right side: inspector, scenarios, notices
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(25),
            Constraint::Percentage(30),
        ])
        .split(body_chunks[1]);

    render_building_inspector(f, right_chunks[0], app);
    render_scenarios(f, right_chunks[1], app);
    render_notices(f, right_chunks[2], app);

    render_status_bar(f, chunks[2], app);
}
