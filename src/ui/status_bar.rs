// Status Bar rendering module
//
// Renders the bottom status bar with keyboard shortcuts, simulation state,
// push channel state and the latest notice.

use crate::app::{AppState, PushState};
use crate::theme::{GRID_VIOLET, IDLE_GRAY, LOAD_AMBER, NEUTRAL_SILVER, OVERLOAD_RED, SUPPLY_GREEN};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::notices::level_style;

pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    // Calculate available width for hints (subtract borders)
    let available_width = area.width.saturating_sub(2) as usize;

    // Indicators always show; hints fill whatever room is left
    let indicators = build_indicators(app);
    let mut current_length: usize = indicators.iter().map(|s| s.content.width()).sum();

    struct Hint {
        priority: u8,
        key: &'static str,
        desc: &'static str,
    }

    let hints = [
        Hint { priority: 1, key: "Q:", desc: "Quit | " },
        Hint { priority: 1, key: "S/P:", desc: "Start/Pause | " },
        Hint { priority: 1, key: "+/-:", desc: "Speed | " },
        Hint { priority: 2, key: "↑↓:", desc: "Scenario | " },
        Hint { priority: 2, key: "Enter:", desc: "Load | " },
        Hint { priority: 2, key: "←→:", desc: "Building | " },
        Hint { priority: 3, key: "R:", desc: "Refresh | " },
        Hint { priority: 3, key: "C:", desc: "Catalog | " },
        Hint { priority: 3, key: "A:", desc: "Report | " },
    ];

    let mut spans = vec![Span::raw(" ")];
    current_length += 1;

    // Process hints by priority
    for priority in 1..=3 {
        for hint in hints.iter().filter(|h| h.priority == priority) {
            let hint_length = hint.key.width() + hint.desc.width();
            if current_length + hint_length <= available_width {
                spans.push(Span::styled(
                    hint.key,
                    Style::default().fg(GRID_VIOLET).add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::raw(hint.desc));
                current_length += hint_length;
            }
        }
    }
    spans.extend(indicators);

    let status_bar = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(GRID_VIOLET)),
        )
        .alignment(Alignment::Left);

    f.render_widget(status_bar, area);
}

/// Label and color for the push channel indicator
pub fn push_indicator(state: &PushState) -> (&'static str, Color) {
    match state {
        PushState::Disabled => ("off", IDLE_GRAY),
        PushState::Connecting => ("connecting", LOAD_AMBER),
        PushState::Connected => ("live", SUPPLY_GREEN),
        PushState::Disconnected(_) => ("down", OVERLOAD_RED),
    }
}

/// Build indicator spans for the status bar
///
/// Shows [RUN/PAUSE xN] [push:state] and the latest notice.
pub fn build_indicators(app: &AppState) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    let (run_label, run_color) = if app.simulation_running() {
        ("RUN", SUPPLY_GREEN)
    } else {
        ("PAUSE", LOAD_AMBER)
    };
    spans.push(Span::styled("[", Style::default().fg(NEUTRAL_SILVER)));
    spans.push(Span::styled(
        run_label,
        Style::default().fg(run_color).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(
        format!(" x{}] ", app.speed),
        Style::default().fg(NEUTRAL_SILVER),
    ));

    let (push_label, push_color) = push_indicator(&app.push_state);
    spans.push(Span::styled("[push:", Style::default().fg(NEUTRAL_SILVER)));
    spans.push(Span::styled(
        push_label,
        Style::default().fg(push_color).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("] ", Style::default().fg(NEUTRAL_SILVER)));

    if let Some(notice) = app.last_notice() {
        let (_, color) = level_style(notice.level);
        spans.push(Span::styled(notice.text.clone(), Style::default().fg(color)));
    }

    spans
}
