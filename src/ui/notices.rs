// Notices rendering module
//
// Renders the newest notices and forwarded log lines, newest at the bottom.

use crate::app::{AppState, Notice, NoticeLevel};
use crate::theme::{GRID_VIOLET, IDLE_GRAY, LOAD_AMBER, NEUTRAL_SILVER, OVERLOAD_RED};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

pub fn level_style(level: NoticeLevel) -> (&'static str, Color) {
    match level {
        NoticeLevel::Info => ("info", NEUTRAL_SILVER),
        NoticeLevel::Warn => ("warn", LOAD_AMBER),
        NoticeLevel::Error => ("error", OVERLOAD_RED),
        NoticeLevel::Log => ("log", IDLE_GRAY),
    }
}

fn notice_line(notice: &Notice) -> Line<'static> {
    let (tag, color) = level_style(notice.level);
    Line::from(vec![
        Span::styled(format!(" {:>5} ", tag), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(notice.text.clone(), Style::default().fg(color)),
    ])
}

pub fn render_notices(f: &mut Frame, area: Rect, app: &AppState) {
    // Only as many as fit inside the borders
    let visible = area.height.saturating_sub(2) as usize;
    let skip = app.notices.len().saturating_sub(visible);
    let lines: Vec<Line> = app.notices.iter().skip(skip).map(notice_line).collect();

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(
                " Notices ",
                Style::default().fg(GRID_VIOLET).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(GRID_VIOLET)),
    );

    f.render_widget(panel, area);
}
