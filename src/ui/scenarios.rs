// Scenario selector rendering module
//
// Renders the scrollable scenario catalog. Enter loads the highlighted
// entry, `c` reloads the catalog.

use crate::app::AppState;
use crate::model::ScenarioInfo;
use crate::theme::{IDLE_GRAY, LOAD_AMBER, NEUTRAL_SILVER, SELECTION_BG};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem},
    Frame,
};

/// `name - desc`, as the simulator's own selector labels entries
pub fn scenario_label(scenario: &ScenarioInfo) -> String {
    if scenario.desc.is_empty() {
        scenario.name.clone()
    } else {
        format!("{} - {}", scenario.name, scenario.desc)
    }
}

pub fn render_scenarios(f: &mut Frame, area: Rect, app: &mut AppState) {
    let items: Vec<ListItem> = if app.scenarios.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            " No scenarios (c to reload)",
            Style::default().fg(IDLE_GRAY),
        )))]
    } else {
        app.scenarios
            .iter()
            .enumerate()
            .map(|(idx, scenario)| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:2}. ", idx + 1), Style::default().fg(IDLE_GRAY)),
                    Span::styled(scenario_label(scenario), Style::default().fg(NEUTRAL_SILVER)),
                ]))
            })
            .collect()
    };

    let title = format!(" Scenarios ({}) ", app.scenarios.len());
    let list = List::new(items)
        .block(
            Block::default()
                .title(Span::styled(
                    title,
                    Style::default().fg(LOAD_AMBER).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(LOAD_AMBER)),
        )
        .highlight_style(Style::default().bg(SELECTION_BG).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(list, area, &mut app.scenario_list_state);
}
