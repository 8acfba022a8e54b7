// Summary panel rendering module
//
// Renders the dashboard row: simulation clock, weather, grid balance,
// finances and the economic metrics of the current snapshot. Status values
// come straight from the last status payload, economics from the snapshot.

use crate::app::AppState;
use crate::model::{EconomicSnapshot, StatusUpdate, WeatherReport};
use crate::theme::{
    balance_color, blackout_color, pm_color, GRID_VIOLET, IDLE_GRAY, NEUTRAL_SILVER, SOLAR_GOLD,
    VOLT_BLUE,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

/// Shown where a value has not been reported yet
pub const PLACEHOLDER: &str = "--";

/// Render ISO-8601 simulation time as `YYYY-MM-DD HH:MM:SS`
///
/// Fractional seconds and zone suffixes are dropped. Anything that does not
/// look like an ISO timestamp is shown verbatim.
pub fn format_sim_time(raw: &str) -> String {
    let Some((date, time)) = raw.split_once('T') else {
        return raw.to_string();
    };
    let clock: String = time
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ':')
        .collect();
    if date.is_empty() || clock.is_empty() {
        return raw.to_string();
    }
    format!("{} {}", date, clock)
}

/// One decimal place, as the dashboard shows every quantity
pub fn format_amount(value: f64) -> String {
    format!("{:.1}", value)
}

/// Electricity price field, two decimals
pub fn format_price(economics: Option<&EconomicSnapshot>) -> String {
    economics
        .and_then(|e| e.electricity_price)
        .map(|price| format!("{:.2}", price))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn pair(label: &str, value: String, color: Color) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!(" {} ", label), Style::default().fg(IDLE_GRAY)),
        Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(" |", Style::default().fg(IDLE_GRAY)),
    ]
}

/// Humidity and fine dust fields; placeholders until the first reading
pub fn weather_detail(weather: Option<&WeatherReport>) -> Vec<Span<'static>> {
    match weather {
        Some(w) => {
            let mut spans = pair("Humidity", format!("{}%", format_amount(w.humidity)), VOLT_BLUE);
            spans.extend(pair("PM", w.pm_level.clone(), pm_color(&w.pm_level)));
            spans
        }
        None => {
            let mut spans = pair("Humidity", PLACEHOLDER.to_string(), IDLE_GRAY);
            spans.extend(pair("PM", PLACEHOLDER.to_string(), IDLE_GRAY));
            spans
        }
    }
}

/// Dashboard lines for a status payload
pub fn status_lines(
    status: &StatusUpdate,
    weather: Option<&WeatherReport>,
    price: String,
) -> Vec<Line<'static>> {
    let balance = balance_color(status.demand, status.supply);

    let mut clock = pair("Time", format_sim_time(&status.time), NEUTRAL_SILVER);
    clock.extend(pair(
        "Weather",
        format!("{} {}°C", status.weather, format_amount(status.temperature)),
        VOLT_BLUE,
    ));
    clock.extend(weather_detail(weather));
    clock.extend(pair("Events", status.event_count.to_string(), NEUTRAL_SILVER));

    let mut grid = pair("Demand", format_amount(status.demand), balance);
    grid.extend(pair("Supply", format_amount(status.supply), balance));
    grid.extend(pair("Flow", format_amount(status.flow), VOLT_BLUE));
    grid.extend(pair(
        "Blackouts",
        status.blackout_count.to_string(),
        blackout_color(status.blackout_count),
    ));

    let mut money = pair("Budget", format_amount(status.budget), NEUTRAL_SILVER);
    money.extend(pair("Money", format_amount(status.money), NEUTRAL_SILVER));
    money.extend(pair("Price", price, SOLAR_GOLD));

    vec![Line::from(clock), Line::from(grid), Line::from(money)]
}

/// Economic metrics line, or the simulator's message when the model is off
pub fn economics_line(economics: &EconomicSnapshot) -> Line<'static> {
    let metrics = economics.metrics();
    // Price already has its own field
    let rest: Vec<Span<'static>> = metrics
        .into_iter()
        .filter(|(label, _)| *label != "Price")
        .flat_map(|(label, value)| pair(label, format!("{:.2}", value), NEUTRAL_SILVER))
        .collect();

    if !rest.is_empty() {
        return Line::from(rest);
    }
    match &economics.message {
        Some(message) => Line::from(Span::styled(
            format!(" {}", message),
            Style::default().fg(IDLE_GRAY),
        )),
        None => Line::from(""),
    }
}

pub fn render_summary(f: &mut Frame, area: Rect, app: &AppState) {
    let economics = app.snapshot().map(|s| s.economics());
    let price = format_price(economics);

    let mut lines = match &app.status {
        Some(status) => status_lines(status, app.weather.as_ref(), price),
        None => vec![Line::from(Span::styled(
            " Waiting for the first status update...",
            Style::default().fg(IDLE_GRAY),
        ))],
    };
    if let Some(economics) = economics {
        lines.push(economics_line(economics));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(
                " gridscope ",
                Style::default().fg(GRID_VIOLET).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(GRID_VIOLET)),
    );

    f.render_widget(panel, area);
}
