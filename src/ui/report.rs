// Analytics report rendering module
//
// Shown in place of the grid map while the report is open (A). Each section
// of the simulator's report becomes a heading plus label/value rows.

use super::summary::{format_amount, format_sim_time, PLACEHOLDER};
use crate::app::{AppState, ReportView};
use crate::model::SimulationReport;
use crate::theme::{pm_color, GRID_VIOLET, IDLE_GRAY, NEUTRAL_SILVER, OVERLOAD_RED, SOLAR_GOLD};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

fn heading(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {}", title),
        Style::default().fg(SOLAR_GOLD).add_modifier(Modifier::BOLD),
    ))
}

fn row(label: &'static str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("   {:<22}", label), Style::default().fg(IDLE_GRAY)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn percent(value: f64) -> String {
    format!("{}%", format_amount(value))
}

/// Report lines in display order; missing sections are skipped
pub fn report_lines(report: &SimulationReport) -> Vec<Line<'static>> {
    if let Some(error) = &report.error {
        return vec![Line::from(Span::styled(
            format!(" {}", error),
            Style::default().fg(IDLE_GRAY),
        ))];
    }

    let mut lines = Vec::new();

    if let Some(period) = &report.simulation_period {
        lines.push(heading("Period"));
        lines.push(row("Start", format_sim_time(&period.start), NEUTRAL_SILVER));
        lines.push(row("End", format_sim_time(&period.end), NEUTRAL_SILVER));
        lines.push(row(
            "Duration",
            format!("{} h", format_amount(period.duration_hours)),
            NEUTRAL_SILVER,
        ));
    }

    if let Some(energy) = &report.energy_metrics {
        lines.push(heading("Energy"));
        lines.push(row("Demand", format_amount(energy.current_demand), NEUTRAL_SILVER));
        lines.push(row("Supply", format_amount(energy.current_supply), NEUTRAL_SILVER));
        lines.push(row("Flow", format_amount(energy.current_flow), NEUTRAL_SILVER));
        lines.push(row("Avg demand", format_amount(energy.avg_demand), NEUTRAL_SILVER));
        lines.push(row("Avg supply", format_amount(energy.avg_supply), NEUTRAL_SILVER));
        lines.push(row(
            "Satisfaction",
            percent(energy.energy_satisfaction_percent),
            NEUTRAL_SILVER,
        ));
    }

    if let Some(reliability) = &report.reliability_metrics {
        let blackout_color = if reliability.current_blackouts > 0 {
            OVERLOAD_RED
        } else {
            NEUTRAL_SILVER
        };
        lines.push(heading("Reliability"));
        lines.push(row(
            "Blackouts",
            reliability.current_blackouts.to_string(),
            blackout_color,
        ));
        lines.push(row("Avg blackouts", format_amount(reliability.avg_blackouts), NEUTRAL_SILVER));
        lines.push(row(
            "Blackout ratio",
            percent(reliability.blackout_ratio_percent),
            NEUTRAL_SILVER,
        ));
        lines.push(row(
            "Congested lines",
            percent(reliability.congestion_ratio_percent),
            NEUTRAL_SILVER,
        ));
    }

    if let Some(renewable) = &report.renewable_metrics {
        lines.push(heading("Renewables"));
        lines.push(row("Solar capacity", format_amount(renewable.solar_capacity), NEUTRAL_SILVER));
        lines.push(row("Solar share", percent(renewable.solar_ratio_percent), NEUTRAL_SILVER));
        lines.push(row(
            "Battery",
            format!(
                "{} / {} ({})",
                format_amount(renewable.battery_charge),
                format_amount(renewable.battery_capacity),
                percent(renewable.battery_utilization_percent)
            ),
            NEUTRAL_SILVER,
        ));
    }

    if let Some(economics) = &report.economic_metrics {
        lines.push(heading("Economics"));
        lines.push(row("ROI", percent(economics.roi_percent), NEUTRAL_SILVER));
        lines.push(row("Profit", format!("{:.2}", economics.profit), NEUTRAL_SILVER));
        lines.push(row("Price", format!("{:.2}", economics.electricity_price), NEUTRAL_SILVER));
    }

    if let Some(environment) = &report.environmental_metrics {
        lines.push(heading("Environment"));
        lines.push(row(
            "Weather",
            format!(
                "{} {}°C",
                environment.current_weather,
                format_amount(environment.current_temperature)
            ),
            NEUTRAL_SILVER,
        ));
        let pm = if environment.current_pm_level.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            environment.current_pm_level.clone()
        };
        lines.push(row("Fine dust", pm, pm_color(&environment.current_pm_level)));
    }

    lines
}

pub fn render_report(f: &mut Frame, area: Rect, app: &AppState) {
    let body = match &app.report {
        ReportView::Ready(report) => report_lines(report),
        ReportView::Loading => vec![Line::from(Span::styled(
            " Loading report...",
            Style::default().fg(IDLE_GRAY),
        ))],
        ReportView::Failed(err) => vec![Line::from(Span::styled(
            format!(" Report unavailable: {}", err),
            Style::default().fg(OVERLOAD_RED),
        ))],
        ReportView::Closed => Vec::new(),
    };

    let panel = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(Span::styled(
                    " Simulation Report (A to close) ",
                    Style::default().fg(GRID_VIOLET).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(GRID_VIOLET)),
        );

    f.render_widget(panel, area);
}
