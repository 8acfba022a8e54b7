// Default theme functions
//
// Maps the encoding policy's buckets onto the palette. Each bucket has
// exactly one fixed color.

use ratatui::style::Color;

use super::{
    BLACKOUT_SLATE, GRID_VIOLET, IDLE_GRAY, LOAD_AMBER, NEUTRAL_SILVER, OVERLOAD_RED, SUPPLY_GREEN,
    VOLT_BLUE,
};
use crate::scene::encoding::{EdgeLoad, NodeKind};

/// Stroke color for a power line load bucket
pub fn edge_color(load: EdgeLoad) -> Color {
    match load {
        EdgeLoad::Overloaded => OVERLOAD_RED,
        EdgeLoad::HighLoad => LOAD_AMBER,
        EdgeLoad::NormalFlow => VOLT_BLUE,
        EdgeLoad::Negligible => IDLE_GRAY,
    }
}

/// Fill color for a building classification
pub fn node_color(kind: NodeKind) -> Color {
    match kind {
        NodeKind::Blackout => BLACKOUT_SLATE,
        NodeKind::Generator => SUPPLY_GREEN,
        NodeKind::Prosumer => GRID_VIOLET,
        NodeKind::Consumer => OVERLOAD_RED,
        NodeKind::Neutral => NEUTRAL_SILVER,
    }
}

/// Color for the supply/demand balance shown in the summary panel
///
/// Color coding:
/// - Green: supply covers demand
/// - Orange: supply covers at least 90% of demand
/// - Red: larger shortfall
pub fn balance_color(demand: f64, supply: f64) -> Color {
    if supply >= demand {
        SUPPLY_GREEN
    } else if demand > 0.0 && supply / demand >= 0.9 {
        LOAD_AMBER
    } else {
        OVERLOAD_RED
    }
}

/// Color for the blackout counter
pub fn blackout_color(blackout_count: u64) -> Color {
    if blackout_count == 0 {
        SUPPLY_GREEN
    } else {
        OVERLOAD_RED
    }
}

/// Color for the simulator's fine dust level label
pub fn pm_color(level: &str) -> Color {
    match level {
        "good" => SUPPLY_GREEN,
        "moderate" => VOLT_BLUE,
        "unhealthy" => LOAD_AMBER,
        "very_unhealthy" | "hazardous" => OVERLOAD_RED,
        _ => NEUTRAL_SILVER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_colors_are_distinct() {
        let colors = [
            edge_color(EdgeLoad::Overloaded),
            edge_color(EdgeLoad::HighLoad),
            edge_color(EdgeLoad::NormalFlow),
            edge_color(EdgeLoad::Negligible),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in colors.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_node_colors_are_distinct() {
        let colors = [
            node_color(NodeKind::Blackout),
            node_color(NodeKind::Generator),
            node_color(NodeKind::Prosumer),
            node_color(NodeKind::Consumer),
            node_color(NodeKind::Neutral),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in colors.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_balance_color() {
        assert_eq!(balance_color(10.0, 12.0), SUPPLY_GREEN);
        assert_eq!(balance_color(10.0, 9.5), LOAD_AMBER);
        assert_eq!(balance_color(10.0, 5.0), OVERLOAD_RED);
        assert_eq!(balance_color(0.0, 0.0), SUPPLY_GREEN);
    }

    #[test]
    fn test_blackout_color() {
        assert_eq!(blackout_color(0), SUPPLY_GREEN);
        assert_eq!(blackout_color(3), OVERLOAD_RED);
    }

    #[test]
    fn test_pm_color() {
        assert_eq!(pm_color("good"), SUPPLY_GREEN);
        assert_eq!(pm_color("unhealthy"), LOAD_AMBER);
        assert_eq!(pm_color("hazardous"), OVERLOAD_RED);
        assert_eq!(pm_color(""), NEUTRAL_SILVER);
    }
}
