// Theme module - Color constants and theme re-exports
//
// This module provides the color palette used by gridscope's panels and
// by the grid map's encoding policy.

pub mod default;

use ratatui::style::Color;

/// Primary accent color - used for borders, titles
/// RGB: (187, 154, 247)
pub const GRID_VIOLET: Color = Color::Rgb(187, 154, 247);

/// Warning indicator - high-load lines, degraded states
/// RGB: (255, 158, 100)
pub const LOAD_AMBER: Color = Color::Rgb(255, 158, 100);

/// Danger indicator - overloaded lines, consumers, errors
/// RGB: (247, 118, 142)
pub const OVERLOAD_RED: Color = Color::Rgb(247, 118, 142);

/// Healthy indicator - generators, connected states
/// RGB: (158, 206, 106)
pub const SUPPLY_GREEN: Color = Color::Rgb(158, 206, 106);

/// Neutral text and neutral buildings
/// RGB: (169, 177, 214)
pub const NEUTRAL_SILVER: Color = Color::Rgb(169, 177, 214);

/// Normal power flow
/// RGB: (122, 162, 247)
pub const VOLT_BLUE: Color = Color::Rgb(122, 162, 247);

/// Negligible flow, idle lines
/// RGB: (86, 95, 137)
pub const IDLE_GRAY: Color = Color::Rgb(86, 95, 137);

/// Blackout buildings; dark but still visible on a black terminal
/// RGB: (59, 66, 97)
pub const BLACKOUT_SLATE: Color = Color::Rgb(59, 66, 97);

/// Solar ring decoration
/// RGB: (224, 175, 104)
pub const SOLAR_GOLD: Color = Color::Rgb(224, 175, 104);

/// Battery gauge background
/// RGB: (40, 84, 48)
pub const BATTERY_DARK: Color = Color::Rgb(40, 84, 48);

/// Battery gauge fill
/// RGB: (185, 242, 124)
pub const BATTERY_FILL: Color = Color::Rgb(185, 242, 124);

/// Building id labels
pub const LABEL_WHITE: Color = Color::White;

/// Selection highlight background (Deep Indigo)
pub const SELECTION_BG: Color = Color::Rgb(47, 51, 77);

// Re-export theme functions for convenient access
pub use default::*;
