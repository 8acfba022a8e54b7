// Application configuration types
//
// Constants for the event loop and the simulation speed presets, plus the
// runtime client settings assembled from the command line.

use reqwest::Url;
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Address of a locally running simulator
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Default per-request timeout in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// Event loop tick; keys are polled and the screen redrawn at this rate
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Speed multipliers offered by the speed controls, ascending
pub const SPEED_PRESETS: [f64; 5] = [0.5, 1.0, 2.0, 5.0, 10.0];

/// Speed assumed before the simulator reports one
pub const DEFAULT_SPEED: f64 = 1.0;

/// Number of notices kept for the notices panel
pub const NOTICE_CAPACITY: usize = 200;

// ============================================================================
// Speed presets
// ============================================================================

/// Next faster preset, or the fastest one if already there
///
/// Speeds between presets step to the nearest preset above.
pub fn next_speed(current: f64) -> f64 {
    SPEED_PRESETS
        .iter()
        .copied()
        .find(|&preset| preset > current)
        .unwrap_or(SPEED_PRESETS[SPEED_PRESETS.len() - 1])
}

/// Next slower preset, or the slowest one if already there
pub fn prev_speed(current: f64) -> f64 {
    SPEED_PRESETS
        .iter()
        .rev()
        .copied()
        .find(|&preset| preset < current)
        .unwrap_or(SPEED_PRESETS[0])
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Settings for talking to the simulator
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: Url,
    pub request_timeout: Duration,
    /// Listen for `status_update` push events
    pub push_enabled: bool,
    /// Scenario to load once at startup
    pub startup_scenario: Option<String>,
}

impl ClientConfig {
    pub fn new(server: Url) -> Self {
        Self {
            server,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            push_enabled: true,
            startup_scenario: None,
        }
    }
}
