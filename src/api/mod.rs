// Simulator HTTP API
//
// The command side of the control channel and the resource fetches the
// sync controller joins into snapshots. `SimulatorApi` is the seam; the
// reqwest-backed client talks to the real simulator.

#[cfg(test)]
pub mod fake;

use crate::model::{
    Building, EconomicSnapshot, LoadScenarioResponse, PowerLine, ScenarioInfo, SimulationReport,
    StatusUpdate, WeatherReport,
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors from talking to the simulator
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never produced a usable response (connect, timeout, decode)
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success HTTP status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    /// Endpoint could not be reached for a reason outside HTTP
    #[error("{endpoint} unavailable: {reason}")]
    Unavailable {
        endpoint: &'static str,
        reason: String,
    },

    #[error("invalid server URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Simulation control commands posted to `/api/control`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ControlCommand {
    Start,
    Pause,
    Speed { speed: f64 },
}

/// User commands handled by the control channel
///
/// Control commands are fire-and-forget; loading a scenario is awaited so
/// its outcome can be reported.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Pause,
    Speed(f64),
    LoadScenario(String),
}

impl Command {
    /// The `/api/control` body for this command, if it is a control command
    pub fn as_control(&self) -> Option<ControlCommand> {
        match self {
            Command::Start => Some(ControlCommand::Start),
            Command::Pause => Some(ControlCommand::Pause),
            Command::Speed(speed) => Some(ControlCommand::Speed { speed: *speed }),
            Command::LoadScenario(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct LoadScenarioRequest<'a> {
    scenario_name: &'a str,
}

/// Remote simulator operations
#[async_trait]
pub trait SimulatorApi: Send + Sync {
    async fn fetch_buildings(&self) -> Result<Vec<Building>, ApiError>;
    async fn fetch_power_lines(&self) -> Result<Vec<PowerLine>, ApiError>;
    async fn fetch_economics(&self) -> Result<EconomicSnapshot, ApiError>;
    async fn fetch_status(&self) -> Result<StatusUpdate, ApiError>;
    async fn fetch_weather(&self) -> Result<WeatherReport, ApiError>;
    async fn fetch_report(&self) -> Result<SimulationReport, ApiError>;
    async fn fetch_scenarios(&self) -> Result<Vec<ScenarioInfo>, ApiError>;
    async fn send_control(&self, command: &ControlCommand) -> Result<(), ApiError>;
    async fn load_scenario(&self, name: &str) -> Result<LoadScenarioResponse, ApiError>;
}

pub const BUILDINGS_ENDPOINT: &str = "/api/buildings";
pub const POWER_LINES_ENDPOINT: &str = "/api/power_lines";
pub const ECONOMICS_ENDPOINT: &str = "/api/economics";
pub const STATUS_ENDPOINT: &str = "/api/status";
pub const WEATHER_ENDPOINT: &str = "/api/weather";
pub const REPORT_ENDPOINT: &str = "/api/report";
pub const SCENARIOS_ENDPOINT: &str = "/api/scenarios";
pub const CONTROL_ENDPOINT: &str = "/api/control";
pub const LOAD_SCENARIO_ENDPOINT: &str = "/api/load_scenario";

/// reqwest-backed simulator client
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpSimulatorApi {
    client: Client,
    base: Url,
}

impl HttpSimulatorApi {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                endpoint: "client",
                source,
            })?;
        Ok(Self { client, base })
    }

    fn url(&self, endpoint: &'static str) -> Result<Url, ApiError> {
        self.base.join(endpoint).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{}", self.base, endpoint),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(endpoint)?)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        decode(endpoint, response).await
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        self.client
            .post(self.url(endpoint)?)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|source| ApiError::Transport { endpoint, source })
}

#[async_trait]
impl SimulatorApi for HttpSimulatorApi {
    async fn fetch_buildings(&self) -> Result<Vec<Building>, ApiError> {
        self.get_json(BUILDINGS_ENDPOINT).await
    }

    async fn fetch_power_lines(&self) -> Result<Vec<PowerLine>, ApiError> {
        self.get_json(POWER_LINES_ENDPOINT).await
    }

    async fn fetch_economics(&self) -> Result<EconomicSnapshot, ApiError> {
        self.get_json(ECONOMICS_ENDPOINT).await
    }

    async fn fetch_status(&self) -> Result<StatusUpdate, ApiError> {
        self.get_json(STATUS_ENDPOINT).await
    }

    async fn fetch_weather(&self) -> Result<WeatherReport, ApiError> {
        self.get_json(WEATHER_ENDPOINT).await
    }

    async fn fetch_report(&self) -> Result<SimulationReport, ApiError> {
        self.get_json(REPORT_ENDPOINT).await
    }

    async fn fetch_scenarios(&self) -> Result<Vec<ScenarioInfo>, ApiError> {
        self.get_json(SCENARIOS_ENDPOINT).await
    }

    async fn send_control(&self, command: &ControlCommand) -> Result<(), ApiError> {
        let response = self.post_json(CONTROL_ENDPOINT, command).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: CONTROL_ENDPOINT,
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn load_scenario(&self, name: &str) -> Result<LoadScenarioResponse, ApiError> {
        let body = LoadScenarioRequest {
            scenario_name: name,
        };
        let response = self.post_json(LOAD_SCENARIO_ENDPOINT, &body).await?;
        decode(LOAD_SCENARIO_ENDPOINT, response).await
    }
}

/// Parse a user-supplied server address, defaulting the scheme to http
pub fn parse_server_url(raw: &str) -> Result<Url, ApiError> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };
    Url::parse(&with_scheme).map_err(|e| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
