// In-memory simulator for tests
//
// Serves canned resources and records commands. Individual endpoints can be
// made to fail to exercise the sync controller's fail-atomic refresh.

use super::*;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct FakeState {
    pub buildings: Vec<Building>,
    pub power_lines: Vec<PowerLine>,
    pub economics: EconomicSnapshot,
    pub status: StatusUpdate,
    pub weather: WeatherReport,
    pub report: SimulationReport,
    pub scenarios: Vec<ScenarioInfo>,
    /// Response to `load_scenario`; `None` answers success
    pub scenario_response: Option<LoadScenarioResponse>,
    pub failing: HashSet<&'static str>,
    pub controls: Vec<ControlCommand>,
    pub loaded: Vec<String>,
    pub building_fetches: usize,
}

#[derive(Debug, Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new(state: FakeState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.with(|s| s.failing.insert(endpoint));
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.with(|s| s.failing.remove(endpoint));
    }

    fn check(&self, endpoint: &'static str) -> Result<(), ApiError> {
        if self.with(|s| s.failing.contains(endpoint)) {
            return Err(ApiError::Unavailable {
                endpoint,
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SimulatorApi for FakeApi {
    async fn fetch_buildings(&self) -> Result<Vec<Building>, ApiError> {
        self.check(BUILDINGS_ENDPOINT)?;
        Ok(self.with(|s| {
            s.building_fetches += 1;
            s.buildings.clone()
        }))
    }

    async fn fetch_power_lines(&self) -> Result<Vec<PowerLine>, ApiError> {
        self.check(POWER_LINES_ENDPOINT)?;
        Ok(self.with(|s| s.power_lines.clone()))
    }

    async fn fetch_economics(&self) -> Result<EconomicSnapshot, ApiError> {
        self.check(ECONOMICS_ENDPOINT)?;
        Ok(self.with(|s| s.economics.clone()))
    }

    async fn fetch_status(&self) -> Result<StatusUpdate, ApiError> {
        self.check(STATUS_ENDPOINT)?;
        Ok(self.with(|s| s.status.clone()))
    }

    async fn fetch_weather(&self) -> Result<WeatherReport, ApiError> {
        self.check(WEATHER_ENDPOINT)?;
        Ok(self.with(|s| s.weather.clone()))
    }

    async fn fetch_report(&self) -> Result<SimulationReport, ApiError> {
        self.check(REPORT_ENDPOINT)?;
        Ok(self.with(|s| s.report.clone()))
    }

    async fn fetch_scenarios(&self) -> Result<Vec<ScenarioInfo>, ApiError> {
        self.check(SCENARIOS_ENDPOINT)?;
        Ok(self.with(|s| s.scenarios.clone()))
    }

    async fn send_control(&self, command: &ControlCommand) -> Result<(), ApiError> {
        self.check(CONTROL_ENDPOINT)?;
        self.with(|s| s.controls.push(command.clone()));
        Ok(())
    }

    async fn load_scenario(&self, name: &str) -> Result<LoadScenarioResponse, ApiError> {
        self.check(LOAD_SCENARIO_ENDPOINT)?;
        Ok(self.with(|s| {
            s.loaded.push(name.to_string());
            s.scenario_response.clone().unwrap_or(LoadScenarioResponse {
                success: true,
                message: format!("Scenario '{}' loaded", name),
            })
        }))
    }
}
