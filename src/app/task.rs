// Background network tasks
//
// State handlers never await the network. They return `Task`s, the runner
// spawns each one on the runtime and the outcome comes back to the event
// loop as a `TaskResult`.

use crate::api::{ApiError, Command, SimulatorApi};
use crate::model::{
    LoadScenarioResponse, ScenarioInfo, SimulationReport, Snapshot, StatusUpdate, WeatherReport,
};
use crate::sync::{self, RefreshTicket};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Work requested by a state handler
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Fetch a full snapshot under the given ticket
    Refresh(RefreshTicket),
    /// Send a command to the simulator
    Command(Command),
    FetchCatalog,
    FetchStatus,
    FetchWeather,
    FetchReport,
}

/// Outcome of a finished task
#[derive(Debug)]
pub enum TaskResult {
    Snapshot(RefreshTicket, Result<Snapshot, ApiError>),
    /// Raw answer to a scenario load; the sync controller interprets it
    ScenarioLoaded {
        name: String,
        result: Result<LoadScenarioResponse, ApiError>,
    },
    Catalog(Result<Vec<ScenarioInfo>, ApiError>),
    Status(Result<StatusUpdate, ApiError>),
    Weather(Result<WeatherReport, ApiError>),
    Report(Result<SimulationReport, ApiError>),
}

/// Run one task to completion
///
/// Control commands are fire-and-forget: failures are logged and nothing is
/// reported back.
pub async fn run_task(api: &dyn SimulatorApi, task: Task) -> Option<TaskResult> {
    match task {
        Task::Refresh(ticket) => Some(TaskResult::Snapshot(
            ticket,
            sync::fetch_snapshot(api).await,
        )),
        Task::Command(Command::LoadScenario(name)) => {
            let result = api.load_scenario(&name).await;
            Some(TaskResult::ScenarioLoaded { name, result })
        }
        Task::Command(command) => {
            if let Some(control) = command.as_control() {
                match api.send_control(&control).await {
                    Ok(()) => tracing::debug!(command = ?control, "Control command sent"),
                    Err(err) => tracing::warn!(command = ?control, error = %err, "Control command failed"),
                }
            }
            None
        }
        Task::FetchCatalog => Some(TaskResult::Catalog(
            sync::fetch_scenario_catalog(api).await,
        )),
        Task::FetchStatus => Some(TaskResult::Status(api.fetch_status().await)),
        Task::FetchWeather => Some(TaskResult::Weather(api.fetch_weather().await)),
        Task::FetchReport => Some(TaskResult::Report(api.fetch_report().await)),
    }
}

/// Spawns tasks onto the runtime and forwards their results
#[derive(Clone)]
pub struct TaskRunner {
    api: Arc<dyn SimulatorApi>,
    results: UnboundedSender<TaskResult>,
}

impl TaskRunner {
    pub fn new(api: Arc<dyn SimulatorApi>, results: UnboundedSender<TaskResult>) -> Self {
        Self { api, results }
    }

    pub fn spawn(&self, task: Task) {
        let api = Arc::clone(&self.api);
        let results = self.results.clone();
        tokio::spawn(async move {
            if let Some(result) = run_task(&*api, task).await {
                // Receiver only goes away on shutdown
                let _ = results.send(result);
            }
        });
    }

    pub fn spawn_all(&self, tasks: Vec<Task>) {
        for task in tasks {
            self.spawn(task);
        }
    }
}
