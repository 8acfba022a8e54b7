// Application state management
//
// `AppState` owns the synchronized snapshot, its rendered scene and the
// dashboard state. Handlers are synchronous and return `Task`s for the
// runner; network outcomes come back through `on_task_result`.

pub mod config;
pub mod event;
pub mod task;

pub use task::{Task, TaskResult, TaskRunner};

use crate::api::{Command, SimulatorApi};
use crate::model::{
    Building, BuildingId, ScenarioInfo, SimulationReport, Snapshot, StatusUpdate, WeatherReport,
};
use crate::push::PushEvent;
use crate::scene::{DisplayList, RenderStats, SceneRenderer, SceneTransform};
use crate::sync::{RefreshOutcome, SyncController, SyncError};
use config::{next_speed, prev_speed, DEFAULT_SPEED, NOTICE_CAPACITY};
use ratatui::widgets::ListState;
use std::collections::VecDeque;
use std::sync::Arc;

/// Severity of a notice shown in the notices panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
    /// Forwarded tracing output
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Push listener state as last reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushState {
    Disabled,
    Connecting,
    Connected,
    Disconnected(String),
}

/// Analytics report overlay
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReportView {
    #[default]
    Closed,
    Loading,
    Ready(SimulationReport),
    Failed(String),
}

impl ReportView {
    pub fn is_open(&self) -> bool {
        !matches!(self, ReportView::Closed)
    }
}

/// Main application state
pub struct AppState {
    /// Whether the application is running
    pub running: bool,

    controller: SyncController,
    renderer: SceneRenderer,

    /// Scene of the current snapshot, redrawn on every commit
    display: DisplayList,

    /// Counters from the last redraw
    pub render_stats: RenderStats,

    /// Latest status payload, straight from push or `/api/status`
    pub status: Option<StatusUpdate>,

    /// Set by the first pushed status; later `/api/status` answers are older
    push_status_seen: bool,

    /// Humidity and fine dust, refreshed alongside pushed status
    pub weather: Option<WeatherReport>,
    weather_in_flight: bool,

    pub report: ReportView,

    /// Simulation speed multiplier last requested or reported
    pub speed: f64,

    /// Scenario catalog
    pub scenarios: Vec<ScenarioInfo>,

    /// List state for the scenario selector (enables scrolling)
    pub scenario_list_state: ListState,

    /// Building shown in the inspector
    pub selected_building: Option<BuildingId>,

    /// Most recent notices, oldest first
    pub notices: VecDeque<Notice>,

    pub push_state: PushState,

    /// Error from the last failed refresh, cleared by the next success
    pub refresh_error: Option<String>,
}

impl AppState {
    pub fn new(push_enabled: bool) -> Self {
        Self {
            running: true,
            controller: SyncController::new(),
            renderer: SceneRenderer::default(),
            display: DisplayList::new(),
            render_stats: RenderStats::default(),
            status: None,
            push_status_seen: false,
            weather: None,
            weather_in_flight: false,
            report: ReportView::Closed,
            speed: DEFAULT_SPEED,
            scenarios: Vec::new(),
            scenario_list_state: ListState::default(),
            selected_building: None,
            notices: VecDeque::with_capacity(NOTICE_CAPACITY),
            push_state: if push_enabled {
                PushState::Connecting
            } else {
                PushState::Disabled
            },
            refresh_error: None,
        }
    }

    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.controller.snapshot()
    }

    pub fn display_list(&self) -> &DisplayList {
        &self.display
    }

    pub fn scene_transform(&self) -> &SceneTransform {
        self.renderer.transform()
    }

    pub fn is_refreshing(&self) -> bool {
        self.controller.is_refreshing()
    }

    // ========================================================================
    // Startup
    // ========================================================================

    /// Load the initial snapshot, through a scenario load when one is named
    ///
    /// Runs before the event loop, so it awaits the controller directly.
    pub async fn bootstrap<A: SimulatorApi + ?Sized>(&mut self, api: &A, scenario: Option<&str>) {
        match scenario {
            Some(name) => match self.controller.load_scenario(api, name).await {
                Ok(message) => self.push_notice(NoticeLevel::Info, message),
                Err(err) => self.report_scenario_error(name, &err),
            },
            None => {
                if let Err(err) = self.controller.refresh_snapshot(api).await {
                    tracing::warn!(error = %err, "Initial refresh failed");
                    self.refresh_error = Some(err.to_string());
                }
            }
        }

        if let Some(snapshot) = self.controller.snapshot().cloned() {
            self.apply_snapshot(&snapshot);
        }
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Ask for a refresh; coalesced while one is already running
    pub fn request_refresh(&mut self) -> Vec<Task> {
        self.controller
            .request_refresh()
            .map(Task::Refresh)
            .into_iter()
            .collect()
    }

    /// Apply a pushed status payload and refresh the snapshot
    ///
    /// Every notification requests a refresh, whether or not the grid
    /// actually changed.
    pub fn on_status_update(&mut self, update: StatusUpdate) -> Vec<Task> {
        self.push_status_seen = true;
        self.apply_status(update);
        let mut tasks = self.request_refresh();
        tasks.extend(self.request_weather());
        tasks
    }

    fn apply_status(&mut self, update: StatusUpdate) {
        if let Some(speed) = update.speed {
            self.speed = speed;
        }
        self.status = Some(update);
    }

    /// Ask for current weather unless a fetch is already running
    pub fn request_weather(&mut self) -> Vec<Task> {
        if self.weather_in_flight {
            return Vec::new();
        }
        self.weather_in_flight = true;
        vec![Task::FetchWeather]
    }

    pub fn on_push_event(&mut self, event: PushEvent) -> Vec<Task> {
        match event {
            PushEvent::Status(update) => self.on_status_update(update),
            PushEvent::Connected => {
                self.push_state = PushState::Connected;
                self.push_notice(NoticeLevel::Info, "Push channel connected".to_string());
                // Catch up on anything missed while disconnected
                self.request_refresh()
            }
            PushEvent::Disconnected(reason) => {
                if self.push_state != PushState::Disconnected(reason.clone()) {
                    self.push_notice(
                        NoticeLevel::Warn,
                        format!("Push channel lost: {}", reason),
                    );
                }
                self.push_state = PushState::Disconnected(reason);
                Vec::new()
            }
        }
    }

    pub fn on_task_result(&mut self, result: TaskResult) -> Vec<Task> {
        match result {
            TaskResult::Snapshot(ticket, result) => {
                let completion = self.controller.complete_refresh(ticket, result);
                match completion.outcome {
                    RefreshOutcome::Committed(snapshot) => {
                        self.refresh_error = None;
                        self.apply_snapshot(&snapshot);
                    }
                    RefreshOutcome::Superseded => {
                        tracing::debug!(seq = ticket.seq(), "Discarded stale snapshot");
                    }
                    RefreshOutcome::Failed(err) => {
                        tracing::warn!(seq = ticket.seq(), error = %err, "Snapshot refresh failed");
                        self.refresh_error = Some(err.to_string());
                    }
                }
                completion.follow_up.map(Task::Refresh).into_iter().collect()
            }
            TaskResult::ScenarioLoaded { name, result } => {
                let completion = self.controller.complete_scenario_load(result);
                match completion.outcome {
                    Ok(message) => self.push_notice(NoticeLevel::Info, message),
                    Err(err) => self.report_scenario_error(&name, &err),
                }
                completion.refresh.map(Task::Refresh).into_iter().collect()
            }
            TaskResult::Catalog(result) => {
                match result {
                    Ok(catalog) => self.set_scenarios(catalog),
                    Err(err) => {
                        self.push_notice(
                            NoticeLevel::Warn,
                            format!("Could not load scenario list: {}", err),
                        );
                    }
                }
                Vec::new()
            }
            TaskResult::Status(result) => {
                match result {
                    // A pushed status is never older than a fetched one
                    Ok(update) if self.push_status_seen => {
                        tracing::debug!(time = %update.time, "Ignoring fetched status behind push");
                    }
                    Ok(update) => self.apply_status(update),
                    Err(err) => tracing::warn!(error = %err, "Status fetch failed"),
                }
                Vec::new()
            }
            TaskResult::Weather(result) => {
                self.weather_in_flight = false;
                match result {
                    Ok(weather) => self.weather = Some(weather),
                    Err(err) => tracing::debug!(error = %err, "Weather fetch failed"),
                }
                Vec::new()
            }
            TaskResult::Report(result) => {
                // Closed while loading
                if self.report.is_open() {
                    self.report = match result {
                        Ok(report) => ReportView::Ready(report),
                        Err(err) => ReportView::Failed(err.to_string()),
                    };
                }
                Vec::new()
            }
        }
    }

    /// Redraw the scene and keep the inspector selection valid
    fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        self.render_stats = self.renderer.render(snapshot, &mut self.display);

        if let Some(id) = self.selected_building {
            let still_present = snapshot.building(id).is_some_and(|b| !b.removed);
            if !still_present {
                self.selected_building = None;
            }
        }
    }

    fn report_scenario_error(&mut self, name: &str, err: &SyncError) {
        match err {
            // Server message is shown verbatim
            SyncError::ScenarioRejected(message) => {
                self.push_notice(NoticeLevel::Error, message.clone())
            }
            SyncError::Api(api_err) => self.push_notice(
                NoticeLevel::Error,
                format!("Loading scenario '{}' failed: {}", name, api_err),
            ),
        }
    }

    // ========================================================================
    // Simulation controls
    // ========================================================================

    pub fn start_simulation(&mut self) -> Vec<Task> {
        vec![Task::Command(Command::Start)]
    }

    pub fn pause_simulation(&mut self) -> Vec<Task> {
        vec![Task::Command(Command::Pause)]
    }

    pub fn speed_up(&mut self) -> Vec<Task> {
        self.change_speed(next_speed(self.speed))
    }

    pub fn slow_down(&mut self) -> Vec<Task> {
        self.change_speed(prev_speed(self.speed))
    }

    fn change_speed(&mut self, speed: f64) -> Vec<Task> {
        if speed == self.speed {
            return Vec::new();
        }
        self.speed = speed;
        vec![Task::Command(Command::Speed(speed))]
    }

    /// Whether the simulator last reported itself running
    pub fn simulation_running(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.running)
    }

    // ========================================================================
    // Analytics report
    // ========================================================================

    /// Open the report and fetch it, or close it
    pub fn toggle_report(&mut self) -> Vec<Task> {
        if self.report.is_open() {
            self.report = ReportView::Closed;
            Vec::new()
        } else {
            self.report = ReportView::Loading;
            vec![Task::FetchReport]
        }
    }

    // ========================================================================
    // Scenario selector
    // ========================================================================

    pub fn set_scenarios(&mut self, catalog: Vec<ScenarioInfo>) {
        let previous = self.selected_scenario().map(|s| s.name.clone());
        self.scenarios = catalog;

        let selection = previous
            .and_then(|name| self.scenarios.iter().position(|s| s.name == name))
            .or(if self.scenarios.is_empty() { None } else { Some(0) });
        self.scenario_list_state.select(selection);
    }

    pub fn selected_scenario(&self) -> Option<&ScenarioInfo> {
        self.scenario_list_state
            .selected()
            .and_then(|idx| self.scenarios.get(idx))
    }

    pub fn select_next_scenario(&mut self) {
        if self.scenarios.is_empty() {
            self.scenario_list_state.select(None);
            return;
        }
        let next = match self.scenario_list_state.selected() {
            None => 0,
            Some(idx) => (idx + 1).min(self.scenarios.len() - 1),
        };
        self.scenario_list_state.select(Some(next));
    }

    pub fn select_previous_scenario(&mut self) {
        if self.scenarios.is_empty() {
            self.scenario_list_state.select(None);
            return;
        }
        let prev = match self.scenario_list_state.selected() {
            None => 0,
            Some(idx) => idx.saturating_sub(1),
        };
        self.scenario_list_state.select(Some(prev));
    }

    pub fn load_selected_scenario(&mut self) -> Vec<Task> {
        match self.selected_scenario() {
            Some(scenario) => {
                let name = scenario.name.clone();
                self.push_notice(NoticeLevel::Info, format!("Loading scenario '{}'", name));
                vec![Task::Command(Command::LoadScenario(name))]
            }
            None => Vec::new(),
        }
    }

    // ========================================================================
    // Building inspector
    // ========================================================================

    pub fn selected_building(&self) -> Option<&Building> {
        let id = self.selected_building?;
        self.snapshot()?.building(id).filter(|b| !b.removed)
    }

    pub fn select_next_building(&mut self) {
        self.step_building(1);
    }

    pub fn select_previous_building(&mut self) {
        self.step_building(-1);
    }

    /// Move the selection through active buildings, wrapping around
    fn step_building(&mut self, step: isize) {
        let Some(snapshot) = self.controller.snapshot() else {
            return;
        };
        let ids: Vec<BuildingId> = snapshot.active_buildings().map(|b| b.id).collect();
        if ids.is_empty() {
            self.selected_building = None;
            return;
        }

        let len = ids.len() as isize;
        let next = match self
            .selected_building
            .and_then(|id| ids.iter().position(|&other| other == id))
        {
            Some(pos) => (pos as isize + step).rem_euclid(len),
            None if step >= 0 => 0,
            None => len - 1,
        };
        self.selected_building = Some(ids[next as usize]);
    }

    // ========================================================================
    // Notices
    // ========================================================================

    pub fn push_notice(&mut self, level: NoticeLevel, text: String) {
        if self.notices.len() >= NOTICE_CAPACITY {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice { level, text });
    }

    /// Append forwarded log output, one notice per non-empty line
    pub fn push_log_output(&mut self, output: &str) {
        for line in output.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
            self.push_notice(NoticeLevel::Log, line.to_string());
        }
    }

    /// Latest notice that is not plain log output
    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices
            .iter()
            .rev()
            .find(|n| n.level != NoticeLevel::Log)
    }
}
