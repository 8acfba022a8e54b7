// Snapshot synchronization
//
// The State Store holds the latest complete Snapshot; the Sync Controller
// fetches buildings, power lines and economics as one unit and commits the
// result. Refreshes are sequenced: each takes a monotonic ticket, at most
// one passive refresh is in flight, and completions older than the
// committed snapshot are discarded.

use crate::api::{ApiError, SimulatorApi};
use crate::model::{LoadScenarioResponse, ScenarioInfo, Snapshot};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Simulator answered `success: false`; carries its message verbatim
    #[error("{0}")]
    ScenarioRejected(String),
}

/// Holder of the current snapshot
///
/// Readers see either no snapshot or a complete one. Replacement swaps the
/// whole `Arc`; nothing inside a snapshot is ever mutated.
#[derive(Debug, Default)]
pub struct StateStore {
    current: Option<Arc<Snapshot>>,
    /// Sequence of the snapshot currently held (0 before any commit)
    committed_seq: u64,
}

impl StateStore {
    pub fn current(&self) -> Option<&Arc<Snapshot>> {
        self.current.as_ref()
    }

    /// Unconditional full overwrite
    pub fn replace(&mut self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.current = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Overwrite only if `seq` is newer than the held snapshot
    ///
    /// Returns `None` and leaves the store untouched for stale sequences.
    pub fn commit(&mut self, seq: u64, snapshot: Snapshot) -> Option<Arc<Snapshot>> {
        if seq <= self.committed_seq {
            return None;
        }
        self.committed_seq = seq;
        Some(self.replace(snapshot))
    }

    /// Sequenced overwrite that always yields the newest snapshot held
    fn commit_latest(&mut self, seq: u64, snapshot: Snapshot) -> Arc<Snapshot> {
        match self.current.clone() {
            Some(current) if seq <= self.committed_seq => current,
            _ => {
                self.committed_seq = self.committed_seq.max(seq);
                self.replace(snapshot)
            }
        }
    }
}

/// Fetch the three snapshot resources concurrently and join them
///
/// Fails as a whole if any single request fails, so a snapshot is never
/// assembled from a partial set of resources.
pub async fn fetch_snapshot<A: SimulatorApi + ?Sized>(api: &A) -> Result<Snapshot, ApiError> {
    let (buildings, power_lines, economics) = tokio::try_join!(
        api.fetch_buildings(),
        api.fetch_power_lines(),
        api.fetch_economics()
    )?;
    Ok(Snapshot::new(buildings, power_lines, economics))
}

/// Fetch the scenario catalog; independent of the snapshot lifecycle
pub async fn fetch_scenario_catalog<A: SimulatorApi + ?Sized>(
    api: &A,
) -> Result<Vec<ScenarioInfo>, ApiError> {
    api.fetch_scenarios().await
}

/// Interpret a scenario load response
fn scenario_outcome(response: LoadScenarioResponse) -> Result<String, SyncError> {
    if response.success {
        Ok(response.message)
    } else {
        Err(SyncError::ScenarioRejected(response.message))
    }
}

/// Permission to run one refresh; carries its sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Committed(Arc<Snapshot>),
    /// A newer snapshot was already committed; this result was dropped
    Superseded,
    /// Fetch failed; the previous snapshot is retained
    Failed(ApiError),
}

#[derive(Debug)]
pub struct RefreshCompletion {
    pub outcome: RefreshOutcome,
    /// Coalesced refresh to start now, if requests arrived meanwhile
    pub follow_up: Option<RefreshTicket>,
}

#[derive(Debug)]
pub struct ScenarioCompletion {
    /// Simulator message, or why the load failed
    pub outcome: Result<String, SyncError>,
    /// Refresh to start now; `None` when the load failed or a refresh is
    /// already in flight and this one was coalesced into it
    pub refresh: Option<RefreshTicket>,
}

/// Sequencing state machine over the State Store
#[derive(Debug, Default)]
pub struct SyncController {
    store: StateStore,
    next_seq: u64,
    in_flight: Option<RefreshTicket>,
    pending: bool,
}

impl SyncController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.store.current()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    fn issue(&mut self) -> RefreshTicket {
        self.next_seq += 1;
        RefreshTicket(self.next_seq)
    }

    /// Ask for a passive refresh
    ///
    /// Returns a ticket when the caller should start fetching now. While a
    /// refresh is in flight the request is coalesced into a single pending
    /// follow-up and `None` is returned.
    pub fn request_refresh(&mut self) -> Option<RefreshTicket> {
        if self.in_flight.is_some() {
            self.pending = true;
            return None;
        }
        let ticket = self.issue();
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Record the result of a passive refresh started with `ticket`
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Snapshot, ApiError>,
    ) -> RefreshCompletion {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }

        let outcome = match result {
            Ok(snapshot) => match self.store.commit(ticket.seq(), snapshot) {
                Some(committed) => RefreshOutcome::Committed(committed),
                None => RefreshOutcome::Superseded,
            },
            Err(err) => RefreshOutcome::Failed(err),
        };

        let follow_up = if self.pending && self.in_flight.is_none() {
            self.pending = false;
            self.request_refresh()
        } else {
            None
        };

        RefreshCompletion { outcome, follow_up }
    }

    /// Fetch and commit one snapshot in place
    ///
    /// Returns the snapshot current after the call. On failure the previous
    /// snapshot is kept and the error is returned; there is no retry.
    pub async fn refresh_snapshot<A: SimulatorApi + ?Sized>(
        &mut self,
        api: &A,
    ) -> Result<Arc<Snapshot>, SyncError> {
        let ticket = self.issue();
        let snapshot = fetch_snapshot(api).await?;
        Ok(self.store.commit_latest(ticket.seq(), snapshot))
    }

    /// Record the simulator's answer to a scenario load
    ///
    /// Every scenario load ends here. A rejected or failed load touches no
    /// state; an accepted one asks for exactly one refresh.
    pub fn complete_scenario_load(
        &mut self,
        response: Result<LoadScenarioResponse, ApiError>,
    ) -> ScenarioCompletion {
        let outcome = response.map_err(SyncError::from).and_then(scenario_outcome);
        let refresh = match outcome {
            Ok(_) => self.request_refresh(),
            Err(_) => None,
        };
        ScenarioCompletion { outcome, refresh }
    }

    /// Load a scenario and await the refresh that follows
    ///
    /// Used at startup, before the event loop can run refresh tickets. A
    /// rejected load surfaces the message as `SyncError::ScenarioRejected`;
    /// a failed refresh is logged and the message is still returned.
    pub async fn load_scenario<A: SimulatorApi + ?Sized>(
        &mut self,
        api: &A,
        name: &str,
    ) -> Result<String, SyncError> {
        let completion = self.complete_scenario_load(api.load_scenario(name).await);
        let message = completion.outcome?;

        if let Some(ticket) = completion.refresh {
            let result = fetch_snapshot(api).await;
            if let RefreshOutcome::Failed(err) = self.complete_refresh(ticket, result).outcome {
                tracing::warn!(scenario = name, error = %err, "Refresh after scenario load failed");
            }
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeApi, FakeState};
    use crate::api::{BUILDINGS_ENDPOINT, ECONOMICS_ENDPOINT, LOAD_SCENARIO_ENDPOINT, POWER_LINES_ENDPOINT};
    use crate::model::{Building, EconomicSnapshot, PowerLine};

    fn seeded_api() -> FakeApi {
        FakeApi::new(FakeState {
            buildings: vec![
                Building { id: 1, x: 0.0, y: 0.0, supply: 3.0, ..Default::default() },
                Building { id: 2, x: 10.0, y: 0.0, supply: -3.0, ..Default::default() },
            ],
            power_lines: vec![PowerLine { u: 1, v: 2, capacity: 4.0, flow: 3.8, removed: false }],
            economics: EconomicSnapshot {
                electricity_price: Some(0.15),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    fn empty_snapshot() -> Snapshot {
        Snapshot::new(vec![], vec![], EconomicSnapshot::default())
    }

    // ============================================================================
    // State Store
    // ============================================================================

    #[test]
    fn test_store_starts_empty() {
        let store = StateStore::default();
        assert!(store.current().is_none());
        assert_eq!(store.committed_seq, 0);
    }

    #[test]
    fn test_store_commit_rejects_stale() {
        let mut store = StateStore::default();
        let fresh = store.commit(5, empty_snapshot()).unwrap();
        assert!(store.commit(3, empty_snapshot()).is_none());
        assert!(store.commit(5, empty_snapshot()).is_none());
        assert!(Arc::ptr_eq(store.current().unwrap(), &fresh));
        assert_eq!(store.committed_seq, 5);
    }

    #[test]
    fn test_store_replace_is_unconditional() {
        let mut store = StateStore::default();
        store.commit(9, empty_snapshot());
        let replaced = store.replace(empty_snapshot());
        assert!(Arc::ptr_eq(store.current().unwrap(), &replaced));
    }

    // ============================================================================
    // refresh_snapshot
    // ============================================================================

    #[tokio::test]
    async fn test_refresh_commits_joined_snapshot() {
        let api = seeded_api();
        let mut controller = SyncController::new();

        let snapshot = controller.refresh_snapshot(&api).await.unwrap();
        assert_eq!(snapshot.buildings().len(), 2);
        assert_eq!(snapshot.power_lines().len(), 1);
        assert_eq!(snapshot.economics().electricity_price, Some(0.15));
        assert!(Arc::ptr_eq(controller.snapshot().unwrap(), &snapshot));
    }

    #[tokio::test]
    async fn test_refresh_never_commits_partial_snapshot() {
        for endpoint in [BUILDINGS_ENDPOINT, POWER_LINES_ENDPOINT, ECONOMICS_ENDPOINT] {
            let api = seeded_api();
            let mut controller = SyncController::new();
            let before = controller.refresh_snapshot(&api).await.unwrap();

            // Change the served data, then break one of the three resources
            api.with(|s| s.buildings.clear());
            api.fail(endpoint);

            let result = controller.refresh_snapshot(&api).await;
            assert!(matches!(result, Err(SyncError::Api(ApiError::Unavailable { .. }))));
            let after = controller.snapshot().unwrap();
            assert!(Arc::ptr_eq(after, &before), "store changed when {} failed", endpoint);
            assert_eq!(after.buildings().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_failed_first_refresh_leaves_store_empty() {
        let api = seeded_api();
        api.fail(POWER_LINES_ENDPOINT);
        let mut controller = SyncController::new();
        assert!(controller.refresh_snapshot(&api).await.is_err());
        assert!(controller.snapshot().is_none());

        api.recover(POWER_LINES_ENDPOINT);
        assert!(controller.refresh_snapshot(&api).await.is_ok());
    }

    // ============================================================================
    // Scenario loading
    // ============================================================================

    #[tokio::test]
    async fn test_rejected_scenario_leaves_store_unchanged() {
        let api = seeded_api();
        let mut controller = SyncController::new();
        let before = controller.refresh_snapshot(&api).await.unwrap();
        let fetches = api.with(|s| s.building_fetches);

        api.with(|s| {
            s.scenario_response = Some(LoadScenarioResponse {
                success: false,
                message: "Scenario 'nope' not found".to_string(),
            })
        });

        let result = controller.load_scenario(&api, "nope").await;
        match result {
            Err(SyncError::ScenarioRejected(message)) => {
                assert_eq!(message, "Scenario 'nope' not found")
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(Arc::ptr_eq(controller.snapshot().unwrap(), &before));
        assert_eq!(**controller.snapshot().unwrap(), *before);
        // No refresh was triggered
        assert_eq!(api.with(|s| s.building_fetches), fetches);
    }

    #[tokio::test]
    async fn test_accepted_scenario_triggers_one_refresh() {
        let api = seeded_api();
        let mut controller = SyncController::new();

        let message = controller.load_scenario(&api, "heatwave").await.unwrap();
        assert_eq!(message, "Scenario 'heatwave' loaded");
        assert_eq!(api.with(|s| s.loaded.clone()), vec!["heatwave".to_string()]);
        assert_eq!(api.with(|s| s.building_fetches), 1);
        assert!(controller.snapshot().is_some());
        assert!(!controller.is_refreshing());
    }

    #[tokio::test]
    async fn test_scenario_transport_failure_is_api_error() {
        let api = seeded_api();
        api.fail(LOAD_SCENARIO_ENDPOINT);
        let mut controller = SyncController::new();
        let result = controller.load_scenario(&api, "heatwave").await;
        assert!(matches!(result, Err(SyncError::Api(_))));
        assert!(controller.snapshot().is_none());
    }

    #[test]
    fn test_scenario_completion_requests_one_refresh() {
        let mut controller = SyncController::new();
        let accepted = controller.complete_scenario_load(Ok(LoadScenarioResponse {
            success: true,
            message: "Scenario 'calm' loaded".to_string(),
        }));
        assert_eq!(accepted.outcome.unwrap(), "Scenario 'calm' loaded");
        let ticket = accepted.refresh.expect("accepted load refreshes");
        assert!(controller.is_refreshing());

        // A second load while that refresh runs is folded into a follow-up
        let again = controller.complete_scenario_load(Ok(LoadScenarioResponse {
            success: true,
            message: "Scenario 'storm' loaded".to_string(),
        }));
        assert!(again.outcome.is_ok());
        assert!(again.refresh.is_none());
        let done = controller.complete_refresh(ticket, Ok(empty_snapshot()));
        assert!(done.follow_up.is_some());
    }

    #[test]
    fn test_failed_scenario_completion_requests_nothing() {
        let mut controller = SyncController::new();
        let rejected = controller.complete_scenario_load(Ok(LoadScenarioResponse {
            success: false,
            message: "Scenario not found".to_string(),
        }));
        assert!(matches!(rejected.outcome, Err(SyncError::ScenarioRejected(_))));
        assert!(rejected.refresh.is_none());

        let failed = controller.complete_scenario_load(Err(ApiError::Unavailable {
            endpoint: LOAD_SCENARIO_ENDPOINT,
            reason: "refused".to_string(),
        }));
        assert!(matches!(failed.outcome, Err(SyncError::Api(_))));
        assert!(failed.refresh.is_none());
        assert!(!controller.is_refreshing());
    }

    #[tokio::test]
    async fn test_fetch_scenario_catalog() {
        let api = seeded_api();
        api.with(|s| {
            s.scenarios = vec![ScenarioInfo {
                name: "heatwave".to_string(),
                desc: "Hot summer week".to_string(),
            }]
        });
        let catalog = fetch_scenario_catalog(&api).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "heatwave");
    }

    // ============================================================================
    // Sequencing and coalescing
    // ============================================================================

    #[test]
    fn test_requests_coalesce_while_in_flight() {
        let mut controller = SyncController::new();
        let first = controller.request_refresh().unwrap();
        assert!(controller.is_refreshing());

        // A burst of notifications while the first refresh runs
        for _ in 0..5 {
            assert!(controller.request_refresh().is_none());
        }

        let done = controller.complete_refresh(first, Ok(empty_snapshot()));
        assert!(matches!(done.outcome, RefreshOutcome::Committed(_)));
        let second = done.follow_up.expect("exactly one follow-up");
        assert!(second.seq() > first.seq());

        let done = controller.complete_refresh(second, Ok(empty_snapshot()));
        assert!(done.follow_up.is_none());
        assert!(!controller.is_refreshing());
    }

    #[test]
    fn test_failed_refresh_still_issues_follow_up() {
        let mut controller = SyncController::new();
        let first = controller.request_refresh().unwrap();
        assert!(controller.request_refresh().is_none());

        let done = controller.complete_refresh(
            first,
            Err(ApiError::Unavailable {
                endpoint: BUILDINGS_ENDPOINT,
                reason: "down".to_string(),
            }),
        );
        assert!(matches!(done.outcome, RefreshOutcome::Failed(_)));
        assert!(done.follow_up.is_some());
        assert!(controller.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let api = seeded_api();
        let mut controller = SyncController::new();

        // Passive refresh starts, then a direct refresh overtakes it
        let stale = controller.request_refresh().unwrap();
        let fresh = controller.refresh_snapshot(&api).await.unwrap();

        let done = controller.complete_refresh(stale, Ok(empty_snapshot()));
        assert!(matches!(done.outcome, RefreshOutcome::Superseded));
        assert!(Arc::ptr_eq(controller.snapshot().unwrap(), &fresh));
        assert!(!controller.is_refreshing());
    }

    #[test]
    fn test_scenario_outcome() {
        let ok = scenario_outcome(LoadScenarioResponse {
            success: true,
            message: "loaded".to_string(),
        });
        assert_eq!(ok.unwrap(), "loaded");

        let err = scenario_outcome(LoadScenarioResponse {
            success: false,
            message: "missing".to_string(),
        });
        assert_eq!(err.unwrap_err().to_string(), "missing");
    }
}
