// Simulation data model
//
// Wire types pushed and served by the grid simulator, plus the immutable
// Snapshot assembled from them. Field names follow the simulator's JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Building identity, stable across snapshots
pub type BuildingId = i64;

/// A building (graph node) as served by `GET /api/buildings`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Building {
    pub id: BuildingId,
    pub x: f64,
    pub y: f64,
    /// Removed buildings are never drawn and never resolve as edge endpoints
    pub removed: bool,
    /// Positive = net generation, negative = net consumption
    pub supply: f64,
    pub is_prosumer: bool,
    pub blackout: bool,
    pub solar_capacity: f64,
    pub battery_capacity: f64,
    pub battery_charge: f64,
    /// Building type label reported by the simulator (e.g. "apartment")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_supply: Option<f64>,
}

impl Building {
    /// Whether the building can be drawn at all
    pub fn is_visible(&self) -> bool {
        !self.removed && self.x.is_finite() && self.y.is_finite()
    }
}

/// A power line (graph edge) as served by `GET /api/power_lines`
///
/// `flow` is signed relative to the `u -> v` direction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerLine {
    pub u: BuildingId,
    pub v: BuildingId,
    pub capacity: f64,
    pub flow: f64,
    pub removed: bool,
}

/// Aggregate economic metrics from `GET /api/economics`
///
/// Opaque to rendering; every field is displayed verbatim when present.
/// When the simulator runs without an economic model only `message` is set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicSnapshot {
    pub electricity_price: Option<f64>,
    pub operational_cost: Option<f64>,
    pub revenue: Option<f64>,
    pub carbon_tax: Option<f64>,
    pub investment_cost: Option<f64>,
    pub profit: Option<f64>,
    pub roi: Option<f64>,
    pub message: Option<String>,
}

impl EconomicSnapshot {
    /// Labelled metrics that are present, in display order
    pub fn metrics(&self) -> Vec<(&'static str, f64)> {
        [
            ("Price", self.electricity_price),
            ("Op. cost", self.operational_cost),
            ("Revenue", self.revenue),
            ("Carbon tax", self.carbon_tax),
            ("Investment", self.investment_cost),
            ("Profit", self.profit),
            ("ROI %", self.roi),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect()
    }
}

/// Compact status payload: the `status_update` push event and `GET /api/status`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusUpdate {
    /// ISO-8601 simulation time
    pub time: String,
    pub weather: String,
    pub temperature: f64,
    pub event_count: u64,
    pub demand: f64,
    pub supply: f64,
    pub flow: f64,
    pub blackout_count: u64,
    pub budget: f64,
    pub money: f64,
    pub running: bool,
    pub speed: Option<f64>,
}

/// Current conditions from `GET /api/weather`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherReport {
    pub weather: String,
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Fine dust level label, e.g. "good" or "bad"
    pub pm_level: String,
}

/// Analytics summary from `GET /api/report`
///
/// Until the simulator has recorded a data point only `error` is set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationReport {
    pub simulation_period: Option<ReportPeriod>,
    pub energy_metrics: Option<EnergyMetrics>,
    pub reliability_metrics: Option<ReliabilityMetrics>,
    pub renewable_metrics: Option<RenewableMetrics>,
    pub economic_metrics: Option<ReportEconomics>,
    pub environmental_metrics: Option<EnvironmentalMetrics>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportPeriod {
    pub start: String,
    pub end: String,
    pub duration_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyMetrics {
    pub current_demand: f64,
    pub current_supply: f64,
    pub current_flow: f64,
    pub avg_demand: f64,
    pub avg_supply: f64,
    pub energy_satisfaction_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilityMetrics {
    pub current_blackouts: u64,
    pub avg_blackouts: f64,
    pub blackout_ratio_percent: f64,
    pub congestion_ratio_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewableMetrics {
    pub solar_capacity: f64,
    pub solar_ratio_percent: f64,
    pub battery_capacity: f64,
    pub battery_charge: f64,
    pub battery_utilization_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportEconomics {
    pub roi_percent: f64,
    pub profit: f64,
    pub electricity_price: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentalMetrics {
    pub current_temperature: f64,
    pub current_weather: String,
    pub current_pm_level: String,
}

/// Scenario catalog entry from `GET /api/scenarios`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioInfo {
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

/// Response of `POST /api/load_scenario`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadScenarioResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// One consistent view of nodes, edges and economics at one instant
///
/// Immutable once built: the store shares it behind an `Arc` and replaces it
/// wholesale. Buildings are indexed by id at construction; on duplicate ids
/// the first occurrence wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    buildings: Vec<Building>,
    power_lines: Vec<PowerLine>,
    economics: EconomicSnapshot,
    index: HashMap<BuildingId, usize>,
}

impl Snapshot {
    pub fn new(
        buildings: Vec<Building>,
        power_lines: Vec<PowerLine>,
        economics: EconomicSnapshot,
    ) -> Self {
        let mut index = HashMap::with_capacity(buildings.len());
        for (pos, building) in buildings.iter().enumerate() {
            index.entry(building.id).or_insert(pos);
        }

        Self {
            buildings,
            power_lines,
            economics,
            index,
        }
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn power_lines(&self) -> &[PowerLine] {
        &self.power_lines
    }

    pub fn economics(&self) -> &EconomicSnapshot {
        &self.economics
    }

    /// Look up a building by id, removed or not
    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.index.get(&id).map(|&pos| &self.buildings[pos])
    }

    /// Resolve both endpoints of a line
    ///
    /// Returns `None` when the line itself is removed or either endpoint is
    /// absent or removed. Such lines are not drawable.
    pub fn resolve_line(&self, line: &PowerLine) -> Option<(&Building, &Building)> {
        if line.removed {
            return None;
        }
        let from = self.building(line.u).filter(|b| !b.removed)?;
        let to = self.building(line.v).filter(|b| !b.removed)?;
        Some((from, to))
    }

    /// Buildings that are still part of the grid
    pub fn active_buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter().filter(|b| !b.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building(id: BuildingId) -> Building {
        Building {
            id,
            ..Default::default()
        }
    }

    #[test]
    fn test_building_deserializes_simulator_payload() {
        let json = r#"{
            "id": 7, "x": 12.5, "y": -3.0, "type": "factory",
            "supply": -4.2, "base_supply": -4.0, "solar_capacity": 0.0,
            "removed": false, "blackout": true, "is_prosumer": false,
            "battery_capacity": 10.0, "battery_charge": 2.5
        }"#;
        let b: Building = serde_json::from_str(json).unwrap();
        assert_eq!(b.id, 7);
        assert_eq!(b.kind.as_deref(), Some("factory"));
        assert!(b.blackout);
        assert_eq!(b.battery_charge, 2.5);
        assert_eq!(b.base_supply, Some(-4.0));
    }

    #[test]
    fn test_building_missing_fields_default() {
        let b: Building = serde_json::from_str(r#"{"id": 3, "x": 1, "y": 2}"#).unwrap();
        assert!(!b.removed);
        assert!(!b.is_prosumer);
        assert_eq!(b.supply, 0.0);
        assert_eq!(b.kind, None);
    }

    #[test]
    fn test_economics_message_only() {
        let e: EconomicSnapshot =
            serde_json::from_str(r#"{"message": "economic model disabled"}"#).unwrap();
        assert_eq!(e.message.as_deref(), Some("economic model disabled"));
        assert!(e.metrics().is_empty());
    }

    #[test]
    fn test_economics_metrics_order() {
        let e: EconomicSnapshot =
            serde_json::from_str(r#"{"electricity_price": 0.12, "profit": 40.0}"#).unwrap();
        assert_eq!(e.metrics(), vec![("Price", 0.12), ("Profit", 40.0)]);
    }

    #[test]
    fn test_status_update_ignores_unknown_fields() {
        let json = r#"{
            "time": "2025-06-01T12:00:00", "demand": 10.0, "supply": 12.0,
            "flow": 3.5, "blackout_count": 1, "weather": "Sunny",
            "temperature": 24.3, "money": 900.0, "budget": 1000.0,
            "event_count": 2, "running": true, "speed": 2.0, "extra": 1
        }"#;
        let s: StatusUpdate = serde_json::from_str(json).unwrap();
        assert!(s.running);
        assert_eq!(s.speed, Some(2.0));
        assert_eq!(s.blackout_count, 1);
    }

    #[test]
    fn test_weather_report_payload() {
        let json = r#"{"weather": "Rainy", "temperature": 14.2, "humidity": 87.5, "pm_level": "moderate"}"#;
        let w: WeatherReport = serde_json::from_str(json).unwrap();
        assert_eq!(w.weather, "Rainy");
        assert_eq!(w.humidity, 87.5);
        assert_eq!(w.pm_level, "moderate");
    }

    #[test]
    fn test_simulation_report_payload() {
        let json = r#"{
            "simulation_period": {"start": "2025-06-01T00:00:00", "end": "2025-06-01T06:00:00", "duration_hours": 6.0},
            "energy_metrics": {"current_demand": 40.0, "current_supply": 38.0, "current_flow": 36.0,
                               "avg_demand": 35.5, "avg_supply": 37.0, "energy_satisfaction_percent": 90.0},
            "reliability_metrics": {"current_blackouts": 2, "avg_blackouts": 1.5,
                                    "blackout_ratio_percent": 10.0, "congestion_ratio_percent": 25.0},
            "renewable_metrics": {"solar_capacity": 12.0, "solar_ratio_percent": 31.6,
                                  "battery_capacity": 50.0, "battery_charge": 20.0, "battery_utilization_percent": 40.0},
            "economic_metrics": {"roi_percent": 3.2, "profit": 120.0, "electricity_price": 0.15},
            "environmental_metrics": {"current_temperature": 27.0, "current_weather": "Sunny", "current_pm_level": "good"}
        }"#;
        let r: SimulationReport = serde_json::from_str(json).unwrap();
        assert!(r.error.is_none());
        assert_eq!(r.simulation_period.unwrap().duration_hours, 6.0);
        assert_eq!(r.reliability_metrics.unwrap().current_blackouts, 2);
        assert_eq!(r.environmental_metrics.unwrap().current_pm_level, "good");
    }

    #[test]
    fn test_simulation_report_without_data() {
        let r: SimulationReport =
            serde_json::from_str(r#"{"error": "no data points yet"}"#).unwrap();
        assert_eq!(r.error.as_deref(), Some("no data points yet"));
        assert!(r.energy_metrics.is_none());
    }

    #[test]
    fn test_resolve_line_skips_missing_and_removed() {
        let mut removed = building(2);
        removed.removed = true;
        let snapshot = Snapshot::new(
            vec![building(1), removed, building(3)],
            vec![
                PowerLine { u: 1, v: 3, capacity: 1.0, ..Default::default() },
                PowerLine { u: 1, v: 2, capacity: 1.0, ..Default::default() },
                PowerLine { u: 1, v: 99, capacity: 1.0, ..Default::default() },
                PowerLine { u: 3, v: 1, capacity: 1.0, removed: true, ..Default::default() },
            ],
            EconomicSnapshot::default(),
        );

        let lines = snapshot.power_lines();
        assert!(snapshot.resolve_line(&lines[0]).is_some());
        assert!(snapshot.resolve_line(&lines[1]).is_none());
        assert!(snapshot.resolve_line(&lines[2]).is_none());
        assert!(snapshot.resolve_line(&lines[3]).is_none());
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let mut first = building(5);
        first.x = 1.0;
        let mut second = building(5);
        second.x = 2.0;
        let snapshot = Snapshot::new(vec![first, second], vec![], EconomicSnapshot::default());
        assert_eq!(snapshot.building(5).map(|b| b.x), Some(1.0));
    }
}
