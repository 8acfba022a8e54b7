// Visual encoding policy
//
// Pure functions mapping power line and building state onto visual
// attributes: load buckets, stroke widths, node radii and decorations.
// Colors for the buckets live in the theme module.

use super::{Point, SceneRect};
use crate::model::Building;
use std::f64::consts::PI;

/// Utilization above which a line is overloaded
pub const OVERLOAD_THRESHOLD: f64 = 0.9;

/// Utilization above which a line is under high load
pub const HIGH_LOAD_THRESHOLD: f64 = 0.7;

/// Flow magnitude above which a line carries meaningful power
/// (also the threshold for drawing the direction arrow)
pub const FLOW_EPSILON: f64 = 0.1;

/// Stroke width clamp for power lines
pub const MIN_LINE_WIDTH: f64 = 1.0;
pub const MAX_LINE_WIDTH: f64 = 8.0;

/// Radius clamp for building discs
pub const MIN_NODE_RADIUS: f64 = 8.0;
pub const MAX_NODE_RADIUS: f64 = 20.0;

/// Side length of the direction arrowhead
pub const ARROW_SIZE: f64 = 8.0;

/// Half-angle of the arrowhead (30 degrees)
const ARROW_SPREAD: f64 = PI / 6.0;

/// Solar ring sits this far outside the node rim
pub const SOLAR_RING_MARGIN: f64 = 4.0;
pub const SOLAR_RING_WIDTH: f64 = 2.0;

/// Battery gauge box, drawn this far below the node rim
pub const BATTERY_WIDTH: f64 = 10.0;
pub const BATTERY_HEIGHT: f64 = 6.0;
pub const BATTERY_GAP: f64 = 4.0;

/// Load classification for a power line
///
/// Boundaries are strict: a utilization of exactly 0.9 is `HighLoad`,
/// exactly 0.7 falls through to the flow test, and a flow magnitude of
/// exactly 0.1 is `Negligible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeLoad {
    /// Utilization > 0.9, or undefined utilization (zero/invalid capacity)
    Overloaded,
    /// Utilization > 0.7
    HighLoad,
    /// |flow| > 0.1
    NormalFlow,
    /// Everything else
    Negligible,
}

/// Classification of a building for its fill color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Blackout,
    Generator,
    Prosumer,
    Consumer,
    Neutral,
}

/// Ratio of flow magnitude to rated capacity
///
/// Returns `None` when capacity is not a positive finite number, in which
/// case utilization is undefined.
pub fn utilization(flow: f64, capacity: f64) -> Option<f64> {
    if capacity > 0.0 && capacity.is_finite() {
        Some(flow.abs() / capacity)
    } else {
        None
    }
}

/// Classify a power line into a load bucket, highest severity first
pub fn classify_edge(flow: f64, capacity: f64) -> EdgeLoad {
    let Some(util) = utilization(flow, capacity).filter(|u| !u.is_nan()) else {
        return EdgeLoad::Overloaded;
    };

    if util > OVERLOAD_THRESHOLD {
        EdgeLoad::Overloaded
    } else if util > HIGH_LOAD_THRESHOLD {
        EdgeLoad::HighLoad
    } else if flow.abs() > FLOW_EPSILON {
        EdgeLoad::NormalFlow
    } else {
        EdgeLoad::Negligible
    }
}

/// Stroke width for a power line: `clamp(capacity / 2, 1, 8)`
pub fn edge_width(capacity: f64) -> f64 {
    let width = capacity / 2.0;
    if width.is_nan() {
        MIN_LINE_WIDTH
    } else {
        width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH)
    }
}

/// Whether a direction arrow is drawn for this flow
pub fn has_direction(flow: f64) -> bool {
    flow.abs() > FLOW_EPSILON
}

/// Arrowhead triangle anchored at the midpoint of `from -> to`
///
/// The apex sits on the midpoint and points toward `to` for positive flow,
/// toward `from` for negative flow. Returns `None` when no arrow is drawn.
pub fn arrow_head(from: Point, to: Point, flow: f64) -> Option<[Point; 3]> {
    if !has_direction(flow) {
        return None;
    }

    let angle = (to.y - from.y).atan2(to.x - from.x);
    let mid = from.midpoint(to);
    // Base corners trail behind the apex, on the side the power comes from
    let trail = if flow > 0.0 { -ARROW_SIZE } else { ARROW_SIZE };

    let left = Point::new(
        mid.x + trail * (angle - ARROW_SPREAD).cos(),
        mid.y + trail * (angle - ARROW_SPREAD).sin(),
    );
    let right = Point::new(
        mid.x + trail * (angle + ARROW_SPREAD).cos(),
        mid.y + trail * (angle + ARROW_SPREAD).sin(),
    );

    Some([mid, left, right])
}

/// Classify a building, strict priority:
/// blackout > generator > prosumer > consumer > neutral
///
/// A prosumer with zero supply is caught by the prosumer branch before the
/// consumer/neutral branches.
pub fn classify_node(building: &Building) -> NodeKind {
    if building.blackout {
        NodeKind::Blackout
    } else if building.supply > 0.0 {
        NodeKind::Generator
    } else if building.is_prosumer {
        NodeKind::Prosumer
    } else if building.supply < 0.0 {
        NodeKind::Consumer
    } else {
        NodeKind::Neutral
    }
}

/// Disc radius for a building: `clamp(|supply| * 2 + 8, 8, 20)`
pub fn node_radius(supply: f64) -> f64 {
    let radius = supply.abs() * 2.0 + MIN_NODE_RADIUS;
    if radius.is_nan() {
        MIN_NODE_RADIUS
    } else {
        radius.clamp(MIN_NODE_RADIUS, MAX_NODE_RADIUS)
    }
}

/// Whether the building gets a solar ring
pub fn has_solar(building: &Building) -> bool {
    building.solar_capacity > 0.0
}

/// Battery state of charge clamped into [0, 1]
///
/// Returns `None` when the building has no battery.
pub fn battery_fill_ratio(charge: f64, capacity: f64) -> Option<f64> {
    if capacity.is_nan() || capacity <= 0.0 {
        return None;
    }
    let ratio = charge / capacity;
    Some(if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) })
}

/// Two-segment battery gauge below a building
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryGauge {
    /// Full gauge box (background segment)
    pub frame: SceneRect,
    /// Charged segment, anchored to the bottom of the frame
    pub fill: SceneRect,
}

/// Gauge geometry for a building drawn at `center` with disc `radius`
pub fn battery_gauge(center: Point, radius: f64, building: &Building) -> Option<BatteryGauge> {
    let ratio = battery_fill_ratio(building.battery_charge, building.battery_capacity)?;

    let left = center.x - BATTERY_WIDTH / 2.0;
    let top = center.y + radius + BATTERY_GAP;
    let fill_height = BATTERY_HEIGHT * ratio;

    Some(BatteryGauge {
        frame: SceneRect::new(left, top, BATTERY_WIDTH, BATTERY_HEIGHT),
        fill: SceneRect::new(left, top + BATTERY_HEIGHT - fill_height, BATTERY_WIDTH, fill_height),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node(supply: f64, is_prosumer: bool, blackout: bool) -> Building {
        Building {
            id: 1,
            supply,
            is_prosumer,
            blackout,
            ..Default::default()
        }
    }

    // ============================================================================
    // Edge load buckets
    // ============================================================================

    #[test]
    fn test_classify_edge_buckets() {
        assert_eq!(classify_edge(3.8, 4.0), EdgeLoad::Overloaded);
        assert_eq!(classify_edge(-3.2, 4.0), EdgeLoad::HighLoad);
        assert_eq!(classify_edge(1.0, 4.0), EdgeLoad::NormalFlow);
        assert_eq!(classify_edge(0.05, 4.0), EdgeLoad::Negligible);
    }

    #[test]
    fn test_classify_edge_boundaries_are_strict() {
        // Exactly 0.9 -> high load, not overloaded
        assert_eq!(classify_edge(9.0, 10.0), EdgeLoad::HighLoad);
        // Exactly 0.7 -> falls through to the flow test
        assert_eq!(classify_edge(7.0, 10.0), EdgeLoad::NormalFlow);
        // |flow| exactly 0.1 -> negligible
        assert_eq!(classify_edge(0.1, 10.0), EdgeLoad::Negligible);
        assert_eq!(classify_edge(-0.1, 10.0), EdgeLoad::Negligible);
    }

    #[test]
    fn test_classify_edge_zero_capacity_fails_safe() {
        assert_eq!(classify_edge(0.0, 0.0), EdgeLoad::Overloaded);
        assert_eq!(classify_edge(1.0, -2.0), EdgeLoad::Overloaded);
        assert_eq!(classify_edge(1.0, f64::NAN), EdgeLoad::Overloaded);
        assert_eq!(classify_edge(f64::NAN, 4.0), EdgeLoad::Overloaded);
    }

    #[test]
    fn test_small_capacity_small_flow_is_high_utilization() {
        // Utilization wins over the flow epsilon
        assert_eq!(classify_edge(0.05, 0.05), EdgeLoad::Overloaded);
    }

    // ============================================================================
    // Edge width and arrows
    // ============================================================================

    #[test]
    fn test_edge_width_clamps() {
        assert_eq!(edge_width(0.0), MIN_LINE_WIDTH);
        assert_eq!(edge_width(4.0), 2.0);
        assert_eq!(edge_width(100.0), MAX_LINE_WIDTH);
        assert_eq!(edge_width(f64::NAN), MIN_LINE_WIDTH);
        assert_eq!(edge_width(f64::INFINITY), MAX_LINE_WIDTH);
    }

    #[test]
    fn test_arrow_points_toward_v_for_positive_flow() {
        let from = Point::new(0.0, 0.0);
        let to = Point::new(100.0, 0.0);
        let [apex, left, right] = arrow_head(from, to, 3.8).unwrap();

        assert_eq!(apex, Point::new(50.0, 0.0));
        // Base corners trail behind the apex, toward u
        assert!(left.x < apex.x);
        assert!(right.x < apex.x);
        // Symmetric around the edge
        assert!((left.y + right.y).abs() < 1e-9);
    }

    #[test]
    fn test_arrow_points_toward_u_for_negative_flow() {
        let from = Point::new(0.0, 0.0);
        let to = Point::new(100.0, 0.0);
        let [apex, left, right] = arrow_head(from, to, -1.0).unwrap();

        assert!(left.x > apex.x);
        assert!(right.x > apex.x);
    }

    #[test]
    fn test_arrow_side_length() {
        let from = Point::new(10.0, 10.0);
        let to = Point::new(40.0, 50.0);
        let [apex, left, right] = arrow_head(from, to, 2.0).unwrap();
        assert!((apex.distance(left) - ARROW_SIZE).abs() < 1e-9);
        assert!((apex.distance(right) - ARROW_SIZE).abs() < 1e-9);
    }

    #[test]
    fn test_no_arrow_for_negligible_flow() {
        let from = Point::new(0.0, 0.0);
        let to = Point::new(10.0, 0.0);
        assert!(arrow_head(from, to, 0.1).is_none());
        assert!(arrow_head(from, to, 0.0).is_none());
        assert!(arrow_head(from, to, f64::NAN).is_none());
    }

    // ============================================================================
    // Node classification
    // ============================================================================

    #[test]
    fn test_node_priority() {
        assert_eq!(classify_node(&node(5.0, false, true)), NodeKind::Blackout);
        assert_eq!(classify_node(&node(5.0, true, false)), NodeKind::Generator);
        assert_eq!(classify_node(&node(-5.0, true, false)), NodeKind::Prosumer);
        assert_eq!(classify_node(&node(-5.0, false, false)), NodeKind::Consumer);
        assert_eq!(classify_node(&node(0.0, false, false)), NodeKind::Neutral);
    }

    #[test]
    fn test_zero_supply_prosumer_is_prosumer() {
        assert_eq!(classify_node(&node(0.0, true, false)), NodeKind::Prosumer);
    }

    #[test]
    fn test_node_radius_clamps() {
        assert_eq!(node_radius(0.0), MIN_NODE_RADIUS);
        assert_eq!(node_radius(3.0), 14.0);
        assert_eq!(node_radius(-3.0), 14.0);
        assert_eq!(node_radius(1e12), MAX_NODE_RADIUS);
        assert_eq!(node_radius(f64::NAN), MIN_NODE_RADIUS);
    }

    // ============================================================================
    // Decorations
    // ============================================================================

    #[test]
    fn test_battery_fill_ratio() {
        assert_eq!(battery_fill_ratio(5.0, 10.0), Some(0.5));
        assert_eq!(battery_fill_ratio(15.0, 10.0), Some(1.0));
        assert_eq!(battery_fill_ratio(-1.0, 10.0), Some(0.0));
        assert_eq!(battery_fill_ratio(1.0, 0.0), None);
        assert_eq!(battery_fill_ratio(1.0, f64::NAN), None);
    }

    #[test]
    fn test_battery_gauge_geometry() {
        let mut b = node(0.0, false, false);
        b.battery_capacity = 10.0;
        b.battery_charge = 5.0;

        let gauge = battery_gauge(Point::new(100.0, 100.0), 8.0, &b).unwrap();
        assert_eq!(gauge.frame, SceneRect::new(95.0, 112.0, 10.0, 6.0));
        // Half full: the fill occupies the bottom half of the frame
        assert_eq!(gauge.fill, SceneRect::new(95.0, 115.0, 10.0, 3.0));
    }

    #[test]
    fn test_no_gauge_without_battery() {
        let b = node(0.0, false, false);
        assert!(battery_gauge(Point::new(0.0, 0.0), 8.0, &b).is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Bucket is a pure function of |flow| / capacity and the thresholds
        #[test]
        fn prop_edge_bucket_matches_thresholds(
            flow in -1000.0f64..1000.0,
            capacity in 0.001f64..1000.0,
        ) {
            let util = flow.abs() / capacity;
            let expected = if util > 0.9 {
                EdgeLoad::Overloaded
            } else if util > 0.7 {
                EdgeLoad::HighLoad
            } else if flow.abs() > 0.1 {
                EdgeLoad::NormalFlow
            } else {
                EdgeLoad::Negligible
            };
            prop_assert_eq!(classify_edge(flow, capacity), expected);
            // Sign of flow never changes the bucket
            prop_assert_eq!(classify_edge(-flow, capacity), expected);
        }

        /// Width stays within its clamp and never decreases with capacity
        #[test]
        fn prop_edge_width_monotonic_and_bounded(
            a in -1e9f64..1e9,
            b in -1e9f64..1e9,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (w_lo, w_hi) = (edge_width(lo), edge_width(hi));
            prop_assert!(w_lo <= w_hi);
            prop_assert!((MIN_LINE_WIDTH..=MAX_LINE_WIDTH).contains(&w_lo));
            prop_assert!((MIN_LINE_WIDTH..=MAX_LINE_WIDTH).contains(&w_hi));
        }

        /// Radius stays within its clamp and never decreases with |supply|
        #[test]
        fn prop_node_radius_monotonic_and_bounded(
            a in 0.0f64..1e9,
            b in 0.0f64..1e9,
            negate in any::<bool>(),
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo = if negate { -lo } else { lo };
            let (r_lo, r_hi) = (node_radius(lo), node_radius(hi));
            prop_assert!(r_lo <= r_hi);
            prop_assert!((MIN_NODE_RADIUS..=MAX_NODE_RADIUS).contains(&r_lo));
            prop_assert!((MIN_NODE_RADIUS..=MAX_NODE_RADIUS).contains(&r_hi));
        }

        /// Blackout always wins regardless of supply and prosumer flag
        #[test]
        fn prop_blackout_overrides(
            supply in -100.0f64..100.0,
            is_prosumer in any::<bool>(),
        ) {
            prop_assert_eq!(classify_node(&node(supply, is_prosumer, true)), NodeKind::Blackout);
        }

        /// Without blackout, positive supply is always a generator
        #[test]
        fn prop_generator_beats_prosumer(
            supply in 0.001f64..100.0,
            is_prosumer in any::<bool>(),
        ) {
            prop_assert_eq!(classify_node(&node(supply, is_prosumer, false)), NodeKind::Generator);
        }
    }
}
