//! C7: the alerting engine — walks one traffic aircraft's assigned
//! [`Alerter`] from its most severe level down to its least severe, picking
//! the highest level whose detector currently reports a violation or a
//! within-alerting-time future conflict (§4.8 "Alerting Logic").

use crate::bands::Region;
use crate::detector::{Detector, DetectorRegistry};
use crate::kinematics::Dimension;
use crate::parameters::{AlertThreshold, Alerter, Parameters};
use crate::state::TrafficState;

/// The outcome of one alerting evaluation for one traffic aircraft: the
/// 1-based level number (0 meaning no alert) and the region it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertResult {
    pub level: usize,
    pub region: Region,
}

impl AlertResult {
    pub const NONE: AlertResult = AlertResult { level: 0, region: Region::None };
}

/// Evaluates `alerter` for one ownship/traffic pair at the current instant,
/// returning the most severe level that fires. A level fires if the
/// ownship is already in violation of its detector, if conflict detection
/// finds an entry time within `alerting_time` (or `early_alerting_time` when
/// the hysteresis buffer says an early alert is still pending, per §4.8's
/// early/normal alerting-time distinction), or if the kinematic spread check
/// qualifies it (§4.7).
pub fn evaluate(
    alerter: &Alerter,
    registry: &DetectorRegistry,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    use_early_time: bool,
) -> AlertResult {
    let rel_s = ownship.s.sub(&traffic.s);
    let rel_v = ownship.v.sub(&traffic.v);

    for (i, level) in alerter.levels.iter().enumerate().rev() {
        if level.region == Region::None {
            continue;
        }
        let Some(det) = registry.get(&level.detector) else { continue };
        if fires(det, &rel_s, &rel_v, level, use_early_time) || spread_triggers(det, level, params, ownship, traffic) {
            return AlertResult { level: i + 1, region: level.region };
        }
    }
    AlertResult::NONE
}

fn fires(det: &crate::detector::CylinderDetector, rel_s: &crate::geometry::Vect3, rel_v: &crate::geometry::Vect3, level: &AlertThreshold, use_early_time: bool) -> bool {
    if det.violation(rel_s, rel_v) {
        return true;
    }
    let Some(conflict) = det.conflict_detection(rel_s, rel_v, threshold_time(level, use_early_time)) else {
        return false;
    };
    let at = if use_early_time { level.early_alerting_time } else { level.alerting_time };
    conflict.time_in <= at
}

fn threshold_time(level: &AlertThreshold, use_early_time: bool) -> f64 {
    if use_early_time {
        level.early_alerting_time.max(level.alerting_time)
    } else {
        level.alerting_time
    }
}

/// Looks up the alerter a traffic aircraft is assigned by its 1-based
/// `alerter_index` into [`Parameters::alerters`]; index 0 or out-of-range
/// disables alerting for that aircraft (§3 "alerter_index").
pub fn alerter_for(params: &Parameters, alerter_index: Option<usize>) -> Option<&Alerter> {
    let idx = alerter_index?;
    if idx == 0 {
        return None;
    }
    params.alerters.get(idx - 1)
}

/// True if `region` is at or above [`Parameters::corrective_region`]: the
/// "corrective" threshold at which a resolution advisory (rather than merely
/// a preventive alert) is expected (§4.8).
pub fn is_corrective(params: &Parameters, region: Region) -> bool {
    match (region.severity(), params.corrective_region.severity()) {
        (Some(r), Some(c)) => r >= c,
        _ => false,
    }
}

/// Runs [`evaluate`] across every band dimension's detector spread, the last
/// step before handing the result to hysteresis (§4.8): an alert is spread-
/// qualified if the band around the current value in at least one dimension
/// is narrower than that level's configured spread, signalling the conflict
/// is "close enough" in that dimension to justify alerting even though
/// `evaluate` alone (cylinder violation/conflict only) would not yet fire.
pub fn spread_qualifies(level: &AlertThreshold, dimension: Dimension, distance_from_current: f64) -> bool {
    let spread = match dimension {
        Dimension::Direction => level.spread_hdir,
        Dimension::HorizontalSpeed => level.spread_hs,
        Dimension::VerticalSpeed => level.spread_vs,
        Dimension::Altitude => level.spread_alt,
    };
    spread > 0.0 && distance_from_current.abs() <= spread
}

/// Checks, for each dimension `level` configures a positive spread on,
/// whether nudging the ownship's candidate velocity by up to that spread
/// (in either trajectory direction) already lands on a violating or soon-
/// conflicting course. If so the nudge's distance always falls within the
/// configured spread by construction, so [`spread_qualifies`] only needs to
/// confirm it is non-zero.
fn spread_triggers(det: &crate::detector::CylinderDetector, level: &AlertThreshold, params: &Parameters, ownship: &TrafficState, traffic: &TrafficState) -> bool {
    for (dimension, spread) in [
        (Dimension::Direction, level.spread_hdir),
        (Dimension::HorizontalSpeed, level.spread_hs),
        (Dimension::VerticalSpeed, level.spread_vs),
        (Dimension::Altitude, level.spread_alt),
    ] {
        if spread <= 0.0 {
            continue;
        }
        let step = crate::kinematics::step_size(params, dimension);
        if step <= 0.0 {
            continue;
        }
        let max_step = (spread / step).ceil().max(1.0) as i64;
        for &trajdir in &[true, false] {
            for k in 1..=max_step {
                let (_, v) = crate::kinematics::trajectory(params, ownship, 0.0, dimension, trajdir, k, true);
                let rel_s = ownship.s.sub(&traffic.s);
                let rel_v = v.sub(&traffic.v);
                let distance = k as f64 * step;
                let conflicts = det.violation(&rel_s, &rel_v) || det.conflict_detection(&rel_s, &rel_v, level.alerting_time).is_some();
                if conflicts && spread_qualifies(level, dimension, distance) {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vect3;

    fn alerter_three_levels() -> Alerter {
        let mut a = Alerter::new("test");
        a.levels.push(AlertThreshold::new("cylinder", 60.0, Region::Far));
        a.levels.push(AlertThreshold::new("cylinder", 40.0, Region::Mid));
        a.levels.push(AlertThreshold::new("cylinder", 20.0, Region::Near));
        a
    }

    fn pair_in_violation() -> (TrafficState, TrafficState) {
        let ownship = TrafficState { id: "o".into(), s: Vect3::ZERO, v: Vect3::ZERO, alerter_index: Some(1), sum: None };
        let traffic = TrafficState { id: "i".into(), s: Vect3::new(10.0, 0.0, 0.0), v: Vect3::ZERO, alerter_index: Some(1), sum: None };
        (ownship, traffic)
    }

    #[test]
    fn violation_fires_the_most_severe_level() {
        let alerter = alerter_three_levels();
        let registry = DetectorRegistry::default();
        let params = Parameters::default();
        let (ownship, traffic) = pair_in_violation();
        let result = evaluate(&alerter, &registry, &params, &ownship, &traffic, false);
        assert_eq!(result.level, 3);
        assert_eq!(result.region, Region::Near);
    }

    #[test]
    fn spread_check_fires_without_a_direct_conflict() {
        // Parallel flight 2km apart never violates or converges on its own.
        let registry = DetectorRegistry::default();
        let params = Parameters::default();
        let ownship = TrafficState { id: "o".into(), s: Vect3::ZERO, v: Vect3::new(0.0, 100.0, 0.0), alerter_index: Some(1), sum: None };
        let traffic = TrafficState { id: "i".into(), s: Vect3::new(0.0, 2000.0, 0.0), v: Vect3::new(0.0, 100.0, 0.0), alerter_index: Some(1), sum: None };

        let mut no_spread = Alerter::new("test");
        no_spread.levels.push(AlertThreshold::new("cylinder", 600.0, Region::Far));
        assert_eq!(
            evaluate(&no_spread, &registry, &params, &ownship, &traffic, false),
            AlertResult::NONE,
            "parallel flight with no spread configured should not fire"
        );

        let mut with_spread = Alerter::new("test");
        let mut level = AlertThreshold::new("cylinder", 600.0, Region::Far);
        level.spread_hs = 50.0;
        with_spread.levels.push(level);
        let result = evaluate(&with_spread, &registry, &params, &ownship, &traffic, false);
        assert_eq!(result.level, 1, "a horizontal-speed nudge within spread_hs should still find the closing conflict");
    }

    #[test]
    fn alerter_for_respects_one_based_index_and_zero_disables() {
        let mut params = Parameters::default();
        params.alerters = vec![alerter_three_levels()];
        assert!(alerter_for(&params, Some(1)).is_some());
        assert!(alerter_for(&params, Some(0)).is_none());
        assert!(alerter_for(&params, None).is_none());
    }

    #[test]
    fn is_corrective_compares_against_parameter() {
        let params = Parameters::default(); // corrective_region defaults to Mid
        assert!(!is_corrective(&params, Region::Far));
        assert!(is_corrective(&params, Region::Mid));
        assert!(is_corrective(&params, Region::Near));
    }
}
