//! Recovery-band search: when every direct maneuver is in conflict, finds
//! the smallest relaxation of the detection volume (and, failing that, the
//! soonest time) that opens at least one recovery band (§4.7 "Recovery
//! bands").
//!
//! Grounded on `original_source/Modules/ACCoRD/src/DaidalusIntegerBands.cpp`'s
//! `first_kinematic_green`, generalized into a shrink-the-volume loop per
//! Design Notes: rather than a single recovery detector fixed ahead of time,
//! this searches a geometrically shrinking sequence of cylinder sizes (the
//! `n`-factor) down to the no-conflict-alert NMAC volume, stopping early if
//! `ca_bands` is disabled.

use crate::detector::CylinderDetector;
use crate::kinematics::Dimension;
use crate::parameters::Parameters;
use crate::state::TrafficState;

/// Result of a recovery search: the relaxed detector radius/height that
/// yields at least one green interval, the shrink-factor power `n` it took
/// to get there (§4.6 "Recovery search", `recovery_nfactor_`), and the time
/// at which the recovery band opens (`recovery_time_`, already including
/// `recovery_stability_time`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoveryResult {
    pub horizontal_radius: f64,
    pub vertical_half_height: f64,
    pub recovery_time: f64,
    pub recovery_nfactor: u32,
}

/// Probes cylinders of radii `min_horizontal_recovery * f^n` /
/// `min_vertical_recovery * f^n`, `f = 1 - ca_factor`, `n = 0, 1, 2, ...`,
/// down to the no-alert NMAC floor, returning the first `n` at which some
/// step becomes conflict-free for the rest of the lookahead. `ca_bands ==
/// false` stops after the starting (`n = 0`) volume fails, matching
/// "recovery bands must never search past the no-alert floor when
/// collision-avoidance bands are disabled".
#[allow(clippy::too_many_arguments)]
pub fn search_recovery_volume(
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    tstep: f64,
    max_step: i64,
    dimension: Dimension,
    eps_h: i8,
    eps_v: i8,
) -> Option<RecoveryResult> {
    let floor = CylinderDetector::new(params.horizontal_nmac, params.vertical_nmac);
    let f = 1.0 - params.ca_factor;
    let mut current = CylinderDetector::new(params.min_horizontal_recovery, params.min_vertical_recovery);
    let mut n = 0u32;
    loop {
        if let Some(time) = first_conflict_free_time(params, ownship, traffic, tstep, max_step, dimension, eps_h, eps_v, &current) {
            return Some(RecoveryResult {
                horizontal_radius: current.horizontal_radius,
                vertical_half_height: current.vertical_half_height,
                recovery_time: time + params.recovery_stability_time,
                recovery_nfactor: n,
            });
        }
        if !params.ca_bands || current.horizontal_radius <= floor.horizontal_radius {
            return None;
        }
        let shrunk_h = (current.horizontal_radius * f).max(floor.horizontal_radius);
        let shrunk_v = (current.vertical_half_height * f).max(floor.vertical_half_height);
        if (shrunk_h - current.horizontal_radius).abs() < 1e-6 && (shrunk_v - current.vertical_half_height).abs() < 1e-6 {
            return None;
        }
        current = CylinderDetector::new(shrunk_h, shrunk_v);
        n += 1;
    }
}

/// Ports `first_kinematic_green`: the earliest step, in either trajectory
/// direction, at which stepping there and holding produces no further
/// conflict for the rest of the lookahead, respecting the repulsiveness
/// requirement — horizontal and vertical — once εH/εV are non-zero.
#[allow(clippy::too_many_arguments)]
fn first_conflict_free_time(
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    tstep: f64,
    max_step: i64,
    dimension: Dimension,
    eps_h: i8,
    eps_v: i8,
    det: &CylinderDetector,
) -> Option<f64> {
    for &trajdir in &[true, false] {
        for k in 0..=max_step {
            if eps_h != 0 && !super::integer_bands::repulsive_at(tstep, trajdir, k, params, ownship, traffic, dimension, eps_h) {
                continue;
            }
            if eps_v != 0 && !super::integer_bands::vertical_repulsive_at(tstep, trajdir, k, params, ownship, traffic, dimension, eps_v) {
                continue;
            }
            let tsk = k as f64 * tstep;
            if super::integer_bands::no_cd_future_traj(
                det,
                None,
                0.0,
                params.lookahead_time + tsk,
                trajdir,
                tsk,
                params,
                ownship,
                traffic,
                dimension,
                k,
                false,
            ) {
                return Some(tsk);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vect3;

    fn wide_miss_pair() -> (TrafficState, TrafficState) {
        let ownship = TrafficState {
            id: "ownship".into(),
            s: Vect3::ZERO,
            v: Vect3::new(50.0, 0.0, 0.0),
            alerter_index: Some(1),
            sum: None,
        };
        let traffic = TrafficState {
            id: "traffic".into(),
            s: Vect3::new(0.0, 4000.0, 0.0),
            v: Vect3::new(0.0, -50.0, 0.0),
            alerter_index: Some(1),
            sum: None,
        };
        (ownship, traffic)
    }

    fn head_on_conflict_pair() -> (TrafficState, TrafficState) {
        let ownship = TrafficState {
            id: "ownship".into(),
            s: Vect3::ZERO,
            v: Vect3::new(0.0, 50.0, 0.0),
            alerter_index: Some(1),
            sum: None,
        };
        let traffic = TrafficState {
            id: "traffic".into(),
            s: Vect3::new(0.0, 100.0, 0.0),
            v: Vect3::new(0.0, -50.0, 0.0),
            alerter_index: Some(1),
            sum: None,
        };
        (ownship, traffic)
    }

    #[test]
    fn recovery_search_finds_relief_for_a_wide_miss() {
        let params = Parameters::default();
        let (ownship, traffic) = wide_miss_pair();
        let result = search_recovery_volume(&params, &ownship, &traffic, 2.0, 30, Dimension::HorizontalSpeed, 0, 0);
        assert!(result.is_some(), "a trajectory that never gets close horizontally should recover at the starting volume");
        assert_eq!(result.unwrap().recovery_nfactor, 0, "a clean miss recovers without needing to shrink the volume");
    }

    #[test]
    fn recovery_search_returns_none_when_ca_bands_disabled_and_unresolved() {
        let mut params = Parameters::default();
        params.ca_bands = false;
        let (ownship, traffic) = head_on_conflict_pair();
        // 100m separation is well inside the starting min_horizontal_recovery
        // cylinder on a closing head-on course: the first attempt fails, and
        // with ca_bands off the search must not shrink further.
        let result = search_recovery_volume(&params, &ownship, &traffic, 2.0, 5, Dimension::HorizontalSpeed, 0, 0);
        assert!(result.is_none(), "an unresolved conflict with ca_bands disabled must report no recovery");
    }
}
