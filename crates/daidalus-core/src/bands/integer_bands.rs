//! C5: integer-step band search.
//!
//! Walks the kinematic trajectory in [`Parameters`] step-size increments,
//! classifying each step as in-conflict or clear, and folds consecutive
//! conflicting steps into [`Integerval`] runs. [`real_bands`](super::real_bands)
//! later converts these integer runs into the real-valued, dimension-scaled
//! [`BandsRange`](super::BandsRange)s the façade exposes.
//!
//! Ported, function-for-function, from
//! `original_source/Modules/ACCoRD/src/DaidalusIntegerBands.cpp` (`CD_future_traj`,
//! `no_CD_future_traj`, `LOS_at`, `kinematic_first_los_step`,
//! `kinematic_first_los_search_index`, `kinematic_bands_search_index`,
//! `kinematic_traj_conflict_only_bands`, `kinematic_bands`,
//! `kinematic_repulsive_at`, `kinematic_first_nonrepulsive_step`) — the
//! names below are the idiomatic-Rust equivalents of that file's methods.

use super::Integerval;
use crate::criteria::{is_horizontally_repulsive, is_vertically_repulsive};
use crate::detector::Detector;
use crate::kinematics::{trajectory, Dimension};
use crate::parameters::Parameters;
use crate::state::TrafficState;

/// True if, stepping `target_step` steps in `trajdir` and then projecting
/// forward to `tsk`, the ownship is in conflict with `traffic` at some point
/// in `[max(B, tsk), T]`. `CD_future_traj` in the source.
#[allow(clippy::too_many_arguments)]
fn cd_future_traj(
    det: &dyn Detector,
    b: f64,
    t: f64,
    trajdir: bool,
    tsk: f64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    target_step: i64,
    instantaneous: bool,
) -> bool {
    let t = params.lookahead_time.min(t);
    if tsk > t || b > t {
        return false;
    }
    let (s_ot, v_ot) = trajectory(params, ownship, tsk, dimension, trajdir, target_step, instantaneous);
    let s_at = if tsk == 0.0 { s_ot } else { s_ot.sub(&v_ot.scal(tsk)) };
    let rel_s = s_at.sub(&traffic.s);
    let rel_v = v_ot.sub(&traffic.v);
    det.conflict_detection(&rel_s, &rel_v, t.max(b).max(tsk)).is_some()
}

/// `no_CD_future_traj`: clear under both the primary detector and (if
/// supplied) the wider recovery-volume detector.
#[allow(clippy::too_many_arguments)]
pub fn no_cd_future_traj(
    conflict_det: &dyn Detector,
    recovery_det: Option<&dyn Detector>,
    b: f64,
    t: f64,
    trajdir: bool,
    tsk: f64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    target_step: i64,
    instantaneous: bool,
) -> bool {
    let primary_clear = !cd_future_traj(conflict_det, b, t, trajdir, tsk, params, ownship, traffic, dimension, target_step, instantaneous);
    let recovery_clear = match recovery_det {
        None => true,
        Some(rd) => !cd_future_traj(rd, 0.0, b, trajdir, tsk, params, ownship, traffic, dimension, target_step, instantaneous),
    };
    primary_clear && recovery_clear
}

/// `LOS_at`: true if the ownship, projected to step `tsk`, is already
/// inside the protected volume at that instant (a line-of-sight violation,
/// not merely a future conflict).
#[allow(clippy::too_many_arguments)]
fn los_at(
    det: &dyn Detector,
    trajdir: bool,
    tsk: f64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    target_step: i64,
    instantaneous: bool,
) -> bool {
    if tsk >= params.lookahead_time {
        return false;
    }
    let (s_ot, v_ot) = trajectory(params, ownship, tsk, dimension, trajdir, target_step, instantaneous);
    let s_at = s_ot.sub(&v_ot.scal(tsk));
    let rel_s = s_at.sub(&traffic.s);
    let rel_v = v_ot.sub(&traffic.v);
    det.violation(&rel_s, &rel_v)
}

/// `kinematic_first_los_step`: first step index in `[min, max]` with a LOS
/// violation, or `-1` if none.
#[allow(clippy::too_many_arguments)]
fn first_los_step(
    det: &dyn Detector,
    tstep: f64,
    trajdir: bool,
    min: i64,
    max: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
) -> i64 {
    for k in min..=max {
        if los_at(det, trajdir, k as f64 * tstep, params, ownship, traffic, dimension, 0, false) {
            return k;
        }
    }
    -1
}

/// `kinematic_first_los_search_index`: the earliest step at which either the
/// primary or recovery detector reports LOS, within the windows each is
/// relevant for.
#[allow(clippy::too_many_arguments)]
pub fn first_los_search_index(
    conflict_det: &dyn Detector,
    recovery_det: Option<&dyn Detector>,
    tstep: f64,
    b: f64,
    trajdir: bool,
    max: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
) -> i64 {
    let first_los_k = (b / tstep).ceil() as i64;
    let first_los_n = ((params.lookahead_time / tstep).floor() as i64).min(max);
    let first_los_n2 = ((b / tstep).floor() as i64).min(max);
    let first_los_init = match recovery_det {
        Some(rd) => first_los_step(rd, tstep, trajdir, 0, first_los_n2, params, ownship, traffic, dimension),
        None => -1,
    };
    let first_los = first_los_step(conflict_det, tstep, trajdir, first_los_k, first_los_n, params, ownship, traffic, dimension);
    let los_init_index = if first_los_init < 0 { max + 1 } else { first_los_init };
    let los_index = if first_los < 0 { max + 1 } else { first_los };
    los_init_index.min(los_index)
}

/// The ground velocity at step `k`, used by the repulsiveness checks to
/// compare consecutive steps' velocity vectors (`kinematic_linvel`).
fn step_velocity(params: &Parameters, ownship: &TrafficState, tstep: f64, trajdir: bool, dimension: Dimension, k: i64) -> crate::geometry::Vect2 {
    trajectory(params, ownship, k as f64 * tstep, dimension, trajdir, k, false).1.vect2()
}

/// Vertical analogue of [`step_velocity`]: the vertical speed at step `k`.
fn step_velocity_z(params: &Parameters, ownship: &TrafficState, tstep: f64, trajdir: bool, dimension: Dimension, k: i64) -> f64 {
    trajectory(params, ownship, k as f64 * tstep, dimension, trajdir, k, false).1.z
}

/// `kinematic_repulsive_at`: whether step `k`'s velocity keeps the ownship
/// on its assigned εH side of the conflict, consistently across the step
/// before, at, and after `k` (the source checks three consecutive velocity
/// pairs to rule out "repulsive for an instant then back" false positives).
#[allow(clippy::too_many_arguments)]
pub fn repulsive_at(
    tstep: f64,
    trajdir: bool,
    k: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    eps_h: i8,
) -> bool {
    if k == 0 {
        return true;
    }
    let (s0, _) = trajectory(params, ownship, 0.0, dimension, trajdir, 0, false);
    let s_rel0 = s0.vect2().sub(&traffic.s.vect2());
    let vi = traffic.v.vect2();

    if k == 1 {
        let v_prev = step_velocity(params, ownship, tstep, trajdir, dimension, 0);
        if !is_horizontally_repulsive(s_rel0, vi, v_prev, v_prev, eps_h) {
            return false;
        }
    }

    let (s_k, v_k) = trajectory(params, ownship, k as f64 * tstep, dimension, trajdir, k, false);
    let s_i_at_k = traffic.s.vect2().scal_add(k as f64 * tstep, &vi);
    let s_rel_k = s_k.vect2().sub(&s_i_at_k);
    let v_prev = step_velocity(params, ownship, tstep, trajdir, dimension, k - 1);
    let v_cur = v_k.vect2();
    let v_next_ref = v_cur;

    is_horizontally_repulsive(s_rel_k, vi, v_prev, v_cur, eps_h)
        && is_horizontally_repulsive(s_rel_k, vi, v_cur, v_next_ref, eps_h)
        && is_horizontally_repulsive(s_rel_k, vi, v_prev, v_next_ref, eps_h)
}

/// `kinematic_first_nonrepulsive_step`: first step in `[0, max]` that fails
/// [`repulsive_at`], or `-1` if every step up to `max` is repulsive.
#[allow(clippy::too_many_arguments)]
pub fn first_nonrepulsive_step(
    tstep: f64,
    trajdir: bool,
    max: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    eps_h: i8,
) -> i64 {
    for k in 0..=max {
        if !repulsive_at(tstep, trajdir, k, params, ownship, traffic, dimension, eps_h) {
            return k;
        }
    }
    -1
}

/// Vertical analogue of [`repulsive_at`]: checks the same three consecutive
/// velocity pairs, but on the vertical component and against εV, so the
/// search also stops at the point a trajectory stops climbing/descending
/// away from the intruder ("both horizontal and vertical senses", §4.5).
#[allow(clippy::too_many_arguments)]
pub fn vertical_repulsive_at(
    tstep: f64,
    trajdir: bool,
    k: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    eps_v: i8,
) -> bool {
    if k == 0 {
        return true;
    }
    let (s0, _) = trajectory(params, ownship, 0.0, dimension, trajdir, 0, false);
    let rel_z0 = s0.z - traffic.s.z;
    let vi_z = traffic.v.z;

    if k == 1 {
        let v_prev = step_velocity_z(params, ownship, tstep, trajdir, dimension, 0);
        if !is_vertically_repulsive(rel_z0, vi_z, v_prev, v_prev, eps_v) {
            return false;
        }
    }

    let (s_k, v_k) = trajectory(params, ownship, k as f64 * tstep, dimension, trajdir, k, false);
    let z_i_at_k = traffic.s.z + k as f64 * tstep * vi_z;
    let rel_z_k = s_k.z - z_i_at_k;
    let v_prev = step_velocity_z(params, ownship, tstep, trajdir, dimension, k - 1);
    let v_cur = v_k.z;
    let v_next_ref = v_cur;

    is_vertically_repulsive(rel_z_k, vi_z, v_prev, v_cur, eps_v)
        && is_vertically_repulsive(rel_z_k, vi_z, v_cur, v_next_ref, eps_v)
        && is_vertically_repulsive(rel_z_k, vi_z, v_prev, v_next_ref, eps_v)
}

/// `kinematic_first_nonrepulsive_step`'s vertical counterpart: first step in
/// `[0, max]` that fails [`vertical_repulsive_at`], or `-1` if none do.
#[allow(clippy::too_many_arguments)]
pub fn first_nonvertical_repulsive_step(
    tstep: f64,
    trajdir: bool,
    max: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    eps_v: i8,
) -> i64 {
    for k in 0..=max {
        if !vertical_repulsive_at(tstep, trajdir, k, params, ownship, traffic, dimension, eps_v) {
            return k;
        }
    }
    -1
}

/// `kinematic_bands_search_index`: the step past which the search need not
/// continue, because either a LOS violation or (when criteria apply) a loss
/// of repulsiveness, horizontal or vertical, occurred.
#[allow(clippy::too_many_arguments)]
pub fn bands_search_index(
    conflict_det: &dyn Detector,
    recovery_det: Option<&dyn Detector>,
    tstep: f64,
    b: f64,
    trajdir: bool,
    max: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    eps_h: i8,
    eps_v: i8,
) -> i64 {
    let use_h_crit = eps_h != 0;
    let use_v_crit = eps_v != 0;
    let first_los = first_los_search_index(conflict_det, recovery_det, tstep, b, trajdir, max, params, ownship, traffic, dimension);
    let first_non_rep_h = if !use_h_crit || first_los == 0 {
        first_los
    } else {
        first_nonrepulsive_step(tstep, trajdir, first_los - 1, params, ownship, traffic, dimension, eps_h)
    };
    let first_non_rep_v = if !use_v_crit || first_los == 0 {
        first_los
    } else {
        first_nonvertical_repulsive_step(tstep, trajdir, first_los - 1, params, ownship, traffic, dimension, eps_v)
    };
    let first_prob_crit_h = if first_non_rep_h < 0 { max + 1 } else { first_non_rep_h };
    let first_prob_crit_v = if first_non_rep_v < 0 { max + 1 } else { first_non_rep_v };
    first_los.min(first_prob_crit_h).min(first_prob_crit_v)
}

/// `kinematic_traj_conflict_only_bands`: folds per-step conflict
/// classification into a run-length list of [`Integerval`]s.
#[allow(clippy::too_many_arguments)]
pub fn traj_conflict_only_bands(
    conflict_det: &dyn Detector,
    recovery_det: Option<&dyn Detector>,
    tstep: f64,
    b: f64,
    t: f64,
    trajdir: bool,
    max: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
) -> Vec<Integerval> {
    let mut out = Vec::new();
    let mut run_start: Option<i64> = None;
    for k in 0..=max {
        let tsk = tstep * k as f64;
        let clear = no_cd_future_traj(conflict_det, recovery_det, b, t + tsk, trajdir, tsk, params, ownship, traffic, dimension, 0, false);
        match (run_start, clear) {
            (Some(_), true) => continue,
            (Some(d), false) => {
                out.push(Integerval::new(d, k - 1));
                run_start = None;
            }
            (None, true) => run_start = Some(k),
            (None, false) => {}
        }
    }
    if let Some(d) = run_start {
        if d != max {
            out.push(Integerval::new(d, max));
        }
    }
    out
}

/// `kinematic_bands`: the top-level entry point — finds the search boundary
/// and, if it's past step 0, folds the conflict-free runs within it.
#[allow(clippy::too_many_arguments)]
pub fn kinematic_bands(
    conflict_det: &dyn Detector,
    recovery_det: Option<&dyn Detector>,
    tstep: f64,
    b: f64,
    t: f64,
    trajdir: bool,
    max: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    eps_h: i8,
    eps_v: i8,
) -> Vec<Integerval> {
    let bsi = bands_search_index(conflict_det, recovery_det, tstep, b, trajdir, max, params, ownship, traffic, dimension, eps_h, eps_v);
    if bsi == 0 {
        Vec::new()
    } else {
        traj_conflict_only_bands(conflict_det, recovery_det, tstep, b, t, trajdir, bsi - 1, params, ownship, traffic, dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::CylinderDetector;
    use crate::geometry::Vect3;

    fn traffic_head_on() -> (TrafficState, TrafficState) {
        let ownship = TrafficState {
            id: "ownship".into(),
            s: Vect3::ZERO,
            v: Vect3::new(0.0, 50.0, 0.0),
            alerter_index: Some(1),
            sum: None,
        };
        let traffic = TrafficState {
            id: "traffic".into(),
            s: Vect3::new(0.0, 5000.0, 0.0),
            v: Vect3::new(0.0, -50.0, 0.0),
            alerter_index: Some(1),
            sum: None,
        };
        (ownship, traffic)
    }

    #[test]
    fn bands_report_conflict_on_unchanged_head_on_course() {
        let params = Parameters::default();
        let det = CylinderDetector::new(150.0, 150.0);
        let (ownship, traffic) = traffic_head_on();
        // target_step 0 holds the current heading: the pair stays on its
        // head-on course and must cross the cylinder, so the conflict-only
        // search should report at least one run.
        let bands = kinematic_bands(
            &det,
            None,
            1.0,
            0.0,
            100.0,
            true,
            50,
            &params,
            &ownship,
            &traffic,
            Dimension::Direction,
            0,
            0,
        );
        assert!(!bands.is_empty(), "an unchanged head-on course should remain in conflict: {bands:?}");
    }

    #[test]
    fn traj_conflict_only_bands_folds_consecutive_conflicts() {
        let params = Parameters::default();
        let det = CylinderDetector::new(2000.0, 150.0);
        let (ownship, traffic) = traffic_head_on();
        let bands = traj_conflict_only_bands(&det, None, 1.0, 0.0, 100.0, true, 50, &params, &ownship, &traffic, Dimension::HorizontalSpeed);
        assert!(!bands.is_empty(), "a wide cylinder on a head-on pair should show at least one conflicting run");
    }
}
