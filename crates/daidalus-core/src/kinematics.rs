//! C4: the kinematic trajectory projector.
//!
//! Given the ownship's current position/velocity and a candidate dimension
//! (direction, horizontal speed, vertical speed, or altitude) plus a signed
//! step count, produces the projected position/velocity at a future time
//! `t`, under either an "instantaneous" model (velocity changes
//! discontinuously) or a "kinematic" one (bounded turn rate / acceleration
//! ramps the velocity to its target before holding it).
//!
//! Grounded on `original_source/Modules/ACCoRD/src/DaidalusIntegerBands.cpp`
//! (`trajectory`, `kinematic_linvel`) for the overall shape: a single
//! `trajectory(params, ownship, t, trajdir, target_step, instantaneous)`
//! entry point that every other C4/C5 routine calls.

use crate::geometry::{to_2pi_rad, Vect2, Vect3};
use crate::parameters::Parameters;
use crate::state::TrafficState;

/// Which control dimension a kinematic step operates on (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Direction,
    HorizontalSpeed,
    VerticalSpeed,
    Altitude,
}

/// The projected ownship position and ground velocity at time `t` along a
/// constant-direction-of-change trajectory in the given `dimension`.
///
/// `trajdir` selects increasing (`true`) or decreasing (`false`) direction of
/// change; `target_step` is the number of [`Parameters`] step sizes already
/// applied (used by repulsiveness checks that need the velocity at two
/// consecutive steps); `instantaneous` switches between the two models.
pub fn trajectory(
    params: &Parameters,
    ownship: &TrafficState,
    t: f64,
    dimension: Dimension,
    trajdir: bool,
    target_step: i64,
    instantaneous: bool,
) -> (Vect3, Vect3) {
    let v0 = ownship.v;
    let target_v = target_velocity(params, v0, dimension, trajdir, target_step);
    let v_at_t = if instantaneous {
        target_v
    } else {
        kinematic_velocity_at(params, v0, target_v, dimension, t, target_step, trajdir)
    };
    let s_at_t = if instantaneous {
        // Instantaneous mode: velocity jumps immediately, so position moves
        // along the target velocity for the whole interval.
        ownship.s.add(&target_v.scal(t))
    } else {
        integrate_position(params, v0, target_v, dimension, t, target_step, trajdir)
    };
    (s_at_t, v_at_t)
}

/// The configured step size for one dimension (§3 Parameter Block).
pub fn step_size(params: &Parameters, dimension: Dimension) -> f64 {
    match dimension {
        Dimension::Direction => params.step_hdir,
        Dimension::HorizontalSpeed => params.step_hs,
        Dimension::VerticalSpeed => params.step_vs,
        Dimension::Altitude => params.step_alt,
    }
}

/// The velocity the aircraft is steering toward: `target_step` applications
/// of one [`Parameters`] step in `dimension`, signed by `trajdir`.
fn target_velocity(params: &Parameters, v0: Vect3, dimension: Dimension, trajdir: bool, target_step: i64) -> Vect3 {
    let sign = if trajdir { 1.0 } else { -1.0 };
    let n = target_step as f64;
    match dimension {
        Dimension::Direction => {
            let gs = v0.vect2().norm();
            let trk = v0.vect2().track_rad();
            let new_trk = to_2pi_rad(trk + sign * n * params.step_hdir);
            Vect3::new(gs * new_trk.sin(), gs * new_trk.cos(), v0.z)
        }
        Dimension::HorizontalSpeed => {
            let gs = (v0.vect2().norm() + sign * n * params.step_hs).max(0.0);
            let trk = v0.vect2().track_rad();
            Vect3::new(gs * trk.sin(), gs * trk.cos(), v0.z)
        }
        Dimension::VerticalSpeed => {
            let vz = v0.z + sign * n * params.step_vs;
            Vect3::new(v0.x, v0.y, vz)
        }
        Dimension::Altitude => {
            if target_step == 0 {
                v0
            } else {
                Vect3::new(v0.x, v0.y, sign * params.vertical_rate)
            }
        }
    }
}

/// Ramps from `v0` to `target` at the acceleration/turn-rate bound for
/// `dimension`, holding `target` once reached. Altitude is a climb/descend
/// trapezoid keyed to the displacement `target_step` steps represent rather
/// than a held vertical speed, so it reads `target_step`/`trajdir` directly
/// instead of `target` (see [`altitude_profile`]).
#[allow(clippy::too_many_arguments)]
fn kinematic_velocity_at(params: &Parameters, v0: Vect3, target: Vect3, dimension: Dimension, t: f64, target_step: i64, trajdir: bool) -> Vect3 {
    match dimension {
        Dimension::Direction => {
            let gs = v0.vect2().norm();
            let trk0 = v0.vect2().track_rad();
            let trk1 = target.vect2().track_rad();
            let delta = crate::geometry::circular_distance(trk0, trk1);
            let max_turn = params.turn_rate * t;
            let turned = delta.signum() * delta.abs().min(max_turn.abs());
            let trk_t = to_2pi_rad(trk0 + turned);
            Vect3::new(gs * trk_t.sin(), gs * trk_t.cos(), v0.z)
        }
        Dimension::HorizontalSpeed => {
            let gs0 = v0.vect2().norm();
            let gs1 = target.vect2().norm();
            let max_delta = params.horizontal_accel * t;
            let delta = gs1 - gs0;
            let gs_t = gs0 + delta.signum() * delta.abs().min(max_delta.abs());
            let trk = v0.vect2().track_rad();
            Vect3::new(gs_t * trk.sin(), gs_t * trk.cos(), v0.z)
        }
        Dimension::VerticalSpeed => {
            let max_delta = params.vertical_accel * t;
            let delta = target.z - v0.z;
            let vz_t = v0.z + delta.signum() * delta.abs().min(max_delta.abs());
            Vect3::new(v0.x, v0.y, vz_t)
        }
        Dimension::Altitude => {
            let sign = if trajdir { 1.0 } else { -1.0 };
            let target_dz = sign * target_step as f64 * params.step_alt;
            let (_, vz) = altitude_profile(target_dz, params.vertical_rate, params.vertical_accel, t);
            Vect3::new(v0.x, v0.y, vz)
        }
    }
}

/// Position at time `t`, integrating the velocity ramp exactly for the
/// constant-acceleration segment and at the (now-reached) target velocity
/// afterward.
#[allow(clippy::too_many_arguments)]
fn integrate_position(params: &Parameters, v0: Vect3, target: Vect3, dimension: Dimension, t: f64, target_step: i64, trajdir: bool) -> Vect3 {
    match dimension {
        Dimension::Direction => {
            // Constant ground speed, turning at a bounded rate: integrate the
            // heading numerically with a handful of sub-steps, which is exact
            // in the limit and accurate to well under a meter for the turn
            // rates DAIDALUS uses.
            let gs = v0.vect2().norm();
            let trk0 = v0.vect2().track_rad();
            let trk1 = target.vect2().track_rad();
            let delta = crate::geometry::circular_distance(trk0, trk1);
            let time_to_target = (delta.abs() / params.turn_rate.max(1e-9)).min(t);
            let steps = 32usize;
            let dt = time_to_target / steps as f64;
            let mut pos = Vect2::ZERO;
            let mut trk = trk0;
            let turn_dir = delta.signum();
            for _ in 0..steps {
                let v = Vect2::new(gs * trk.sin(), gs * trk.cos());
                pos = pos.scal_add(dt, &v);
                trk = to_2pi_rad(trk + turn_dir * params.turn_rate * dt);
            }
            let remaining = (t - time_to_target).max(0.0);
            if remaining > 0.0 {
                let v_final = Vect2::new(gs * trk1.sin(), gs * trk1.cos());
                pos = pos.scal_add(remaining, &v_final);
            }
            Vect3::with_vect2(pos, v0.z * t)
        }
        Dimension::HorizontalSpeed => {
            let gs0 = v0.vect2().norm();
            let gs1 = target.vect2().norm();
            let trk = v0.vect2().track_rad();
            let time_to_target = ((gs1 - gs0).abs() / params.horizontal_accel.max(1e-9)).min(t);
            let avg_gs = (gs0 + gs_at(gs0, gs1, params.horizontal_accel, time_to_target)) / 2.0;
            let dist_ramp = avg_gs * time_to_target;
            let remaining = (t - time_to_target).max(0.0);
            let dist_total = dist_ramp + gs1 * remaining;
            Vect3::new(dist_total * trk.sin(), dist_total * trk.cos(), v0.z * t)
        }
        Dimension::VerticalSpeed => {
            let time_to_target = ((target.z - v0.z).abs() / params.vertical_accel.max(1e-9)).min(t);
            let avg_vz = (v0.z + vz_at(v0.z, target.z, params.vertical_accel, time_to_target)) / 2.0;
            let remaining = (t - time_to_target).max(0.0);
            let dz = avg_vz * time_to_target + target.z * remaining;
            Vect3::new(v0.x * t, v0.y * t, dz)
        }
        Dimension::Altitude => {
            let sign = if trajdir { 1.0 } else { -1.0 };
            let target_dz = sign * target_step as f64 * params.step_alt;
            let (dz, _) = altitude_profile(target_dz, params.vertical_rate, params.vertical_accel, t);
            Vect3::new(v0.x * t, v0.y * t, dz)
        }
    }
}

fn gs_at(gs0: f64, gs1: f64, accel: f64, t: f64) -> f64 {
    let delta = gs1 - gs0;
    gs0 + delta.signum() * (accel * t).min(delta.abs())
}

fn vz_at(vz0: f64, vz1: f64, accel: f64, t: f64) -> f64 {
    let delta = vz1 - vz0;
    vz0 + delta.signum() * (accel * t).min(delta.abs())
}

/// Climb/descend profile for [`Dimension::Altitude`]: a bounded-acceleration
/// trapezoid (or, when `target_dz` is too short to reach cruise, a triangle)
/// that accelerates away from level flight toward `vertical_rate`, holds it,
/// and decelerates back to level exactly as the aircraft reaches
/// `target_dz`. Assumes the aircraft starts level (`vz(0) = 0`), which holds
/// for every caller in this crate (altitude steps are always evaluated from
/// the ownship's current, already-settled vertical speed).
fn altitude_profile(target_dz: f64, vertical_rate: f64, accel: f64, t: f64) -> (f64, f64) {
    if target_dz == 0.0 || vertical_rate <= 0.0 || accel <= 0.0 || t <= 0.0 {
        return (0.0, 0.0);
    }
    let sign = target_dz.signum();
    let dist = target_dz.abs();
    let d_ramp = vertical_rate * vertical_rate / accel;
    let (t_acc, t_cruise, vpeak) = if d_ramp <= dist {
        let t_acc = vertical_rate / accel;
        let d_acc = 0.5 * vertical_rate * t_acc;
        let t_cruise = (dist - 2.0 * d_acc) / vertical_rate;
        (t_acc, t_cruise, vertical_rate)
    } else {
        let vpeak = (accel * dist).sqrt();
        (vpeak / accel, 0.0, vpeak)
    };

    if t >= t_acc + t_cruise + t_acc {
        return (sign * dist, 0.0);
    }
    if t <= t_acc {
        return (sign * 0.5 * accel * t * t, sign * accel * t);
    }
    let d_acc = 0.5 * accel * t_acc * t_acc;
    if t <= t_acc + t_cruise {
        let t_in_cruise = t - t_acc;
        return (sign * (d_acc + vpeak * t_in_cruise), sign * vpeak);
    }
    let t_in_decel = t - t_acc - t_cruise;
    let d_cruise = vpeak * t_cruise;
    let d = d_acc + d_cruise + vpeak * t_in_decel - 0.5 * accel * t_in_decel * t_in_decel;
    let v = vpeak - accel * t_in_decel;
    (sign * d, sign * v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn straight_ownship() -> TrafficState {
        TrafficState {
            id: "ownship".to_string(),
            s: Vect3::ZERO,
            v: Vect3::new(0.0, 100.0, 0.0),
            alerter_index: Some(1),
            sum: None,
        }
    }

    #[test]
    fn instantaneous_direction_change_jumps_immediately() {
        let params = Parameters::default();
        let own = straight_ownship();
        let (_, v) = trajectory(&params, &own, 1.0, Dimension::Direction, true, 10, true);
        assert!((v.vect2().track_rad() - own.v.vect2().track_rad()).abs() > 1e-6);
    }

    #[test]
    fn kinematic_speed_change_is_bounded_by_accel() {
        let mut params = Parameters::default();
        params.horizontal_accel = 1.0;
        let own = straight_ownship();
        let (_, v) = trajectory(&params, &own, 1.0, Dimension::HorizontalSpeed, true, 1000, false);
        // after 1s at 1 m/s^2 the speed can change by at most 1 m/s
        assert!((v.vect2().norm() - own.v.vect2().norm()).abs() <= 1.0 + 1e-9);
    }

    #[test]
    fn zero_time_trajectory_returns_current_state() {
        let params = Parameters::default();
        let own = straight_ownship();
        let (s, v) = trajectory(&params, &own, 0.0, Dimension::VerticalSpeed, true, 1, false);
        assert_relative_eq!(s.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(s.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(v.x, own.v.x);
        assert_relative_eq!(v.y, own.v.y);
    }
}
