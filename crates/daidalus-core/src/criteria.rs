//! C3: implicit horizontal/vertical coordination criteria (εH/εV).
//!
//! Two aircraft that can each see the other's state but cannot negotiate a
//! maneuver still need to resolve a conflict without colliding. Implicit
//! coordination works by having both sides evaluate the same deterministic
//! sign function of the relative geometry and agree, without communication,
//! on which side of the conflict each one takes.
//!
//! Grounded on `original_source/C++/include/CriteriaCore.h`
//! (`horizontalCoordination`, `verticalCoordination`, `criteria`) for the
//! shape of the API; the sign conventions follow the ACCoRD documentation
//! comments in that header (Design Notes / Open Question (b) covers the
//! tie-break needed when the geometry is exactly symmetric).

use crate::geometry::Vect2;

/// The horizontal coordination sign: positive if the ownship passes in front
/// of (to the right of, given `v`'s heading) the intruder's relative
/// position, negative otherwise. Exactly 0 only when `s` and `v` are
/// parallel or `s` is the origin — see [`horizontal_coordination_tiebreak`].
pub fn horizontal_coordination(s: Vect2, v: Vect2) -> i8 {
    sign(s.det(&v))
}

/// Vertical coordination sign: positive if the ownship is above the
/// intruder's relative position, negative if below, 0 at exact level flight
/// (an Open Question case resolved the same way as the horizontal one).
pub fn vertical_coordination(relative_z: f64) -> i8 {
    sign(relative_z)
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Resolves a horizontal coordination sign of exactly 0 (degenerate,
/// perfectly head-on or overtaking geometry) using each aircraft's string id,
/// lexicographically: the aircraft with the smaller id takes ε = +1. Both
/// sides compute the same comparison independently and so still agree
/// without communication (Design Notes, Open Question (b)).
pub fn horizontal_coordination_tiebreak(s: Vect2, v: Vect2, own_id: &str, other_id: &str) -> i8 {
    let eps = horizontal_coordination(s, v);
    if eps != 0 {
        eps
    } else if own_id < other_id {
        1
    } else {
        -1
    }
}

/// Same tie-break as [`horizontal_coordination_tiebreak`], for the vertical
/// sign: exact level flight (`relative_z == 0`) falls back to the id
/// comparison rather than leaving εV undecided.
pub fn vertical_coordination_tiebreak(relative_z: f64, own_id: &str, other_id: &str) -> i8 {
    let eps = vertical_coordination(relative_z);
    if eps != 0 {
        eps
    } else if own_id < other_id {
        1
    } else {
        -1
    }
}

/// Whether a candidate new ownship velocity `nvo` keeps the aircraft on its
/// assigned (εH, εV) side of a conflict with relative position `s` and
/// intruder velocity `vi` (§4.3 "Criteria"). This is the repulsiveness test
/// applied by the recovery-band search and by `conflict_crit`/`recovery_crit`.
pub fn satisfies_criteria(s: Vect2, vi: Vect2, nvo: Vect2, eps_h: i8) -> bool {
    let nv_rel = nvo.sub(&vi);
    let new_sign = sign(s.det(&nv_rel));
    new_sign == 0 || new_sign as i32 == eps_h as i32
}

/// Whether `nvo` is horizontally repulsive: moving the closest-point-of-
/// approach distance away from the intruder relative to the current
/// velocity, along the assigned side (§4.3).
pub fn is_horizontally_repulsive(s: Vect2, vi: Vect2, v_current: Vect2, nvo: Vect2, eps_h: i8) -> bool {
    if !satisfies_criteria(s, vi, nvo, eps_h) {
        return false;
    }
    let current_closure = s.dot(&v_current.sub(&vi));
    let new_closure = s.dot(&nvo.sub(&vi));
    new_closure >= current_closure
}

/// Vertical analogue of [`satisfies_criteria`]: a candidate vertical speed
/// `nvz` keeps the aircraft on its assigned εV side of the conflict.
pub fn satisfies_vertical_criteria(vi_z: f64, nvz: f64, eps_v: i8) -> bool {
    let new_sign = sign(nvz - vi_z);
    new_sign == 0 || new_sign as i32 == eps_v as i32
}

/// Vertical analogue of [`is_horizontally_repulsive`]. `rel_z` is the
/// ownship's altitude relative to the intruder; `rel_z * relative_vz` is the
/// instantaneous rate of change of half the squared vertical separation, so
/// comparing it at the current and candidate vertical speeds tells whether
/// the candidate increases vertical separation relative to holding course.
pub fn is_vertically_repulsive(rel_z: f64, vi_z: f64, v_current_z: f64, nvz: f64, eps_v: i8) -> bool {
    if !satisfies_vertical_criteria(vi_z, nvz, eps_v) {
        return false;
    }
    let current_closure = rel_z * (v_current_z - vi_z);
    let new_closure = rel_z * (nvz - vi_z);
    new_closure >= current_closure
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_coordination_sign_matches_det() {
        let s = Vect2::new(1.0, 0.0);
        let v = Vect2::new(0.0, 1.0);
        assert_eq!(horizontal_coordination(s, v), 1);
        assert_eq!(horizontal_coordination(v, s), -1);
    }

    #[test]
    fn tiebreak_is_consistent_from_both_sides() {
        let s = Vect2::new(1.0, 0.0);
        let v = Vect2::ZERO;
        let eps_from_a = horizontal_coordination_tiebreak(s, v, "aircraft-a", "aircraft-b");
        let eps_from_b = horizontal_coordination_tiebreak(s.scal(-1.0), v, "aircraft-b", "aircraft-a");
        // Both must assign opposite sides of the same conflict.
        assert_eq!(eps_from_a, -eps_from_b);
    }

    #[test]
    fn satisfies_criteria_accepts_same_side_velocity() {
        let s = Vect2::new(1.0, 0.0);
        let vi = Vect2::ZERO;
        let eps_h = horizontal_coordination(s, Vect2::new(0.0, 1.0));
        assert!(satisfies_criteria(s, vi, Vect2::new(0.0, 1.0), eps_h));
    }

    #[test]
    fn vertical_tiebreak_is_consistent_from_both_sides() {
        let eps_from_a = vertical_coordination_tiebreak(0.0, "aircraft-a", "aircraft-b");
        let eps_from_b = vertical_coordination_tiebreak(0.0, "aircraft-b", "aircraft-a");
        assert_eq!(eps_from_a, -eps_from_b);
    }

    #[test]
    fn is_vertically_repulsive_accepts_climbing_away_above() {
        // Ownship 100m above the intruder, intruder level: climbing further
        // away (positive vz) increases separation and matches eps_v = 1.
        assert!(is_vertically_repulsive(100.0, 0.0, 0.0, 2.0, 1));
    }

    #[test]
    fn is_vertically_repulsive_rejects_closing_toward_intruder() {
        // Same geometry, but descending back toward the intruder: reduces
        // separation and violates the assigned side.
        assert!(!is_vertically_repulsive(100.0, 0.0, 2.0, -2.0, 1));
    }
}
