//! C6: assembles [`Integerval`] step runs from [`super::integer_bands`] into
//! the real-valued, per-dimension [`BandsRange`]s the façade exposes (§4.6
//! "Output assembly").
//!
//! Each control dimension differs only in how a step index converts to a
//! real value and whether the output wraps (direction, modulo 2π) or is
//! clamped to an absolute range (speed/altitude). Grounded on the same
//! `DaidalusIntegerBands.cpp`/`kinematic_bands` family as
//! [`super::integer_bands`]; the direction/value conversion and
//! region-composition step follow the source's `toIntervalSet_*` helpers
//! described in `original_source/_INDEX.md`'s `DaidalusRealBands.cpp` entry.

use super::{compose_max_severity, recovery, BandsRange, ColorValue, Integerval, Region};
use crate::detector::{CylinderDetector, Detector, DetectorRegistry};
use crate::geometry::to_2pi_rad;
use crate::kinematics::Dimension;
use crate::parameters::{Alerter, Parameters};
use crate::state::TrafficState;

/// Converts an integer step index to the dimension's real value: radians for
/// [`Dimension::Direction`], m/s for horizontal/vertical speed, meters for
/// altitude.
pub fn step_to_value(params: &Parameters, current: f64, dimension: Dimension, trajdir: bool, step: i64) -> f64 {
    let sign = if trajdir { 1.0 } else { -1.0 };
    let n = step as f64;
    match dimension {
        Dimension::Direction => to_2pi_rad(current + sign * n * params.step_hdir),
        Dimension::HorizontalSpeed => (current + sign * n * params.step_hs).max(0.0),
        Dimension::VerticalSpeed => current + sign * n * params.step_vs,
        Dimension::Altitude => current + sign * n * params.step_alt,
    }
}

/// The absolute range bounding a dimension's output (§3 Parameter Block):
/// `[0, 2π)` for direction, the relative-override range for the rest.
pub(crate) fn absolute_range(params: &Parameters, current: f64, dimension: Dimension) -> (f64, f64) {
    match dimension {
        Dimension::Direction => (0.0, std::f64::consts::TAU),
        Dimension::HorizontalSpeed => params.hs_range(current),
        Dimension::VerticalSpeed => params.vs_range(current),
        Dimension::Altitude => params.alt_range(current),
    }
}

/// Runs the integer-band search against one detector in both trajectory
/// directions and converts the resulting step runs to real-valued
/// `(low, up)` pairs (§4.5/§4.6 step 2).
#[allow(clippy::too_many_arguments)]
fn conflict_runs(
    det: &dyn Detector,
    tstep: f64,
    b: f64,
    t: f64,
    max: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    current: f64,
    eps_h: i8,
    eps_v: i8,
) -> Vec<(f64, f64)> {
    let mut runs_out = Vec::new();
    for &trajdir in &[true, false] {
        let runs = super::integer_bands::kinematic_bands(det, Some(det), tstep, b, t, trajdir, max, params, ownship, traffic, dimension, eps_h, eps_v);
        for run in runs {
            let Integerval { lo: run_lo, up: run_up } = run;
            let v_lo = step_to_value(params, current, dimension, trajdir, run_lo);
            let v_up = step_to_value(params, current, dimension, trajdir, run_up);
            let (a, b_val) = if trajdir { (v_lo, v_up) } else { (v_up, v_lo) };
            runs_out.push((a.min(b_val), a.max(b_val)));
        }
    }
    runs_out
}

/// Tags `runs` as `region` against the `[lo, hi]` absolute range, filling
/// everything else `NONE` (§8 P1).
fn tag_runs(lo: f64, hi: f64, runs: &[(f64, f64)], region: Region) -> Vec<BandsRange> {
    let mut points = vec![ColorValue { value: lo, region: Region::None }, ColorValue { value: hi, region: Region::None }];
    for &(a, b_val) in runs {
        let a = a.clamp(lo, hi);
        let b_val = b_val.clamp(lo, hi);
        if a < b_val {
            points.push(ColorValue { value: a, region });
            points.push(ColorValue { value: b_val, region: Region::None });
        }
    }
    super::merge_breakpoints(points)
}

/// Assembles the final [`BandsRange`] list for one dimension against one
/// traffic aircraft: each of `alerter`'s non-`NONE` levels runs the integer-
/// band search against its own registered detector and is tagged with that
/// level's region, the per-level results are composed most-severe-wins
/// (§4.6 steps 3-4), and if the composed result is fully saturated (no
/// `NONE` interval left anywhere), a recovery search opens whatever sub-range
/// its relaxed volume clears, tagged [`Region::Recovery`] (§4.6 "Recovery
/// search"). `eps_h`/`eps_v` are the raw (ungated) coordination signs; this
/// function gates them against `conflict_crit`/`recovery_crit` itself for the
/// direct search and the recovery search respectively, since the two phases
/// are independently configurable (§3 Parameter Block).
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    alerter: &Alerter,
    registry: &DetectorRegistry,
    tstep: f64,
    b: f64,
    t: f64,
    max: i64,
    params: &Parameters,
    ownship: &TrafficState,
    traffic: &TrafficState,
    dimension: Dimension,
    current: f64,
    eps_h: i8,
    eps_v: i8,
) -> Vec<BandsRange> {
    let (lo, hi) = absolute_range(params, current, dimension);
    let (eps_h_direct, eps_v_direct) = if params.conflict_crit { (eps_h, eps_v) } else { (0, 0) };

    let mut per_level = Vec::new();
    for level in alerter.levels.iter().filter(|l| l.region != Region::None) {
        let Some(det) = registry.get(&level.detector) else { continue };
        let runs = conflict_runs(det, tstep, b, t, max, params, ownship, traffic, dimension, current, eps_h_direct, eps_v_direct);
        per_level.push(tag_runs(lo, hi, &runs, level.region));
    }

    let mut composed = if per_level.is_empty() {
        vec![BandsRange { low: lo, up: hi, region: Region::None }]
    } else {
        compose_max_severity(&per_level)
    };

    if dimension_recovery_enabled(params, dimension) && composed.iter().all(|r| r.region != Region::None) {
        let (eps_h_recovery, eps_v_recovery) = if params.recovery_crit { (eps_h, eps_v) } else { (0, 0) };
        if let Some(result) = recovery::search_recovery_volume(params, ownship, traffic, tstep, max, dimension, eps_h_recovery, eps_v_recovery) {
            let recovery_det = CylinderDetector::new(result.horizontal_radius, result.vertical_half_height);
            let clear_runs = conflict_runs(&recovery_det, tstep, b, t, max, params, ownship, traffic, dimension, current, eps_h_recovery, eps_v_recovery);
            composed = overlay_recovery(&composed, &clear_runs);
        }
    }

    composed
}

fn dimension_recovery_enabled(params: &Parameters, dimension: Dimension) -> bool {
    match dimension {
        Dimension::Direction => params.recovery_hdir,
        Dimension::HorizontalSpeed => params.recovery_hs,
        Dimension::VerticalSpeed => params.recovery_vs,
        Dimension::Altitude => params.recovery_alt,
    }
}

/// Splits every range in `composed` against `clear_runs`, relabelling the
/// overlapping portion [`Region::Recovery`]: since this only ever runs once
/// `composed` is fully saturated, the recovery detector's clear sub-range
/// always wins outright rather than competing by severity.
fn overlay_recovery(composed: &[BandsRange], clear_runs: &[(f64, f64)]) -> Vec<BandsRange> {
    if clear_runs.is_empty() {
        return composed.to_vec();
    }
    let mut out = Vec::new();
    for range in composed {
        let mut cuts: Vec<f64> = vec![range.low, range.up];
        for &(a, b_val) in clear_runs {
            let a = a.clamp(range.low, range.up);
            let b_val = b_val.clamp(range.low, range.up);
            if a < b_val {
                cuts.push(a);
                cuts.push(b_val);
            }
        }
        cuts.sort_by(|x, y| x.partial_cmp(y).unwrap());
        cuts.dedup_by(|x, y| (*x - *y).abs() < 1e-9);
        for w in cuts.windows(2) {
            let (lo, hi) = (w[0], w[1]);
            if hi <= lo {
                continue;
            }
            let mid = (lo + hi) / 2.0;
            let in_recovery = clear_runs.iter().any(|&(a, b_val)| mid >= a && mid <= b_val);
            let region = if in_recovery { Region::Recovery } else { range.region };
            out.push(BandsRange { low: lo, up: hi, region });
        }
    }
    let mut merged: Vec<BandsRange> = Vec::new();
    for r in out {
        if let Some(last) = merged.last_mut() {
            if last.region == r.region && (last.up - r.low).abs() < 1e-9 {
                last.up = r.up;
                continue;
            }
        }
        merged.push(r);
    }
    merged
}

/// The first breakpoint's region is "now": the region the caller's current
/// value of this dimension resolves to (§4.2 "regionOf"-style query).
pub fn region_of(ranges: &[BandsRange], value: f64) -> Region {
    for range in ranges {
        if value >= range.low && value <= range.up {
            return range.region;
        }
    }
    Region::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vect3;
    use crate::parameters::AlertThreshold;

    fn head_on_pair() -> (TrafficState, TrafficState) {
        let ownship = TrafficState {
            id: "ownship".into(),
            s: Vect3::ZERO,
            v: Vect3::new(0.0, 50.0, 0.0),
            alerter_index: Some(1),
            sum: None,
        };
        let traffic = TrafficState {
            id: "traffic".into(),
            s: Vect3::new(0.0, 3000.0, 0.0),
            v: Vect3::new(0.0, -50.0, 0.0),
            alerter_index: Some(1),
            sum: None,
        };
        (ownship, traffic)
    }

    fn alerter_far_mid_near() -> Alerter {
        let mut a = Alerter::new("test");
        a.levels.push(AlertThreshold::new("far", 60.0, Region::Far));
        a.levels.push(AlertThreshold::new("mid", 60.0, Region::Mid));
        a.levels.push(AlertThreshold::new("near", 60.0, Region::Near));
        a
    }

    fn registry_three_cylinders() -> DetectorRegistry {
        let mut r = DetectorRegistry::default();
        r.insert("far", CylinderDetector::new(2000.0, 300.0));
        r.insert("mid", CylinderDetector::new(1000.0, 200.0));
        r.insert("near", CylinderDetector::new(300.0, 150.0));
        r
    }

    #[test]
    fn assembled_bands_cover_the_whole_absolute_range() {
        let params = Parameters::default();
        let alerter = alerter_far_mid_near();
        let registry = registry_three_cylinders();
        let (ownship, traffic) = head_on_pair();
        let ranges = assemble(&alerter, &registry, 2.0, 0.0, 100.0, 20, &params, &ownship, &traffic, Dimension::Direction, 0.0, 1, 0);
        assert!(!ranges.is_empty());
        assert_eq!(ranges.first().unwrap().low, 0.0);
        assert_eq!(ranges.last().unwrap().up, std::f64::consts::TAU);
    }

    #[test]
    fn composition_escalates_to_the_most_severe_overlapping_level() {
        let params = Parameters::default();
        let alerter = alerter_far_mid_near();
        let registry = registry_three_cylinders();
        let (ownship, traffic) = head_on_pair();
        let ranges = assemble(&alerter, &registry, 2.0, 0.0, 100.0, 20, &params, &ownship, &traffic, Dimension::Direction, 0.0, 0, 0);
        // The NEAR cylinder is a strict subset of the MID and FAR ones, so
        // wherever NEAR reports conflict, the composed result must carry
        // NEAR rather than being outranked by the wider detectors' regions.
        assert!(ranges.iter().any(|r| r.region == Region::Near), "{ranges:?}");
    }

    #[test]
    fn overlay_recovery_replaces_saturated_ranges_within_its_extent() {
        let composed = vec![BandsRange { low: 0.0, up: 10.0, region: Region::Near }];
        let clear_runs = vec![(4.0, 6.0)];
        let result = overlay_recovery(&composed, &clear_runs);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], BandsRange { low: 0.0, up: 4.0, region: Region::Near });
        assert_eq!(result[1], BandsRange { low: 4.0, up: 6.0, region: Region::Recovery });
        assert_eq!(result[2], BandsRange { low: 6.0, up: 10.0, region: Region::Near });
    }

    #[test]
    fn region_of_resolves_current_value() {
        let ranges = vec![
            BandsRange { low: 0.0, up: 1.0, region: Region::None },
            BandsRange { low: 1.0, up: 2.0, region: Region::Near },
        ];
        assert_eq!(region_of(&ranges, 0.5), Region::None);
        assert_eq!(region_of(&ranges, 1.5), Region::Near);
        assert_eq!(region_of(&ranges, 9.0), Region::Unknown);
    }
}
