//! C10: the public façade. Owns a [`CoreState`] and a [`DetectorRegistry`],
//! re-derives everything query methods need on demand, and never panics or
//! returns an `Err` from a pure query (§7 sentinel-value philosophy).

use crate::alerting::{self, AlertResult};
use crate::bands::real_bands;
use crate::bands::{compose_max_severity, BandsRange, Region};
use crate::core_state::CoreState;
use crate::criteria;
use crate::detector::DetectorRegistry;
use crate::error::StateError;
use crate::hysteresis::GreenBand;
use crate::kinematics::Dimension;
use crate::parameters::{Alerter, Parameters};
use crate::state::{AircraftState, TrafficState};

/// Default step count/time-step used by the band searches; the façade's own
/// knob for how finely `[0, lookahead_time]` gets sampled.
const DEFAULT_TSTEP: f64 = 1.0;

/// Public entry point for the whole engine (§4 "Public API"). One instance
/// per encounter; create, feed state, query.
#[derive(Debug, Clone)]
pub struct Daidalus {
    core: CoreState,
    detectors: DetectorRegistry,
}

impl Default for Daidalus {
    fn default() -> Self {
        Daidalus { core: CoreState::new(), detectors: DetectorRegistry::default() }
    }
}

impl Daidalus {
    pub fn new() -> Self {
        Daidalus::default()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.core.parameters
    }

    pub fn set_parameters(&mut self, parameters: Parameters) {
        self.core.parameters = parameters;
        self.core.hysteresis.clear();
        self.core.generation += 1;
    }

    pub fn set_ownship(&mut self, state: AircraftState) {
        self.core.set_ownship(state);
    }

    pub fn put_traffic(&mut self, state: AircraftState) -> Result<(), StateError> {
        self.core.put_traffic(state)
    }

    pub fn remove_traffic(&mut self, id: &str) -> Result<(), StateError> {
        self.core.remove_traffic(id)
    }

    pub fn set_wind(&mut self, east: f64, north: f64) {
        self.core.set_wind(crate::state::Wind { east, north });
    }

    pub fn set_time(&mut self, time: f64) {
        self.core.set_time(time);
    }

    pub fn error_log(&self) -> &[String] {
        &self.core.error_log
    }

    pub fn clear_errors(&mut self) {
        self.core.clear_errors();
    }

    pub fn traffic_count(&self) -> usize {
        self.core.traffic.len()
    }

    /// The alert level and region for traffic aircraft `index` (1-based),
    /// or [`AlertResult::NONE`] for any index with no assigned alerter or an
    /// id that no longer resolves — an invalid index never panics (§7).
    pub fn alert_level(&mut self, index: usize) -> AlertResult {
        let Some((own, traffic)) = self.core.project() else { return AlertResult::NONE };
        let Ok(aircraft) = self.core.traffic_by_index(index) else { return AlertResult::NONE };
        let Some(t) = traffic.iter().find(|t| t.id == aircraft.id) else { return AlertResult::NONE };
        let Some(alerter) = alerting::alerter_for(&self.core.parameters, aircraft.alerter_index) else {
            return AlertResult::NONE;
        };
        let raw = alerting::evaluate(alerter, &self.detectors, &self.core.parameters, &own, t, false);
        let (level, region) = self.core.hysteresis.update(
            &aircraft.id,
            raw.level,
            raw.region,
            self.core.time,
            self.core.parameters.alerting_m,
            self.core.parameters.alerting_n,
            self.core.parameters.hysteresis_time,
            self.core.parameters.persistence_time,
        );
        AlertResult { level, region }
    }

    /// Whether any tracked traffic aircraft currently carries a
    /// [`alerting::is_corrective`]-eligible alert.
    pub fn is_conflict(&mut self) -> bool {
        (1..=self.traffic_count()).any(|i| {
            let result = self.alert_level(i);
            alerting::is_corrective(&self.core.parameters, result.region)
        })
    }

    /// Direction bands, radians, `[0, 2*PI)`, composed most-severe-wins
    /// across every tracked traffic aircraft (§4.6 step 3). A single full
    /// clear band if there is no traffic; empty if there is no ownship.
    pub fn direction_bands(&mut self) -> Vec<BandsRange> {
        self.bands_for(Dimension::Direction)
    }

    pub fn horizontal_speed_bands(&mut self) -> Vec<BandsRange> {
        self.bands_for(Dimension::HorizontalSpeed)
    }

    pub fn vertical_speed_bands(&mut self) -> Vec<BandsRange> {
        self.bands_for(Dimension::VerticalSpeed)
    }

    pub fn altitude_bands(&mut self) -> Vec<BandsRange> {
        self.bands_for(Dimension::Altitude)
    }

    fn bands_for(&mut self, dimension: Dimension) -> Vec<BandsRange> {
        let Some((own, traffic)) = self.core.project() else { return Vec::new() };
        let current = current_value(&own, dimension);
        let max_step = (self.core.parameters.lookahead_time / DEFAULT_TSTEP).ceil() as i64;

        if traffic.is_empty() {
            let (lo, hi) = real_bands::absolute_range(&self.core.parameters, current, dimension);
            return vec![BandsRange { low: lo, up: hi, region: Region::None }];
        }

        let mut per_traffic = Vec::with_capacity(traffic.len());
        for t in &traffic {
            let Some(alerter) = alerting::alerter_for(&self.core.parameters, t.alerter_index) else { continue };
            let (eps_h, eps_v) = epsilons_for(&own, t);
            per_traffic.push(real_bands::assemble(
                alerter,
                &self.detectors,
                DEFAULT_TSTEP,
                0.0,
                self.core.parameters.lookahead_time,
                max_step,
                &self.core.parameters,
                &own,
                t,
                dimension,
                current,
                eps_h,
                eps_v,
            ));
        }

        let composed = if per_traffic.is_empty() {
            let (lo, hi) = real_bands::absolute_range(&self.core.parameters, current, dimension);
            vec![BandsRange { low: lo, up: hi, region: Region::None }]
        } else {
            compose_max_severity(&per_traffic)
        };

        if self.core.parameters.bands_persistence {
            self.apply_bands_persistence(composed, dimension, current)
        } else {
            composed
        }
    }

    /// §4.9 Open Question (c): clips the just-computed bands so that the
    /// green (clear) sub-range around `current` in `dimension` doesn't
    /// change unless the new one is "fresh" or the prior one's persistence
    /// has elapsed. Keyed by the ownship id, since the persisted band tracks
    /// what the ownship itself has been shown, not any one intruder.
    fn apply_bands_persistence(&mut self, ranges: Vec<BandsRange>, dimension: Dimension, current: f64) -> Vec<BandsRange> {
        let Some(own_id) = self.core.ownship.as_ref().map(|o| o.id.clone()) else { return ranges };
        let Some(candidate) = green_band_at(&ranges, current) else { return ranges };
        let persistence_preferred = persistence_preferred_for(&self.core.parameters, dimension);
        let held = self.core.hysteresis.persist_green_band(
            &own_id,
            dimension,
            candidate,
            current,
            persistence_preferred,
            self.core.parameters.persistence_time,
            self.core.time,
        );
        if held == candidate {
            return ranges;
        }
        clip_green_band(&ranges, held)
    }

    /// Which region the aircraft's current value in `dimension` resolves to,
    /// against the most recently computed bands (§4.2 "regionOf").
    pub fn region_of_direction(&mut self) -> Region {
        let bands = self.direction_bands();
        let Some((own, _)) = self.core.project() else { return Region::Unknown };
        real_bands::region_of(&bands, current_value(&own, Dimension::Direction))
    }

    /// The nearest conflict-region boundary below `current` in `dimension`,
    /// across all traffic (§4.6 "Resolution advisory"). `None` if the
    /// current value is already in `NONE` with nothing in conflict below it,
    /// or there is no ownship.
    pub fn resolution_low(&mut self, dimension: Dimension) -> Option<f64> {
        self.resolution_bounds(dimension)?.0
    }

    /// Vertical/upward analogue of [`Self::resolution_low`].
    pub fn resolution_up(&mut self, dimension: Dimension) -> Option<f64> {
        self.resolution_bounds(dimension)?.1
    }

    /// Which side of a conflict the resolution advisory prefers: `true` for
    /// up/right, `false` for down/left, whichever resolution boundary is
    /// closer to the current value (§4.6 "Resolution advisory", §4.10). Ties
    /// prefer `true`. `None` if there is no conflict to resolve in either
    /// direction.
    pub fn preferred_direction(&mut self, dimension: Dimension) -> Option<bool> {
        let (current, (low, up)) = {
            let current = self.current_dimension_value(dimension)?;
            (current, self.resolution_bounds(dimension)?)
        };
        match (low, up) {
            (None, None) => None,
            (Some(_), None) => Some(false),
            (None, Some(_)) => Some(true),
            (Some(l), Some(u)) => Some((u - current).abs() <= (current - l).abs()),
        }
    }

    /// Computes `(current, ranges)` once and derives both resolution
    /// boundaries from it, so [`Self::preferred_direction`] doesn't run the
    /// band search three times over.
    fn resolution_bounds(&mut self, dimension: Dimension) -> Option<(Option<f64>, Option<f64>)> {
        let current = self.current_dimension_value(dimension)?;
        let ranges = self.bands_for(dimension);
        Some((resolution_boundary(&ranges, current, false), resolution_boundary(&ranges, current, true)))
    }

    /// The latest lookahead-start offset `b`, in `[0, lookahead_time]`, at
    /// which traffic `index` still has at least one direct (non-recovery)
    /// resolution in the direction dimension (§4.6 "Last time to maneuver").
    /// Returns `0.0` once no resolution exists even right now; the
    /// lookahead time itself if a direct resolution persists for the whole
    /// window; an invalid index returns `0.0` rather than panicking (§7).
    pub fn last_time_to_maneuver(&mut self, index: usize) -> f64 {
        let Some((own, traffic)) = self.core.project() else { return 0.0 };
        let Ok(aircraft) = self.core.traffic_by_index(index) else { return 0.0 };
        let Some(t) = traffic.iter().find(|t| t.id == aircraft.id) else { return 0.0 };
        let Some(alerter) = alerting::alerter_for(&self.core.parameters, aircraft.alerter_index) else { return 0.0 };

        let params = &self.core.parameters;
        let current = current_value(&own, Dimension::Direction);
        let max_step = (params.lookahead_time / DEFAULT_TSTEP).ceil() as i64;
        let (eps_h, eps_v) = epsilons_for(&own, t);

        if !has_direct_resolution(alerter, &self.detectors, params, &own, t, max_step, current, eps_h, eps_v, 0.0) {
            return 0.0;
        }
        if has_direct_resolution(alerter, &self.detectors, params, &own, t, max_step, current, eps_h, eps_v, params.lookahead_time) {
            return params.lookahead_time;
        }

        let mut lo = 0.0_f64;
        let mut hi = params.lookahead_time;
        while hi - lo > 0.5 {
            let mid = (lo + hi) / 2.0;
            if has_direct_resolution(alerter, &self.detectors, params, &own, t, max_step, current, eps_h, eps_v, mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    fn current_dimension_value(&mut self, dimension: Dimension) -> Option<f64> {
        let (own, _) = self.core.project()?;
        Some(current_value(&own, dimension))
    }
}

fn current_value(own: &TrafficState, dimension: Dimension) -> f64 {
    match dimension {
        Dimension::Direction => own.v.vect2().track_rad(),
        Dimension::HorizontalSpeed => own.v.vect2().norm(),
        Dimension::VerticalSpeed => own.v.z,
        Dimension::Altitude => own.s.z,
    }
}

/// Raw (ungated) εH/εV implicit-coordination signs between the ownship and
/// one traffic aircraft, broken by id when the geometry is exactly
/// symmetric (§4.3 "Criteria"). `assemble` gates these against
/// `conflict_crit`/`recovery_crit` itself.
fn epsilons_for(own: &TrafficState, traffic: &TrafficState) -> (i8, i8) {
    let rel_s = own.s.sub(&traffic.s);
    let rel_v = own.v.sub(&traffic.v);
    let eps_h = criteria::horizontal_coordination_tiebreak(rel_s.vect2(), rel_v.vect2(), &own.id, &traffic.id);
    let eps_v = criteria::vertical_coordination_tiebreak(rel_s.z, &own.id, &traffic.id);
    (eps_h, eps_v)
}

/// The boundary of the nearest conflict-region range relative to `current`:
/// searching upward (`upward == true`) or downward. `None` if there is no
/// conflict region on that side.
fn resolution_boundary(ranges: &[BandsRange], current: f64, upward: bool) -> Option<f64> {
    let mut best: Option<f64> = None;
    for r in ranges {
        if !r.region.is_conflict_region() {
            continue;
        }
        if upward && r.low >= current {
            best = Some(best.map_or(r.low, |b| b.min(r.low)));
        } else if !upward && r.up <= current {
            best = Some(best.map_or(r.up, |b| b.max(r.up)));
        } else if current >= r.low && current <= r.up {
            // Already inside a conflict range: the boundary on the
            // requested side is the edge of this very range.
            best = Some(if upward { r.up } else { r.low });
        }
    }
    best
}

/// Whether traffic `t`'s direction bands, computed with a lookahead window
/// starting `b` seconds from now, still contain at least one `NONE`
/// sub-range — i.e. a direct resolution that doesn't rely on the recovery
/// search (§4.6 "Last time to maneuver").
#[allow(clippy::too_many_arguments)]
fn has_direct_resolution(
    alerter: &Alerter,
    registry: &DetectorRegistry,
    params: &Parameters,
    own: &TrafficState,
    t: &TrafficState,
    max_step: i64,
    current: f64,
    eps_h: i8,
    eps_v: i8,
    b: f64,
) -> bool {
    let ranges = real_bands::assemble(
        alerter,
        registry,
        DEFAULT_TSTEP,
        b,
        params.lookahead_time,
        max_step,
        params,
        own,
        t,
        Dimension::Direction,
        current,
        eps_h,
        eps_v,
    );
    ranges.iter().any(|r| r.region == Region::None)
}

fn persistence_preferred_for(params: &Parameters, dimension: Dimension) -> f64 {
    match dimension {
        Dimension::Direction => params.persistence_preferred_hdir,
        Dimension::HorizontalSpeed => params.persistence_preferred_hs,
        Dimension::VerticalSpeed => params.persistence_preferred_vs,
        Dimension::Altitude => params.persistence_preferred_alt,
    }
}

/// The `NONE` sub-range of `ranges` containing `current`, if any — the
/// candidate green band [`HysteresisStore::persist_green_band`](crate::hysteresis::HysteresisStore::persist_green_band) checks for freshness.
fn green_band_at(ranges: &[BandsRange], current: f64) -> Option<GreenBand> {
    ranges
        .iter()
        .find(|r| r.region == Region::None && current >= r.low && current <= r.up)
        .map(|r| GreenBand { low: r.low, up: r.up })
}

/// Rewrites `ranges` so that the `NONE` sub-range containing `current` (the
/// one the persistence check ran against) is replaced by `held`'s extent,
/// with its immediate neighbors' boundaries moved to meet it so the list
/// stays contiguous. Only called once persistence has decided to hold a
/// band that differs from what was just computed.
fn clip_green_band(ranges: &[BandsRange], held: GreenBand) -> Vec<BandsRange> {
    let overlap = |r: &BandsRange| (r.up.min(held.up) - r.low.max(held.low)).max(0.0);
    let target = ranges
        .iter()
        .enumerate()
        .filter(|(_, r)| r.region == Region::None)
        .max_by(|(_, a), (_, b)| overlap(a).partial_cmp(&overlap(b)).unwrap());
    let Some((target, best)) = target else { return ranges.to_vec() };
    if overlap(best) <= 0.0 {
        return ranges.to_vec();
    }
    let mut out = ranges.to_vec();
    out[target] = BandsRange { low: held.low, up: held.up, region: Region::None };
    if target > 0 {
        out[target - 1].up = held.low;
    }
    if target + 1 < out.len() {
        out[target + 1].low = held.up;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vect3;

    #[test]
    fn fresh_instance_reports_no_conflicts() {
        let mut daa = Daidalus::new();
        daa.set_ownship(AircraftState::new_euclidean("own", Vect3::ZERO, Vect3::new(0.0, 50.0, 0.0), 0.0));
        assert!(!daa.is_conflict());
    }

    #[test]
    fn no_ownship_reports_empty_bands_and_no_alert() {
        let mut daa = Daidalus::new();
        assert_eq!(daa.alert_level(1), AlertResult::NONE);
        assert!(daa.direction_bands().is_empty());
    }

    #[test]
    fn traffic_free_ownship_reports_a_single_clear_band() {
        let mut daa = Daidalus::new();
        daa.set_ownship(AircraftState::new_euclidean("own", Vect3::ZERO, Vect3::new(0.0, 50.0, 0.0), 0.0));
        let bands = daa.direction_bands();
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].region, Region::None);
        assert_eq!(bands[0].low, 0.0);
        assert_eq!(bands[0].up, std::f64::consts::TAU);
    }

    #[test]
    fn invalid_traffic_index_never_panics() {
        let mut daa = Daidalus::new();
        daa.set_ownship(AircraftState::new_euclidean("own", Vect3::ZERO, Vect3::ZERO, 0.0));
        assert_eq!(daa.alert_level(99), AlertResult::NONE);
        assert_eq!(daa.last_time_to_maneuver(99), 0.0);
    }

    #[test]
    fn traffic_in_violation_raises_an_alert() {
        let mut daa = Daidalus::new();
        daa.set_ownship(AircraftState::new_euclidean("own", Vect3::ZERO, Vect3::ZERO, 0.0));
        daa.put_traffic(AircraftState::new_euclidean("intruder", Vect3::new(10.0, 0.0, 0.0), Vect3::ZERO, 0.0)).unwrap();
        let result = daa.alert_level(1);
        assert!(result.level > 0);
    }

    #[test]
    fn direction_bands_compose_across_multiple_traffic() {
        let mut daa = Daidalus::new();
        daa.set_ownship(AircraftState::new_euclidean("own", Vect3::ZERO, Vect3::new(0.0, 50.0, 0.0), 0.0));
        daa.put_traffic(AircraftState::new_euclidean("head_on", Vect3::new(0.0, 3000.0, 0.0), Vect3::new(0.0, -50.0, 0.0), 0.0))
            .unwrap();
        let bands = daa.direction_bands();
        assert!(!bands.is_empty());
        assert_eq!(bands.first().unwrap().low, 0.0);
        assert_eq!(bands.last().unwrap().up, std::f64::consts::TAU);
        assert!(bands.iter().any(|r| r.region.is_conflict_region()), "{bands:?}");
    }
}
