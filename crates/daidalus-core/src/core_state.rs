//! C9: the mutable core — ownship, traffic list, wind, current time, active
//! [`Parameters`], the [`HysteresisStore`], and the generation counter that
//! every query checks before trusting a cached result (§4.10 "Core state").

use crate::error::StateError;
use crate::geometry::{Projection, Vect3};
use crate::hysteresis::HysteresisStore;
use crate::parameters::Parameters;
use crate::state::{AircraftState, Position, TrafficState, Wind};
use tracing::warn;

use crate::geometry::PROJECTION_ACCURACY_RADIUS_M;

/// The full mutable state behind the façade (§4.10). Every mutating method
/// bumps `generation`; [`crate::daidalus::Daidalus::refresh`] recomputes the
/// derived `TrafficState`s whenever its cached generation is stale.
#[derive(Debug, Clone)]
pub struct CoreState {
    pub parameters: Parameters,
    pub ownship: Option<AircraftState>,
    pub traffic: Vec<AircraftState>,
    pub wind: Wind,
    pub time: f64,
    pub hysteresis: HysteresisStore,
    pub generation: u64,
    pub error_log: Vec<String>,
}

impl Default for CoreState {
    fn default() -> Self {
        CoreState {
            parameters: Parameters::default(),
            ownship: None,
            traffic: Vec::new(),
            wind: Wind::CALM,
            time: 0.0,
            hysteresis: HysteresisStore::new(),
            generation: 0,
            error_log: Vec::new(),
        }
    }
}

impl CoreState {
    pub fn new() -> Self {
        CoreState::default()
    }

    fn bump(&mut self) {
        self.generation += 1;
    }

    fn log_error(&mut self, err: impl std::fmt::Display) {
        let msg = err.to_string();
        warn!(%msg, "daidalus state error");
        self.error_log.push(msg);
    }

    /// Sets the ownship. A new id (or no prior ownship) clears all traffic
    /// and hysteresis, since every other aircraft's projected position was
    /// relative to the old ownship (§4.10 invalidation rules). Re-setting
    /// the *same* ownship id just refreshes its state, preserving
    /// hysteresis so an identical-id update across consecutive frames stays
    /// smooth.
    pub fn set_ownship(&mut self, state: AircraftState) {
        let is_new_identity = self.ownship.as_ref().map(|o| o.id != state.id).unwrap_or(true);
        if is_new_identity {
            self.traffic.clear();
            self.hysteresis.clear();
        }
        self.time = state.time;
        self.ownship = Some(state);
        self.bump();
    }

    /// Adds or replaces a traffic aircraft by id. Rejects (logs, does not
    /// mutate) if no ownship is set yet, or if the traffic's position frame
    /// (geodetic vs. Euclidean) doesn't match the ownship's.
    pub fn put_traffic(&mut self, state: AircraftState) -> Result<(), StateError> {
        let Some(ownship) = &self.ownship else {
            self.log_error(StateError::OwnshipNotSet);
            return Err(StateError::OwnshipNotSet);
        };
        if ownship.position.is_geodetic() != state.position.is_geodetic() {
            self.log_error(StateError::MixedPositionFrames);
            return Err(StateError::MixedPositionFrames);
        }
        if let Some(existing) = self.traffic.iter_mut().find(|t| t.id == state.id) {
            *existing = state;
        } else {
            self.traffic.push(state);
        }
        self.bump();
        Ok(())
    }

    pub fn remove_traffic(&mut self, id: &str) -> Result<(), StateError> {
        let before = self.traffic.len();
        self.traffic.retain(|t| t.id != id);
        if self.traffic.len() == before {
            let err = StateError::UnknownTraffic(id.to_string());
            self.log_error(&err);
            return Err(err);
        }
        self.hysteresis.clear_aircraft(id);
        self.bump();
        Ok(())
    }

    pub fn set_wind(&mut self, wind: Wind) {
        self.wind = wind;
        self.bump();
    }

    /// Advances current time. A jump backward, or one larger than the
    /// lookahead time, is treated as a new encounter: hysteresis resets
    /// (§4.9 Design Notes — otherwise a stale debounce window could
    /// suppress a genuinely new conflict).
    pub fn set_time(&mut self, time: f64) {
        let stale = time < self.time || (time - self.time) > self.parameters.lookahead_time;
        self.time = time;
        if stale {
            self.hysteresis.clear();
        }
        self.bump();
    }

    /// 1-based accessor into `traffic`, the indexing convention the rest of
    /// the public API uses.
    pub fn traffic_by_index(&self, index: usize) -> Result<&AircraftState, StateError> {
        if index == 0 || index > self.traffic.len() {
            return Err(StateError::IndexOutOfRange(index, self.traffic.len()));
        }
        Ok(&self.traffic[index - 1])
    }

    /// Projects the ownship and every traffic aircraft into the shared
    /// Euclidean frame (§4.1). Geodetic states are projected around the
    /// ownship's position; Euclidean states pass through unchanged. Returns
    /// `None` if no ownship is set.
    pub fn project(&mut self) -> Option<(TrafficState, Vec<TrafficState>)> {
        let ownship = self.ownship.as_ref()?;
        let (own_s, own_v, projection) = match ownship.position {
            Position::Euclidean(s) => (s, ownship.ground_velocity, None),
            Position::Geodetic(p) => {
                let proj = Projection::new(p);
                let (s, _) = proj.project(p);
                (s, proj.project_velocity(ownship.ground_velocity), Some(proj))
            }
        };
        let own_traffic = TrafficState {
            id: ownship.id.clone(),
            s: own_s,
            v: own_v,
            alerter_index: ownship.alerter_index,
            sum: ownship.sum,
        };

        let mut out = Vec::with_capacity(self.traffic.len());
        for t in &self.traffic {
            let (s, v) = match t.position {
                Position::Euclidean(s) => (s, t.ground_velocity),
                Position::Geodetic(p) => {
                    let proj = projection.expect("ownship and traffic frames are validated to match in put_traffic");
                    let (s, distance) = proj.project(p);
                    if distance > PROJECTION_ACCURACY_RADIUS_M {
                        warn!(aircraft = %t.id, distance, "traffic beyond local projection accuracy radius");
                    }
                    (s, proj.project_velocity(t.ground_velocity))
                }
            };
            out.push(TrafficState { id: t.id.clone(), s, v, alerter_index: t.alerter_index, sum: t.sum });
        }
        Some((own_traffic, out))
    }

    pub fn clear_errors(&mut self) {
        self.error_log.clear();
    }
}

/// Relative position/velocity of `traffic` with respect to `ownship`, the
/// quantity every C2-C7 routine actually operates on.
pub fn relative(ownship: &TrafficState, traffic: &TrafficState) -> (Vect3, Vect3) {
    (ownship.s.sub(&traffic.s), ownship.v.sub(&traffic.v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LatLonAlt;

    #[test]
    fn new_ownship_identity_clears_traffic_and_hysteresis() {
        let mut core = CoreState::new();
        core.set_ownship(AircraftState::new_euclidean("own1", Vect3::ZERO, Vect3::ZERO, 0.0));
        core.put_traffic(AircraftState::new_euclidean("t1", Vect3::new(10.0, 0.0, 0.0), Vect3::ZERO, 0.0)).unwrap();
        assert_eq!(core.traffic.len(), 1);
        core.set_ownship(AircraftState::new_euclidean("own2", Vect3::ZERO, Vect3::ZERO, 0.0));
        assert!(core.traffic.is_empty());
    }

    #[test]
    fn put_traffic_without_ownship_is_rejected() {
        let mut core = CoreState::new();
        let err = core.put_traffic(AircraftState::new_euclidean("t1", Vect3::ZERO, Vect3::ZERO, 0.0)).unwrap_err();
        assert_eq!(err, StateError::OwnshipNotSet);
    }

    #[test]
    fn mixed_position_frames_rejected() {
        let mut core = CoreState::new();
        core.set_ownship(AircraftState::new_euclidean("own1", Vect3::ZERO, Vect3::ZERO, 0.0));
        let geo = AircraftState::new_geodetic("t1", LatLonAlt { lat: 1.0, lon: 1.0, alt: 0.0 }, Vect3::ZERO, 0.0);
        assert_eq!(core.put_traffic(geo).unwrap_err(), StateError::MixedPositionFrames);
    }

    #[test]
    fn traffic_by_index_is_one_based() {
        let mut core = CoreState::new();
        core.set_ownship(AircraftState::new_euclidean("own1", Vect3::ZERO, Vect3::ZERO, 0.0));
        core.put_traffic(AircraftState::new_euclidean("t1", Vect3::new(1.0, 0.0, 0.0), Vect3::ZERO, 0.0)).unwrap();
        assert_eq!(core.traffic_by_index(1).unwrap().id, "t1");
        assert!(core.traffic_by_index(0).is_err());
        assert!(core.traffic_by_index(2).is_err());
    }
}
