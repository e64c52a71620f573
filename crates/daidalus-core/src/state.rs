//! §3 data model: aircraft state, SUM uncertainty block, and wind.
//!
//! A small, mostly-`Default`-derived bag of per-aircraft mutable fields,
//! generalized to the full DAIDALUS aircraft record.

use crate::geometry::{sqrt_safe, LatLonAlt, Vect3};
use serde::{Deserialize, Serialize};

/// Either frame a caller may supply a position in. A state set may not mix
/// the two across ownship and traffic (`StateError::MixedPositionFrames`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Position {
    Geodetic(LatLonAlt),
    Euclidean(Vect3),
}

impl Position {
    pub fn is_geodetic(&self) -> bool {
        matches!(self, Position::Geodetic(_))
    }
}

/// Sensor Uncertainty Mitigation block: Gaussian covariances on position and
/// velocity (§3). Fields follow the source's covariance-matrix convention:
/// `*_ew`/`*_ns` are variances, `*_en` is the off-diagonal covariance term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SumBlock {
    pub s_ew: f64,
    pub s_ns: f64,
    pub s_en: f64,
    pub sz_std: f64,
    pub v_ew: f64,
    pub v_ns: f64,
    pub v_en: f64,
    pub vz_std: f64,
}

impl SumBlock {
    /// Larger eigenvalue of the 2x2 horizontal-position covariance matrix,
    /// square-rooted: the horizontal position error standard deviation.
    pub fn horizontal_position_error(&self) -> f64 {
        larger_eigen_sqrt(self.s_ew, self.s_ns, self.s_en)
    }

    /// Same construction over the horizontal-velocity covariance matrix.
    pub fn horizontal_velocity_error(&self) -> f64 {
        larger_eigen_sqrt(self.v_ew, self.v_ns, self.v_en)
    }
}

/// `sqrt` of the larger eigenvalue of `[[a, c], [c, d]]`.
fn larger_eigen_sqrt(a: f64, d: f64, c: f64) -> f64 {
    let mean = (a + d) / 2.0;
    let half_diff = (a - d) / 2.0;
    let radius = sqrt_safe(half_diff * half_diff + c * c);
    sqrt_safe(mean + radius)
}

/// A single aircraft's kinematic state as supplied by the caller (§3, §6
/// "State input"). Velocity is ground velocity in the east/north/up frame;
/// wind is subtracted elsewhere to obtain air velocity when needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftState {
    pub id: String,
    pub position: Position,
    /// Ground velocity, east/north/up meters per second.
    pub ground_velocity: Vect3,
    /// `Some` 1-based index into the parameter block's alerter list; `None`
    /// (or index 0 at the file-format boundary) disables alerting for this
    /// aircraft.
    pub alerter_index: Option<usize>,
    pub sum: Option<SumBlock>,
    pub time: f64,
}

impl AircraftState {
    pub fn new_euclidean(id: impl Into<String>, s: Vect3, v: Vect3, time: f64) -> Self {
        AircraftState {
            id: id.into(),
            position: Position::Euclidean(s),
            ground_velocity: v,
            alerter_index: Some(1),
            sum: None,
            time,
        }
    }

    pub fn new_geodetic(id: impl Into<String>, p: LatLonAlt, v: Vect3, time: f64) -> Self {
        AircraftState {
            id: id.into(),
            position: Position::Geodetic(p),
            ground_velocity: v,
            alerter_index: Some(1),
            sum: None,
            time,
        }
    }
}

/// Wind vector in the "TO" convention (points in the direction the wind is
/// blowing toward), east/north meters per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Wind {
    pub east: f64,
    pub north: f64,
}

impl Wind {
    pub const CALM: Wind = Wind { east: 0.0, north: 0.0 };

    pub fn as_vect3(&self) -> Vect3 {
        Vect3::new(self.east, self.north, 0.0)
    }
}

/// The internal, already-projected representation every geometric component
/// (C2-C6) operates on. Unlike the source's `TrafficState`, this never holds
/// a back-reference to the ownship's projection (Design Notes): the core
/// recomputes `s`/`v` on every refresh from the raw [`AircraftState`] plus
/// the current ownship-centered [`crate::geometry::Projection`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficState {
    pub id: String,
    /// Euclidean position, relative to nothing in particular — always used
    /// as a difference against another `TrafficState`'s `s`.
    pub s: Vect3,
    /// Ground velocity, east/north/up.
    pub v: Vect3,
    pub alerter_index: Option<usize>,
    pub sum: Option<SumBlock>,
}

impl TrafficState {
    /// Air velocity given the current wind (ground velocity minus wind,
    /// both TO-convention east/north vectors).
    pub fn air_velocity(&self, wind: Wind) -> Vect3 {
        self.v.sub(&wind.as_vect3())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn eigen_of_isotropic_covariance_is_the_diagonal() {
        // No correlation, equal variances: both eigenvalues equal 4.0.
        assert_relative_eq!(larger_eigen_sqrt(4.0, 4.0, 0.0), 2.0);
    }

    #[test]
    fn eigen_handles_anisotropic_covariance() {
        let sum = SumBlock {
            s_ew: 100.0,
            s_ns: 25.0,
            s_en: 0.0,
            ..Default::default()
        };
        assert_relative_eq!(sum.horizontal_position_error(), 10.0);
    }
}
