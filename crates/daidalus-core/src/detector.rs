//! C2: the conflict-detector abstraction and its cylindrical implementation.
//!
//! A detector answers three questions about a relative trajectory over a
//! lookahead window: is there a violation right now, is there a future
//! conflict, and (for display) what is the horizontal boundary of the
//! protected volume. Every [`AlertThreshold`](crate::parameters::AlertThreshold)
//! names one by its registered id so different alert levels can use
//! different-sized volumes (§4.2).

use crate::geometry::{horizontal_miss_distance, tcpa2, Vect2, Vect3};
use std::collections::HashMap;

/// A single conflict interval `[t_in, t_out]` on the relative trajectory,
/// plus the horizontal/vertical separation at entry (§4.2 "Conflict Detection").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConflictInterval {
    pub time_in: f64,
    pub time_out: f64,
}

/// Capability set every registered detector must provide (§4.2).
pub trait Detector: std::fmt::Debug + Send + Sync {
    /// True if the protected volume is currently violated.
    fn violation(&self, s: &Vect3, v: &Vect3) -> bool;

    /// The future conflict interval within `[0, lookahead]`, if any.
    fn conflict_detection(&self, s: &Vect3, v: &Vect3, lookahead: f64) -> Option<ConflictInterval>;

    /// Horizontal boundary of the protected volume, sampled every
    /// `resolution` radians around the ownship, in the ownship's own frame
    /// (§4.2 `horizontalHazardZone`). Used by the contour/hazard-zone APIs.
    fn horizontal_hazard_zone(&self, resolution: f64) -> Vec<Vect2>;
}

/// The classic ACAS-style cylinder: horizontal radius `d`, vertical half-height
/// `h`. Violation is simultaneous horizontal-inside-`d` and vertical-inside-`h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderDetector {
    pub horizontal_radius: f64,
    pub vertical_half_height: f64,
}

impl CylinderDetector {
    pub fn new(horizontal_radius: f64, vertical_half_height: f64) -> Self {
        CylinderDetector { horizontal_radius, vertical_half_height }
    }

    /// Horizontal entry/exit times against a cylinder of radius `d`, solving
    /// `|s + t*v|^2 = d^2` for the relative horizontal trajectory. `None` if
    /// the trajectory never enters (including the degenerate stationary case
    /// when already outside).
    fn horizontal_times(&self, s: &Vect2, v: &Vect2) -> Option<(f64, f64)> {
        let d2 = self.horizontal_radius * self.horizontal_radius;
        let a = v.sq();
        let b = 2.0 * s.dot(v);
        let c = s.sq() - d2;
        if a <= 1e-12 {
            return if c <= 0.0 { Some((f64::NEG_INFINITY, f64::INFINITY)) } else { None };
        }
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);
        Some((t1.min(t2), t1.max(t2)))
    }

    /// Vertical entry/exit times against a band of half-height `h` centered
    /// on zero relative altitude.
    fn vertical_times(&self, sz: f64, vz: f64) -> (f64, f64) {
        if vz.abs() <= 1e-12 {
            return if sz.abs() <= self.vertical_half_height {
                (f64::NEG_INFINITY, f64::INFINITY)
            } else {
                (f64::NAN, f64::NAN)
            };
        }
        let t_lo = (-self.vertical_half_height - sz) / vz;
        let t_hi = (self.vertical_half_height - sz) / vz;
        (t_lo.min(t_hi), t_lo.max(t_hi))
    }
}

impl Detector for CylinderDetector {
    fn violation(&self, s: &Vect3, v: &Vect3) -> bool {
        let _ = v;
        s.vect2().norm() < self.horizontal_radius && s.z.abs() < self.vertical_half_height
    }

    fn conflict_detection(&self, s: &Vect3, v: &Vect3, lookahead: f64) -> Option<ConflictInterval> {
        let (h_in, h_out) = self.horizontal_times(&s.vect2(), &v.vect2())?;
        let (v_in, v_out) = self.vertical_times(s.z, v.z);
        if v_in.is_nan() {
            return None;
        }
        let time_in = h_in.max(v_in).max(0.0);
        let time_out = h_out.min(v_out).min(lookahead);
        if time_in < time_out {
            Some(ConflictInterval { time_in, time_out })
        } else {
            None
        }
    }

    fn horizontal_hazard_zone(&self, resolution: f64) -> Vec<Vect2> {
        let step = resolution.max(1e-3);
        let mut pts = Vec::new();
        let mut angle = 0.0;
        while angle < std::f64::consts::TAU {
            pts.push(Vect2::new(self.horizontal_radius * angle.sin(), self.horizontal_radius * angle.cos()));
            angle += step;
        }
        pts
    }
}

/// Diagnostic miss-distance pair used by `tcpa`/`horizontal_miss_distance`
/// style queries independent of any particular detector's shape (§4.1).
pub fn closest_approach(s: &Vect3, v: &Vect3) -> (f64, f64) {
    let t = tcpa2(&s.vect2(), &v.vect2());
    (t, horizontal_miss_distance(&s.vect2(), &v.vect2()))
}

/// Named catalogue of detector instances, referenced by id from
/// [`AlertThreshold::detector`](crate::parameters::AlertThreshold). Mirrors
/// how the source's `Alerter` binds each severity level to a
/// `Detection3D` instance by name rather than embedding it inline.
#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    detectors: HashMap<String, CylinderDetector>,
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        let mut detectors = HashMap::new();
        detectors.insert("cylinder".to_string(), DEFAULT_CYLINDER);
        DetectorRegistry { detectors }
    }
}

impl DetectorRegistry {
    pub fn get(&self, id: &str) -> Option<&CylinderDetector> {
        self.detectors.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, detector: CylinderDetector) {
        self.detectors.insert(id.into(), detector);
    }
}

/// Well-known-cylinder (WC) default used by the built-in "cylinder" detector:
/// a DO-365-style 0.2 NM / 450 ft volume.
const DEFAULT_CYLINDER: CylinderDetector = CylinderDetector { horizontal_radius: 370.4, vertical_half_height: 137.16 };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cylinder_violation_requires_both_dimensions() {
        let c = CylinderDetector::new(100.0, 50.0);
        assert!(c.violation(&Vect3::new(10.0, 0.0, 10.0), &Vect3::ZERO));
        assert!(!c.violation(&Vect3::new(200.0, 0.0, 10.0), &Vect3::ZERO));
        assert!(!c.violation(&Vect3::new(10.0, 0.0, 100.0), &Vect3::ZERO));
    }

    #[test]
    fn conflict_detection_finds_future_head_on_conflict() {
        let c = CylinderDetector::new(100.0, 50.0);
        let s = Vect3::new(1000.0, 0.0, 0.0);
        let v = Vect3::new(-10.0, 0.0, 0.0);
        let conflict = c.conflict_detection(&s, &v, 300.0).expect("should detect a future conflict");
        assert!(conflict.time_in < conflict.time_out);
        assert!(conflict.time_in > 0.0);
    }

    #[test]
    fn conflict_detection_none_when_diverging() {
        let c = CylinderDetector::new(100.0, 50.0);
        let s = Vect3::new(1000.0, 0.0, 0.0);
        let v = Vect3::new(10.0, 0.0, 0.0);
        assert!(c.conflict_detection(&s, &v, 300.0).is_none());
    }

    #[test]
    fn hazard_zone_is_circle_of_correct_radius() {
        let c = CylinderDetector::new(50.0, 10.0);
        let zone = c.horizontal_hazard_zone(0.5);
        assert!(zone.iter().all(|p| (p.norm() - 50.0).abs() < 1e-9));
    }
}
