//! 2-D/3-D vector algebra, angle arithmetic, and the ownship-centered
//! geodetic-to-Euclidean projection (component C1 of the design).
//!
//! Generalizes a point-pair haversine/`modulo` helper into full vector
//! algebra and an ownship-centered local tangent-plane projection.

use serde::{Deserialize, Serialize};

/// Mean earth radius in meters, used by the local tangent-plane projection.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Beyond this distance from the ownship, the local tangent-plane projection
/// starts to accumulate meaningful error; traffic past it still gets a
/// (degraded) projected position, but callers are warned (§4.1, Open Question a).
pub const PROJECTION_ACCURACY_RADIUS_M: f64 = 350_000.0;

/// A 2-D vector (east, north) in meters or meters/second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vect2 {
    pub x: f64,
    pub y: f64,
}

impl Vect2 {
    pub const ZERO: Vect2 = Vect2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vect2 { x, y }
    }

    pub fn add(&self, o: &Vect2) -> Vect2 {
        Vect2::new(self.x + o.x, self.y + o.y)
    }

    pub fn sub(&self, o: &Vect2) -> Vect2 {
        Vect2::new(self.x - o.x, self.y - o.y)
    }

    pub fn scal(&self, k: f64) -> Vect2 {
        Vect2::new(self.x * k, self.y * k)
    }

    /// `self + k * o`
    pub fn scal_add(&self, k: f64, o: &Vect2) -> Vect2 {
        Vect2::new(self.x + k * o.x, self.y + k * o.y)
    }

    pub fn dot(&self, o: &Vect2) -> f64 {
        self.x * o.x + self.y * o.y
    }

    /// 2-D cross product (determinant); sign is the geometric core of εH.
    pub fn det(&self, o: &Vect2) -> f64 {
        self.x * o.y - self.y * o.x
    }

    pub fn sq(&self) -> f64 {
        self.dot(self)
    }

    pub fn norm(&self) -> f64 {
        sqrt_safe(self.sq())
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn track_rad(&self) -> f64 {
        to_2pi_rad(self.x.atan2(self.y))
    }
}

/// A 3-D vector (east, north, up) in meters or meters/second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vect3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vect3 {
    pub const ZERO: Vect3 = Vect3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vect3 { x, y, z }
    }

    pub fn add(&self, o: &Vect3) -> Vect3 {
        Vect3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    pub fn sub(&self, o: &Vect3) -> Vect3 {
        Vect3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    pub fn scal(&self, k: f64) -> Vect3 {
        Vect3::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn scal_add(&self, k: f64, o: &Vect3) -> Vect3 {
        Vect3::new(self.x + k * o.x, self.y + k * o.y, self.z + k * o.z)
    }

    pub fn dot(&self, o: &Vect3) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn sq(&self) -> f64 {
        self.dot(self)
    }

    pub fn norm(&self) -> f64 {
        sqrt_safe(self.sq())
    }

    pub fn vect2(&self) -> Vect2 {
        Vect2::new(self.x, self.y)
    }

    pub fn with_vect2(v2: Vect2, z: f64) -> Vect3 {
        Vect3::new(v2.x, v2.y, z)
    }
}

/// `sqrt` that never returns `NaN` for small negative inputs caused by
/// floating-point cancellation (e.g. `norm()` of a vector that is
/// mathematically zero but numerically `-1e-18`).
pub fn sqrt_safe(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        libm::sqrt(x)
    }
}

/// `asin` clamped to a valid domain, for the same reason as [`sqrt_safe`].
pub fn asin_safe(x: f64) -> f64 {
    libm::asin(x.clamp(-1.0, 1.0))
}

/// Reduces an angle in radians to `[0, 2*PI)`.
pub fn to_2pi_rad(rad: f64) -> f64 {
    modulo(rad, std::f64::consts::TAU)
}

/// Reduces an angle in radians to `(-PI, PI]`.
pub fn to_pi_rad(rad: f64) -> f64 {
    let r = to_2pi_rad(rad);
    if r > std::f64::consts::PI {
        r - std::f64::consts::TAU
    } else {
        r
    }
}

/// Euclidean (non-negative-result) modulo, matching the sign convention the
/// teacher's `decode/cpr.rs::modulo` documents: "the sign of the result
/// matches the sign of the dividend" in plain `%`, which this corrects.
pub fn modulo(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return a;
    }
    let r = a % b;
    if r < 0.0 {
        r + b.abs()
    } else {
        r
    }
}

/// Signed circular distance from `a` to `b`, both radians, wrapped to
/// `(-PI, PI]`: positive means `b` is reached by increasing `a`.
pub fn circular_distance(a: f64, b: f64) -> f64 {
    to_pi_rad(b - a)
}

/// Time at which the relative position `s + t*v` has minimum norm, or `0.0`
/// if `v` is (numerically) stationary — the closing geometry never changes so
/// "now" is as good a time as any to evaluate it.
pub fn tcpa2(s: &Vect2, v: &Vect2) -> f64 {
    let vv = v.sq();
    if vv <= 1e-12 {
        0.0
    } else {
        -s.dot(v) / vv
    }
}

pub fn tcpa3(s: &Vect3, v: &Vect3) -> f64 {
    let v2 = v.vect2();
    if v2.sq() <= 1e-12 {
        0.0
    } else {
        tcpa2(&s.vect2(), &v2)
    }
}

/// Horizontal miss distance: the norm of the relative position at the time
/// of closest approach (clamped to `t >= 0`, since a DAA system only cares
/// about the future).
pub fn horizontal_miss_distance(s: &Vect2, v: &Vect2) -> f64 {
    let t = tcpa2(s, v).max(0.0);
    s.scal_add(t, v).norm()
}

/// Point-in-polygon test for a simple, counter-clockwise-oriented polygon
/// (§4.1, §4.2 `horizontalContours`/`horizontalHazardZone` consumers).
/// Uses the standard ray-casting parity test.
pub fn point_in_polygon(point: Vect2, polygon: &[Vect2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let n = polygon.len();
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        let intersects = ((pi.y > point.y) != (pj.y > point.y))
            && (point.x
                < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x);
        if intersects {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// A geodetic position (degrees, meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLonAlt {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

/// The ownship-centered local tangent-plane projection used to turn every
/// traffic aircraft's geodetic state into the Euclidean frame the rest of the
/// engine works in (§4.1). An equirectangular (orthographic-at-the-pole)
/// approximation, good to well under a meter within
/// [`PROJECTION_ACCURACY_RADIUS_M`] of the origin.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    lat0_rad: f64,
    lon0_rad: f64,
    cos_lat0: f64,
}

impl Projection {
    pub fn new(origin: LatLonAlt) -> Self {
        let lat0_rad = origin.lat.to_radians();
        Projection {
            lat0_rad,
            lon0_rad: origin.lon.to_radians(),
            cos_lat0: lat0_rad.cos(),
        }
    }

    /// Projects a geodetic position to the local `(east, north, up)` frame,
    /// returning the Euclidean position together with the great-circle
    /// distance from the origin (used by callers to raise
    /// [`PROJECTION_ACCURACY_RADIUS_M`] warnings).
    pub fn project(&self, p: LatLonAlt) -> (Vect3, f64) {
        let lat_rad = p.lat.to_radians();
        let lon_rad = p.lon.to_radians();
        let dlat = lat_rad - self.lat0_rad;
        let dlon = lon_rad - self.lon0_rad;
        let x = dlon * self.cos_lat0 * EARTH_RADIUS_M;
        let y = dlat * EARTH_RADIUS_M;
        let distance = haversine_m(self.lat0_rad, self.lon0_rad, lat_rad, lon_rad);
        (Vect3::new(x, y, p.alt), distance)
    }

    /// Ground velocity does not need re-projecting beyond the same linear
    /// east/north scaling (the tangent plane is locally orthonormal).
    pub fn project_velocity(&self, v: Vect3) -> Vect3 {
        v
    }
}

fn haversine_m(lat1_rad: f64, lon1_rad: f64, lat2_rad: f64, lon2_rad: f64) -> f64 {
    let d_lat = lat2_rad - lat1_rad;
    let d_lon = lon2_rad - lon1_rad;
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * asin_safe(sqrt_safe(a));
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn modulo_matches_euclidean_convention() {
        assert_relative_eq!(modulo(-1.0, 60.0), 59.0);
        assert_relative_eq!(modulo(61.0, 60.0), 1.0);
        assert_relative_eq!(modulo(0.0, 60.0), 0.0);
    }

    #[test]
    fn det_sign_matches_orientation() {
        let s = Vect2::new(1.0, 0.0);
        let v = Vect2::new(0.0, 1.0);
        assert!(s.det(&v) > 0.0);
        assert!(v.det(&s) < 0.0);
    }

    #[test]
    fn tcpa_of_closing_traffic_is_positive() {
        // Relative position 10 east, closing at 1 m/s west.
        let s = Vect2::new(10.0, 0.0);
        let v = Vect2::new(-1.0, 0.0);
        assert_relative_eq!(tcpa2(&s, &v), 10.0);
        assert_relative_eq!(horizontal_miss_distance(&s, &v), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn tcpa_of_receding_traffic_is_clamped_by_caller() {
        let s = Vect2::new(10.0, 0.0);
        let v = Vect2::new(1.0, 0.0);
        assert!(tcpa2(&s, &v) < 0.0);
    }

    #[test]
    fn point_in_polygon_ccw_square() {
        let square = [
            Vect2::new(0.0, 0.0),
            Vect2::new(0.0, 10.0),
            Vect2::new(10.0, 10.0),
            Vect2::new(10.0, 0.0),
        ];
        assert!(point_in_polygon(Vect2::new(5.0, 5.0), &square));
        assert!(!point_in_polygon(Vect2::new(15.0, 5.0), &square));
    }

    #[test]
    fn projection_round_trips_near_origin() {
        let origin = LatLonAlt { lat: 40.0, lon: -3.0, alt: 0.0 };
        let proj = Projection::new(origin);
        let (v, dist) = proj.project(LatLonAlt { lat: 40.0, lon: -3.0, alt: 100.0 });
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(v.z, 100.0);
        assert_relative_eq!(dist, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn projection_accuracy_radius_flags_far_traffic() {
        let origin = LatLonAlt { lat: 0.0, lon: 0.0, alt: 0.0 };
        let proj = Projection::new(origin);
        let (_, dist) = proj.project(LatLonAlt { lat: 10.0, lon: 0.0, alt: 0.0 });
        assert!(dist > PROJECTION_ACCURACY_RADIUS_M);
    }
}
