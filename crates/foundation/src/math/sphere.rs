//! Globe-local sphere <-> geographic mapping.
//!
//! Convention (shared with the globe mesh and the camera):
//! - polar angle `phi = 90° - lat`, azimuth `theta = lng + 180°`
//! - `x = -r sin(phi) cos(theta)`, `y = r cos(phi)`, `z = r sin(phi) sin(theta)`
//!
//! `sphere_point_to_lat_lng` is the exact inverse of `to_sphere_point`, so a
//! coordinate survives the round trip within floating-point tolerance.

use super::Vec3;

/// Geographic coordinate in degrees. Longitude is kept in `[-180, 180)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Wraps a longitude in degrees into `[-180, 180)`.
pub fn normalize_lng(lng_deg: f64) -> f64 {
    if (-180.0..180.0).contains(&lng_deg) {
        return lng_deg;
    }
    let wrapped = (lng_deg + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid rounds tiny negative inputs up to exactly 360.
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Signed shortest-arc longitude difference `to - from`, in `[-180, 180)`.
pub fn lng_delta(from_deg: f64, to_deg: f64) -> f64 {
    normalize_lng(to_deg - from_deg)
}

/// Places `(lat, lng)` on a sphere of the given radius in the globe's local frame.
pub fn to_sphere_point(lat_deg: f64, lng_deg: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - lat_deg).to_radians();
    let theta = (lng_deg + 180.0).to_radians();
    let sin_phi = phi.sin();

    Vec3::new(
        -(radius * sin_phi * theta.cos()),
        radius * phi.cos(),
        radius * sin_phi * theta.sin(),
    )
}

/// Recovers the geographic coordinate under a point in the globe's local frame.
///
/// The point is normalized first, so anything along the same ray from the
/// center resolves to the same coordinate. Returns `None` for the zero vector
/// and non-finite input.
pub fn sphere_point_to_lat_lng(point: Vec3) -> Option<LatLng> {
    let n = point.normalize()?;
    let lat = n.y.clamp(-1.0, 1.0).asin().to_degrees();
    let theta = n.z.atan2(-n.x).to_degrees();
    Some(LatLng::new(lat, normalize_lng(theta - 180.0)))
}
