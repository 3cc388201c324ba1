/// Axis-aligned bounds in (longitude, latitude) degrees.
///
/// Used as a cheap reject before exact ring containment tests. No antimeridian
/// handling: rings that cross it are expected to be split by the dataset.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LngLatBounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl LngLatBounds {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        LngLatBounds { min, max }
    }

    /// Bounds of a `[lng, lat]` ring; `None` for an empty ring.
    pub fn from_points(points: &[[f64; 2]]) -> Option<Self> {
        let first = points.first()?;
        let mut b = LngLatBounds::new(*first, *first);
        for p in &points[1..] {
            b.min[0] = b.min[0].min(p[0]);
            b.min[1] = b.min[1].min(p[1]);
            b.max[0] = b.max[0].max(p[0]);
            b.max[1] = b.max[1].max(p[1]);
        }
        Some(b)
    }

    /// Inclusive containment.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.min[0] && lng <= self.max[0] && lat >= self.min[1] && lat <= self.max[1]
    }
}

#[cfg(test)]
mod tests {
    use super::LngLatBounds;

    #[test]
    fn bounds_from_ring() {
        let ring = [[10.0, 5.0], [-3.0, 7.5], [4.0, -2.0], [10.0, 5.0]];
        let b = LngLatBounds::from_points(&ring).expect("bounds");
        assert_eq!(b, LngLatBounds::new([-3.0, -2.0], [10.0, 7.5]));
        assert!(b.contains(0.0, 0.0));
        assert!(b.contains(10.0, 7.5));
        assert!(!b.contains(10.1, 0.0));
        assert!(LngLatBounds::from_points(&[]).is_none());
    }
}
