use std::collections::BTreeMap;

use foundation::bounds::LngLatBounds;
use foundation::math::LatLng;

/// One polygon part of a country boundary: its outer ring in `[lng, lat]` degrees.
///
/// Holes are not kept; the hit-test only consults outer rings.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonPart {
    outer: Vec<[f64; 2]>,
    bounds: LngLatBounds,
}

impl PolygonPart {
    /// Returns `None` for rings with fewer than three vertices or non-finite coordinates.
    pub fn new(outer: Vec<[f64; 2]>) -> Option<Self> {
        if outer.len() < 3 || outer.iter().any(|p| !p[0].is_finite() || !p[1].is_finite()) {
            return None;
        }
        let bounds = LngLatBounds::from_points(&outer)?;
        Some(Self { outer, bounds })
    }

    pub fn outer(&self) -> &[[f64; 2]] {
        &self.outer
    }

    pub fn bounds(&self) -> LngLatBounds {
        self.bounds
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    Parts(Vec<PolygonPart>),
    /// Geometry the containment test cannot use (points, lines, malformed polygons).
    Unsupported(String),
    Empty,
}

impl Boundary {
    pub fn parts(&self) -> &[PolygonPart] {
        match self {
            Boundary::Parts(parts) => parts,
            Boundary::Unsupported(_) | Boundary::Empty => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryRecord {
    pub name: String,
    pub iso_code: String,
    pub centroid: LatLng,
    pub boundary: Boundary,
}

/// Immutable, dataset-ordered set of countries with a case-insensitive name index.
///
/// Ordering contract:
/// - `iter()` yields records in dataset order; the hit-test scans in this order.
/// - When two records share a name, the name index points at the first one.
#[derive(Debug, Clone, Default)]
pub struct CountrySet {
    records: Vec<CountryRecord>,
    by_name: BTreeMap<String, usize>,
    duplicate_names: Vec<String>,
}

impl CountrySet {
    pub fn new(records: Vec<CountryRecord>) -> Self {
        let mut by_name = BTreeMap::new();
        let mut duplicate_names = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let key = name_key(&record.name);
            if by_name.contains_key(&key) {
                duplicate_names.push(record.name.clone());
                continue;
            }
            by_name.insert(key, index);
        }

        Self {
            records,
            by_name,
            duplicate_names,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryRecord> + '_ {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CountryRecord> {
        self.records.get(index)
    }

    /// Names that were shadowed in the index by an earlier record.
    pub fn duplicate_names(&self) -> &[String] {
        &self.duplicate_names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name_key(name)).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&CountryRecord> {
        self.index_of(name).and_then(|i| self.records.get(i))
    }

    /// Hit for a country picked by name, positioned at its centroid.
    pub fn hit_by_name(&self, name: &str) -> Option<CountryHit<'_>> {
        let index = self.index_of(name)?;
        let record = self.records.get(index)?;
        Some(CountryHit::new(index, record, record.centroid))
    }

    pub(crate) fn indexed(&self) -> impl Iterator<Item = (usize, &CountryRecord)> + '_ {
        self.records.iter().enumerate()
    }
}

pub(crate) fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A country resolved from a `CountrySet`, with the coordinate that resolved it.
///
/// Only the set, the hit-test and search produce hits, so anything holding a
/// hit refers to a loaded record.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CountryHit<'a> {
    index: usize,
    record: &'a CountryRecord,
    coordinate: LatLng,
}

impl<'a> CountryHit<'a> {
    pub(crate) fn new(index: usize, record: &'a CountryRecord, coordinate: LatLng) -> Self {
        Self {
            index,
            record,
            coordinate,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn record(&self) -> &'a CountryRecord {
        self.record
    }

    pub fn name(&self) -> &'a str {
        &self.record.name
    }

    pub fn coordinate(&self) -> LatLng {
        self.coordinate
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{Boundary, CountryRecord, PolygonPart};
    use foundation::math::LatLng;

    pub fn rect(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> PolygonPart {
        PolygonPart::new(vec![
            [min_lng, min_lat],
            [max_lng, min_lat],
            [max_lng, max_lat],
            [min_lng, max_lat],
            [min_lng, min_lat],
        ])
        .expect("rect part")
    }

    pub fn country(name: &str, iso: &str, parts: Vec<PolygonPart>) -> CountryRecord {
        let centroid = parts
            .first()
            .map(|p| {
                let b = p.bounds();
                LatLng::new((b.min[1] + b.max[1]) / 2.0, (b.min[0] + b.max[0]) / 2.0)
            })
            .unwrap_or(LatLng::new(0.0, 0.0));
        CountryRecord {
            name: name.to_string(),
            iso_code: iso.to_string(),
            centroid,
            boundary: Boundary::Parts(parts),
        }
    }
}
