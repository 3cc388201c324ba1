use foundation::math::{LatLng, StableF64, normalize_lng};
use scene::{Boundary, CountryRecord, CountrySet, PolygonPart};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::geojson::{Feature, FeatureCollection, FeatureGeometry, Ring};

/// Property keys consulted for the display name, in order.
pub const NAME_KEYS: &[&str] = &["ADMIN", "NAME", "NAME_LONG", "name", "admin"];

/// Property keys consulted for the ISO code, in order. Natural Earth uses `-99` for "none".
pub const ISO_KEYS: &[&str] = &["ISO_A2", "ISO_A2_EH", "iso_a2", "ISO_A3", "iso_a3"];

const LABEL_KEYS: &[(&str, &str)] = &[("LABEL_Y", "LABEL_X"), ("label_y", "label_x")];

/// Derives country records from a boundary collection, in dataset order.
///
/// Features without a usable name are skipped. Geometry problems never skip a
/// feature: the record keeps an `Unsupported`/`Empty` boundary instead.
pub fn countries_from_collection(collection: &FeatureCollection) -> CountrySet {
    let mut records = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.iter().enumerate() {
        match country_from_feature(feature) {
            Some(record) => records.push(record),
            None => warn!("skipping feature {index}: no name property"),
        }
    }

    let set = CountrySet::new(records);
    for name in set.duplicate_names() {
        warn!("duplicate country name {name:?}; name lookups resolve to the first record");
    }
    set
}

pub fn country_from_feature(feature: &Feature) -> Option<CountryRecord> {
    let name = first_string(&feature.properties, NAME_KEYS)?;
    let iso_code = first_string(&feature.properties, ISO_KEYS)
        .or_else(|| feature.id.clone().filter(|id| is_usable(id)))
        .unwrap_or_default();
    let boundary = boundary_from_geometry(&name, &feature.geometry);
    let centroid = label_point(&feature.properties).unwrap_or_else(|| boundary_centroid(&boundary));

    Some(CountryRecord {
        name,
        iso_code,
        centroid,
        boundary,
    })
}

fn is_usable(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s != "-99"
}

fn first_string(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| props.get(*k).and_then(|v| v.as_str()))
        .find(|s| is_usable(s))
        .map(|s| s.trim().to_string())
}

fn label_point(props: &Map<String, Value>) -> Option<LatLng> {
    LABEL_KEYS.iter().find_map(|(lat_key, lng_key)| {
        let lat = props.get(*lat_key)?.as_f64()?;
        let lng = props.get(*lng_key)?.as_f64()?;
        let ll = LatLng::new(lat, normalize_lng(lng));
        (ll.is_finite() && (-90.0..=90.0).contains(&lat)).then_some(ll)
    })
}

fn boundary_from_geometry(name: &str, geometry: &FeatureGeometry) -> Boundary {
    let polygons: Vec<&Vec<Ring>> = match geometry {
        FeatureGeometry::Polygon(rings) => vec![rings],
        FeatureGeometry::MultiPolygon(polys) => polys.iter().collect(),
        FeatureGeometry::Unsupported { kind, reason } => {
            match reason {
                Some(reason) => warn!("{name}: unusable {kind} geometry: {reason}"),
                None => debug!("{name}: {kind} geometry is not a boundary"),
            }
            return Boundary::Unsupported(kind.clone());
        }
        FeatureGeometry::Null => return Boundary::Empty,
    };

    let mut parts = Vec::with_capacity(polygons.len());
    for rings in polygons {
        // Outer ring only; holes are not consulted by the hit-test.
        let Some(outer) = rings.first() else {
            continue;
        };
        match PolygonPart::new(outer.clone()) {
            Some(part) => parts.push(part),
            None => debug!("{name}: dropping degenerate ring ({} vertices)", outer.len()),
        }
    }

    if parts.is_empty() {
        warn!("{name}: polygon geometry has no usable outer ring");
        return Boundary::Unsupported("Polygon".to_string());
    }
    Boundary::Parts(parts)
}

/// Area-weighted centroid of the largest outer ring, `(0, 0)` with no geometry.
fn boundary_centroid(boundary: &Boundary) -> LatLng {
    let largest = boundary
        .parts()
        .iter()
        .map(|p| (StableF64(ring_area(p.outer()).abs()), p.outer()))
        .max_by_key(|(area, _)| *area);

    match largest {
        Some((_, ring)) => ring_centroid(ring),
        None => LatLng::new(0.0, 0.0),
    }
}

/// Signed shoelace area in square degrees; works for closed and open rings.
fn ring_area(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    let mut twice = 0.0;
    for i in 0..n {
        let [x0, y0] = ring[i];
        let [x1, y1] = ring[(i + 1) % n];
        twice += x0 * y1 - x1 * y0;
    }
    twice / 2.0
}

fn ring_centroid(ring: &[[f64; 2]]) -> LatLng {
    let n = ring.len();
    let area = ring_area(ring);
    if area.abs() < 1e-12 {
        let (sx, sy) = ring
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
        return LatLng::new(sy / n as f64, normalize_lng(sx / n as f64));
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let [x0, y0] = ring[i];
        let [x1, y1] = ring[(i + 1) % n];
        let cross = x0 * y1 - x1 * y0;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    let k = 1.0 / (6.0 * area);
    LatLng::new(cy * k, normalize_lng(cx * k))
}
