use serde_json::{Map, Value};

/// A ring of `[lon, lat]` pairs in degrees. Extra coordinate members (altitude) are dropped.
pub type Ring = Vec<[f64; 2]>;

/// Feature geometry as far as country boundaries are concerned.
///
/// Only Polygon and MultiPolygon are parsed; everything else is carried as
/// `Unsupported` so one odd feature never fails the whole collection.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
    Unsupported { kind: String, reason: Option<String> },
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: FeatureGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug)]
pub enum GeoJsonError {
    Json(serde_json::Error),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::Json(e) => write!(f, "JSON parse error: {e}"),
            GeoJsonError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            GeoJsonError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeoJsonError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl FeatureCollection {
    pub fn from_geojson_slice(payload: &[u8]) -> Result<Self, GeoJsonError> {
        let value: Value = serde_json::from_slice(payload).map_err(GeoJsonError::Json)?;
        Self::from_geojson_value(value)
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        Self::from_geojson_slice(payload.as_bytes())
    }

    pub fn from_geojson_value(value: Value) -> Result<Self, GeoJsonError> {
        let obj = value
            .as_object()
            .ok_or(GeoJsonError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(GeoJsonError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let feat_obj = feat_val.as_object().ok_or(GeoJsonError::InvalidFeature {
                index,
                reason: "feature must be an object".to_string(),
            })?;

            match feat_obj.get("type").and_then(|v| v.as_str()) {
                Some("Feature") => {}
                Some(other) => {
                    return Err(GeoJsonError::InvalidFeature {
                        index,
                        reason: format!("unexpected feature type: {other}"),
                    });
                }
                None => {
                    return Err(GeoJsonError::InvalidFeature {
                        index,
                        reason: "feature missing type".to_string(),
                    });
                }
            }

            let id = match feat_obj.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };

            let properties = feat_obj
                .get("properties")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();

            let geometry = match feat_obj.get("geometry") {
                None | Some(Value::Null) => FeatureGeometry::Null,
                Some(v) => parse_geometry(v),
            };

            features.push(Feature {
                id,
                properties,
                geometry,
            });
        }

        Ok(Self { features })
    }
}

fn parse_geometry(value: &Value) -> FeatureGeometry {
    let Some(obj) = value.as_object() else {
        return unsupported("unknown", "geometry must be an object");
    };
    let Some(ty) = obj.get("type").and_then(|v| v.as_str()) else {
        return unsupported("unknown", "geometry missing type");
    };

    let parsed = match ty {
        "Polygon" => obj
            .get("coordinates")
            .ok_or_else(|| "geometry missing coordinates".to_string())
            .and_then(parse_polygon)
            .map(FeatureGeometry::Polygon),
        "MultiPolygon" => obj
            .get("coordinates")
            .ok_or_else(|| "geometry missing coordinates".to_string())
            .and_then(parse_multi_polygon)
            .map(FeatureGeometry::MultiPolygon),
        other => {
            return FeatureGeometry::Unsupported {
                kind: other.to_string(),
                reason: None,
            };
        }
    };

    parsed.unwrap_or_else(|reason| unsupported(ty, &reason))
}

fn unsupported(kind: &str, reason: &str) -> FeatureGeometry {
    FeatureGeometry::Unsupported {
        kind: kind.to_string(),
        reason: Some(reason.to_string()),
    }
}

fn parse_position(coords: &Value) -> Result<[f64; 2], String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0]
        .as_f64()
        .ok_or("position lon must be a number".to_string())?;
    let lat = arr[1]
        .as_f64()
        .ok_or("position lat must be a number".to_string())?;
    Ok([lon, lat])
}

fn parse_ring(coords: &Value) -> Result<Ring, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array of positions".to_string())?;
    arr.iter().map(parse_position).collect()
}

fn parse_polygon(coords: &Value) -> Result<Vec<Ring>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    rings.iter().map(parse_ring).collect()
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Ring>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    polys.iter().map(parse_polygon).collect()
}

#[cfg(test)]
mod tests {
    use super::{FeatureCollection, FeatureGeometry, GeoJsonError};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_bundled_countries() {
        let payload = include_str!("../../../assets/countries.geojson");
        let fc = FeatureCollection::from_geojson_str(payload).expect("parse collection");
        assert_eq!(fc.features.len(), 8);
        assert!(matches!(fc.features[0].geometry, FeatureGeometry::MultiPolygon(_)));
        assert!(matches!(fc.features[1].geometry, FeatureGeometry::Polygon(_)));
        assert_eq!(fc.features[4].id.as_deref(), Some("EGY"));
        assert_eq!(
            fc.features[6].geometry,
            FeatureGeometry::Unsupported {
                kind: "Point".to_string(),
                reason: None
            }
        );
        assert_eq!(fc.features[7].geometry, FeatureGeometry::Null);
    }

    #[test]
    fn malformed_polygon_is_kept_as_unsupported() {
        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","id":7,"properties":{"name":"Bad"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,"x"],[1,1]]]}}
        ]}"#;
        let fc = FeatureCollection::from_geojson_str(payload).expect("parse collection");
        assert_eq!(fc.features[0].id.as_deref(), Some("7"));
        match &fc.features[0].geometry {
            FeatureGeometry::Unsupported { kind, reason } => {
                assert_eq!(kind, "Polygon");
                assert_eq!(reason.as_deref(), Some("position lat must be a number"));
            }
            other => panic!("unexpected geometry: {other:?}"),
        }
    }

    #[test]
    fn drops_altitude_from_positions() {
        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},
             "geometry":{"type":"Polygon","coordinates":[[[0,0,5],[2,0,5],[1,2,5],[0,0,5]]]}}
        ]}"#;
        let fc = FeatureCollection::from_geojson_str(payload).expect("parse collection");
        assert_eq!(
            fc.features[0].geometry,
            FeatureGeometry::Polygon(vec![vec![[0.0, 0.0], [2.0, 0.0], [1.0, 2.0], [0.0, 0.0]]])
        );
    }

    #[test]
    fn rejects_non_collections() {
        assert!(matches!(
            FeatureCollection::from_geojson_str(r#"{"type":"Feature"}"#),
            Err(GeoJsonError::NotAFeatureCollection)
        ));
        assert!(matches!(
            FeatureCollection::from_geojson_str("not json"),
            Err(GeoJsonError::Json(_))
        ));
        assert!(matches!(
            FeatureCollection::from_geojson_str(r#"{"type":"FeatureCollection","features":[1]}"#),
            Err(GeoJsonError::InvalidFeature { index: 0, .. })
        ));
    }
}
