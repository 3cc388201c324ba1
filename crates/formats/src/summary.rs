use foundation::math::LatLng;
use scene::{CameraPose, CountryRecord, SearchMatch};
use serde::{Deserialize, Serialize};

/// JSON shape of a coordinate: `{ "lat": .., "lng": .. }`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl From<LatLng> for Coordinate {
    fn from(ll: LatLng) -> Self {
        Self {
            lat: ll.lat,
            lng: ll.lng,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSummary {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

impl From<CameraPose> for CameraSummary {
    fn from(pose: CameraPose) -> Self {
        Self {
            lat: pose.lat,
            lng: pose.lng,
            altitude: pose.altitude,
        }
    }
}

/// Country as exposed to clients (no boundary geometry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountrySummary {
    pub name: String,
    pub iso_code: String,
    pub centroid: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraSummary>,
}

impl CountrySummary {
    pub fn from_record(record: &CountryRecord) -> Self {
        Self {
            name: record.name.clone(),
            iso_code: record.iso_code.clone(),
            centroid: record.centroid.into(),
            camera: None,
        }
    }

    pub fn with_camera(mut self, pose: CameraPose) -> Self {
        self.camera = Some(pose.into());
        self
    }
}

impl From<&SearchMatch<'_>> for CountrySummary {
    fn from(m: &SearchMatch<'_>) -> Self {
        Self::from_record(m.hit.record())
    }
}
