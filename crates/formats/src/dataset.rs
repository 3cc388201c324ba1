use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use scene::CountrySet;
use tracing::{debug, info};

use crate::countries::countries_from_collection;
use crate::geojson::{FeatureCollection, GeoJsonError};

/// Content hash (blake3, hex) of a raw boundary dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetFingerprint(String);

impl DatasetFingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DatasetFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
pub enum CountryLoadError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(GeoJsonError),
}

impl std::fmt::Display for CountryLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountryLoadError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            CountryLoadError::Parse(e) => write!(f, "country dataset error: {e}"),
        }
    }
}

impl std::error::Error for CountryLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CountryLoadError::Io { source, .. } => Some(source),
            CountryLoadError::Parse(e) => Some(e),
        }
    }
}

/// The loaded country set together with the fingerprint it was built from.
///
/// Reloads rebuild the set only when the dataset bytes changed; readers keep
/// whatever `Arc<CountrySet>` they already hold.
#[derive(Debug, Clone)]
pub struct CountryCatalog {
    fingerprint: DatasetFingerprint,
    countries: Arc<CountrySet>,
}

impl CountryCatalog {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CountryLoadError> {
        Self::build(DatasetFingerprint::of(bytes), bytes)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CountryLoadError> {
        Self::from_bytes(&read(path.as_ref())?)
    }

    fn build(fingerprint: DatasetFingerprint, bytes: &[u8]) -> Result<Self, CountryLoadError> {
        let countries = parse_countries(bytes)?;
        info!(
            "loaded {} countries (fingerprint {})",
            countries.len(),
            &fingerprint.as_str()[..12]
        );
        Ok(Self {
            fingerprint,
            countries: Arc::new(countries),
        })
    }

    pub fn fingerprint(&self) -> &DatasetFingerprint {
        &self.fingerprint
    }

    pub fn countries(&self) -> Arc<CountrySet> {
        Arc::clone(&self.countries)
    }

    /// Swaps in a catalog built elsewhere (typically outside a lock).
    ///
    /// Returns `true` if the fingerprint changed; an identical dataset leaves
    /// the current `Arc<CountrySet>` in place.
    pub fn replace_with(&mut self, next: CountryCatalog) -> bool {
        if next.fingerprint == self.fingerprint {
            debug!("country dataset unchanged; keeping current set");
            return false;
        }
        info!(
            "country dataset changed ({} -> {})",
            &self.fingerprint.as_str()[..12],
            &next.fingerprint.as_str()[..12]
        );
        *self = next;
        true
    }

    /// Returns `Ok(true)` if the dataset changed and the set was rebuilt.
    ///
    /// On a parse error the current set is kept.
    pub fn reload_from_bytes(&mut self, bytes: &[u8]) -> Result<bool, CountryLoadError> {
        let fingerprint = DatasetFingerprint::of(bytes);
        if fingerprint == self.fingerprint {
            debug!("country dataset unchanged; keeping current set");
            return Ok(false);
        }
        let next = Self::build(fingerprint, bytes)?;
        Ok(self.replace_with(next))
    }

    pub fn reload_from_path(&mut self, path: impl AsRef<Path>) -> Result<bool, CountryLoadError> {
        self.reload_from_bytes(&read(path.as_ref())?)
    }
}

fn read(path: &Path) -> Result<Vec<u8>, CountryLoadError> {
    fs::read(path).map_err(|source| CountryLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_countries(bytes: &[u8]) -> Result<CountrySet, CountryLoadError> {
    let collection = FeatureCollection::from_geojson_slice(bytes).map_err(CountryLoadError::Parse)?;
    Ok(countries_from_collection(&collection))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{CountryCatalog, CountryLoadError, DatasetFingerprint};

    const BUNDLED: &str = include_str!("../../../assets/countries.geojson");

    const TINY: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"ADMIN":"Freedonia","ISO_A2":"FD"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}
    ]}"#;

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = DatasetFingerprint::of(b"abc");
        let b = DatasetFingerprint::of(b"abc");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_ne!(a, DatasetFingerprint::of(b"abd"));
    }

    #[test]
    fn loads_from_disk_and_reloads_only_on_change() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("countries.geojson");
        std::fs::write(&path, BUNDLED).expect("write");

        let mut catalog = CountryCatalog::load(&path).expect("load");
        assert_eq!(catalog.countries().len(), 8);
        let before = catalog.countries();

        assert!(!catalog.reload_from_path(&path).expect("reload"));
        assert!(Arc::ptr_eq(&before, &catalog.countries()));

        std::fs::write(&path, TINY).expect("rewrite");
        assert!(catalog.reload_from_path(&path).expect("reload"));
        assert_eq!(catalog.countries().len(), 1);
        // Earlier readers keep their snapshot.
        assert_eq!(before.len(), 8);
    }

    #[test]
    fn failed_reload_keeps_current_set() {
        let mut catalog = CountryCatalog::from_bytes(TINY.as_bytes()).expect("load");
        let fp = catalog.fingerprint().clone();
        let err = catalog.reload_from_bytes(b"{").expect_err("bad json");
        assert!(matches!(err, CountryLoadError::Parse(_)));
        assert_eq!(catalog.fingerprint(), &fp);
        assert_eq!(catalog.countries().len(), 1);
    }

    #[test]
    fn replace_with_swaps_only_on_a_new_fingerprint() {
        let mut catalog = CountryCatalog::from_bytes(TINY.as_bytes()).expect("load");
        let before = catalog.countries();

        let same = CountryCatalog::from_bytes(TINY.as_bytes()).expect("same");
        assert!(!catalog.replace_with(same));
        assert!(Arc::ptr_eq(&before, &catalog.countries()));

        let next = CountryCatalog::from_bytes(BUNDLED.as_bytes()).expect("bundled");
        let fp = next.fingerprint().clone();
        assert!(catalog.replace_with(next));
        assert_eq!(catalog.fingerprint(), &fp);
        assert_eq!(catalog.countries().len(), 8);
        assert_eq!(before.len(), 1);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CountryCatalog::load("/definitely/not/here.geojson").expect_err("missing");
        assert!(err.to_string().contains("/definitely/not/here.geojson"));
    }
}
