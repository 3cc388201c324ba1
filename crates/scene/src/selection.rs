use foundation::math::LatLng;

use crate::country::{CountryHit, CountryRecord, CountrySet};

/// Current country selection.
///
/// Writers: `select` takes a `CountryHit`, which only the country set, the
/// hit-test and search can produce, so a non-empty selection always names a
/// loaded record.
///
/// The dataset index of the hit is kept next to the name, so a record that
/// shares its name with an earlier one stays distinguishable.
///
/// `revision()` increases on every change and lets views recompute derived
/// state (camera targets) only when the selection actually moved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    name: Option<String>,
    index: Option<usize>,
    coordinate: Option<LatLng>,
    revision: u64,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.index
    }

    pub fn selected_coordinate(&self) -> Option<LatLng> {
        self.coordinate
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    /// Returns `true` if the selection changed.
    pub fn select(&mut self, hit: CountryHit<'_>) -> bool {
        let coordinate = hit.coordinate();
        if self.index == Some(hit.index())
            && self.name.as_deref() == Some(hit.name())
            && self.coordinate == Some(coordinate)
        {
            return false;
        }
        self.name = Some(hit.name().to_string());
        self.index = Some(hit.index());
        self.coordinate = Some(coordinate);
        self.revision += 1;
        true
    }

    /// Dismisses the selection. Returns `true` if anything was selected.
    pub fn clear(&mut self) -> bool {
        if self.name.is_none() {
            return false;
        }
        self.name = None;
        self.index = None;
        self.coordinate = None;
        self.revision += 1;
        true
    }

    /// The selected record, by index when it still carries the selected name.
    pub fn selected_record<'a>(&self, set: &'a CountrySet) -> Option<&'a CountryRecord> {
        let name = self.name.as_deref()?;
        self.index
            .and_then(|i| set.get(i))
            .filter(|record| record.name == name)
            .or_else(|| set.by_name(name))
    }

    /// Drops the selection if its country is missing from a freshly loaded set.
    ///
    /// A country that moved within the dataset keeps its selection and its
    /// index follows the record. Returns `true` if the selection was cleared.
    pub fn retain_in(&mut self, set: &CountrySet) -> bool {
        let Some(name) = self.name.as_deref() else {
            return false;
        };
        let still_there = self
            .index
            .and_then(|i| set.get(i))
            .is_some_and(|record| record.name == name);
        if still_there {
            return false;
        }
        match set.index_of(name) {
            Some(index) => {
                self.index = Some(index);
                false
            }
            None => self.clear(),
        }
    }
}
