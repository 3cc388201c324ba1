use foundation::math::Vec3;

use crate::camera::ViewController;
use crate::country::{CountryHit, CountrySet};
use crate::hit_test::locate_country;
use crate::selection::SelectionState;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

/// Per-session client state, passed explicitly to everything that reads or
/// writes it.
#[derive(Debug, Clone, Default)]
pub struct GlobeContext {
    pub theme: Theme,
    pub selection: SelectionState,
    pub view: ViewController,
}

impl GlobeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggle();
        self.theme
    }

    /// Click path: hit-tests `point` (globe-local frame) and selects the country under it.
    ///
    /// A miss leaves the context untouched and returns `None`.
    pub fn select_at_point<'a>(&mut self, set: &'a CountrySet, point: Vec3) -> Option<CountryHit<'a>> {
        let hit = locate_country(set, point)?;
        self.apply(hit);
        Some(hit)
    }

    /// Search path: selects a hit produced by `search_countries` or `CountrySet::hit_by_name`.
    pub fn select_hit(&mut self, hit: CountryHit<'_>) {
        self.apply(hit);
    }

    /// Closes the detail panel.
    pub fn dismiss(&mut self) {
        self.selection.clear();
        self.view.sync(&self.selection);
    }

    /// Re-checks the selection against a reloaded dataset.
    pub fn on_dataset_reloaded(&mut self, set: &CountrySet) {
        if self.selection.retain_in(set) {
            self.view.sync(&self.selection);
        }
    }

    fn apply(&mut self, hit: CountryHit<'_>) {
        if self.selection.select(hit) {
            self.view.sync(&self.selection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GlobeContext, Theme};
    use crate::camera::SELECTION_ALTITUDE;
    use crate::country::CountrySet;
    use crate::country::fixtures::{country, rect};
    use crate::search::search_countries;
    use foundation::math::to_sphere_point;

    fn set() -> CountrySet {
        CountrySet::new(vec![
            country("Freedonia", "FD", vec![rect(0.0, 0.0, 10.0, 10.0)]),
            country("Sylvania", "SY", vec![rect(20.0, 0.0, 30.0, 10.0)]),
        ])
    }

    #[test]
    fn theme_toggles() {
        let mut ctx = GlobeContext::new();
        assert_eq!(ctx.theme, Theme::Dark);
        assert_eq!(ctx.toggle_theme(), Theme::Light);
        assert_eq!(ctx.toggle_theme().as_str(), "dark");
    }

    #[test]
    fn click_selects_and_starts_camera_flight() {
        let set = set();
        let mut ctx = GlobeContext::new();
        let hit = ctx
            .select_at_point(&set, to_sphere_point(2.0, 3.0, 1.0))
            .expect("hit");
        assert_eq!(hit.name(), "Freedonia");
        assert_eq!(ctx.selection.selected_name(), Some("Freedonia"));
        assert!(ctx.view.is_animating());

        let target = ctx.view.transition().expect("transition").target();
        assert!((target.lat - 2.0).abs() < 1e-9);
        assert!((target.lng - 3.0).abs() < 1e-9);
        assert_eq!(target.altitude, SELECTION_ALTITUDE);
    }

    #[test]
    fn ocean_click_is_a_no_op() {
        let set = set();
        let mut ctx = GlobeContext::new();
        ctx.select_hit(set.hit_by_name("Sylvania").expect("hit"));
        let revision = ctx.selection.revision();

        assert!(ctx.select_at_point(&set, to_sphere_point(0.0, -140.0, 1.0)).is_none());
        assert_eq!(ctx.selection.selected_name(), Some("Sylvania"));
        assert_eq!(ctx.selection.revision(), revision);
    }

    #[test]
    fn search_selection_bypasses_hit_test_and_dismiss_clears() {
        let set = set();
        let mut ctx = GlobeContext::new();
        let found = search_countries(&set, "syl", 5);
        ctx.select_hit(found[0].hit);
        assert_eq!(ctx.selection.selected_name(), Some("Sylvania"));

        ctx.dismiss();
        assert!(ctx.selection.is_empty());
    }

    #[test]
    fn reload_drops_vanished_selection() {
        let mut ctx = GlobeContext::new();
        ctx.select_hit(set().hit_by_name("Sylvania").expect("hit"));
        let reloaded = CountrySet::new(vec![country("Freedonia", "FD", vec![rect(0.0, 0.0, 1.0, 1.0)])]);
        ctx.on_dataset_reloaded(&reloaded);
        assert!(ctx.selection.is_empty());
    }
}
