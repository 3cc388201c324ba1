//! Camera targeting and smooth fly-to transitions for the globe view.
//!
//! The camera is described as a point of view above the globe: the
//! coordinate it looks down on plus an altitude in globe radii. Eye positions
//! use the same sphere mapping as the hit-test, so a camera targeting a
//! country's centroid sits directly above the point the hit-test resolves to it.

use foundation::math::{LatLng, Vec3, lng_delta, normalize_lng, to_sphere_point};

use crate::selection::SelectionState;

/// Altitude (in globe radii above the surface) used when flying to a selection.
pub const SELECTION_ALTITUDE: f64 = 1.5;

/// Closest the camera may get to the surface, in globe radii.
pub const MIN_ALTITUDE: f64 = 0.05;

/// Default fly-to duration in seconds.
pub const DEFAULT_TRANSITION_S: f64 = 1.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraPose {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

impl CameraPose {
    pub fn new(lat: f64, lng: f64, altitude: f64) -> Self {
        Self {
            lat: lat.clamp(-90.0, 90.0),
            lng: normalize_lng(lng),
            altitude: altitude.max(MIN_ALTITUDE),
        }
    }

    pub fn looking_at(coordinate: LatLng, altitude: f64) -> Self {
        Self::new(coordinate.lat, coordinate.lng, altitude)
    }

    /// Camera position in the globe's local frame.
    pub fn eye(&self, globe_radius: f64) -> Vec3 {
        to_sphere_point(self.lat, self.lng, globe_radius * (1.0 + self.altitude))
    }

    /// Interpolates toward `to`; longitude follows the shortest arc.
    pub fn lerp(self, to: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            self.lat + (to.lat - self.lat) * t,
            self.lng + lng_delta(self.lng, to.lng) * t,
            self.altitude + (to.altitude - self.altitude) * t,
        )
    }
}

pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let f = -2.0 * t + 2.0;
        1.0 - f * f * f / 2.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraTransition {
    from: CameraPose,
    to: CameraPose,
    duration_s: f64,
    elapsed_s: f64,
}

impl CameraTransition {
    pub fn new(from: CameraPose, to: CameraPose, duration_s: f64) -> Self {
        Self {
            from,
            to,
            duration_s: duration_s.max(0.0),
            elapsed_s: 0.0,
        }
    }

    pub fn target(&self) -> CameraPose {
        self.to
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration_s <= 0.0 {
            return 1.0;
        }
        (self.elapsed_s / self.duration_s).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn pose(&self) -> CameraPose {
        if self.is_finished() {
            return self.to;
        }
        self.from.lerp(self.to, ease_in_out_cubic(self.progress()))
    }

    fn advance(&mut self, dt_s: f64) {
        if dt_s.is_finite() && dt_s > 0.0 {
            self.elapsed_s += dt_s;
        }
    }
}

/// Drives the camera from selection changes.
///
/// Camera targets are recomputed only when the selection revision moves;
/// frames in between just advance the running transition.
#[derive(Debug, Clone)]
pub struct ViewController {
    pose: CameraPose,
    transition: Option<CameraTransition>,
    selection_altitude: f64,
    transition_s: f64,
    synced_revision: u64,
}

impl Default for ViewController {
    fn default() -> Self {
        // Opens over Africa, zoomed out far enough to see the whole hemisphere.
        Self::new(CameraPose::new(5.0, 20.0, 2.5))
    }
}

impl ViewController {
    pub fn new(pose: CameraPose) -> Self {
        Self {
            pose,
            transition: None,
            selection_altitude: SELECTION_ALTITUDE,
            transition_s: DEFAULT_TRANSITION_S,
            synced_revision: 0,
        }
    }

    pub fn with_timing(mut self, selection_altitude: f64, transition_s: f64) -> Self {
        self.selection_altitude = selection_altitude.max(MIN_ALTITUDE);
        self.transition_s = transition_s.max(0.0);
        self
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn transition(&self) -> Option<&CameraTransition> {
        self.transition.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Camera pose that frames the current selection, if any.
    pub fn target_for(&self, selection: &SelectionState) -> Option<CameraPose> {
        selection
            .selected_coordinate()
            .map(|c| CameraPose::looking_at(c, self.selection_altitude))
    }

    /// Starts a transition from wherever the camera currently is.
    pub fn fly_to(&mut self, target: CameraPose, duration_s: f64) {
        let transition = CameraTransition::new(self.pose, target, duration_s);
        if transition.is_finished() {
            self.pose = target;
            self.transition = None;
        } else {
            self.transition = Some(transition);
        }
    }

    /// Reacts to selection changes. Returns `true` if a new transition started.
    ///
    /// Clearing the selection leaves the camera where it is.
    pub fn sync(&mut self, selection: &SelectionState) -> bool {
        if selection.revision() == self.synced_revision {
            return false;
        }
        self.synced_revision = selection.revision();

        let Some(target) = self.target_for(selection) else {
            return false;
        };
        self.fly_to(target, self.transition_s);
        true
    }

    /// Advances the running transition by `dt_s` seconds and returns the new pose.
    pub fn update(&mut self, dt_s: f64) -> CameraPose {
        if let Some(t) = self.transition.as_mut() {
            t.advance(dt_s);
            self.pose = t.pose();
            if t.is_finished() {
                self.transition = None;
            }
        }
        self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraPose, MIN_ALTITUDE, ViewController, ease_in_out_cubic};
    use crate::country::CountrySet;
    use crate::country::fixtures::{country, rect};
    use crate::selection::SelectionState;
    use foundation::math::{sphere_point_to_lat_lng, to_sphere_point};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn easing_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert_close(ease_in_out_cubic(0.5), 0.5, 1e-12);
        assert_eq!(ease_in_out_cubic(-3.0), 0.0);
        assert!(ease_in_out_cubic(0.25) < 0.25);
    }

    #[test]
    fn pose_is_clamped_and_wrapped() {
        let p = CameraPose::new(120.0, 190.0, -1.0);
        assert_eq!(p.lat, 90.0);
        assert_close(p.lng, -170.0, 1e-12);
        assert_eq!(p.altitude, MIN_ALTITUDE);
    }

    #[test]
    fn eye_sits_above_the_target() {
        let pose = CameraPose::new(35.0, 139.0, 1.5);
        let eye = pose.eye(100.0);
        assert_close(eye.length(), 250.0, 1e-9);
        let ll = sphere_point_to_lat_lng(eye).expect("ll");
        assert_close(ll.lat, 35.0, 1e-9);
        assert_close(ll.lng, 139.0, 1e-9);
    }

    #[test]
    fn lerp_crosses_the_antimeridian() {
        let a = CameraPose::new(0.0, 170.0, 1.0);
        let b = CameraPose::new(0.0, -170.0, 1.0);
        let mid = a.lerp(b, 0.5);
        assert_close(mid.lng.abs(), 180.0, 1e-9);
        let quarter = a.lerp(b, 0.25);
        assert_close(quarter.lng, 175.0, 1e-9);
    }

    #[test]
    fn sync_flies_to_selection_once_per_change() {
        let set = CountrySet::new(vec![country("Freedonia", "FD", vec![rect(0.0, 0.0, 10.0, 10.0)])]);
        let mut selection = SelectionState::new();
        let mut view = ViewController::default();
        let start = view.pose();

        assert!(!view.sync(&selection));

        selection.select(set.hit_by_name("Freedonia").expect("hit"));
        assert!(view.sync(&selection));
        assert!(view.is_animating());
        assert!(!view.sync(&selection));

        let halfway = view.update(0.5);
        assert!(halfway != start);
        let end = view.update(0.6);
        assert!(!view.is_animating());
        assert_eq!(end, CameraPose::new(5.0, 5.0, super::SELECTION_ALTITUDE));

        // Dismissing keeps the camera in place.
        selection.clear();
        assert!(!view.sync(&selection));
        assert_eq!(view.update(1.0), end);
    }

    #[test]
    fn zero_duration_jumps_and_bad_dt_is_ignored() {
        let mut view = ViewController::default().with_timing(1.0, 0.0);
        let target = CameraPose::new(-10.0, 40.0, 1.0);
        view.fly_to(target, 0.0);
        assert!(!view.is_animating());
        assert_eq!(view.pose(), target);

        view.fly_to(CameraPose::new(10.0, 40.0, 1.0), 2.0);
        let before = view.update(f64::NAN);
        assert_eq!(before, target);
        view.update(-1.0);
        assert!(view.is_animating());
    }

    #[test]
    fn transition_lands_on_sphere_point_of_target() {
        let mut view = ViewController::default();
        view.fly_to(CameraPose::new(48.0, 2.0, 1.0), 1.0);
        let pose = view.update(5.0);
        let eye = pose.eye(1.0);
        let expected = to_sphere_point(48.0, 2.0, 2.0);
        assert_close(eye.x, expected.x, 1e-12);
        assert_close(eye.y, expected.y, 1e-12);
        assert_close(eye.z, expected.z, 1e-12);
    }
}
