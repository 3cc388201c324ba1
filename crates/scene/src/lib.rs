pub mod camera;
pub mod context;
pub mod country;
pub mod search;
pub mod selection;

pub use camera::{CameraPose, CameraTransition, ViewController};
pub use context::{GlobeContext, Theme};
pub use country::*;
pub use hit_test::{locate_country, locate_lat_lng};
pub use search::{MatchKind, SearchMatch, search_countries};
pub use selection::SelectionState;
