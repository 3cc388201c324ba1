pub mod countries;
pub mod dataset;
pub mod geojson;
pub mod summary;

pub use countries::*;
pub use dataset::*;
pub use geojson::*;
pub use summary::*;
