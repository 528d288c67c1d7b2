//! Pure computation: projection, validation, clustering and GeoJSON export.

pub mod cluster;
#[cfg(feature = "geojson")]
pub mod geojson;
pub mod projection;
pub mod validation;

pub use cluster::SpatialIndex;
