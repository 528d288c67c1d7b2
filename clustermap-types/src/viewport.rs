use crate::bbox::GeoBounds;
use serde::{Deserialize, Serialize};

/// Settled camera state of a map: visible bounds plus zoom level.
///
/// A viewport is always replaced as a whole; it is never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: GeoBounds,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(bounds: GeoBounds, zoom: f64) -> Self {
        Self { bounds, zoom }
    }

    /// Build a viewport from raw edges, as most map engines report them.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustermap_types::Viewport;
    ///
    /// let vp = Viewport::from_edges(-122.45, 47.48, -122.22, 47.74, 12.3);
    /// assert_eq!(vp.zoom, 12.3);
    /// assert_eq!(vp.bounds.west, -122.45);
    /// ```
    pub fn from_edges(west: f64, south: f64, east: f64, north: f64, zoom: f64) -> Self {
        Self::new(GeoBounds::new(west, south, east, north), zoom)
    }

    /// Bounds and zoom are all finite numbers.
    pub fn is_finite(&self) -> bool {
        self.bounds.is_finite() && self.zoom.is_finite()
    }
}
