//! Cluster query engine: one built index per point set, queried per viewport.

use crate::compute::SpatialIndex;
use crate::compute::validation::DataQualityReport;
use crate::config::ClusterConfig;
use crate::display::DisplayItem;
use crate::error::Result;
use clustermap_types::{PointRecord, Viewport};
use std::sync::Arc;

/// Holds the index for the current point set and answers viewport queries.
///
/// The index is rebuilt only when a *different* point set (by `Arc`
/// identity) is supplied; handing the same set back is free.
#[derive(Debug)]
pub struct ClusterEngine {
    config: ClusterConfig,
    index: SpatialIndex,
}

impl ClusterEngine {
    /// Build the engine and its index.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustermap::{ClusterConfig, ClusterEngine};
    /// use clustermap_types::{PointRecord, Viewport};
    /// use std::sync::Arc;
    ///
    /// let points: Arc<[PointRecord]> = vec![PointRecord::new(1, -122.33, 47.61)].into();
    /// let engine = ClusterEngine::new(points, ClusterConfig::default())?;
    ///
    /// // No viewport reported yet: nothing to draw.
    /// assert!(engine.display_items(None).is_empty());
    ///
    /// let vp = Viewport::from_edges(-122.5, 47.5, -122.2, 47.7, 12.0);
    /// assert_eq!(engine.display_items(Some(&vp)).len(), 1);
    /// # Ok::<(), clustermap::ClusterError>(())
    /// ```
    pub fn new(points: Arc<[PointRecord]>, config: ClusterConfig) -> Result<Self> {
        let index = SpatialIndex::build(points, &config)?;
        Ok(Self { config, index })
    }

    /// Swap in a point set. Returns `true` when the index was rebuilt.
    pub fn set_points(&mut self, points: Arc<[PointRecord]>) -> Result<bool> {
        if Arc::ptr_eq(self.index.source(), &points) {
            log::debug!("Point set unchanged, keeping index");
            return Ok(false);
        }
        self.index = SpatialIndex::build(points, &self.config)?;
        Ok(true)
    }

    /// Display items for a settled viewport.
    ///
    /// `None` (the map has not reported a position yet) and non-finite
    /// viewports yield an empty list.
    pub fn display_items(&self, viewport: Option<&Viewport>) -> Vec<DisplayItem> {
        let Some(viewport) = viewport else {
            return Vec::new();
        };
        if !viewport.is_finite() {
            log::warn!("Ignoring non-finite viewport {:?}", viewport);
            return Vec::new();
        }

        let zoom = self.effective_zoom(viewport.zoom);
        let items = self.index.query(&viewport.bounds, zoom);
        log::debug!(
            "Viewport at zoom {:.2} (level {}): {} items",
            viewport.zoom,
            zoom,
            items.len()
        );
        items
    }

    /// Query level for a fractional camera zoom, clamped to `[0, max_clustering_zoom]`.
    pub fn effective_zoom(&self, zoom: f64) -> u8 {
        let max = self.config.max_clustering_zoom;
        if zoom.is_nan() {
            return 0;
        }
        zoom.floor().clamp(0.0, max as f64) as u8
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Points excluded from the current index.
    pub fn report(&self) -> &DataQualityReport {
        self.index.report()
    }
}
