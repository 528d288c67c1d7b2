//! Cluster expansion: zoom the camera in until a clicked cluster splits.

use crate::compute::SpatialIndex;
use crate::config::ClusterConfig;
use crate::display::ClusterId;
use crate::markers::MapSurface;
use geo::Point;

/// An animated camera move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransition {
    pub center: Point,
    pub zoom: f64,
    pub duration_ms: u64,
}

/// Turns cluster clicks into camera transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionNavigator {
    zoom_cap: u8,
    duration_ms: u64,
}

impl ExpansionNavigator {
    pub fn new(config: &ClusterConfig) -> Self {
        Self {
            zoom_cap: config.expansion_zoom_cap,
            duration_ms: config.transition_duration_ms,
        }
    }

    /// Transition that expands `cluster`, centred on its centroid.
    ///
    /// The target zoom is the cluster's expansion zoom, capped at the
    /// configured maximum. `None` when the cluster is not in `index`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustermap::navigator::ExpansionNavigator;
    /// use clustermap::{ClusterConfig, SpatialIndex};
    /// use clustermap_types::{GeoBounds, PointRecord};
    /// use std::sync::Arc;
    ///
    /// let points: Arc<[PointRecord]> = vec![
    ///     PointRecord::new(1, -122.3400, 47.6100),
    ///     PointRecord::new(2, -122.3401, 47.6101),
    /// ]
    /// .into();
    /// let config = ClusterConfig::default();
    /// let index = SpatialIndex::build(points, &config)?;
    ///
    /// let items = index.query(&GeoBounds::WORLD, 10);
    /// let cluster = items[0].as_cluster().unwrap();
    ///
    /// let plan = ExpansionNavigator::new(&config).plan(&index, cluster.id).unwrap();
    /// assert_eq!(plan.zoom, cluster.expansion_zoom as f64);
    /// assert_eq!(plan.center, cluster.position);
    /// # Ok::<(), clustermap::ClusterError>(())
    /// ```
    pub fn plan(&self, index: &SpatialIndex, cluster: ClusterId) -> Option<CameraTransition> {
        let item = match index.cluster(cluster) {
            Ok(item) => item,
            Err(e) => {
                log::warn!("Ignoring expansion of cluster {}: {}", cluster, e);
                return None;
            }
        };

        Some(CameraTransition {
            center: item.position,
            zoom: item.expansion_zoom.min(self.zoom_cap) as f64,
            duration_ms: self.duration_ms,
        })
    }

    /// Issue the expansion transition for `cluster` on `surface`.
    ///
    /// Exactly one transition is issued for a known cluster; unknown ids
    /// (stale clicks) do nothing.
    pub fn navigate<M: MapSurface>(
        &self,
        surface: &mut M,
        index: &SpatialIndex,
        cluster: ClusterId,
    ) -> Option<CameraTransition> {
        let transition = self.plan(index, cluster)?;
        log::debug!(
            "Expanding cluster {} to zoom {} at ({:.5}, {:.5})",
            cluster,
            transition.zoom,
            transition.center.x(),
            transition.center.y()
        );
        surface.fly_to(&transition);
        Some(transition)
    }

    pub fn zoom_cap(&self) -> u8 {
        self.zoom_cap
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}
