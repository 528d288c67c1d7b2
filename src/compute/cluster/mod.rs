//! Hierarchical point clustering over per-zoom R-trees.
//!
//! The index is built once from a point set and never mutated. Building
//! works top-down: the finest level holds every point, and each coarser
//! level is produced by greedily merging nodes that lie within the cluster
//! radius of each other, measured in projected pixels at that zoom.
//!
//! ## Levels
//!
//! For `max_clustering_zoom = M` the index holds levels `0..=M`:
//!
//! - levels `0..M` are clustered, one merge pass each, radius
//!   `radius_px / (extent * 2^z)`
//! - level `M` holds the raw points, so any query at `z >= M` shows every
//!   point individually
//!
//! Every point is owned by exactly one node per level. A query maps the raw
//! points inside the requested bounds to their owners on the requested
//! level, which makes the result an exact partition of the points in view.
//!
//! ## Identity
//!
//! A cluster is named by the level it was formed at and its slot there
//! ([`ClusterId`]). Coarser levels that carry the cluster unchanged reuse
//! the id, so a marker bound to it survives zooming out until the cluster
//! is merged into a bigger one.
//!
//! ## Example
//!
//! ```rust
//! use clustermap::{ClusterConfig, SpatialIndex};
//! use clustermap_types::{GeoBounds, PointRecord};
//! use std::sync::Arc;
//!
//! let points: Arc<[PointRecord]> = (0..5i64)
//!     .map(|i| PointRecord::new(i, -122.3400 + i as f64 * 0.0004, 47.6100))
//!     .collect();
//!
//! let index = SpatialIndex::build(points, &ClusterConfig::default())?;
//! let seattle = GeoBounds::new(-122.5, 47.5, -122.2, 47.7);
//!
//! let far = index.query(&seattle, 10);
//! assert_eq!(far.len(), 1);
//! assert_eq!(far[0].member_count(), 5);
//!
//! let near = index.query(&seattle, 17);
//! assert_eq!(near.len(), 5);
//! # Ok::<(), clustermap::ClusterError>(())
//! ```

mod level;
#[cfg(test)]
mod tests;

use crate::compute::projection::{lat_y, lng_x, project, radius_at_zoom, unproject};
use crate::compute::validation::{DataQualityReport, screen_points};
use crate::config::ClusterConfig;
use crate::display::{ClusterId, ClusterItem, DisplayItem, PointItem, abbreviate_count};
use crate::error::{ClusterError, Result};
use clustermap_types::{GeoBounds, PointId, PointRecord};
use level::{Level, MergeParams, Node, NodeKind, NodePosition, merge_level};
use rstar::{AABB, RTree};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Slack added to projected query envelopes; exact filtering happens in degrees.
const ENVELOPE_EPSILON: f64 = 1e-12;

/// Immutable cluster hierarchy over one point set.
pub struct SpatialIndex {
    points: Arc<[PointRecord]>,
    /// Raw point slot -> position in `points`
    sources: Vec<usize>,
    by_id: FxHashMap<PointId, u32>,
    /// Indexed by zoom
    levels: Vec<Level>,
    leaf_tree: RTree<NodePosition>,
    max_zoom: u8,
    report: DataQualityReport,
}

impl SpatialIndex {
    /// Build the index for `points`.
    ///
    /// Points with invalid coordinates or duplicate ids are left out and
    /// listed in [`SpatialIndex::report`]. Fails only on invalid configuration.
    pub fn build(points: Arc<[PointRecord]>, config: &ClusterConfig) -> Result<Self> {
        config.validate()?;

        let (kept, report) = screen_points(&points);
        let max_zoom = config.max_clustering_zoom;

        let top: Vec<Node> = kept
            .iter()
            .enumerate()
            .map(|(slot, &source)| {
                let (x, y) = project(&points[source].location());
                Node::leaf(x, y, slot as u32)
            })
            .collect();

        let leaf_tree = RTree::bulk_load(
            top.iter()
                .enumerate()
                .map(|(slot, node)| NodePosition::new(node.x, node.y, slot as u32))
                .collect(),
        );

        // Finest level first; reversed once all levels exist.
        let mut stack: Vec<Vec<Node>> = Vec::with_capacity(max_zoom as usize + 1);
        stack.push(top);
        for zoom in (0..max_zoom).rev() {
            let params = MergeParams {
                radius: radius_at_zoom(config.cluster_radius_px, config.tile_extent, zoom),
                min_points: config.min_points_per_cluster,
            };
            let Some(upper) = stack.last_mut() else {
                break;
            };
            let lower = merge_level(upper, zoom, params);
            log::debug!("Zoom {}: {} nodes", zoom, lower.len());
            stack.push(lower);
        }
        stack.reverse();

        let mut owners: Vec<Vec<u32>> = vec![Vec::new(); stack.len()];
        if let Some(finest) = owners.last_mut() {
            *finest = (0..kept.len() as u32).collect();
        }
        for zoom in (0..stack.len().saturating_sub(1)).rev() {
            let upper = &stack[zoom + 1];
            owners[zoom] = owners[zoom + 1]
                .iter()
                .map(|&owner| upper[owner as usize].parent.unwrap_or(owner))
                .collect();
        }

        let levels: Vec<Level> = stack
            .into_iter()
            .zip(owners)
            .map(|(nodes, leaf_owner)| Level { nodes, leaf_owner })
            .collect();

        let by_id = kept
            .iter()
            .enumerate()
            .map(|(slot, &source)| (points[source].id.clone(), slot as u32))
            .collect();

        log::info!(
            "Built cluster index: {} points, {} excluded, {} levels, {} nodes at zoom 0",
            kept.len(),
            report.rejected_count(),
            levels.len(),
            levels.first().map(|l| l.nodes.len()).unwrap_or(0)
        );

        Ok(Self {
            points,
            sources: kept,
            by_id,
            levels,
            leaf_tree,
            max_zoom,
            report,
        })
    }

    /// Display items for the points inside `bounds` at `zoom`.
    ///
    /// Zooms at or above the max clustering zoom return raw points. The
    /// result is sorted by level slot and is identical for identical input.
    pub fn query(&self, bounds: &GeoBounds, zoom: u8) -> Vec<DisplayItem> {
        if !bounds.is_finite() {
            log::warn!("Rejecting cluster query with non-finite bounds");
            return Vec::new();
        }

        let zoom = zoom.min(self.max_zoom);
        let Some(level) = self.levels.get(zoom as usize) else {
            return Vec::new();
        };

        let mut seen: FxHashSet<u32> = FxHashSet::default();
        let mut owners: Vec<u32> = Vec::new();

        for rect in bounds.to_rects() {
            let (min, max) = (rect.min(), rect.max());
            let envelope = AABB::from_corners(
                NodePosition::probe(
                    lng_x(min.x) - ENVELOPE_EPSILON,
                    lat_y(max.y) - ENVELOPE_EPSILON,
                ),
                NodePosition::probe(
                    lng_x(max.x) + ENVELOPE_EPSILON,
                    lat_y(min.y) + ENVELOPE_EPSILON,
                ),
            );

            for candidate in self.leaf_tree.locate_in_envelope_intersecting(&envelope) {
                let Some(record) = self.record(candidate.slot) else {
                    continue;
                };
                let inside = record.longitude >= min.x
                    && record.longitude <= max.x
                    && record.latitude >= min.y
                    && record.latitude <= max.y;
                if !inside {
                    continue;
                }
                let owner = level.leaf_owner[candidate.slot as usize];
                if seen.insert(owner) {
                    owners.push(owner);
                }
            }
        }

        owners.sort_unstable();
        owners
            .into_iter()
            .filter_map(|slot| self.item_at(level, slot))
            .collect()
    }

    /// Zoom at which `cluster` first splits into several items.
    ///
    /// Always greater than every zoom the cluster is returned at.
    pub fn expansion_zoom(&self, cluster: ClusterId) -> Result<u8> {
        self.cluster_node(cluster)?;
        Ok(self.expansion_from(cluster))
    }

    /// The cluster as a display item.
    pub fn cluster(&self, cluster: ClusterId) -> Result<ClusterItem> {
        let node = self.cluster_node(cluster)?;
        Ok(self.cluster_item(cluster, node))
    }

    /// Items the cluster splits into one level further in.
    pub fn children(&self, cluster: ClusterId) -> Result<Vec<DisplayItem>> {
        let node = self.cluster_node(cluster)?;
        let upper = self
            .levels
            .get(cluster.zoom as usize + 1)
            .ok_or(ClusterError::UnknownCluster(cluster))?;

        Ok(node
            .children
            .iter()
            .filter_map(|&child| self.item_at(upper, child))
            .collect())
    }

    /// Member points of a cluster, paged by `offset` and `limit`.
    pub fn leaves(
        &self,
        cluster: ClusterId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<&PointRecord>> {
        let node = self.cluster_node(cluster)?;

        let mut found = Vec::new();
        let mut skipped = 0;
        let mut pending: Vec<(usize, u32)> = node
            .children
            .iter()
            .rev()
            .map(|&child| (cluster.zoom as usize + 1, child))
            .collect();

        while let Some((zoom, slot)) = pending.pop() {
            if found.len() >= limit {
                break;
            }
            let Some(node) = self.levels.get(zoom).and_then(|l| l.node(slot)) else {
                continue;
            };
            match node.kind {
                NodeKind::Point(leaf) => {
                    if skipped < offset {
                        skipped += 1;
                        continue;
                    }
                    if let Some(record) = self.record(leaf) {
                        found.push(record);
                    }
                }
                NodeKind::Cluster(_) => {
                    pending.extend(node.children.iter().rev().map(|&child| (zoom + 1, child)));
                }
            }
        }

        Ok(found)
    }

    /// Look up an indexed point by id.
    pub fn point(&self, id: &PointId) -> Option<&PointRecord> {
        self.by_id.get(id).and_then(|&slot| self.record(slot))
    }

    /// All indexed points in input order.
    pub fn points(&self) -> impl Iterator<Item = &PointRecord> + '_ {
        self.sources.iter().filter_map(|&source| self.points.get(source))
    }

    /// The point set this index was built from, including rejected records.
    pub fn source(&self) -> &Arc<[PointRecord]> {
        &self.points
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Zoom at and above which no clustering happens.
    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Number of display items covering the whole point set at `zoom`.
    pub fn node_count(&self, zoom: u8) -> usize {
        self.levels
            .get(zoom.min(self.max_zoom) as usize)
            .map(|l| l.nodes.len())
            .unwrap_or(0)
    }

    /// Points excluded while building.
    pub fn report(&self) -> &DataQualityReport {
        &self.report
    }

    fn record(&self, slot: u32) -> Option<&PointRecord> {
        self.sources
            .get(slot as usize)
            .and_then(|&source| self.points.get(source))
    }

    fn cluster_node(&self, cluster: ClusterId) -> Result<&Node> {
        if cluster.zoom >= self.max_zoom {
            return Err(ClusterError::UnknownCluster(cluster));
        }
        self.levels
            .get(cluster.zoom as usize)
            .and_then(|level| level.node(cluster.index))
            .filter(|node| node.kind == NodeKind::Cluster(cluster))
            .ok_or(ClusterError::UnknownCluster(cluster))
    }

    fn expansion_from(&self, cluster: ClusterId) -> u8 {
        let mut zoom = cluster.zoom;
        let mut slot = cluster.index;
        loop {
            let next = zoom + 1;
            let Some(node) = self.levels.get(zoom as usize).and_then(|l| l.node(slot)) else {
                return next;
            };
            if node.children.len() != 1 || next >= self.max_zoom {
                return next;
            }
            slot = node.children[0];
            zoom = next;
        }
    }

    fn cluster_item(&self, id: ClusterId, node: &Node) -> ClusterItem {
        ClusterItem {
            id,
            position: unproject(node.x, node.y),
            member_count: node.count,
            abbreviated_count: abbreviate_count(node.count),
            expansion_zoom: self.expansion_from(id),
        }
    }

    fn item_at(&self, level: &Level, slot: u32) -> Option<DisplayItem> {
        let node = level.node(slot)?;
        match node.kind {
            NodeKind::Point(leaf) => {
                let record = self.record(leaf)?;
                Some(DisplayItem::Point(PointItem {
                    point_id: record.id.clone(),
                    position: record.location(),
                }))
            }
            NodeKind::Cluster(id) => Some(DisplayItem::Cluster(self.cluster_item(id, node))),
        }
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("points", &self.sources.len())
            .field("levels", &self.levels.len())
            .field("max_zoom", &self.max_zoom)
            .finish()
    }
}
