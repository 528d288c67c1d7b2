//! Frame-to-frame marker reconciliation.
//!
//! Each applied frame is diffed against the live markers by [`DisplayId`]:
//!
//! 1. markers whose id is gone are removed and their handles released
//! 2. ids without a marker get a new handle
//! 3. ids present on both sides keep their handle; only position and pin
//!    scale are updated in place, or the handle is replaced when its
//!    content (bubble tier, label) changed
//!
//! Handles that fail to allocate are skipped and retried on the next frame.

use super::{ClickAction, MapSurface, MarkerSpec};
use crate::compute::SpatialIndex;
use crate::display::{DisplayId, Frame};
use geo::Point;
use rustc_hash::{FxHashMap, FxHashSet};

/// A display item bound to its on-map handle.
#[derive(Debug)]
pub struct LiveMarker<H> {
    handle: H,
    spec: MarkerSpec,
    hovered: bool,
}

impl<H> LiveMarker<H> {
    pub fn id(&self) -> &DisplayId {
        &self.spec.id
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn position(&self) -> Point {
        self.spec.position
    }

    pub fn spec(&self) -> &MarkerSpec {
        &self.spec
    }

    pub fn action(&self) -> &ClickAction {
        &self.spec.on_click
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }
}

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub added: usize,
    pub removed: usize,
    /// Kept handles whose position or scale changed
    pub updated: usize,
    /// Kept handles left exactly as they were
    pub unchanged: usize,
    /// Handles re-created because their content changed
    pub replaced: usize,
    /// Items that could not be placed this frame
    pub skipped: usize,
}

/// Owner of every live marker handle.
#[derive(Debug)]
pub struct MarkerReconciler<H> {
    live: FxHashMap<DisplayId, LiveMarker<H>>,
    last_generation: Option<u64>,
}

impl<H> Default for MarkerReconciler<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> MarkerReconciler<H> {
    pub fn new() -> Self {
        Self {
            live: FxHashMap::default(),
            last_generation: None,
        }
    }

    /// Bring the map in line with `frame`.
    ///
    /// Returns `None` without touching the map when `frame` is older than
    /// the last applied frame.
    pub fn reconcile<M>(
        &mut self,
        surface: &mut M,
        frame: &Frame,
        index: &SpatialIndex,
    ) -> Option<ReconcileStats>
    where
        M: MapSurface<Handle = H>,
    {
        if let Some(last) = self.last_generation
            && frame.generation < last
        {
            log::debug!(
                "Dropping stale frame #{} (last applied #{})",
                frame.generation,
                last
            );
            return None;
        }

        let mut stats = ReconcileStats::default();
        let wanted: FxHashSet<DisplayId> = frame.items.iter().map(|item| item.id()).collect();

        let gone: Vec<DisplayId> = self
            .live
            .keys()
            .filter(|id| !wanted.contains(*id))
            .cloned()
            .collect();
        for id in gone {
            if let Some(marker) = self.live.remove(&id) {
                surface.remove_marker(marker.handle);
                stats.removed += 1;
            }
        }

        let mut placed: FxHashSet<DisplayId> = FxHashSet::default();
        for item in &frame.items {
            let id = item.id();
            if !placed.insert(id.clone()) {
                continue;
            }
            let Some(spec) = MarkerSpec::for_item(item, index, frame.zoom) else {
                log::warn!("No record for {}, not drawing it", id);
                stats.skipped += 1;
                continue;
            };

            if let Some(marker) = self.live.get_mut(&id)
                && marker.spec.content == spec.content
            {
                let mut touched = false;
                if marker.spec.position != spec.position {
                    surface.move_marker(&mut marker.handle, spec.position);
                    touched = true;
                }
                if marker.spec.scale != spec.scale {
                    surface.rescale_marker(&mut marker.handle, spec.scale);
                    touched = true;
                }
                marker.spec = spec;
                if touched {
                    stats.updated += 1;
                } else {
                    stats.unchanged += 1;
                }
                continue;
            }

            let mut hovered = false;
            if let Some(old) = self.live.remove(&id) {
                hovered = old.hovered;
                surface.remove_marker(old.handle);
                stats.replaced += 1;
            }

            if !surface.is_ready() {
                stats.skipped += 1;
                continue;
            }
            match surface.add_marker(&spec) {
                Ok(mut handle) => {
                    if hovered {
                        surface.set_hovered(&mut handle, true);
                    }
                    self.live.insert(
                        id,
                        LiveMarker {
                            handle,
                            spec,
                            hovered,
                        },
                    );
                    stats.added += 1;
                }
                Err(e) => {
                    log::warn!("Could not place marker {}: {}", id, e);
                    stats.skipped += 1;
                }
            }
        }

        self.last_generation = Some(frame.generation);
        log::debug!("Frame #{} reconciled: {:?}", frame.generation, stats);
        Some(stats)
    }

    /// Set hover state on a live marker. Returns `false` for unknown ids.
    pub fn set_hovered<M>(&mut self, surface: &mut M, id: &DisplayId, hovered: bool) -> bool
    where
        M: MapSurface<Handle = H>,
    {
        let Some(marker) = self.live.get_mut(id) else {
            return false;
        };
        if marker.hovered != hovered {
            marker.hovered = hovered;
            surface.set_hovered(&mut marker.handle, hovered);
        }
        true
    }

    /// Remove every marker from the map. Returns how many were released.
    pub fn clear<M>(&mut self, surface: &mut M) -> usize
    where
        M: MapSurface<Handle = H>,
    {
        let count = self.live.len();
        for (_, marker) in self.live.drain() {
            surface.remove_marker(marker.handle);
        }
        count
    }

    pub fn get(&self, id: &DisplayId) -> Option<&LiveMarker<H>> {
        self.live.get(id)
    }

    pub fn contains(&self, id: &DisplayId) -> bool {
        self.live.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveMarker<H>> + '_ {
        self.live.values()
    }

    /// Generation of the last applied frame.
    pub fn last_generation(&self) -> Option<u64> {
        self.last_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use crate::display::DisplayItem;
    use crate::markers::MemorySurface;
    use clustermap_types::{GeoBounds, PointId, PointRecord, Viewport};
    use std::sync::Arc;

    fn index() -> SpatialIndex {
        let points: Arc<[PointRecord]> = vec![
            PointRecord::new(1, -122.3400, 47.6100).with_name("Alpha"),
            PointRecord::new(2, -122.3401, 47.6101).with_name("Bravo"),
            PointRecord::new(3, -122.3000, 47.6500).with_name("Charlie"),
            PointRecord::new(4, -122.2000, 47.7000).with_name("Delta"),
        ]
        .into();
        SpatialIndex::build(points, &ClusterConfig::default()).unwrap()
    }

    fn surface() -> MemorySurface {
        MemorySurface::ready_at(Viewport::new(GeoBounds::WORLD, 2.0))
    }

    fn frame(index: &SpatialIndex, generation: u64, zoom: u8) -> Frame {
        Frame {
            generation,
            zoom: zoom as f64,
            items: index.query(&GeoBounds::WORLD, zoom),
        }
    }

    #[test]
    fn test_first_frame_adds_everything() {
        let index = index();
        let mut surface = surface();
        let mut reconciler = MarkerReconciler::new();

        let frame = frame(&index, 1, 17);
        let stats = reconciler.reconcile(&mut surface, &frame, &index).unwrap();
        assert_eq!(stats.added, 4);
        assert_eq!(reconciler.len(), 4);
        assert_eq!(surface.marker_count(), 4);
    }

    #[test]
    fn test_unchanged_frame_keeps_handles() {
        let index = index();
        let mut surface = surface();
        let mut reconciler = MarkerReconciler::new();

        let first = frame(&index, 1, 17);
        reconciler.reconcile(&mut surface, &first, &index);
        let handles: Vec<(DisplayId, u64)> = reconciler
            .iter()
            .map(|m| (m.id().clone(), m.handle().id()))
            .collect();

        let second = frame(&index, 2, 17);
        let stats = reconciler.reconcile(&mut surface, &second, &index).unwrap();
        assert_eq!(stats.unchanged, 4);
        assert_eq!(stats.added, 0);
        assert_eq!(stats.removed, 0);
        for (id, handle) in handles {
            assert_eq!(reconciler.get(&id).unwrap().handle().id(), handle);
        }
        assert_eq!(surface.stats().added, 4);
    }

    #[test]
    fn test_zoom_out_replaces_points_with_cluster() {
        let index = index();
        let mut surface = surface();
        let mut reconciler = MarkerReconciler::new();

        reconciler.reconcile(&mut surface, &frame(&index, 1, 17), &index);
        let stats = reconciler
            .reconcile(&mut surface, &frame(&index, 2, 12), &index)
            .unwrap();

        assert_eq!(stats.removed, 2);
        assert_eq!(stats.added, 1);
        assert_eq!(reconciler.len(), 3);
        assert_eq!(surface.marker_count(), 3);
        assert!(reconciler.iter().any(|m| matches!(m.id(), DisplayId::Cluster(_))));
        assert!(!reconciler.contains(&DisplayId::Point(PointId::from(1))));
    }

    #[test]
    fn test_pins_rescale_in_place_on_zoom() {
        let index = index();
        let mut surface = surface();
        let mut reconciler = MarkerReconciler::new();

        let lone = DisplayId::Point(PointId::from(4));
        reconciler.reconcile(&mut surface, &frame(&index, 1, 15), &index);
        let handle = reconciler.get(&lone).unwrap().handle().id();

        let mut deeper = frame(&index, 2, 17);
        deeper.zoom = 17.5;
        let stats = reconciler.reconcile(&mut surface, &deeper, &index).unwrap();
        assert!(stats.updated >= 1);
        assert_eq!(reconciler.get(&lone).unwrap().handle().id(), handle);
        let (_, placed) = surface.marker_for(&lone).unwrap();
        assert_eq!(placed.scale, crate::markers::style::pin_scale(17.5));
    }

    #[test]
    fn test_stale_frame_is_dropped() {
        let index = index();
        let mut surface = surface();
        let mut reconciler = MarkerReconciler::new();

        reconciler.reconcile(&mut surface, &frame(&index, 5, 17), &index);
        assert!(
            reconciler
                .reconcile(&mut surface, &frame(&index, 4, 2), &index)
                .is_none()
        );
        assert_eq!(reconciler.len(), 4);
        assert_eq!(reconciler.last_generation(), Some(5));
    }

    #[test]
    fn test_failed_allocation_retried_next_frame() {
        let index = index();
        let mut surface = surface();
        let mut reconciler = MarkerReconciler::new();

        surface.fail_next_adds(2);
        let stats = reconciler
            .reconcile(&mut surface, &frame(&index, 1, 17), &index)
            .unwrap();
        assert_eq!(stats.skipped, 2);
        assert_eq!(reconciler.len(), 2);

        let stats = reconciler
            .reconcile(&mut surface, &frame(&index, 2, 17), &index)
            .unwrap();
        assert_eq!(stats.added, 2);
        assert_eq!(stats.unchanged, 2);
        assert_eq!(reconciler.len(), 4);
        assert_eq!(surface.marker_count(), 4);
    }

    #[test]
    fn test_not_ready_surface_skips_without_failing() {
        let index = index();
        let mut surface = MemorySurface::new();
        let mut reconciler = MarkerReconciler::new();

        let stats = reconciler
            .reconcile(&mut surface, &frame(&index, 1, 17), &index)
            .unwrap();
        assert_eq!(stats.skipped, 4);
        assert!(reconciler.is_empty());
    }

    #[test]
    fn test_hover_survives_rerender() {
        let index = index();
        let mut surface = surface();
        let mut reconciler = MarkerReconciler::new();

        let lone = DisplayId::Point(PointId::from(4));
        reconciler.reconcile(&mut surface, &frame(&index, 1, 17), &index);
        assert!(reconciler.set_hovered(&mut surface, &lone, true));

        reconciler.reconcile(&mut surface, &frame(&index, 2, 17), &index);
        assert!(reconciler.get(&lone).unwrap().is_hovered());
        assert!(surface.marker_for(&lone).unwrap().1.hovered);

        let missing = DisplayId::Point(PointId::from(99));
        assert!(!reconciler.set_hovered(&mut surface, &missing, true));
    }

    #[test]
    fn test_clear_releases_all_handles() {
        let index = index();
        let mut surface = surface();
        let mut reconciler = MarkerReconciler::new();

        reconciler.reconcile(&mut surface, &frame(&index, 1, 17), &index);
        assert_eq!(reconciler.clear(&mut surface), 4);
        assert!(reconciler.is_empty());
        assert_eq!(surface.marker_count(), 0);
    }

    #[test]
    fn test_unknown_point_item_is_skipped() {
        let index = index();
        let mut surface = surface();
        let mut reconciler = MarkerReconciler::new();

        let mut frame = frame(&index, 1, 17);
        frame.items.push(DisplayItem::Point(crate::display::PointItem {
            point_id: PointId::from("ghost"),
            position: Point::new(0.0, 0.0),
        }));
        let stats = reconciler.reconcile(&mut surface, &frame, &index).unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.added, 4);
    }
}
