//! In-memory map surface for headless hosts, demos and tests.

use super::{MapSurface, MarkerSpec, SurfaceError};
use crate::display::DisplayId;
use crate::navigator::CameraTransition;
use clustermap_types::Viewport;
use geo::Point;
use std::collections::BTreeMap;

/// Handle to a marker placed on a [`MemorySurface`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MemoryHandle(u64);

impl MemoryHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A marker as currently drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    pub spec: MarkerSpec,
    pub position: Point,
    pub scale: f64,
    pub hovered: bool,
}

/// Counters of surface operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub added: u64,
    pub removed: u64,
    pub moved: u64,
    pub rescaled: u64,
    pub failed: u64,
}

/// Map surface keeping its markers in a `BTreeMap`.
#[derive(Debug, Default)]
pub struct MemorySurface {
    ready: bool,
    camera: Option<Viewport>,
    next_handle: u64,
    markers: BTreeMap<u64, PlacedMarker>,
    transitions: Vec<CameraTransition>,
    failing_adds: usize,
    stats: SurfaceStats,
}

impl MemorySurface {
    /// A surface that has not finished loading.
    pub fn new() -> Self {
        Self::default()
    }

    /// A loaded surface looking at `camera`.
    pub fn ready_at(camera: Viewport) -> Self {
        Self {
            ready: true,
            camera: Some(camera),
            ..Self::default()
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Move the camera, as a user pan or zoom would.
    pub fn set_camera(&mut self, camera: Viewport) {
        self.camera = Some(camera);
    }

    /// Make the next `count` marker additions fail.
    pub fn fail_next_adds(&mut self, count: usize) {
        self.failing_adds = count;
    }

    /// Complete the most recent camera transition.
    ///
    /// The camera is recentred on the target and its extent scaled by the
    /// zoom change. Returns `false` when there is nothing to complete.
    pub fn finish_transition(&mut self) -> bool {
        let (Some(transition), Some(camera)) = (self.transitions.last(), self.camera) else {
            return false;
        };
        let factor = 2f64.powf(camera.zoom - transition.zoom);
        let half_width = camera.bounds.width() * factor / 2.0;
        let half_height = camera.bounds.height() * factor / 2.0;
        let center = transition.center;

        self.camera = Some(Viewport::from_edges(
            center.x() - half_width,
            center.y() - half_height,
            center.x() + half_width,
            center.y() + half_height,
            transition.zoom,
        ));
        true
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn markers(&self) -> impl Iterator<Item = (u64, &PlacedMarker)> + '_ {
        self.markers.iter().map(|(&id, marker)| (id, marker))
    }

    /// The handle id and marker drawn for a display item.
    pub fn marker_for(&self, id: &DisplayId) -> Option<(u64, &PlacedMarker)> {
        self.markers().find(|(_, marker)| &marker.spec.id == id)
    }

    /// Camera transitions issued so far, oldest first.
    pub fn transitions(&self) -> &[CameraTransition] {
        &self.transitions
    }

    pub fn stats(&self) -> &SurfaceStats {
        &self.stats
    }
}

impl MapSurface for MemorySurface {
    type Handle = MemoryHandle;

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn camera(&self) -> Option<Viewport> {
        if self.ready { self.camera } else { None }
    }

    fn add_marker(&mut self, spec: &MarkerSpec) -> Result<MemoryHandle, SurfaceError> {
        if !self.ready {
            self.stats.failed += 1;
            return Err(SurfaceError::NotReady);
        }
        if self.failing_adds > 0 {
            self.failing_adds -= 1;
            self.stats.failed += 1;
            return Err(SurfaceError::Rejected(format!("cannot place {}", spec.id)));
        }

        let id = self.next_handle;
        self.next_handle += 1;
        self.markers.insert(
            id,
            PlacedMarker {
                spec: spec.clone(),
                position: spec.position,
                scale: spec.scale,
                hovered: false,
            },
        );
        self.stats.added += 1;
        Ok(MemoryHandle(id))
    }

    fn move_marker(&mut self, handle: &mut MemoryHandle, position: Point) {
        if let Some(marker) = self.markers.get_mut(&handle.0) {
            marker.position = position;
            self.stats.moved += 1;
        }
    }

    fn rescale_marker(&mut self, handle: &mut MemoryHandle, scale: f64) {
        if let Some(marker) = self.markers.get_mut(&handle.0) {
            marker.scale = scale;
            self.stats.rescaled += 1;
        }
    }

    fn remove_marker(&mut self, handle: MemoryHandle) {
        if self.markers.remove(&handle.0).is_some() {
            self.stats.removed += 1;
        }
    }

    fn fly_to(&mut self, transition: &CameraTransition) {
        self.transitions.push(*transition);
    }

    fn set_hovered(&mut self, handle: &mut MemoryHandle, hovered: bool) {
        if let Some(marker) = self.markers.get_mut(&handle.0) {
            marker.hovered = hovered;
        }
    }
}
