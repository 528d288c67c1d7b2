//! Viewport tracking.
//!
//! The host map reports camera positions on settle (end of pan, zoom or
//! animated move) and once when it becomes ready. The tracker turns those
//! into a sequence of distinct viewports, each stamped with a generation.

use clustermap_types::Viewport;

/// A newly published viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportUpdate {
    pub viewport: Viewport,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct ViewportTracker {
    current: Option<Viewport>,
    generation: u64,
    ready: bool,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The map finished loading. Always publishes so the first frame has a viewport.
    pub fn on_ready(&mut self, camera: Viewport) -> Option<ViewportUpdate> {
        if !camera.is_finite() {
            log::warn!("Map reported ready with a non-finite camera {:?}", camera);
            return None;
        }
        self.ready = true;
        Some(self.publish(camera))
    }

    /// The camera settled. Publishes only when bounds or zoom changed.
    ///
    /// Settles reported before the map is ready are ignored; the ready
    /// event publishes the position instead.
    pub fn on_settled(&mut self, camera: Viewport) -> Option<ViewportUpdate> {
        if !self.ready {
            log::debug!("Camera settled before map was ready, ignoring");
            return None;
        }
        if !camera.is_finite() {
            log::warn!("Ignoring non-finite camera {:?}", camera);
            return None;
        }
        if self.current.as_ref() == Some(&camera) {
            return None;
        }
        Some(self.publish(camera))
    }

    fn publish(&mut self, camera: Viewport) -> ViewportUpdate {
        self.generation += 1;
        self.current = Some(camera);
        log::debug!(
            "Viewport #{}: zoom {:.2}, bounds {:?}",
            self.generation,
            camera.zoom,
            camera.bounds
        );
        ViewportUpdate {
            viewport: camera,
            generation: self.generation,
        }
    }

    /// Last published viewport, if any.
    pub fn current(&self) -> Option<&Viewport> {
        self.current.as_ref()
    }

    /// Generation of the last published viewport (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}
