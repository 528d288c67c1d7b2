//! Session controller.
//!
//! [`MapSession`] owns every piece of mutable state for one map: the
//! engine, the viewport tracker, the live markers, the expansion navigator
//! and the currently open detail selection. Host events are delivered to it
//! one at a time; each event runs to completion before the next.
//!
//! ```rust
//! use clustermap::markers::MemorySurface;
//! use clustermap::session::{ClickOutcome, DetailHistory};
//! use clustermap::SessionBuilder;
//! use clustermap_types::{PointRecord, Viewport};
//! use std::sync::Arc;
//!
//! let points: Arc<[PointRecord]> = vec![
//!     PointRecord::new(1, -122.3400, 47.6100).with_name("Alpha"),
//!     PointRecord::new(2, -122.3401, 47.6101).with_name("Bravo"),
//! ]
//! .into();
//!
//! let surface = MemorySurface::ready_at(Viewport::from_edges(-122.5, 47.5, -122.2, 47.7, 12.0));
//! let mut session = SessionBuilder::new()
//!     .points(points)
//!     .build(surface, DetailHistory::default())?;
//!
//! session.on_map_ready()?;
//! assert_eq!(session.live_marker_count(), 1);
//!
//! let bubble = session.live_ids()[0].clone();
//! assert!(matches!(session.on_marker_clicked(&bubble), ClickOutcome::Expanded(_)));
//! # Ok::<(), clustermap::ClusterError>(())
//! ```

use crate::display::{DisplayId, Frame};
use crate::engine::ClusterEngine;
use crate::error::Result;
use crate::markers::{ClickAction, MapSurface, MarkerReconciler, ReconcileStats, SurfaceError};
use crate::navigator::{CameraTransition, ExpansionNavigator};
use crate::tracker::{ViewportTracker, ViewportUpdate};
use clustermap_types::{PointId, PointRecord, Viewport};
use std::sync::Arc;

/// Receives point records to show in a detail card.
pub trait DetailView {
    fn show(&mut self, record: &PointRecord);

    /// Close the card currently shown, if any.
    fn dismiss(&mut self) {}
}

/// Detail view that records what it was asked to show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailHistory {
    pub shown: Vec<PointRecord>,
    pub dismissed: usize,
}

impl DetailHistory {
    pub fn last_shown(&self) -> Option<&PointRecord> {
        self.shown.last()
    }
}

impl DetailView for DetailHistory {
    fn show(&mut self, record: &PointRecord) {
        self.shown.push(record.clone());
    }

    fn dismiss(&mut self) {
        self.dismissed += 1;
    }
}

/// Result of a marker click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// A cluster was clicked and the camera is moving in
    Expanded(CameraTransition),
    /// A point was clicked and its record handed to the detail view
    ShowedDetails(PointId),
    /// The marker is no longer live or its target is gone
    Ignored,
}

pub struct MapSession<M: MapSurface, D: DetailView> {
    surface: M,
    details: D,
    engine: ClusterEngine,
    tracker: ViewportTracker,
    reconciler: MarkerReconciler<M::Handle>,
    navigator: ExpansionNavigator,
    open_detail: Option<PointId>,
    /// The last applied frame left items unplaced
    retry_pending: bool,
}

impl<M: MapSurface, D: DetailView> MapSession<M, D> {
    pub fn new(surface: M, details: D, engine: ClusterEngine) -> Self {
        let navigator = ExpansionNavigator::new(engine.config());
        Self {
            surface,
            details,
            engine,
            tracker: ViewportTracker::new(),
            reconciler: MarkerReconciler::new(),
            navigator,
            open_detail: None,
            retry_pending: false,
        }
    }

    /// The map finished loading: draw the first frame for its camera.
    pub fn on_map_ready(&mut self) -> Result<Option<ReconcileStats>> {
        let camera = match self.surface.camera() {
            Some(camera) if self.surface.is_ready() => camera,
            _ => return Err(SurfaceError::NotReady.into()),
        };
        Ok(self
            .tracker
            .on_ready(camera)
            .and_then(|update| self.render(update)))
    }

    /// The camera settled after a pan, zoom or animated move.
    ///
    /// An unchanged camera redraws only when the last frame left items
    /// unplaced. Returns `None` when nothing was redrawn: the map is not
    /// ready yet, the camera did not change, or the camera is not finite.
    pub fn on_camera_settled(&mut self, camera: Viewport) -> Option<ReconcileStats> {
        match self.tracker.on_settled(camera) {
            Some(update) => self.render(update),
            None if self.retry_pending && self.tracker.current() == Some(&camera) => {
                log::debug!("Camera unchanged, retrying unplaced markers");
                self.refresh()
            }
            None => None,
        }
    }

    /// Compute the frame for a published viewport without touching the map.
    pub fn prepare_frame(&self, update: &ViewportUpdate) -> Frame {
        Frame {
            generation: update.generation,
            zoom: update.viewport.zoom,
            items: self.engine.display_items(Some(&update.viewport)),
        }
    }

    /// Apply a prepared frame. Frames older than the last applied one are dropped.
    pub fn apply_frame(&mut self, frame: &Frame) -> Option<ReconcileStats> {
        let stats = self
            .reconciler
            .reconcile(&mut self.surface, frame, self.engine.index())?;
        self.retry_pending = stats.skipped > 0;
        Some(stats)
    }

    /// Redraw the current viewport, e.g. after the point set changed.
    ///
    /// Before any viewport is known this applies an empty frame, which
    /// removes whatever markers are still live.
    pub fn refresh(&mut self) -> Option<ReconcileStats> {
        let Some(&viewport) = self.tracker.current() else {
            return self.apply_frame(&Frame::empty(self.tracker.generation()));
        };
        let update = ViewportUpdate {
            viewport,
            generation: self.tracker.generation(),
        };
        self.render(update)
    }

    /// Dispatch a click on the marker bound to `id`.
    ///
    /// Clicks on markers that are no longer live are ignored.
    pub fn on_marker_clicked(&mut self, id: &DisplayId) -> ClickOutcome {
        let Some(action) = self.reconciler.get(id).map(|m| m.action().clone()) else {
            log::warn!("Ignoring click on {}, marker is no longer live", id);
            return ClickOutcome::Ignored;
        };

        match action {
            ClickAction::ExpandCluster(cluster) => self
                .navigator
                .navigate(&mut self.surface, self.engine.index(), cluster)
                .map(ClickOutcome::Expanded)
                .unwrap_or(ClickOutcome::Ignored),
            ClickAction::ShowDetails(point) => {
                let Some(record) = self.engine.index().point(&point) else {
                    log::warn!("Ignoring click on {}, point is not indexed", point);
                    return ClickOutcome::Ignored;
                };
                if self.open_detail.take().is_some() {
                    self.details.dismiss();
                }
                self.details.show(record);
                self.open_detail = Some(point.clone());
                ClickOutcome::ShowedDetails(point)
            }
        }
    }

    /// Pointer entered or left the marker bound to `id`.
    pub fn on_marker_hover(&mut self, id: &DisplayId, hovered: bool) -> bool {
        self.reconciler.set_hovered(&mut self.surface, id, hovered)
    }

    /// Swap in a new point set and redraw. Returns `true` when the index
    /// was rebuilt.
    ///
    /// An open detail card whose point is gone from the new set is closed.
    pub fn replace_points(&mut self, points: Arc<[PointRecord]>) -> Result<bool> {
        if !self.engine.set_points(points)? {
            return Ok(false);
        }
        let orphaned = self
            .open_detail
            .as_ref()
            .is_some_and(|id| self.engine.index().point(id).is_none());
        if orphaned {
            self.close_details();
        }
        self.refresh();
        Ok(true)
    }

    /// Close the open detail card. Returns `false` when none was open.
    pub fn close_details(&mut self) -> bool {
        if self.open_detail.take().is_none() {
            return false;
        }
        self.details.dismiss();
        true
    }

    /// Remove every marker from the map and hand back the collaborators.
    pub fn shutdown(mut self) -> (M, D) {
        let released = self.reconciler.clear(&mut self.surface);
        self.close_details();
        log::info!("Session closed, released {} markers", released);
        (self.surface, self.details)
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    /// Mutable access to the host map, e.g. to move its camera in tests.
    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }

    pub fn details(&self) -> &D {
        &self.details
    }

    pub fn engine(&self) -> &ClusterEngine {
        &self.engine
    }

    pub fn reconciler(&self) -> &MarkerReconciler<M::Handle> {
        &self.reconciler
    }

    /// Last published viewport.
    pub fn viewport(&self) -> Option<&Viewport> {
        self.tracker.current()
    }

    /// Point whose detail card is open.
    pub fn open_detail(&self) -> Option<&PointId> {
        self.open_detail.as_ref()
    }

    /// The last applied frame left items unplaced; the next settle retries them.
    pub fn has_pending_retry(&self) -> bool {
        self.retry_pending
    }

    pub fn live_marker_count(&self) -> usize {
        self.reconciler.len()
    }

    /// Ids of the live markers, sorted.
    pub fn live_ids(&self) -> Vec<DisplayId> {
        let mut ids: Vec<DisplayId> = self.reconciler.iter().map(|m| m.id().clone()).collect();
        ids.sort();
        ids
    }

    fn render(&mut self, update: ViewportUpdate) -> Option<ReconcileStats> {
        let frame = self.prepare_frame(&update);
        self.apply_frame(&frame)
    }
}

impl<M, D> std::fmt::Debug for MapSession<M, D>
where
    M: MapSurface,
    D: DetailView,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("engine", &self.engine)
            .field("viewport", &self.tracker.current())
            .field("live_markers", &self.reconciler.len())
            .field("open_detail", &self.open_detail)
            .finish()
    }
}
