//! Live map markers
//!
//! The host map engine is abstracted behind [`MapSurface`]: it places,
//! moves and removes visual handles and runs camera transitions. The
//! [`MarkerReconciler`] is the only component that adds or removes handles;
//! it diffs each new frame of display items against the markers already on
//! the map.
//!
//! Click handling is data, not closures: every marker carries a
//! [`ClickAction`], and the host reports clicks back by [`DisplayId`].

pub mod memory;
pub mod reconciler;
pub mod style;

pub use memory::{MemoryHandle, MemorySurface, PlacedMarker, SurfaceStats};
pub use reconciler::{LiveMarker, MarkerReconciler, ReconcileStats};
pub use style::{BubbleStyle, PinStyle, Rgba};

use crate::compute::SpatialIndex;
use crate::display::{ClusterId, DisplayId, DisplayItem};
use crate::navigator::CameraTransition;
use clustermap_types::{PointId, Viewport};
use geo::Point;
use thiserror::Error;

/// Failures reported by the host map.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("map is not ready")]
    NotReady,

    #[error("marker rejected: {0}")]
    Rejected(String),
}

/// What a click on a marker should do.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    /// Zoom the camera in until the cluster splits
    ExpandCluster(ClusterId),
    /// Hand the point's record to the detail view
    ShowDetails(PointId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerContent {
    Bubble(BubbleStyle),
    Pin(PinStyle),
}

/// Everything the host needs to draw one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub id: DisplayId,
    pub position: Point,
    pub content: MarkerContent,
    /// Zoom compensation for pins; always 1.0 for bubbles
    pub scale: f64,
    pub on_click: ClickAction,
}

impl MarkerSpec {
    /// Marker for a display item. `None` when a point item is not in `index`.
    pub fn for_item(item: &DisplayItem, index: &SpatialIndex, zoom: f64) -> Option<Self> {
        match item {
            DisplayItem::Cluster(cluster) => Some(Self {
                id: item.id(),
                position: cluster.position,
                content: MarkerContent::Bubble(BubbleStyle::for_cluster(
                    cluster.member_count,
                    cluster.abbreviated_count.clone(),
                )),
                scale: 1.0,
                on_click: ClickAction::ExpandCluster(cluster.id),
            }),
            DisplayItem::Point(point) => {
                let record = index.point(&point.point_id)?;
                Some(Self {
                    id: item.id(),
                    position: point.position,
                    content: MarkerContent::Pin(PinStyle {
                        label: record.name.clone(),
                        image_url: record.image_url.clone(),
                    }),
                    scale: style::pin_scale(zoom),
                    on_click: ClickAction::ShowDetails(point.point_id.clone()),
                })
            }
        }
    }
}

/// The host map engine.
///
/// Handles are owned: `remove_marker` consumes one, so a released handle
/// cannot be used again.
pub trait MapSurface {
    type Handle;

    /// The map has loaded and accepts markers.
    fn is_ready(&self) -> bool;

    /// Current camera, or `None` before the map is ready.
    fn camera(&self) -> Option<Viewport>;

    fn add_marker(&mut self, spec: &MarkerSpec) -> Result<Self::Handle, SurfaceError>;

    fn move_marker(&mut self, handle: &mut Self::Handle, position: Point);

    fn rescale_marker(&mut self, _handle: &mut Self::Handle, _scale: f64) {}

    fn remove_marker(&mut self, handle: Self::Handle);

    /// Start an animated camera move.
    fn fly_to(&mut self, transition: &CameraTransition);

    /// Hover styling hook.
    fn set_hovered(&mut self, _handle: &mut Self::Handle, _hovered: bool) {}
}
