//! Viewport-driven point clustering and live map-marker management.
//!
//! A point set is indexed once into a per-zoom cluster hierarchy. Each time
//! the map camera settles, the points in view are grouped into display
//! items (clusters and single points), and the markers on the map are
//! reconciled against them so that nothing leaks, nothing is duplicated and
//! unchanged items keep their marker.
//!
//! ```rust
//! use clustermap::{ClusterConfig, ClusterEngine};
//! use clustermap_types::{PointRecord, Viewport};
//! use std::sync::Arc;
//!
//! let points: Arc<[PointRecord]> = vec![
//!     PointRecord::new(1, -122.3400, 47.6100),
//!     PointRecord::new(2, -122.3401, 47.6101),
//!     PointRecord::new(3, -122.2000, 47.7000),
//! ]
//! .into();
//!
//! let engine = ClusterEngine::new(points, ClusterConfig::default())?;
//! let downtown = Viewport::from_edges(-122.5, 47.5, -122.1, 47.8, 12.0);
//!
//! let items = engine.display_items(Some(&downtown));
//! assert_eq!(items.len(), 2);
//! assert_eq!(items.iter().map(|i| i.member_count()).sum::<u32>(), 3);
//! # Ok::<(), clustermap::ClusterError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod loader;
pub mod markers;
pub mod navigator;
pub mod session;
pub mod tracker;

pub use builder::SessionBuilder;
pub use compute::SpatialIndex;
pub use compute::validation::{DataQualityReport, RejectedPoint};
pub use config::ClusterConfig;
pub use display::{ClusterId, ClusterItem, DisplayId, DisplayItem, Frame, PointItem};
pub use engine::ClusterEngine;
pub use error::{ClusterError, Result};
pub use loader::{LoadedPoints, load_points_from_json, load_points_from_path};
pub use markers::{ClickAction, MapSurface, MarkerReconciler, MarkerSpec, SurfaceError};
pub use navigator::{CameraTransition, ExpansionNavigator};
pub use session::{ClickOutcome, DetailView, MapSession};
pub use tracker::{ViewportTracker, ViewportUpdate};

pub use clustermap_types as types;
pub use clustermap_types::{GeoBounds, PointId, PointRecord, Viewport};

pub use geo::{Point, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ClusterConfig, ClusterEngine, ClusterError, Result, SessionBuilder};

    pub use crate::{ClusterId, DisplayId, DisplayItem, Frame};

    pub use crate::{GeoBounds, PointId, PointRecord, Viewport};

    pub use crate::{ClickOutcome, DetailView, MapSession, MapSurface};

    pub use geo::Point;
}
