//! # clustermap-types
//!
//! Plain data types shared by the `clustermap` crate and its hosts:
//!
//! - **Point records**: [`PointRecord`], [`PointId`], [`Price`]
//! - **Bounds**: [`GeoBounds`], a west/south/east/north box that may cross
//!   the antimeridian
//! - **Viewport**: [`Viewport`], the settled camera state of a map
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use clustermap_types::{GeoBounds, PointRecord, Viewport};
//!
//! let hotel = PointRecord::new(1, -122.3321, 47.6062).with_name("Downtown Inn");
//! let viewport = Viewport::new(GeoBounds::new(-122.5, 47.4, -122.1, 47.8), 11.0);
//! assert!(viewport.bounds.contains_point(&hotel.location()));
//! ```

pub mod bbox;
pub mod point;
pub mod viewport;

pub use bbox::{GeoBounds, wrap_longitude};
pub use point::{PointId, PointRecord, Price};
pub use viewport::Viewport;

/// Re-exports of the geometric primitives used throughout.
pub mod geo {
    pub use geo::{Point, Rect};
}
