//! Display items: the zoom-specific answer to "what should be drawn here".
//!
//! A query returns a list of [`DisplayItem`]s, each either an aggregate
//! [`ClusterItem`] or a single [`PointItem`]. Items are identified by
//! [`DisplayId`], which is what keeps on-screen markers stable between frames.

use clustermap_types::PointId;
use geo::Point;
use std::fmt;

/// Identity of a cluster within one built index.
///
/// `zoom` is the level the cluster was formed at and `index` its slot on that
/// level. A cluster carried unchanged to lower zoom levels keeps its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId {
    pub zoom: u8,
    pub index: u32,
}

impl ClusterId {
    pub fn new(zoom: u8, index: u32) -> Self {
        Self { zoom, index }
    }

    /// Pack into a single integer: the slot in the high bits, `zoom + 1` in
    /// the low five bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustermap::ClusterId;
    ///
    /// let id = ClusterId::new(12, 345);
    /// assert_eq!(ClusterId::from_u64(id.as_u64()), Some(id));
    /// ```
    pub fn as_u64(&self) -> u64 {
        ((self.index as u64) << 5) | (self.zoom as u64 + 1)
    }

    pub fn from_u64(value: u64) -> Option<Self> {
        let zoom_bits = value & 0x1f;
        let index = u32::try_from(value >> 5).ok()?;
        if zoom_bits == 0 {
            return None;
        }
        Some(Self {
            zoom: (zoom_bits - 1) as u8,
            index,
        })
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zoom, self.index)
    }
}

/// Identity of a display item: a cluster id or a point id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DisplayId {
    Cluster(ClusterId),
    Point(PointId),
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayId::Cluster(id) => write!(f, "cluster:{}", id),
            DisplayId::Point(id) => write!(f, "point:{}", id),
        }
    }
}

impl From<ClusterId> for DisplayId {
    fn from(id: ClusterId) -> Self {
        DisplayId::Cluster(id)
    }
}

impl From<PointId> for DisplayId {
    fn from(id: PointId) -> Self {
        DisplayId::Point(id)
    }
}

/// An aggregate standing in for several nearby points.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterItem {
    pub id: ClusterId,
    /// Member-weighted centroid
    pub position: Point,
    pub member_count: u32,
    /// Short label for the bubble, e.g. `"1.2k"`
    pub abbreviated_count: String,
    /// Zoom at which this cluster splits
    pub expansion_zoom: u8,
}

/// A single point shown on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PointItem {
    pub point_id: PointId,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    Cluster(ClusterItem),
    Point(PointItem),
}

impl DisplayItem {
    pub fn id(&self) -> DisplayId {
        match self {
            DisplayItem::Cluster(cluster) => DisplayId::Cluster(cluster.id),
            DisplayItem::Point(point) => DisplayId::Point(point.point_id.clone()),
        }
    }

    pub fn position(&self) -> Point {
        match self {
            DisplayItem::Cluster(cluster) => cluster.position,
            DisplayItem::Point(point) => point.position,
        }
    }

    /// Number of points represented (1 for a point).
    pub fn member_count(&self) -> u32 {
        match self {
            DisplayItem::Cluster(cluster) => cluster.member_count,
            DisplayItem::Point(_) => 1,
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, DisplayItem::Cluster(_))
    }

    pub fn as_cluster(&self) -> Option<&ClusterItem> {
        match self {
            DisplayItem::Cluster(cluster) => Some(cluster),
            DisplayItem::Point(_) => None,
        }
    }
}

/// The display items for one settled viewport.
///
/// `generation` orders frames: a frame older than one already applied is
/// never applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub generation: u64,
    pub zoom: f64,
    pub items: Vec<DisplayItem>,
}

impl Frame {
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            zoom: 0.0,
            items: Vec::new(),
        }
    }
}

/// Short label for a member count.
///
/// # Examples
///
/// ```
/// use clustermap::display::abbreviate_count;
///
/// assert_eq!(abbreviate_count(42), "42");
/// assert_eq!(abbreviate_count(1250), "1.3k");
/// assert_eq!(abbreviate_count(3000), "3k");
/// assert_eq!(abbreviate_count(18_400), "18k");
/// ```
pub fn abbreviate_count(count: u32) -> String {
    if count >= 10_000 {
        format!("{}k", (count as f64 / 1000.0).round())
    } else if count >= 1000 {
        format!("{}k", (count as f64 / 100.0).round() / 10.0)
    } else {
        count.to_string()
    }
}
