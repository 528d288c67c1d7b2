use geo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Wrap a longitude into `[-180, 180)`.
///
/// # Examples
///
/// ```
/// use clustermap_types::wrap_longitude;
///
/// assert_eq!(wrap_longitude(190.0), -170.0);
/// assert_eq!(wrap_longitude(-185.0), 175.0);
/// assert_eq!(wrap_longitude(12.5), 12.5);
/// ```
pub fn wrap_longitude(lon: f64) -> f64 {
    ((lon + 180.0) % 360.0 + 360.0) % 360.0 - 180.0
}

/// A geographic bounding box as reported by a map camera.
///
/// Unlike `geo::Rect`, the corners are kept as given: `west` may be greater
/// than `east` when the box crosses the antimeridian, and a box wider than
/// 360 degrees covers every longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    /// The whole world.
    pub const WORLD: GeoBounds = GeoBounds {
        west: -180.0,
        south: -90.0,
        east: 180.0,
        north: 90.0,
    };

    /// Create bounds from west/south/east/north edges in degrees.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustermap_types::GeoBounds;
    ///
    /// let seattle = GeoBounds::new(-122.45, 47.48, -122.22, 47.74);
    /// assert!(!seattle.crosses_antimeridian());
    /// ```
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Create bounds from a `geo::Rect` (never crosses the antimeridian).
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    /// All four edges are finite numbers.
    pub fn is_finite(&self) -> bool {
        [self.west, self.south, self.east, self.north]
            .iter()
            .all(|v| v.is_finite())
    }

    /// The box is at least one full turn wide.
    pub fn spans_all_longitudes(&self) -> bool {
        self.east - self.west >= 360.0
    }

    /// The box wraps past 180° back to -180°.
    pub fn crosses_antimeridian(&self) -> bool {
        if self.spans_all_longitudes() {
            return false;
        }
        let (west, east) = self.normalized_longitudes();
        west > east
    }

    /// Wrap both edges into `[-180, 180)`, keeping an edge of exactly 180 as is.
    fn normalized_longitudes(&self) -> (f64, f64) {
        let normalize = |lon: f64| if lon == 180.0 { 180.0 } else { wrap_longitude(lon) };
        (normalize(self.west), normalize(self.east))
    }

    fn clamped_latitudes(&self) -> (f64, f64) {
        let south = self.south.clamp(-90.0, 90.0);
        let north = self.north.clamp(-90.0, 90.0);
        if south <= north {
            (south, north)
        } else {
            (north, south)
        }
    }

    /// Split the box into one or two normalized rectangles.
    ///
    /// Latitudes are clamped to ±90. A box crossing the antimeridian yields
    /// its eastern and western halves.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustermap_types::GeoBounds;
    ///
    /// let pacific = GeoBounds::new(170.0, -10.0, -170.0, 10.0);
    /// let rects = pacific.to_rects();
    /// assert_eq!(rects.len(), 2);
    /// assert_eq!(rects[0].max().x, 180.0);
    /// assert_eq!(rects[1].min().x, -180.0);
    /// ```
    pub fn to_rects(&self) -> Vec<Rect> {
        let (south, north) = self.clamped_latitudes();
        let rect = |west: f64, east: f64| {
            Rect::new(
                geo::coord! { x: west, y: south },
                geo::coord! { x: east, y: north },
            )
        };

        if self.spans_all_longitudes() {
            return vec![rect(-180.0, 180.0)];
        }

        let (west, east) = self.normalized_longitudes();
        if west > east {
            vec![rect(west, 180.0), rect(-180.0, east)]
        } else {
            vec![rect(west, east)]
        }
    }

    /// Check whether a point lies inside the box (edges inclusive).
    pub fn contains_point(&self, point: &Point) -> bool {
        self.to_rects().iter().any(|r| {
            point.x() >= r.min().x
                && point.x() <= r.max().x
                && point.y() >= r.min().y
                && point.y() <= r.max().y
        })
    }

    /// Longitudinal extent in degrees, accounting for antimeridian wrap.
    pub fn width(&self) -> f64 {
        if self.spans_all_longitudes() {
            return 360.0;
        }
        let (west, east) = self.normalized_longitudes();
        if west > east {
            180.0 - west + (east + 180.0)
        } else {
            east - west
        }
    }

    /// Latitudinal extent in degrees.
    pub fn height(&self) -> f64 {
        let (south, north) = self.clamped_latitudes();
        north - south
    }

    /// Geographic center of the box.
    pub fn center(&self) -> Point {
        let (south, north) = self.clamped_latitudes();
        let (west, _) = self.normalized_longitudes();
        let lon = if self.spans_all_longitudes() {
            0.0
        } else {
            wrap_longitude(west + self.width() / 2.0)
        };
        Point::new(lon, (south + north) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_bounds_single_rect() {
        let bounds = GeoBounds::new(-74.05, 40.68, -73.90, 40.88);
        let rects = bounds.to_rects();
        assert_eq!(rects.len(), 1);
        assert!(bounds.contains_point(&Point::new(-73.98, 40.75)));
        assert!(!bounds.contains_point(&Point::new(-73.80, 40.75)));
    }

    #[test]
    fn test_antimeridian_crossing() {
        let bounds = GeoBounds::new(175.0, -5.0, 185.0, 5.0);
        assert!(bounds.crosses_antimeridian());
        assert!(bounds.contains_point(&Point::new(179.0, 0.0)));
        assert!(bounds.contains_point(&Point::new(-178.0, 0.0)));
        assert!(!bounds.contains_point(&Point::new(170.0, 0.0)));
        assert!((bounds.width() - 10.0).abs() < 1e-9);
        let center_lon = bounds.center().x();
        assert!((center_lon.abs() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_world_spanning_bounds() {
        let bounds = GeoBounds::new(-400.0, -95.0, 400.0, 95.0);
        assert!(bounds.spans_all_longitudes());
        assert!(!bounds.crosses_antimeridian());
        let rects = bounds.to_rects();
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].min().y, -90.0);
        assert_eq!(rects[0].max().y, 90.0);
        assert!(bounds.contains_point(&Point::new(179.9, 89.0)));
    }

    #[test]
    fn test_east_edge_at_180_is_not_wrapped() {
        let bounds = GeoBounds::new(0.0, 0.0, 180.0, 10.0);
        assert!(!bounds.crosses_antimeridian());
        assert!(bounds.contains_point(&Point::new(180.0, 5.0)));
    }

    #[test]
    fn test_zero_width_at_180_stays_zero_width() {
        let bounds = GeoBounds::new(180.0, 0.0, 180.0, 50.0);
        let rects = bounds.to_rects();
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].min().x, 180.0);
        assert_eq!(rects[0].max().x, 180.0);
        assert_eq!(bounds.width(), 0.0);
        assert!(bounds.contains_point(&Point::new(180.0, 10.0)));
        assert!(!bounds.contains_point(&Point::new(-122.33, 47.61)));
    }

    #[test]
    fn test_west_edge_at_180_crossing() {
        let bounds = GeoBounds::new(180.0, -10.0, -170.0, 10.0);
        assert!(bounds.crosses_antimeridian());
        assert!((bounds.width() - 10.0).abs() < 1e-9);
        assert!(bounds.contains_point(&Point::new(-175.0, 0.0)));
        assert!(!bounds.contains_point(&Point::new(170.0, 0.0)));
    }
}
