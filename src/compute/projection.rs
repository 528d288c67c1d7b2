//! Web Mercator projection onto the unit square.
//!
//! `x` grows eastwards from 0 at -180° to 1 at 180°, `y` grows southwards
//! from 0 at the northern Mercator limit to 1 at the southern one. At zoom
//! `z` the unit square spans `extent * 2^z` screen pixels, which is what
//! turns a pixel radius into a projected distance.

use geo::Point;
use std::f64::consts::PI;

/// Project a longitude to `[0, 1]`.
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Project a latitude to `[0, 1]`, clamping beyond the Mercator limit.
pub fn lat_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0).to_radians();
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Project a geographic point to unit-square `(x, y)`.
pub fn project(point: &Point) -> (f64, f64) {
    (lng_x(point.x()), lat_y(point.y()))
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64) -> Point {
    Point::new(x_lng(x), y_lat(y))
}

/// Projected distance covered by `radius_px` screen pixels at `zoom`.
///
/// # Examples
///
/// ```
/// use clustermap::compute::projection::radius_at_zoom;
///
/// // 40px on a 512px tile at zoom 0 is 40/512 of the world.
/// assert_eq!(radius_at_zoom(40.0, 512.0, 0), 40.0 / 512.0);
/// assert_eq!(radius_at_zoom(40.0, 512.0, 1), 40.0 / 1024.0);
/// ```
pub fn radius_at_zoom(radius_px: f64, extent: f64, zoom: u8) -> f64 {
    radius_px / (extent * 2f64.powi(zoom as i32))
}
