//! Marker appearance: cluster bubbles tiered by member count, hotel pins.

use std::fmt;

/// An RGBA colour with alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Rgba {
    /// CSS notation, e.g. `rgba(67, 56, 202, 0.7)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

const BUBBLE_ALPHA: f32 = 0.7;

/// Fill colour tiers: <4, <6, <10, >=10 members.
pub fn bubble_color(member_count: u32) -> Rgba {
    match member_count {
        10.. => Rgba::new(67, 56, 202, BUBBLE_ALPHA),
        6..=9 => Rgba::new(79, 70, 229, BUBBLE_ALPHA),
        4..=5 => Rgba::new(99, 102, 241, BUBBLE_ALPHA),
        _ => Rgba::new(129, 140, 248, BUBBLE_ALPHA),
    }
}

/// Radius tiers in pixels: <50, <100, >=100 members.
pub fn bubble_radius(member_count: u32) -> u32 {
    match member_count {
        100.. => 60,
        50..=99 => 50,
        _ => 40,
    }
}

/// Cluster bubble content.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleStyle {
    pub label: String,
    pub fill: Rgba,
    pub radius_px: u32,
    pub font_size_px: u32,
}

impl BubbleStyle {
    /// Style for a cluster of `member_count` points labelled `label`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clustermap::markers::style::BubbleStyle;
    ///
    /// let small = BubbleStyle::for_cluster(3, "3");
    /// assert_eq!(small.radius_px, 40);
    /// assert_eq!(small.fill.to_string(), "rgba(129, 140, 248, 0.7)");
    ///
    /// let large = BubbleStyle::for_cluster(1200, "1.2k");
    /// assert_eq!(large.radius_px, 60);
    /// assert_eq!(large.font_size_px, 18);
    /// ```
    pub fn for_cluster(member_count: u32, label: impl Into<String>) -> Self {
        let radius_px = bubble_radius(member_count);
        Self {
            label: label.into(),
            fill: bubble_color(member_count),
            radius_px,
            font_size_px: if radius_px >= 50 { 18 } else { 16 },
        }
    }
}

/// Hotel pin content: round thumbnail plus a name tag.
#[derive(Debug, Clone, PartialEq)]
pub struct PinStyle {
    pub label: String,
    pub image_url: String,
}

const PIN_REFERENCE_ZOOM: f64 = 16.0;
const PIN_MIN_SCALE: f64 = 0.6;
const PIN_MAX_SCALE: f64 = 0.8;

/// Scale applied to pins so they keep a roughly constant size while zooming.
///
/// # Examples
///
/// ```
/// use clustermap::markers::style::pin_scale;
///
/// assert_eq!(pin_scale(12.0), 0.8);
/// assert_eq!(pin_scale(20.0), 0.6);
/// assert!((pin_scale(17.0) - 0.6667).abs() < 1e-3);
/// ```
pub fn pin_scale(zoom: f64) -> f64 {
    if !zoom.is_finite() {
        return PIN_MAX_SCALE;
    }
    (1.0 / 1.5f64.powf(zoom - PIN_REFERENCE_ZOOM)).clamp(PIN_MIN_SCALE, PIN_MAX_SCALE)
}
