//! Validation for point coordinates and point-set screening.

use crate::error::{ClusterError, Result};
use clustermap_types::{PointId, PointRecord};
use rustc_hash::FxHashSet;

/// Validates a longitude/latitude pair.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use clustermap::compute::validation::validate_coordinates;
///
/// assert!(validate_coordinates(-122.33, 47.61).is_ok());
/// assert!(validate_coordinates(200.0, 40.0).is_err());
/// assert!(validate_coordinates(-74.0, f64::NAN).is_err());
/// ```
pub fn validate_coordinates(lon: f64, lat: f64) -> Result<()> {
    if !lon.is_finite() {
        return Err(ClusterError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            lon
        )));
    }

    if !lat.is_finite() {
        return Err(ClusterError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lon) {
        return Err(ClusterError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lon
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(ClusterError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    Ok(())
}

/// Validates the coordinates of a single record.
pub fn validate_point_record(record: &PointRecord) -> Result<()> {
    validate_coordinates(record.longitude, record.latitude)
        .map_err(|e| ClusterError::InvalidInput(format!("Point {}: {}", record.id, e)))
}

/// A point that was left out of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedPoint {
    /// Position in the input
    pub index: usize,
    /// Identifier, when one could be read
    pub id: Option<PointId>,
    pub reason: String,
}

/// Outcome of screening a point set: how many points were kept and why the
/// others were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataQualityReport {
    pub accepted: usize,
    pub rejected: Vec<RejectedPoint>,
}

impl DataQualityReport {
    /// No point was rejected.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    pub(crate) fn reject(&mut self, index: usize, id: Option<PointId>, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!(
            "Excluding point at index {} ({}): {}",
            index,
            id.as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "no id".to_string()),
            reason
        );
        self.rejected.push(RejectedPoint { index, id, reason });
    }
}

/// Screens a point set, returning the indices of usable records.
///
/// Records with invalid coordinates are dropped, and so is every record
/// repeating an id seen earlier (the first occurrence wins).
///
/// # Examples
///
/// ```
/// use clustermap::compute::validation::screen_points;
/// use clustermap_types::PointRecord;
///
/// let points = vec![
///     PointRecord::new(1, -122.33, 47.61),
///     PointRecord::new(2, 999.0, 47.61),
///     PointRecord::new(1, -122.30, 47.60),
/// ];
///
/// let (kept, report) = screen_points(&points);
/// assert_eq!(kept, vec![0]);
/// assert_eq!(report.rejected_count(), 2);
/// ```
pub fn screen_points(points: &[PointRecord]) -> (Vec<usize>, DataQualityReport) {
    let mut report = DataQualityReport::default();
    let mut seen: FxHashSet<&PointId> = FxHashSet::default();
    let mut kept = Vec::with_capacity(points.len());

    for (index, record) in points.iter().enumerate() {
        if let Err(e) = validate_point_record(record) {
            report.reject(index, Some(record.id.clone()), e.to_string());
            continue;
        }
        if !seen.insert(&record.id) {
            report.reject(
                index,
                Some(record.id.clone()),
                format!("Duplicate point id {}", record.id),
            );
            continue;
        }
        kept.push(index);
    }

    report.accepted = kept.len();
    (kept, report)
}
