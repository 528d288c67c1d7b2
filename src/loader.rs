//! Point-set loading.
//!
//! The dataset is a JSON array of hotel records. Records that cannot be
//! read or fail validation are skipped and listed in the returned report;
//! a file that is not a JSON array at all is an error.

use crate::compute::validation::{DataQualityReport, screen_points};
use crate::error::{ClusterError, Result};
use clustermap_types::{PointId, PointRecord};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// A screened point set, ready to index.
#[derive(Debug, Clone)]
pub struct LoadedPoints {
    pub points: Arc<[PointRecord]>,
    pub report: DataQualityReport,
}

impl LoadedPoints {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Parse a JSON array of point records.
///
/// # Examples
///
/// ```
/// use clustermap::loader::load_points_from_json;
///
/// let loaded = load_points_from_json(r#"[
///     {"hotel_id": 1, "name": "Alpha", "longitude": -122.34, "latitude": 47.61},
///     {"hotel_id": 2, "name": "Broken", "longitude": -122.34}
/// ]"#)?;
///
/// assert_eq!(loaded.len(), 1);
/// assert_eq!(loaded.report.rejected_count(), 1);
/// # Ok::<(), clustermap::ClusterError>(())
/// ```
pub fn load_points_from_json(json: &str) -> Result<LoadedPoints> {
    let values: Vec<Value> = serde_json::from_str(json)
        .map_err(|e| ClusterError::Serialization(format!("Point dataset: {}", e)))?;
    Ok(screen_values(values))
}

/// Read and parse a JSON point dataset from disk.
pub fn load_points_from_path<P: AsRef<Path>>(path: P) -> Result<LoadedPoints> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let loaded = load_points_from_json(&json)?;
    log::info!(
        "Loaded {} points from {} ({} skipped)",
        loaded.len(),
        path.display(),
        loaded.report.rejected_count()
    );
    Ok(loaded)
}

/// Screen already-parsed records: invalid coordinates and repeated ids are dropped.
pub fn screen_records(records: Vec<PointRecord>) -> LoadedPoints {
    let (kept, report) = screen_points(&records);
    let points = keep_indices(records, &kept);
    LoadedPoints {
        points: points.into(),
        report,
    }
}

pub(crate) fn screen_values(values: Vec<Value>) -> LoadedPoints {
    let mut report = DataQualityReport::default();
    let mut records = Vec::with_capacity(values.len());
    // Input index of each parsed record
    let mut origin = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        let id = record_id(&value);
        match serde_json::from_value::<PointRecord>(value) {
            Ok(record) => {
                records.push(record);
                origin.push(index);
            }
            Err(e) => report.reject(index, id, format!("Unreadable record: {}", e)),
        }
    }

    let (kept, screened) = screen_points(&records);
    for mut rejected in screened.rejected {
        rejected.index = origin[rejected.index];
        report.rejected.push(rejected);
    }
    report.rejected.sort_by_key(|r| r.index);
    report.accepted = kept.len();

    LoadedPoints {
        points: keep_indices(records, &kept).into(),
        report,
    }
}

fn record_id(value: &Value) -> Option<PointId> {
    let raw = value.get("hotel_id").or_else(|| value.get("id"))?;
    match raw {
        Value::Number(n) => n.as_i64().map(PointId::Number),
        Value::String(s) => Some(PointId::Text(s.clone())),
        _ => None,
    }
}

fn keep_indices(records: Vec<PointRecord>, kept: &[usize]) -> Vec<PointRecord> {
    let mut wanted = kept.iter().peekable();
    records
        .into_iter()
        .enumerate()
        .filter(|(index, _)| wanted.next_if_eq(&index).is_some())
        .map(|(_, record)| record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HOTELS: &str = r#"[
        {"hotel_id": 1, "name": "Alpha", "longitude": -122.34, "latitude": 47.61, "star_rating": 4},
        {"hotel_id": "b-2", "name": "Bravo", "longitude": -122.30, "latitude": 47.65, "price_per_night": 189.5},
        {"hotel_id": 3, "name": "Off the map", "longitude": 200.0, "latitude": 47.65},
        {"hotel_id": 1, "name": "Alpha again", "longitude": -122.31, "latitude": 47.62},
        {"name": "No id", "longitude": -122.31, "latitude": 47.62},
        {"hotel_id": 6, "name": "No latitude", "longitude": -122.31}
    ]"#;

    #[test]
    fn test_load_reports_bad_records() {
        let loaded = load_points_from_json(HOTELS).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.points[0].name, "Alpha");
        assert_eq!(loaded.points[1].id, PointId::from("b-2"));

        let report = &loaded.report;
        assert_eq!(report.accepted, 2);
        let indices: Vec<usize> = report.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![2, 3, 4, 5]);
        assert_eq!(report.rejected[0].id, Some(PointId::from(3)));
        assert_eq!(report.rejected[2].id, None);
        assert_eq!(report.rejected[3].id, Some(PointId::from(6)));
    }

    #[test]
    fn test_not_an_array_is_an_error() {
        let result = load_points_from_json(r#"{"hotels": []}"#);
        assert!(matches!(result, Err(ClusterError::Serialization(_))));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(HOTELS.as_bytes()).unwrap();

        let loaded = load_points_from_path(file.path()).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_screen_records_drops_duplicates() {
        let loaded = screen_records(vec![
            PointRecord::new(1, 0.0, 0.0),
            PointRecord::new(1, 1.0, 1.0),
            PointRecord::new(2, 1.0, f64::NAN),
            PointRecord::new(3, 2.0, 2.0),
        ]);
        let ids: Vec<&PointId> = loaded.points.iter().map(|p| &p.id).collect();
        assert_eq!(ids, vec![&PointId::from(1), &PointId::from(3)]);
        assert_eq!(loaded.report.rejected_count(), 2);
    }
}
