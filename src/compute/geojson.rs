//! GeoJSON conversion for display items and point sets.
//!
//! Cluster features carry the same properties web clustering libraries
//! emit (`cluster`, `cluster_id`, `point_count`, `point_count_abbreviated`)
//! so the output can feed a map style directly.

use crate::compute::SpatialIndex;
use crate::display::DisplayItem;
use crate::error::{ClusterError, Result};
use crate::loader::{LoadedPoints, screen_values};
use clustermap_types::PointId;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde_json::json;

/// Converts display items to a FeatureCollection.
///
/// Point features carry the point's full record as properties; points not
/// found in `index` get only their id.
pub fn display_items_to_geojson(items: &[DisplayItem], index: &SpatialIndex) -> FeatureCollection {
    let features = items
        .iter()
        .map(|item| match item {
            DisplayItem::Cluster(cluster) => {
                let mut properties = JsonObject::new();
                properties.insert("cluster".into(), json!(true));
                properties.insert("cluster_id".into(), json!(cluster.id.as_u64()));
                properties.insert("point_count".into(), json!(cluster.member_count));
                properties.insert(
                    "point_count_abbreviated".into(),
                    json!(cluster.abbreviated_count),
                );
                properties.insert("expansion_zoom".into(), json!(cluster.expansion_zoom));
                feature(
                    item,
                    Some(Id::Number(cluster.id.as_u64().into())),
                    properties,
                )
            }
            DisplayItem::Point(point) => {
                let mut properties = index
                    .point(&point.point_id)
                    .and_then(|record| serde_json::to_value(record).ok())
                    .and_then(|value| match value {
                        serde_json::Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .unwrap_or_else(|| {
                        let mut map = JsonObject::new();
                        map.insert("id".into(), json!(point.point_id));
                        map
                    });
                properties.insert("cluster".into(), json!(false));
                feature(item, Some(point_feature_id(&point.point_id)), properties)
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Converts display items to a GeoJSON string.
pub fn display_items_to_geojson_string(items: &[DisplayItem], index: &SpatialIndex) -> Result<String> {
    let collection = display_items_to_geojson(items, index);
    serde_json::to_string(&collection).map_err(|e| {
        ClusterError::Serialization(format!("Failed to serialize display items: {}", e))
    })
}

/// Parses a FeatureCollection of point features into a point set.
///
/// Each feature's properties become the record's attributes and its point
/// geometry its location. The id is taken from `hotel_id`/`id` properties,
/// falling back to the feature id. Features that do not make a valid record
/// are reported, not fatal.
pub fn points_from_geojson(geojson: &str) -> Result<LoadedPoints> {
    let parsed: GeoJson = geojson
        .parse()
        .map_err(|e| ClusterError::InvalidInput(format!("Failed to parse GeoJSON: {}", e)))?;
    let GeoJson::FeatureCollection(collection) = parsed else {
        return Err(ClusterError::InvalidInput(
            "GeoJSON is not a FeatureCollection".to_string(),
        ));
    };

    let values = collection
        .features
        .into_iter()
        .map(|feature| {
            let mut record = feature.properties.unwrap_or_default();
            if !record.contains_key("hotel_id") && !record.contains_key("id") {
                match feature.id {
                    Some(Id::String(s)) => {
                        record.insert("id".into(), json!(s));
                    }
                    Some(Id::Number(n)) => {
                        record.insert("id".into(), serde_json::Value::Number(n));
                    }
                    None => {}
                }
            }
            if let Some(Value::Point(coords)) = feature.geometry.map(|g| g.value)
                && coords.len() >= 2
            {
                record.insert("longitude".into(), json!(coords[0]));
                record.insert("latitude".into(), json!(coords[1]));
            }
            serde_json::Value::Object(record)
        })
        .collect();

    Ok(screen_values(values))
}

fn feature(item: &DisplayItem, id: Option<Id>, properties: JsonObject) -> Feature {
    let position = item.position();
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![position.x(), position.y()]))),
        id,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn point_feature_id(id: &PointId) -> Id {
    match id {
        PointId::Number(n) => Id::Number((*n).into()),
        PointId::Text(s) => Id::String(s.clone()),
    }
}
