//! Clustering configuration
//!
//! [`ClusterConfig`] is plain serializable data so hosts can ship it as JSON
//! (or TOML with the `toml` feature) next to their map style.
use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};

/// Zoom levels are encoded in five bits of the numeric cluster id.
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

/// Clustering and navigation options.
///
/// Field names are snake_case; the camelCase spellings used by web map
/// hosts (`clusterRadiusPx`, `maxClusteringZoom`, ...) are accepted too.
///
/// # Example
///
/// ```rust
/// use clustermap::ClusterConfig;
///
/// let config = ClusterConfig::default();
/// assert_eq!(config.cluster_radius_px, 40.0);
///
/// let json = r#"{
///     "clusterRadiusPx": 60,
///     "max_clustering_zoom": 15
/// }"#;
/// let config = ClusterConfig::from_json(json).unwrap();
/// assert_eq!(config.cluster_radius_px, 60.0);
/// assert_eq!(config.max_clustering_zoom, 15);
/// assert_eq!(config.min_points_per_cluster, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Merge radius in screen pixels
    #[serde(default = "ClusterConfig::default_radius", alias = "clusterRadiusPx")]
    pub cluster_radius_px: f64,

    /// At and above this zoom every point is shown individually
    #[serde(
        default = "ClusterConfig::default_max_clustering_zoom",
        alias = "maxClusteringZoom"
    )]
    pub max_clustering_zoom: u8,

    /// Smallest number of points a cluster may hold
    #[serde(
        default = "ClusterConfig::default_min_points",
        alias = "minPointsPerCluster"
    )]
    pub min_points_per_cluster: usize,

    /// Upper bound for the zoom a cluster click flies to
    #[serde(
        default = "ClusterConfig::default_expansion_zoom_cap",
        alias = "expansionZoomCap"
    )]
    pub expansion_zoom_cap: u8,

    /// Pixel size of one zoom-0 tile
    #[serde(default = "ClusterConfig::default_tile_extent", alias = "tileExtent")]
    pub tile_extent: f64,

    /// Duration of the camera transition issued on cluster click
    #[serde(
        default = "ClusterConfig::default_transition_duration_ms",
        alias = "transitionDurationMs"
    )]
    pub transition_duration_ms: u64,
}

impl ClusterConfig {
    const fn default_radius() -> f64 {
        40.0
    }

    const fn default_max_clustering_zoom() -> u8 {
        17
    }

    const fn default_min_points() -> usize {
        2
    }

    const fn default_expansion_zoom_cap() -> u8 {
        20
    }

    const fn default_tile_extent() -> f64 {
        512.0
    }

    const fn default_transition_duration_ms() -> u64 {
        800
    }

    pub fn with_cluster_radius(mut self, radius_px: f64) -> Self {
        self.cluster_radius_px = radius_px;
        self
    }

    pub fn with_max_clustering_zoom(mut self, zoom: u8) -> Self {
        self.max_clustering_zoom = zoom;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points_per_cluster = min_points;
        self
    }

    pub fn with_expansion_zoom_cap(mut self, cap: u8) -> Self {
        self.expansion_zoom_cap = cap;
        self
    }

    pub fn with_tile_extent(mut self, extent: f64) -> Self {
        self.tile_extent = extent;
        self
    }

    pub fn with_transition_duration_ms(mut self, duration_ms: u64) -> Self {
        self.transition_duration_ms = duration_ms;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.cluster_radius_px.is_finite() || self.cluster_radius_px <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "Cluster radius must be a positive number of pixels, got: {}",
                self.cluster_radius_px
            )));
        }

        if self.max_clustering_zoom > MAX_SUPPORTED_ZOOM {
            return Err(ClusterError::InvalidConfig(format!(
                "Max clustering zoom must be at most {}, got: {}",
                MAX_SUPPORTED_ZOOM, self.max_clustering_zoom
            )));
        }

        if self.min_points_per_cluster < 2 {
            return Err(ClusterError::InvalidConfig(
                "A cluster needs at least 2 points".to_string(),
            ));
        }

        if self.expansion_zoom_cap == 0 {
            return Err(ClusterError::InvalidConfig(
                "Expansion zoom cap must be greater than zero".to_string(),
            ));
        }

        if !self.tile_extent.is_finite() || self.tile_extent <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "Tile extent must be positive, got: {}",
                self.tile_extent
            )));
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ClusterConfig = serde_json::from_str(json).map_err(|e| {
            ClusterError::Serialization(format!("Failed to parse config JSON: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ClusterError::Serialization(format!("Failed to serialize config: {}", e))
        })
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: ClusterConfig = toml::from_str(toml_str).map_err(|e| {
            ClusterError::Serialization(format!("Failed to parse config TOML: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ClusterError::Serialization(format!("Failed to serialize config: {}", e))
        })
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_radius_px: Self::default_radius(),
            max_clustering_zoom: Self::default_max_clustering_zoom(),
            min_points_per_cluster: Self::default_min_points(),
            expansion_zoom_cap: Self::default_expansion_zoom_cap(),
            tile_extent: Self::default_tile_extent(),
            transition_duration_ms: Self::default_transition_duration_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClusterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_clustering_zoom, 17);
        assert_eq!(config.expansion_zoom_cap, 20);
    }

    #[test]
    fn test_json_roundtrip_keeps_values() {
        let config = ClusterConfig::default()
            .with_cluster_radius(55.0)
            .with_min_points(3);
        let json = config.to_json().unwrap();
        let parsed = ClusterConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(
            ClusterConfig::default()
                .with_cluster_radius(0.0)
                .validate()
                .is_err()
        );
        assert!(
            ClusterConfig::default()
                .with_cluster_radius(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(ClusterConfig::default().with_min_points(1).validate().is_err());
        assert!(
            ClusterConfig::default()
                .with_max_clustering_zoom(31)
                .validate()
                .is_err()
        );
        assert!(
            ClusterConfig::default()
                .with_expansion_zoom_cap(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_from_json_rejects_invalid_config() {
        let result = ClusterConfig::from_json(r#"{"minPointsPerCluster": 1}"#);
        assert!(matches!(result, Err(ClusterError::InvalidConfig(_))));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_config() {
        let config = ClusterConfig::from_toml("cluster_radius_px = 80.0\nexpansion_zoom_cap = 18\n")
            .unwrap();
        assert_eq!(config.cluster_radius_px, 80.0);
        assert_eq!(config.expansion_zoom_cap, 18);
    }
}
