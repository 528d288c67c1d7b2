//! Session builder
//!
//! Collects the configuration and the point source for a map session, then
//! builds the index and wires the session together.

use crate::config::ClusterConfig;
use crate::engine::ClusterEngine;
use crate::error::Result;
use crate::loader::load_points_from_path;
use crate::markers::MapSurface;
use crate::session::{DetailView, MapSession};
use clustermap_types::PointRecord;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
enum PointSource {
    #[default]
    Empty,
    Memory(Arc<[PointRecord]>),
    File(PathBuf),
}

/// Builder for a [`MapSession`] or a bare [`ClusterEngine`].
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    config: ClusterConfig,
    source: PointSource,
}

impl SessionBuilder {
    /// A builder with default configuration and no points.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clustering configuration.
    pub fn config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an in-memory point set.
    pub fn points(mut self, points: Arc<[PointRecord]>) -> Self {
        self.source = PointSource::Memory(points);
        self
    }

    /// Load the point set from a JSON dataset file when building.
    pub fn points_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.source = PointSource::File(path.into());
        self
    }

    /// Build the engine. Reads the dataset file if one was configured.
    pub fn build_engine(self) -> Result<ClusterEngine> {
        let points = match self.source {
            PointSource::Empty => Arc::<[PointRecord]>::from(Vec::new()),
            PointSource::Memory(points) => points,
            PointSource::File(path) => {
                let loaded = load_points_from_path(&path)?;
                if !loaded.report.is_clean() {
                    log::warn!(
                        "{}: {} records skipped",
                        path.display(),
                        loaded.report.rejected_count()
                    );
                }
                loaded.points
            }
        };
        ClusterEngine::new(points, self.config)
    }

    /// Build a session drawing onto `surface`.
    pub fn build<M, D>(self, surface: M, details: D) -> Result<MapSession<M, D>>
    where
        M: MapSurface,
        D: DetailView,
    {
        Ok(MapSession::new(surface, details, self.build_engine()?))
    }
}
