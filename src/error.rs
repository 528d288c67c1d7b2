//! Error types for clustermap.

use crate::display::ClusterId;
use crate::markers::SurfaceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No cluster with id {0}")]
    UnknownCluster(ClusterId),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Map surface error: {0}")]
    Surface(#[from] SurfaceError),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
