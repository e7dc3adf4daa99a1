use gdal::errors::GdalError;
use std::fmt::Write;
use std::path::PathBuf;
use thiserror::Error;

const MAX_LISTED_IDS: usize = 10;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Insufficient features: route planning needs at least 2 stops, found {count} (feature {id})")]
    InsufficientFeatures { count: usize, id: String },

    #[error("Coverage error: {} feature(s) outside the DSM extent: {}", ids.len(), list_ids(ids))]
    Coverage { ids: Vec<String> },

    #[error("Sampling error: no valid DSM cell under the buffer of {target}")]
    Sampling { target: String },

    #[error("No route found: {0}")]
    NoRouteFound(String),

    #[error("Failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: GdalError,
    },

    #[error(transparent)]
    Gdal(#[from] GdalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PlanError>;

fn list_ids(ids: &[String]) -> String {
    let mut out = ids
        .iter()
        .take(MAX_LISTED_IDS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    if ids.len() > MAX_LISTED_IDS {
        let _ = write!(out, " ... and {} more", ids.len() - MAX_LISTED_IDS);
    }
    out
}
