use crate::error::{PlanError, Result};
use gdal::Dataset;
use std::path::Path;

pub trait DatasetEx {
    fn open_dataset(path: impl AsRef<Path>) -> Result<Dataset>;
}

impl DatasetEx for Dataset {
    fn open_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        Dataset::open(path).map_err(|source| PlanError::Open {
            path: path.to_path_buf(),
            source,
        })
    }
}
