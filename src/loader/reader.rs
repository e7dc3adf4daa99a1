use crate::core::projection::describe;
use crate::core::raster::DsmGrid;
use crate::core::spatial::GeoTransform;
use crate::error::{PlanError, Result};
use crate::utils::dataset::DatasetEx;
use gdal::Dataset;
use gdal::spatial_ref::SpatialRef;
use std::path::Path;
use tap::TapOptional;
use tracing::{debug, info, warn};

/// Band 1 is read into memory when it takes fewer bytes than this.
pub const PRELOAD_THRESHOLD: usize = 1 << 30;

/// An opened DSM. A windowed grid owns the GDAL handle, which is released
/// when the last clone of the grid drops.
pub struct Dsm {
    pub grid: DsmGrid,
    pub crs: Option<SpatialRef>,
}

impl Dsm {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_threshold(path, PRELOAD_THRESHOLD)
    }

    pub fn open_with_threshold(path: impl AsRef<Path>, preload_threshold: usize) -> Result<Self> {
        let path = path.as_ref();
        let dataset = Dataset::open_dataset(path)?;

        let gt_array = dataset
            .geo_transform()
            .map_err(|_| PlanError::Input(format!("GeoTransform missing for {path:?}")))?;
        let transform = GeoTransform::from_gdal(gt_array)?;

        let crs = dataset.spatial_ref().ok().tap_none(|| {
            warn!("DSM {path:?} carries no CRS, features are assumed to share its frame")
        });

        let band = dataset.rasterband(1)?;
        let no_data_value = band.no_data_value();
        let (w, h) = band.size();
        let total_bytes = w * h * size_of::<f32>();

        let grid = if total_bytes < preload_threshold {
            let buffer = band.read_as::<f32>((0, 0), (w, h), (w, h), None)?;
            DsmGrid::new(transform, w, h, buffer.data().to_vec(), no_data_value)?
        } else {
            info!(
                "DSM {path:?} is {} MiB, reading it window by window",
                total_bytes >> 20
            );
            drop(band);
            DsmGrid::windowed(transform, w, h, dataset, no_data_value)
        };

        debug!(
            "Opened DSM {path:?}: {w}x{h} cells, nodata {:?}, CRS {}",
            no_data_value,
            crs.as_ref().map(describe).unwrap_or_else(|| "unknown".into())
        );

        Ok(Self { grid, crs })
    }

    pub fn from_grid(grid: DsmGrid, crs: Option<SpatialRef>) -> Self {
        Self { grid, crs }
    }
}
