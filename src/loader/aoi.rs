use crate::core::feature::FeatureSet;
use crate::core::projection::{Reprojector, describe, differs};
use crate::error::{PlanError, Result};
use crate::utils::dataset::DatasetEx;
use gdal::Dataset;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::LayerAccess;
use geo::{BooleanOps, Geometry, Intersects, MultiPolygon};
use std::path::Path;
use tap::Tap;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    pub polygons: Vec<MultiPolygon<f64>>,
    pub crs: Option<SpatialRef>,
}

pub fn read_aoi(path: impl AsRef<Path>) -> Result<AreaOfInterest> {
    let path = path.as_ref();
    let dataset = Dataset::open_dataset(path)?;
    let mut layer = dataset.layer(0)?;
    let crs = layer.spatial_ref();

    let mut polygons = Vec::new();
    for (row, feature) in layer.features().enumerate() {
        let geometry = feature
            .geometry()
            .map(Geometry::<f64>::try_from)
            .transpose()?;

        match geometry {
            Some(Geometry::Polygon(p)) => polygons.push(MultiPolygon::new(vec![p])),
            Some(Geometry::MultiPolygon(mp)) => polygons.push(mp),
            _ => {
                return Err(PlanError::Input(format!(
                    "AOI row {row} of {path:?} is not a polygon"
                )));
            }
        }
    }

    Ok(AreaOfInterest { polygons, crs })
}

impl AreaOfInterest {
    /// Keep only the polygon at 1-based `index`.
    pub fn select(self, index: usize) -> Result<Self> {
        let count = self.polygons.len();
        if index == 0 || index > count {
            return Err(PlanError::Input(format!(
                "AOI index {index} out of range: the AOI holds {count} polygon(s), indices start at 1"
            )));
        }

        let polygon = self.polygons.into_iter().nth(index - 1);
        Ok(Self {
            polygons: polygon.into_iter().collect(),
            crs: self.crs,
        })
    }

    pub fn align_to(self, target: Option<&SpatialRef>) -> Result<Self> {
        let (Some(source), Some(target)) = (self.crs.as_ref(), target) else {
            return Ok(self);
        };
        if !differs(Some(source), Some(target)) {
            return Ok(self);
        }

        warn!(
            "AOI CRS ({}) does not match features CRS ({}). Reprojecting AOI to features CRS.",
            describe(source),
            describe(target)
        );
        let projector = Reprojector::new(source, target)?;
        let polygons = self
            .polygons
            .iter()
            .map(|mp| projector.multi_polygon(mp))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            polygons,
            crs: Some(target.clone()),
        })
    }

    pub fn union(&self) -> MultiPolygon<f64> {
        self.polygons
            .iter()
            .fold(MultiPolygon::new(vec![]), |acc, mp| acc.union(mp))
    }
}

/// Keep the features touching the AOI, optionally narrowed to one polygon.
pub fn filter_by_aoi(
    features: FeatureSet,
    aoi: AreaOfInterest,
    index: Option<usize>,
) -> Result<FeatureSet> {
    let aoi = match index {
        Some(i) => aoi.select(i)?,
        None => aoi,
    };
    let aoi = aoi.align_to(features.crs.as_ref())?;
    let mask = aoi.union();

    let before = features.len();
    let kept = features
        .features
        .into_iter()
        .filter(|f| mask.intersects(&f.position))
        .collect::<Vec<_>>()
        .tap(|kept| info!("AOI filter kept {} of {before} features", kept.len()));
    Ok(FeatureSet::new(kept, features.crs))
}
