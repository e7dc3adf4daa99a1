pub mod sampler;

use crate::core::feature::FeatureSet;
use crate::core::projection::{describe, differs};
use crate::core::validator::validate_coverage;
use crate::error::Result;
use gdal::spatial_ref::SpatialRef;
use geo::Rect;
use tracing::{info, warn};

pub use sampler::ElevationSampler;

pub fn align_to_dsm(features: FeatureSet, dsm_crs: Option<&SpatialRef>) -> Result<FeatureSet> {
    match (features.crs.as_ref(), dsm_crs) {
        (Some(source), Some(target)) if differs(Some(source), Some(target)) => {
            warn!(
                "Features CRS ({}) does not match DSM CRS ({}). Reprojecting features to DSM CRS.",
                describe(source),
                describe(target)
            );
            features.reproject(target)
        }
        (None, _) | (_, None) => {
            warn!("CRS unknown on features or DSM, assuming both share one frame");
            Ok(features)
        }
        _ => Ok(features),
    }
}

pub fn check_coverage(features: &FeatureSet, extent: Rect<f64>) -> Result<()> {
    validate_coverage(features, extent)?;
    info!("All {} features lie within the DSM extent", features.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feature::Feature;
    use crate::error::PlanError;
    use geo::Coord;

    #[test]
    fn features_are_moved_into_the_dsm_crs() {
        let wgs = crate::core::projection::wgs84().unwrap();
        let utm = SpatialRef::from_epsg(32718).unwrap();
        let set = FeatureSet::new(
            vec![Feature::new("1", Coord { x: -75.0, y: -12.5 })],
            Some(wgs),
        );

        let out = align_to_dsm(set, Some(&utm)).unwrap();
        assert_eq!(out.crs.as_ref(), Some(&utm));
        assert!((out.features[0].position.x - 500_000.0).abs() < 1.0);
    }

    #[test]
    fn unknown_crs_keeps_coordinates() {
        let set = FeatureSet::new(vec![Feature::new("1", Coord { x: 3.0, y: 4.0 })], None);
        let out = align_to_dsm(set, None).unwrap();
        assert_eq!(out.features[0].position, Coord { x: 3.0, y: 4.0 });
    }

    #[test]
    fn far_outside_point_fails_coverage() {
        let set = FeatureSet::new(
            vec![
                Feature::new("in", Coord { x: 50.0, y: 50.0 }),
                Feature::new("out", Coord { x: 1100.0, y: 50.0 }),
            ],
            None,
        );
        let extent = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 100.0, y: 100.0 });
        assert!(matches!(
            check_coverage(&set, extent),
            Err(PlanError::Coverage { ids }) if ids == vec!["out".to_string()]
        ));
    }
}
