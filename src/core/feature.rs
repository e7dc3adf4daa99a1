use crate::core::projection::Reprojector;
use crate::error::{PlanError, Result};
use gdal::spatial_ref::SpatialRef;
use geo::Coord;

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    pub position: Coord<f64>,
    pub elevation: Option<f64>,
}

impl Feature {
    pub fn new(id: impl Into<String>, position: Coord<f64>) -> Self {
        Self {
            id: id.into(),
            position,
            elevation: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub features: Vec<Feature>,
    pub crs: Option<SpatialRef>,
}

impl FeatureSet {
    pub fn new(features: Vec<Feature>, crs: Option<SpatialRef>) -> Self {
        Self { features, crs }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn coords(&self) -> Vec<Coord<f64>> {
        self.features.iter().map(|f| f.position).collect()
    }

    pub fn reproject(self, target: &SpatialRef) -> Result<Self> {
        let Some(source) = &self.crs else {
            return Ok(self);
        };

        let projector = Reprojector::new(source, target)?;
        let moved = projector.coords(&self.coords())?;

        let features = self
            .features
            .into_iter()
            .zip(moved)
            .map(|(f, position)| Feature { position, ..f })
            .collect();

        Ok(Self {
            features,
            crs: Some(target.clone()),
        })
    }
}

/// Where the vehicle launches from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TakeoffSite {
    /// Already in the working (DSM) CRS.
    Projected(Coord<f64>),
    Geographic { lat: f64, lon: f64 },
}

impl TakeoffSite {
    pub fn resolve(&self, working_crs: Option<&SpatialRef>) -> Result<Coord<f64>> {
        match *self {
            TakeoffSite::Projected(c) => Ok(c),
            TakeoffSite::Geographic { lat, lon } => {
                let crs = working_crs.ok_or_else(|| {
                    PlanError::Input(
                        "Geographic takeoff coordinates need a DSM with a known CRS".into(),
                    )
                })?;
                Reprojector::from_wgs84(crs)?.coord(Coord { x: lon, y: lat })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projected_takeoff_passes_through() {
        let site = TakeoffSite::Projected(Coord { x: 3.0, y: 4.0 });
        assert_eq!(site.resolve(None).unwrap(), Coord { x: 3.0, y: 4.0 });
    }

    #[test]
    fn geographic_takeoff_without_crs_is_an_input_error() {
        let site = TakeoffSite::Geographic { lat: -12.0, lon: -77.0 };
        assert!(matches!(site.resolve(None), Err(PlanError::Input(_))));
    }

    #[test]
    fn geographic_takeoff_lands_in_utm() {
        let utm = SpatialRef::from_epsg(32718).unwrap();
        let site = TakeoffSite::Geographic { lat: -12.5, lon: -75.0 };
        let c = site.resolve(Some(&utm)).unwrap();
        // -75 is the central meridian of zone 18
        assert!((c.x - 500_000.0).abs() < 1.0);
        assert!(c.y > 8_000_000.0 && c.y < 10_000_000.0);
    }

    #[test]
    fn reprojecting_without_source_crs_is_a_no_op() {
        let set = FeatureSet::new(vec![Feature::new("1", Coord { x: 1.0, y: 2.0 })], None);
        let utm = SpatialRef::from_epsg(32718).unwrap();
        let out = set.reproject(&utm).unwrap();
        assert_eq!(out.features[0].position, Coord { x: 1.0, y: 2.0 });
        assert!(out.crs.is_none());
    }
}
