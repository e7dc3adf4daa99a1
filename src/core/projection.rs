use crate::error::{PlanError, Result};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use geo::{Coord, MapCoords, MultiPolygon};

pub const WGS84_EPSG: u32 = 4326;

pub fn wgs84() -> Result<SpatialRef> {
    Ok(SpatialRef::from_epsg(WGS84_EPSG)?)
}

pub fn describe(srs: &SpatialRef) -> String {
    match (srs.auth_name(), srs.auth_code()) {
        (Ok(name), Ok(code)) => format!("{name}:{code}"),
        _ => srs.name().unwrap_or_else(|_| "unnamed CRS".to_string()),
    }
}

/// Whether two optional CRSs are known to differ. Unknown on either side counts as same.
pub fn differs(a: Option<&SpatialRef>, b: Option<&SpatialRef>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

/// Coordinate transform that always speaks x/y (lon/lat) order.
pub struct Reprojector {
    transform: CoordTransform,
}

impl Reprojector {
    pub fn new(source: &SpatialRef, target: &SpatialRef) -> Result<Self> {
        let mut source = source.clone();
        source.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

        let mut target = target.clone();
        target.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

        Ok(Self {
            transform: CoordTransform::new(&source, &target)?,
        })
    }

    pub fn to_wgs84(source: &SpatialRef) -> Result<Self> {
        Self::new(source, &wgs84()?)
    }

    pub fn from_wgs84(target: &SpatialRef) -> Result<Self> {
        Self::new(&wgs84()?, target)
    }

    pub fn coord(&self, c: Coord<f64>) -> Result<Coord<f64>> {
        let mut x = [c.x];
        let mut y = [c.y];
        let mut z = [0.0];
        self.transform.transform_coords(&mut x, &mut y, &mut z)?;

        if !x[0].is_finite() || !y[0].is_finite() {
            return Err(PlanError::Input(format!(
                "Reprojection of ({}, {}) produced non-finite coordinates",
                c.x, c.y
            )));
        }
        Ok(Coord { x: x[0], y: y[0] })
    }

    pub fn coords(&self, coords: &[Coord<f64>]) -> Result<Vec<Coord<f64>>> {
        if coords.is_empty() {
            return Ok(vec![]);
        }

        let mut x: Vec<f64> = coords.iter().map(|c| c.x).collect();
        let mut y: Vec<f64> = coords.iter().map(|c| c.y).collect();
        let mut z = vec![0.0; coords.len()];
        self.transform.transform_coords(&mut x, &mut y, &mut z)?;

        x.into_iter()
            .zip(y)
            .map(|(x, y)| {
                if x.is_finite() && y.is_finite() {
                    Ok(Coord { x, y })
                } else {
                    Err(PlanError::Input(
                        "Reprojection produced non-finite coordinates".into(),
                    ))
                }
            })
            .collect()
    }

    pub fn multi_polygon(&self, mp: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        mp.try_map_coords(|c| self.coord(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn utm_round_trip_through_wgs84() {
        let utm = SpatialRef::from_epsg(32718).unwrap();
        let forward = Reprojector::to_wgs84(&utm).unwrap();
        let back = Reprojector::from_wgs84(&utm).unwrap();

        let original = Coord { x: 412_345.678, y: 8_612_345.432 };
        let geographic = forward.coord(original).unwrap();
        assert!((-180.0..=180.0).contains(&geographic.x));
        assert!((-90.0..=90.0).contains(&geographic.y));

        let restored = back.coord(geographic).unwrap();
        assert_abs_diff_eq!(restored.x, original.x, epsilon = 1e-3);
        assert_abs_diff_eq!(restored.y, original.y, epsilon = 1e-3);
    }

    #[test]
    fn batch_and_single_agree() {
        let utm = SpatialRef::from_epsg(32718).unwrap();
        let forward = Reprojector::to_wgs84(&utm).unwrap();
        let pts = [Coord { x: 400_000.0, y: 8_600_000.0 }, Coord { x: 401_000.0, y: 8_601_000.0 }];

        let batch = forward.coords(&pts).unwrap();
        for (p, b) in pts.iter().zip(&batch) {
            let single = forward.coord(*p).unwrap();
            assert_abs_diff_eq!(single.x, b.x, epsilon = 1e-12);
            assert_abs_diff_eq!(single.y, b.y, epsilon = 1e-12);
        }
    }

    #[test]
    fn unknown_crs_never_differs() {
        let utm = SpatialRef::from_epsg(32718).unwrap();
        assert!(!differs(None, Some(&utm)));
        assert!(!differs(Some(&utm), Some(&utm.clone())));
        assert!(differs(Some(&utm), Some(&wgs84().unwrap())));
    }
}
