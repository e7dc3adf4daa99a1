use crate::assembler::{PointKind, RoutePoint};
use crate::core::projection::{Reprojector, describe, wgs84};
use crate::error::{PlanError, Result};
use gdal::DriverManager;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType, ToGdal};
use geo::Point;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const WAYPOINT_LAYER: &str = "waypoints";

/// Reserved for multi-cluster missions.
const CLUSTER_ID: u32 = 0;

const FIELDS: [(&str, OGRFieldType::Type); 7] = [
    ("point_id", OGRFieldType::OFTString),
    ("cluster_id", OGRFieldType::OFTInteger),
    ("kind", OGRFieldType::OFTString),
    ("longitude", OGRFieldType::OFTReal),
    ("latitude", OGRFieldType::OFTReal),
    ("elevation", OGRFieldType::OFTReal),
    ("order", OGRFieldType::OFTInteger),
];

/// One row of the flight table, in flight order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub point_id: Option<String>,
    pub cluster_id: u32,
    pub kind: PointKind,
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
    pub order: usize,
}

pub fn project_records(points: &[RoutePoint], crs: Option<&SpatialRef>) -> Result<Vec<Record>> {
    let coords: Vec<_> = points.iter().map(|p| p.position).collect();

    let geographic = match crs {
        Some(crs) => {
            info!("Projecting {} route points from {} to EPSG:4326", points.len(), describe(crs));
            Reprojector::to_wgs84(crs)?.coords(&coords)?
        }
        None => {
            warn!("Route CRS unknown, writing coordinates unchanged as longitude/latitude");
            coords
        }
    };

    Ok(points
        .iter()
        .zip(geographic)
        .map(|(p, c)| Record {
            point_id: p.point_id.clone(),
            cluster_id: CLUSTER_ID,
            kind: p.kind,
            longitude: c.x,
            latitude: c.y,
            elevation: p.elevation,
            order: p.order,
        })
        .collect())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn write_csv(records: &[Record], path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Wrote {} records to {path:?}", records.len());
    Ok(())
}

fn integer_field<T>(name: &str, value: T) -> Result<i32>
where
    T: Copy + std::fmt::Display + TryInto<i32>,
{
    value
        .try_into()
        .map_err(|_| PlanError::Input(format!("{name} {value} does not fit a GeoPackage integer field")))
}

/// Waypoints only, as EPSG:4326 points.
pub fn write_gpkg(records: &[Record], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    if path.exists() {
        fs::remove_file(path)?;
    }

    let srs = wgs84()?;
    let driver = DriverManager::get_driver_by_name("GPKG")?;
    let mut dataset = driver.create_vector_only(path)?;
    let mut layer = dataset.create_layer(LayerOptions {
        name: WAYPOINT_LAYER,
        srs: Some(&srs),
        ty: OGRwkbGeometryType::wkbPoint,
        ..Default::default()
    })?;

    layer.create_defn_fields(&FIELDS)?;

    let names = FIELDS.map(|(name, _)| name);
    let mut written = 0;
    for r in records.iter().filter(|r| r.kind == PointKind::Waypoint) {
        let geometry = Point::new(r.longitude, r.latitude).to_gdal()?;
        let values = [
            FieldValue::StringValue(r.point_id.clone().unwrap_or_default()),
            FieldValue::IntegerValue(integer_field("cluster_id", r.cluster_id)?),
            FieldValue::StringValue("wpt".into()),
            FieldValue::RealValue(r.longitude),
            FieldValue::RealValue(r.latitude),
            FieldValue::RealValue(r.elevation),
            FieldValue::IntegerValue(integer_field("order", r.order)?),
        ];
        layer.create_feature_fields(geometry, &names, &values)?;
        written += 1;
    }

    info!("Wrote {written} waypoints to {path:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::dataset::DatasetEx;
    use gdal::Dataset;
    use geo::Coord;

    fn points() -> Vec<RoutePoint> {
        let wpt = |id: &str, x: f64, order| RoutePoint {
            point_id: Some(id.into()),
            kind: PointKind::Waypoint,
            position: Coord { x, y: 1.0 },
            elevation: 50.0,
            order,
        };
        let cpt = RoutePoint {
            point_id: None,
            kind: PointKind::Checkpoint,
            position: Coord { x: 1.5, y: 1.0 },
            elevation: 51.0,
            order: 0,
        };
        vec![wpt("a", 1.0, 1), cpt, wpt("b", 2.0, 2)]
    }

    #[test]
    fn records_keep_flight_order_without_crs() {
        let records = project_records(&points(), None).unwrap();
        let kinds: Vec<_> = records.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![PointKind::Waypoint, PointKind::Checkpoint, PointKind::Waypoint]);
        assert_eq!(records[1].longitude, 1.5);
        assert!(records.iter().all(|r| r.cluster_id == 0));
    }

    #[test]
    fn utm_records_land_in_geographic_range() {
        let utm = SpatialRef::from_epsg(32718).unwrap();
        let mut pts = points();
        for p in &mut pts {
            p.position = Coord { x: 500_000.0 + p.position.x, y: 8_600_000.0 };
        }

        let records = project_records(&pts, Some(&utm)).unwrap();
        for r in &records {
            assert!((r.longitude + 75.0).abs() < 0.01);
            assert!((-90.0..0.0).contains(&r.latitude));
        }
    }

    #[test]
    fn csv_has_the_flight_table_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site_wpt").join("site_wpt.csv");

        write_csv(&project_records(&points(), None).unwrap(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "point_id,cluster_id,kind,longitude,latitude,elevation,order");
        assert_eq!(lines[1], "a,0,wpt,1.0,1.0,50.0,1");
        assert_eq!(lines[2], ",0,cpt,1.5,1.0,51.0,0");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn gpkg_holds_waypoints_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.gpkg");

        let records = project_records(&points(), None).unwrap();
        write_gpkg(&records, &path).unwrap();
        // second write replaces the file
        write_gpkg(&records, &path).unwrap();

        let dataset = Dataset::open_dataset(&path).unwrap();
        let mut layer = dataset.layer_by_name(WAYPOINT_LAYER).unwrap();
        assert_eq!(layer.feature_count(), 2);
        let srs = layer.spatial_ref().unwrap();
        assert_eq!(srs.auth_code().unwrap(), 4326);

        let ids: Vec<_> = layer
            .features()
            .filter_map(|f| f.field_as_string_by_name("point_id").ok().flatten())
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn oversized_order_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = project_records(&points(), None).unwrap();
        records[2].order = usize::MAX;

        match write_gpkg(&records, &dir.path().join("route.gpkg")) {
            Err(PlanError::Input(msg)) => assert!(msg.contains("order")),
            other => panic!("expected input error, got {other:?}"),
        }
    }
}
