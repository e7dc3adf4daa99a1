use crate::core::feature::{Feature, FeatureSet};
use crate::error::{PlanError, Result};
use crate::utils::dataset::DatasetEx;
use gdal::Dataset;
use gdal::vector::{FieldValue, LayerAccess};
use geo::{Geometry, InteriorPoint};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SourceFeature {
    pub id: String,
    pub geometry: Geometry<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeometryKind {
    Point,
    Areal,
}

pub fn read_features(path: impl AsRef<Path>, id_field: &str) -> Result<FeatureSet> {
    let path = path.as_ref();
    let dataset = Dataset::open_dataset(path)?;
    let mut layer = dataset.layer(0)?;
    let crs = layer.spatial_ref();

    let mut rows = Vec::new();
    for (row, feature) in layer.features().enumerate() {
        let gdal_geometry = feature.geometry().ok_or_else(|| {
            PlanError::Input(format!("Row {row} of {path:?} has no geometry"))
        })?;
        let geometry = Geometry::<f64>::try_from(gdal_geometry)?;

        let id = resolve_id(attribute_id(&feature, id_field), feature.fid(), row);

        rows.push(SourceFeature { id, geometry });
    }

    let features = normalize(rows)?;
    info!("Loaded {} features from {path:?}", features.len());

    Ok(FeatureSet::new(features, crs))
}

/// Attribute value first, then the native FID, then the 0-based row index.
fn resolve_id(attribute: Option<String>, fid: Option<u64>, row: usize) -> String {
    attribute
        .or_else(|| fid.map(|fid| fid.to_string()))
        .unwrap_or_else(|| row.to_string())
}

fn attribute_id(feature: &gdal::vector::Feature, id_field: &str) -> Option<String> {
    let (_, value) = feature.fields().find(|(name, _)| name == id_field)?;

    match value? {
        FieldValue::IntegerValue(v) => Some(v.to_string()),
        FieldValue::Integer64Value(v) => Some(v.to_string()),
        FieldValue::StringValue(v) => Some(v),
        FieldValue::RealValue(v) => Some(v.to_string()),
        _ => None,
    }
}

/// Reduce every row to a point: polygons to an interior point, points unchanged.
/// A layer must be all points or all polygons.
pub fn normalize(rows: Vec<SourceFeature>) -> Result<Vec<Feature>> {
    let kinds: BTreeSet<&'static str> = rows.iter().map(|r| type_name(&r.geometry)).collect();

    let kind = rows
        .iter()
        .map(|r| classify(&r.geometry))
        .try_fold(None, |acc, k| match (acc, k) {
            (_, None) => Err(()),
            (None, Some(k)) => Ok(Some(k)),
            (Some(a), Some(k)) if a == k => Ok(Some(a)),
            _ => Err(()),
        })
        .map_err(|_| {
            PlanError::Input(format!(
                "Unsupported geometry type(s): {kinds:?}. Input should contain only Polygon, MultiPolygon or Point geometries"
            ))
        })?;

    if kind == Some(GeometryKind::Areal) {
        debug!("Replacing {} polygons by interior points", rows.len());
    }

    rows.into_iter()
        .map(|r| {
            let point = match &r.geometry {
                Geometry::Point(p) => Some(*p),
                areal => areal.interior_point(),
            };
            point
                .map(|p| Feature::new(r.id.clone(), p.0))
                .ok_or_else(|| PlanError::Input(format!("Feature {} has an empty geometry", r.id)))
        })
        .collect()
}

fn classify(geometry: &Geometry<f64>) -> Option<GeometryKind> {
    match geometry {
        Geometry::Point(_) => Some(GeometryKind::Point),
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => Some(GeometryKind::Areal),
        _ => None,
    }
}

fn type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::fixtures::{UTM_18S, write_layer, write_points};
    use geo::{Contains, LineString, MultiPolygon, Point, Polygon, polygon};

    fn row(id: &str, geometry: impl Into<Geometry<f64>>) -> SourceFeature {
        SourceFeature {
            id: id.into(),
            geometry: geometry.into(),
        }
    }

    #[test]
    fn points_pass_through() {
        let out = normalize(vec![row("a", Point::new(1.0, 2.0)), row("b", Point::new(3.0, 4.0))]).unwrap();
        assert_eq!(out[0].id, "a");
        assert_eq!(out[1].position, geo::Coord { x: 3.0, y: 4.0 });
        assert!(out.iter().all(|f| f.elevation.is_none()));
    }

    #[test]
    fn polygons_become_points_inside_them() {
        // concave "C" shape whose centroid falls outside the polygon
        let crown: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 2.0), (x: 2.0, y: 2.0),
            (x: 2.0, y: 8.0), (x: 10.0, y: 8.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0),
        ];
        let square: Polygon<f64> = polygon![
            (x: 20.0, y: 20.0), (x: 22.0, y: 20.0), (x: 22.0, y: 22.0), (x: 20.0, y: 22.0),
        ];
        let out = normalize(vec![
            row("c", crown.clone()),
            row("m", MultiPolygon::new(vec![square.clone()])),
        ])
        .unwrap();

        assert!(crown.contains(&Point::from(out[0].position)));
        assert!(square.contains(&Point::from(out[1].position)));
    }

    #[test]
    fn mixed_geometries_are_rejected() {
        let square: Polygon<f64> = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let err = normalize(vec![row("a", Point::new(0.0, 0.0)), row("b", square)]).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, PlanError::Input(_)));
        assert!(msg.contains("Point") && msg.contains("Polygon"));
    }

    #[test]
    fn lines_are_unsupported() {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]);
        assert!(matches!(normalize(vec![row("l", line)]), Err(PlanError::Input(_))));
    }

    #[test]
    fn id_falls_back_from_attribute_to_fid_to_row() {
        assert_eq!(resolve_id(Some("T-7".into()), Some(3), 2), "T-7");
        assert_eq!(resolve_id(None, Some(3), 2), "3");
        assert_eq!(resolve_id(None, None, 2), "2");
    }

    #[test]
    fn ids_come_from_the_attribute_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_points(
            &dir.path().join("with_ids.gpkg"),
            &[(10.0, 10.0), (20.0, 20.0), (30.0, 30.0)],
            Some(&[Some("p-a"), None, Some("p-c")]),
        );

        let set = read_features(&path, "point_id").unwrap();
        let ids: Vec<_> = set.features.iter().map(|f| f.id.as_str()).collect();
        // the null attribute falls back to the GeoPackage FID
        assert_eq!(ids, vec!["p-a", "2", "p-c"]);
        assert_eq!(set.crs.unwrap().auth_code().unwrap(), UTM_18S as i32);
    }

    #[test]
    fn layer_without_the_field_uses_fids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_points(&dir.path().join("no_ids.gpkg"), &[(10.0, 10.0), (20.0, 20.0)], None);

        let set = read_features(&path, "point_id").unwrap();
        let ids: Vec<_> = set.features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(set.features[1].position, geo::Coord { x: 500_020.0, y: 8_600_080.0 });
    }

    #[test]
    fn polygon_layer_is_read_as_interior_points() {
        let dir = tempfile::tempdir().unwrap();
        let square: Polygon<f64> = polygon![
            (x: 500_010.0, y: 8_600_010.0), (x: 500_020.0, y: 8_600_010.0),
            (x: 500_020.0, y: 8_600_020.0), (x: 500_010.0, y: 8_600_020.0),
        ];
        let path = write_layer(
            &dir.path().join("crowns.gpkg"),
            UTM_18S,
            &[square.clone().into(), Point::new(500_050.0, 8_600_050.0).into()],
            None,
        );
        assert!(matches!(read_features(&path, "point_id"), Err(PlanError::Input(_))));

        let path = write_layer(&dir.path().join("crowns_only.gpkg"), UTM_18S, &[square.clone().into()], None);
        let set = read_features(&path, "point_id").unwrap();
        assert!(square.contains(&Point::from(set.features[0].position)));
    }
}
