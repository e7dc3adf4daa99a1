//! Small on-disk datasets for loader and mission tests.

use gdal::DriverManager;
use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType, ToGdal};
use geo::{Coord, Geometry};
use std::path::{Path, PathBuf};

pub(crate) const UTM_18S: u32 = 32718;

/// Top-left corner of the fixture DSM, in UTM 18S.
pub(crate) const DSM_ORIGIN: Coord<f64> = Coord { x: 500_000.0, y: 8_600_100.0 };

const DSM_SIZE: usize = 100;
const DSM_NODATA: f64 = -9999.0;

/// 100x100 GeoTIFF of 1 m cells starting at `DSM_ORIGIN`, values from `f(col, row)`.
pub(crate) fn write_dsm(dir: &Path, f: impl Fn(usize, usize) -> f32) -> PathBuf {
    let path = dir.join("dsm.tif");
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<f32, _>(&path, DSM_SIZE, DSM_SIZE, 1)
        .unwrap();
    dataset
        .set_geo_transform(&[DSM_ORIGIN.x, 1.0, 0.0, DSM_ORIGIN.y, 0.0, -1.0])
        .unwrap();
    dataset
        .set_spatial_ref(&SpatialRef::from_epsg(UTM_18S).unwrap())
        .unwrap();

    let data = (0..DSM_SIZE)
        .flat_map(|row| (0..DSM_SIZE).map(move |col| (col, row)))
        .map(|(col, row)| f(col, row))
        .collect();
    let mut band = dataset.rasterband(1).unwrap();
    band.set_no_data_value(Some(DSM_NODATA)).unwrap();
    band.write((0, 0), (DSM_SIZE, DSM_SIZE), &mut Buffer::new((DSM_SIZE, DSM_SIZE), data))
        .unwrap();
    path
}

/// GeoPackage with one layer of `geometries`. With `ids`, a `point_id` string
/// field is added and `None` entries are left null.
pub(crate) fn write_layer(
    path: &Path,
    epsg: u32,
    geometries: &[Geometry<f64>],
    ids: Option<&[Option<&str>]>,
) -> PathBuf {
    let srs = SpatialRef::from_epsg(epsg).unwrap();
    let driver = DriverManager::get_driver_by_name("GPKG").unwrap();
    let mut dataset = driver.create_vector_only(path).unwrap();
    let mut layer = dataset
        .create_layer(LayerOptions {
            name: "features",
            srs: Some(&srs),
            ty: OGRwkbGeometryType::wkbUnknown,
            ..Default::default()
        })
        .unwrap();

    if ids.is_some() {
        layer
            .create_defn_fields(&[("point_id", OGRFieldType::OFTString)])
            .unwrap();
    }

    for (i, geometry) in geometries.iter().enumerate() {
        let geometry = geometry.to_gdal().unwrap();
        match ids.and_then(|ids| ids[i]) {
            Some(id) => layer
                .create_feature_fields(geometry, &["point_id"], &[FieldValue::StringValue(id.into())])
                .unwrap(),
            None => layer.create_feature(geometry).unwrap(),
        }
    }
    path.to_path_buf()
}

/// Point layer in UTM 18S, coordinates relative to `DSM_ORIGIN`.
pub(crate) fn write_points(path: &Path, offsets: &[(f64, f64)], ids: Option<&[Option<&str>]>) -> PathBuf {
    let geometries: Vec<Geometry<f64>> = offsets
        .iter()
        .map(|&(dx, dy)| geo::Point::new(DSM_ORIGIN.x + dx, DSM_ORIGIN.y - dy).into())
        .collect();
    write_layer(path, UTM_18S, &geometries, ids)
}
