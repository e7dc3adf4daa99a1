use crate::error::{PlanError, Result};
use geo::{Coord, Rect};

#[derive(Debug, Clone, Copy)]
pub struct GeoTransform {
    forward_matrix: [f64; 6],
    inverse_matrix: [f64; 6],
}

impl GeoTransform {
    pub fn from_gdal(gt: [f64; 6]) -> Result<Self> {
        let determinant = gt[1] * gt[5] - gt[2] * gt[4];

        if determinant.abs() < 1e-10 {
            return Err(PlanError::Input(
                "Invalid GeoTransform: determinant is zero".into(),
            ));
        }

        let inv_det = 1.0 / determinant;

        let inverse_matrix = [
            (gt[2] * gt[3] - gt[5] * gt[0]) * inv_det,
            gt[5] * inv_det,
            -gt[2] * inv_det,
            (gt[4] * gt[0] - gt[1] * gt[3]) * inv_det,
            -gt[4] * inv_det,
            gt[1] * inv_det,
        ];

        Ok(Self {
            forward_matrix: gt,
            inverse_matrix,
        })
    }

    /// North-up transform with square cells of `cell_size`, `origin` being the top-left corner.
    pub fn north_up(origin: Coord<f64>, cell_size: f64) -> Result<Self> {
        Self::from_gdal([origin.x, cell_size, 0.0, origin.y, 0.0, -cell_size])
    }

    #[inline]
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> Coord<f64> {
        let inv = self.inverse_matrix;
        let u = inv[0] + x * inv[1] + y * inv[2];
        let v = inv[3] + x * inv[4] + y * inv[5];
        Coord { x: u, y: v }
    }

    #[inline]
    pub fn pixel_to_geo(&self, x: f64, y: f64) -> Coord<f64> {
        let fwd = self.forward_matrix;
        let lx = fwd[0] + x * fwd[1] + y * fwd[2];
        let ly = fwd[3] + x * fwd[4] + y * fwd[5];
        Coord { x: lx, y: ly }
    }

    #[inline]
    pub fn cell_center(&self, col: usize, row: usize) -> Coord<f64> {
        self.pixel_to_geo(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Axis-aligned rectangle enclosing a `width` x `height` raster.
    pub fn extent(&self, width: usize, height: usize) -> Rect<f64> {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.pixel_to_geo(0.0, 0.0),
            self.pixel_to_geo(w, 0.0),
            self.pixel_to_geo(w, h),
            self.pixel_to_geo(0.0, h),
        ];

        let (min, max) = corners.iter().fold(
            (
                Coord { x: f64::MAX, y: f64::MAX },
                Coord { x: f64::MIN, y: f64::MIN },
            ),
            |(min, max), c| {
                (
                    Coord { x: min.x.min(c.x), y: min.y.min(c.y) },
                    Coord { x: max.x.max(c.x), y: max.y.max(c.y) },
                )
            },
        );
        Rect::new(min, max)
    }
}
