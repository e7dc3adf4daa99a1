use crate::core::buffer::{point_buffer, segment_buffer};
use crate::core::feature::Feature;
use crate::core::raster::DsmGrid;
use crate::error::{PlanError, Result};
use crate::utils::progress::create_progress_bar;
use geo::{Centroid, Coord};
use rayon::prelude::*;
use tracing::debug;

/// Max-height zonal sampling over a DSM grid.
pub struct ElevationSampler<'a> {
    grid: &'a DsmGrid,
    feature_buffer: f64,
    path_buffer: f64,
}

impl<'a> ElevationSampler<'a> {
    pub fn new(grid: &'a DsmGrid, feature_buffer: f64, path_buffer: f64) -> Self {
        Self {
            grid,
            feature_buffer,
            path_buffer,
        }
    }

    pub fn point_elevation(&self, at: Coord<f64>) -> Result<Option<f64>> {
        Ok(self
            .grid
            .max_within(&point_buffer(at, self.feature_buffer))?
            .map(f64::from))
    }

    /// Centroid and max height of the corridor buffer between `a` and `b`.
    pub fn corridor(&self, a: Coord<f64>, b: Coord<f64>) -> Result<Option<(Coord<f64>, f64)>> {
        let zone = segment_buffer(a, b, self.path_buffer);
        let Some(centroid) = zone.centroid() else {
            return Ok(None);
        };
        Ok(self
            .grid
            .max_within(&zone)?
            .map(|max| (centroid.0, f64::from(max))))
    }

    pub fn sample_features(&self, features: &mut [Feature]) -> Result<()> {
        let bar = create_progress_bar(features.len() as u64, "Sampling feature elevations");

        let missing = features
            .par_iter_mut()
            .map(|f| -> Result<Option<String>> {
                let sampled = self.point_elevation(f.position)?;
                f.elevation = sampled;
                bar.inc(1);
                Ok(sampled.is_none().then(|| f.id.clone()))
            })
            .collect::<Result<Vec<_>>>();
        bar.finish_and_clear();
        let missing = missing?;

        if let Some(id) = missing.into_iter().flatten().min() {
            return Err(PlanError::Sampling {
                target: format!("feature {id}"),
            });
        }

        debug!(
            "Sampled {} features with a {} unit buffer",
            features.len(),
            self.feature_buffer
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::tests::grid_from_fn;
    use approx::assert_abs_diff_eq;

    #[test]
    fn features_get_the_buffer_max() {
        let grid = grid_from_fn(|col, _| col as f32);
        let sampler = ElevationSampler::new(&grid, 3.2, 10.0);
        let mut features = vec![
            Feature::new("a", Coord { x: 50.5, y: 50.5 }),
            Feature::new("b", Coord { x: 20.5, y: 20.5 }),
        ];

        sampler.sample_features(&mut features).unwrap();
        assert_eq!(features[0].elevation, Some(53.0));
        assert_eq!(features[1].elevation, Some(23.0));
    }

    #[test]
    fn feature_over_nodata_is_a_sampling_error() {
        let grid = grid_from_fn(|col, _| if col < 10 { -9999.0 } else { 1.0 });
        let sampler = ElevationSampler::new(&grid, 3.0, 10.0);
        let mut features = vec![
            Feature::new("ok", Coord { x: 50.0, y: 50.0 }),
            Feature::new("void", Coord { x: 4.0, y: 50.0 }),
        ];

        match sampler.sample_features(&mut features) {
            Err(PlanError::Sampling { target }) => assert!(target.contains("void")),
            other => panic!("expected sampling error, got {other:?}"),
        }
    }

    #[test]
    fn corridor_covers_the_whole_segment() {
        let grid = grid_from_fn(|col, row| if (col, row) == (30, 50) { 99.0 } else { 1.0 });
        let sampler = ElevationSampler::new(&grid, 3.0, 2.0);

        let (centroid, max) = sampler
            .corridor(Coord { x: 20.0, y: 50.0 }, Coord { x: 40.0, y: 50.0 })
            .unwrap()
            .unwrap();
        assert_eq!(max, 99.0);
        assert_abs_diff_eq!(centroid.x, 30.0, epsilon = 1e-6);
        assert_abs_diff_eq!(centroid.y, 50.0, epsilon = 1e-6);
    }

    #[test]
    fn corridor_off_the_raster_is_missing() {
        let grid = grid_from_fn(|_, _| 1.0);
        let sampler = ElevationSampler::new(&grid, 3.0, 2.0);
        assert!(sampler
            .corridor(Coord { x: -300.0, y: 50.0 }, Coord { x: -200.0, y: 50.0 })
            .unwrap()
            .is_none());
    }
}
