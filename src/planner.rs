use crate::alignment::{ElevationSampler, align_to_dsm, check_coverage};
use crate::assembler::{RoutePoint, assemble};
use crate::config::{MissionConfig, OutputPaths, PlannerConfig};
use crate::core::feature::{FeatureSet, TakeoffSite};
use crate::core::validator::validate_feature_count;
use crate::error::Result;
use crate::exporter::{Record, project_records, write_csv, write_gpkg};
use crate::loader::{Dsm, filter_by_aoi, read_aoi, read_features};
use crate::routing::{CostMatrix, DistanceMatrix, GuidedLocalSearch, RouteSolver, nearest_start, solve_checked};
use crate::utils::tap::TryTap;
use gdal::spatial_ref::SpatialRef;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PlannedRoute {
    pub points: Vec<RoutePoint>,
    /// Feature indices in flight order.
    pub route: Vec<usize>,
    pub cost: i64,
    pub crs: Option<SpatialRef>,
}

pub struct RoutePlanner {
    config: PlannerConfig,
    solver: Box<dyn RouteSolver>,
}

impl RoutePlanner {
    pub fn new(config: &PlannerConfig) -> Self {
        Self::with_solver(config, Box::new(GuidedLocalSearch::default()))
    }

    pub fn with_solver(config: &PlannerConfig, solver: Box<dyn RouteSolver>) -> Self {
        Self {
            config: config.clone(),
            solver,
        }
    }

    pub fn plan(
        &self,
        features: FeatureSet,
        dsm: &Dsm,
        takeoff: Option<&TakeoffSite>,
    ) -> Result<PlannedRoute> {
        validate_feature_count(&features)?;
        let mut features = align_to_dsm(features, dsm.crs.as_ref())?
            .try_tap(|set| check_coverage(set, dsm.grid.extent()))?;
        let crs = dsm.crs.clone().or_else(|| features.crs.clone());

        let sampler = ElevationSampler::new(&dsm.grid, self.config.feature_buffer, self.config.path_buffer);
        sampler.sample_features(&mut features.features)?;
        info!("Sampled elevations for {} features", features.len());

        let takeoff = takeoff.map(|t| t.resolve(crs.as_ref())).transpose()?;
        let coords = features.coords();
        let costs = CostMatrix::from_distances(&DistanceMatrix::from_coords(&coords));
        let start = nearest_start(&coords, takeoff);
        info!(
            "Routing {} stops from feature {} with the {} solver",
            coords.len(),
            features.features[start].id,
            self.solver.name()
        );

        let route = solve_checked(self.solver.as_ref(), &costs, start, self.config.time_limit())?;
        let cost = costs.path_cost(&route);
        info!("Route found, scaled cost {cost}");

        let points = assemble(&features.features, &route, &sampler)?;
        info!("Assembled {} route points", points.len());

        Ok(PlannedRoute {
            points,
            route,
            cost,
            crs,
        })
    }
}

/// Load, filter, plan and write one mission. Returns the written records.
pub fn run_mission(config: &MissionConfig, paths: &OutputPaths) -> Result<Vec<Record>> {
    let features = read_features(&config.features_path, &config.planner.point_id_field)?;
    let features = match &config.aoi_path {
        Some(path) => filter_by_aoi(features, read_aoi(path)?, config.aoi_index)?,
        None => features,
    };

    let planned = {
        let dsm = Dsm::open(&config.dsm_path)?;
        RoutePlanner::new(&config.planner).plan(features, &dsm, config.takeoff().as_ref())?
    };

    let records = project_records(&planned.points, planned.crs.as_ref())?;
    write_csv(&records, &paths.csv)?;
    write_gpkg(&records, &paths.gpkg)?;

    info!("Mission {} written to {:?}", paths.name, paths.dir);
    Ok(records)
}
