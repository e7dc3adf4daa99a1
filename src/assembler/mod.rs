use crate::alignment::sampler::ElevationSampler;
use crate::core::feature::Feature;
use crate::error::{PlanError, Result};
use crate::utils::float::FloatEx;
use geo::Coord;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Checkpoint-to-waypoint elevation gap below which the checkpoint is raised.
pub const TIE_TOLERANCE: f64 = 1e-3;
pub const TIE_OFFSET: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointKind {
    #[serde(rename = "wpt")]
    Waypoint,
    #[serde(rename = "cpt")]
    Checkpoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutePoint {
    pub point_id: Option<String>,
    pub kind: PointKind,
    pub position: Coord<f64>,
    pub elevation: f64,
    /// 1-based flight order for waypoints, 0 for checkpoints.
    pub order: usize,
}

impl RoutePoint {
    fn waypoint(feature: &Feature, order: usize) -> Result<Self> {
        let elevation = feature.elevation.ok_or_else(|| PlanError::Sampling {
            target: format!("feature {}", feature.id),
        })?;

        Ok(Self {
            point_id: Some(feature.id.clone()),
            kind: PointKind::Waypoint,
            position: feature.position,
            elevation,
            order,
        })
    }

    fn checkpoint(position: Coord<f64>, elevation: f64) -> Self {
        Self {
            point_id: None,
            kind: PointKind::Checkpoint,
            position,
            elevation,
            order: 0,
        }
    }
}

/// Waypoints in route order with a corridor checkpoint between each pair.
pub fn assemble(
    features: &[Feature],
    route: &[usize],
    sampler: &ElevationSampler,
) -> Result<Vec<RoutePoint>> {
    let waypoints = route
        .iter()
        .enumerate()
        .map(|(k, &i)| RoutePoint::waypoint(&features[i], k + 1))
        .collect::<Result<Vec<_>>>()?;

    let checkpoints = waypoints
        .par_windows(2)
        .map(|pair| -> Result<RoutePoint> {
            let (a, b) = (&pair[0], &pair[1]);
            sampler
                .corridor(a.position, b.position)?
                .map(|(centroid, max)| RoutePoint::checkpoint(centroid, max))
                .ok_or_else(|| PlanError::Sampling {
                    target: format!(
                        "corridor between {} and {}",
                        a.point_id.as_deref().unwrap_or("?"),
                        b.point_id.as_deref().unwrap_or("?")
                    ),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut points = interleave(waypoints, checkpoints);
    let raised = resolve_elevation_ties(&mut points);
    debug!("Assembled {} route points, raised {raised} checkpoints", points.len());

    Ok(points)
}

fn interleave(waypoints: Vec<RoutePoint>, checkpoints: Vec<RoutePoint>) -> Vec<RoutePoint> {
    let mut out = Vec::with_capacity(waypoints.len() + checkpoints.len());
    let mut cpts = checkpoints.into_iter();

    for wpt in waypoints {
        if !out.is_empty() {
            out.extend(cpts.next());
        }
        out.push(wpt);
    }
    out
}

/// One left-to-right pass: a checkpoint followed by a waypoint at (nearly) the
/// same elevation is raised by [`TIE_OFFSET`]. Raised values are not re-checked.
pub fn resolve_elevation_ties(points: &mut [RoutePoint]) -> usize {
    let mut raised = 0;
    for i in 0..points.len().saturating_sub(1) {
        let (cur, next) = (&points[i], &points[i + 1]);
        if cur.kind == PointKind::Checkpoint
            && next.kind == PointKind::Waypoint
            && cur.elevation.approx_eq(next.elevation, TIE_TOLERANCE)
        {
            points[i].elevation += TIE_OFFSET;
            raised += 1;
        }
    }
    raised
}
