use crate::error::{PlanError, Result};
use crate::routing::matrix::CostMatrix;
use std::time::Duration;
use tracing::debug;

/// Open-path TSP solver anchored at a fixed first node.
pub trait RouteSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, costs: &CostMatrix, start: usize, budget: Duration) -> Result<Vec<usize>>;
}

/// Run `solver` and reject anything that is not a permutation of `0..n` starting at `start`.
pub fn solve_checked(
    solver: &dyn RouteSolver,
    costs: &CostMatrix,
    start: usize,
    budget: Duration,
) -> Result<Vec<usize>> {
    if start >= costs.len() {
        return Err(PlanError::NoRouteFound(format!(
            "start index {start} outside {} nodes",
            costs.len()
        )));
    }

    let route = solver.solve(costs, start, budget)?;
    validate_route(&route, costs.len(), start)?;

    debug!(
        "{} solver returned a {}-stop path costing {}",
        solver.name(),
        route.len(),
        costs.path_cost(&route)
    );
    Ok(route)
}

pub fn validate_route(route: &[usize], n: usize, start: usize) -> Result<()> {
    if route.first() != Some(&start) {
        return Err(PlanError::NoRouteFound(format!(
            "route does not begin at start node {start}"
        )));
    }

    let mut seen = vec![false; n];
    for &node in route {
        match seen.get_mut(node) {
            Some(s) if !*s => *s = true,
            _ => {
                return Err(PlanError::NoRouteFound(format!(
                    "route visits node {node} twice or out of range"
                )));
            }
        }
    }

    if route.len() != n {
        return Err(PlanError::NoRouteFound(format!(
            "route covers {} of {n} nodes",
            route.len()
        )));
    }
    Ok(())
}
