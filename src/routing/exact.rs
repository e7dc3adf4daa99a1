use crate::error::{PlanError, Result};
use crate::routing::matrix::CostMatrix;
use crate::routing::solver::RouteSolver;
use std::time::{Duration, Instant};

/// Largest instance the dynamic program accepts.
pub const MAX_EXACT_NODES: usize = 16;

/// Subsets visited between deadline checks.
const DEADLINE_STRIDE: usize = 1024;

/// Held-Karp dynamic program over open paths from a fixed start.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSolver;

impl RouteSolver for ExactSolver {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn solve(&self, costs: &CostMatrix, start: usize, budget: Duration) -> Result<Vec<usize>> {
        let n = costs.len();
        if n == 0 || start >= n {
            return Err(PlanError::NoRouteFound("no nodes to route".into()));
        }
        if n > MAX_EXACT_NODES {
            return Err(PlanError::NoRouteFound(format!(
                "exact solver handles at most {MAX_EXACT_NODES} nodes, got {n}"
            )));
        }

        let deadline = Instant::now() + budget;
        let full = (1usize << n) - 1;
        let idx = |mask: usize, last: usize| mask * n + last;

        let mut best = vec![i64::MAX; (full + 1) * n];
        let mut parent = vec![usize::MAX; (full + 1) * n];
        best[idx(1 << start, start)] = 0;

        for mask in 1..=full {
            if mask % DEADLINE_STRIDE == 0 && Instant::now() >= deadline {
                return Err(PlanError::NoRouteFound(
                    "exact solver ran out of time".into(),
                ));
            }
            if mask & (1 << start) == 0 {
                continue;
            }

            for last in (0..n).filter(|&l| mask & (1 << l) != 0) {
                let here = best[idx(mask, last)];
                if here == i64::MAX {
                    continue;
                }
                for next in (0..n).filter(|&j| mask & (1 << j) == 0) {
                    let slot = idx(mask | (1 << next), next);
                    let cost = here + costs.get(last, next);
                    if cost < best[slot] {
                        best[slot] = cost;
                        parent[slot] = last;
                    }
                }
            }
        }

        let end = (0..n)
            .filter(|&l| best[idx(full, l)] != i64::MAX)
            .min_by_key(|&l| (best[idx(full, l)], l))
            .ok_or_else(|| PlanError::NoRouteFound("no Hamiltonian path".into()))?;

        let mut route = Vec::with_capacity(n);
        let (mut mask, mut node) = (full, end);
        while node != usize::MAX {
            route.push(node);
            let prev = parent[idx(mask, node)];
            mask &= !(1 << node);
            node = prev;
        }
        route.reverse();
        Ok(route)
    }
}
