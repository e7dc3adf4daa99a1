use crate::error::{PlanError, Result};
use crate::routing::matrix::CostMatrix;
use crate::routing::solver::RouteSolver;
use crate::utils::progress::create_spinner;
use std::time::{Duration, Instant};
use tracing::debug;

const EPSILON: f64 = 1e-9;

/// Guided local search over open paths.
///
/// Greedy cheapest-arc construction, then repeated 2-opt and relocate descents
/// on penalty-augmented costs. The arcs of each local optimum with the highest
/// `cost / (1 + penalty)` are penalised before the next descent. Runs until the
/// budget is spent and returns the best path by true cost.
#[derive(Debug, Clone)]
pub struct GuidedLocalSearch {
    pub lambda_coefficient: f64,
}

impl Default for GuidedLocalSearch {
    fn default() -> Self {
        Self {
            lambda_coefficient: 0.1,
        }
    }
}

struct Penalties {
    n: usize,
    counts: Vec<u32>,
    lambda: f64,
}

impl Penalties {
    fn new(n: usize) -> Self {
        Self {
            n,
            counts: vec![0; n * n],
            lambda: 0.0,
        }
    }

    #[inline]
    fn count(&self, i: usize, j: usize) -> u32 {
        self.counts[i * self.n + j]
    }

    fn bump(&mut self, i: usize, j: usize) {
        self.counts[i * self.n + j] += 1;
        self.counts[j * self.n + i] += 1;
    }
}

struct Search<'a> {
    costs: &'a CostMatrix,
    penalties: Penalties,
    deadline: Instant,
}

impl Search<'_> {
    #[inline]
    fn arc(&self, i: usize, j: usize) -> f64 {
        self.costs.get(i, j) as f64 + self.penalties.lambda * self.penalties.count(i, j) as f64
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Descend until neither neighbourhood improves or time runs out.
    fn descend(&self, route: &mut Vec<usize>) {
        while !self.expired() {
            if !self.two_opt(route) && !self.relocate(route) {
                break;
            }
        }
    }

    /// First improving reversal of `route[i..=j]`, position 0 fixed.
    fn two_opt(&self, route: &mut [usize]) -> bool {
        let n = route.len();
        for i in 1..n - 1 {
            for j in i + 1..n {
                let before = route[i - 1];
                let mut delta = self.arc(before, route[j]) - self.arc(before, route[i]);
                if let Some(&after) = route.get(j + 1) {
                    delta += self.arc(route[i], after) - self.arc(route[j], after);
                }

                if delta < -EPSILON {
                    route[i..=j].reverse();
                    return true;
                }
            }
        }
        false
    }

    /// First improving move of one node to another slot, position 0 fixed.
    fn relocate(&self, route: &mut Vec<usize>) -> bool {
        let n = route.len();
        for i in 1..n {
            let node = route[i];
            let prev = route[i - 1];
            let removal = match route.get(i + 1) {
                Some(&next) => self.arc(prev, node) + self.arc(node, next) - self.arc(prev, next),
                None => self.arc(prev, node),
            };

            let mut reduced = route.clone();
            reduced.remove(i);

            for k in 1..=reduced.len() {
                if k == i {
                    continue;
                }
                let a = reduced[k - 1];
                let insertion = match reduced.get(k) {
                    Some(&b) => self.arc(a, node) + self.arc(node, b) - self.arc(a, b),
                    None => self.arc(a, node),
                };

                if insertion - removal < -EPSILON {
                    reduced.insert(k, node);
                    *route = reduced;
                    return true;
                }
            }
        }
        false
    }

    fn penalise(&mut self, route: &[usize]) {
        let utility = |i: usize, j: usize| {
            self.costs.get(i, j) as f64 / (1.0 + self.penalties.count(i, j) as f64)
        };

        let best = route
            .windows(2)
            .map(|w| utility(w[0], w[1]))
            .fold(f64::MIN, f64::max);

        let arcs = route
            .windows(2)
            .filter(|w| (utility(w[0], w[1]) - best).abs() < EPSILON)
            .map(|w| (w[0], w[1]))
            .collect::<Vec<_>>();

        for (i, j) in arcs {
            self.penalties.bump(i, j);
        }
    }
}

/// Extend from the last visited node along its cheapest arc, ties to the lowest index.
fn cheapest_arc_path(costs: &CostMatrix, start: usize) -> Vec<usize> {
    let n = costs.len();
    let mut visited = vec![false; n];
    let mut route = Vec::with_capacity(n);
    visited[start] = true;
    route.push(start);

    while route.len() < n {
        let last = route[route.len() - 1];
        let next = (0..n)
            .filter(|&j| !visited[j])
            .min_by_key(|&j| (costs.get(last, j), j));

        let Some(next) = next else { break };
        visited[next] = true;
        route.push(next);
    }
    route
}

/// Every ordering of the non-start nodes; for tiny inputs only.
fn enumerate(costs: &CostMatrix, start: usize) -> Option<Vec<usize>> {
    let rest: Vec<usize> = (0..costs.len()).filter(|&j| j != start).collect();

    let mut orders = vec![rest.clone()];
    if rest.len() == 2 {
        orders.push(vec![rest[1], rest[0]]);
    }

    orders
        .into_iter()
        .map(|tail| std::iter::once(start).chain(tail).collect::<Vec<_>>())
        .min_by_key(|route| costs.path_cost(route))
}

impl RouteSolver for GuidedLocalSearch {
    fn name(&self) -> &'static str {
        "guided local search"
    }

    fn solve(&self, costs: &CostMatrix, start: usize, budget: Duration) -> Result<Vec<usize>> {
        let n = costs.len();
        if n == 0 || start >= n {
            return Err(PlanError::NoRouteFound("no nodes to route".into()));
        }
        if n <= 3 {
            return enumerate(costs, start)
                .ok_or_else(|| PlanError::NoRouteFound("no ordering found".into()));
        }

        let spinner = create_spinner(format!("Solving {n}-stop route"));
        let mut search = Search {
            costs,
            penalties: Penalties::new(n),
            deadline: Instant::now() + budget,
        };

        let mut current = cheapest_arc_path(costs, start);
        search.descend(&mut current);

        let mut best = current.clone();
        let mut best_cost = costs.path_cost(&best);
        search.penalties.lambda = self.lambda_coefficient * best_cost as f64 / (n - 1) as f64;

        let mut rounds = 0usize;
        while !search.expired() {
            search.penalise(&current);
            search.descend(&mut current);
            rounds += 1;

            let cost = costs.path_cost(&current);
            if cost < best_cost {
                best_cost = cost;
                best.clone_from(&current);
                spinner.set_message(format!("Solving {n}-stop route, best {best_cost}"));
            }
        }
        spinner.finish_and_clear();

        debug!("Guided local search ran {rounds} rounds, best cost {best_cost}");
        Ok(best)
    }
}
