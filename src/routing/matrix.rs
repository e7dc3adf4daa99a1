use geo::Coord;
use rayon::prelude::*;

/// Scale applied to distances before truncating them to integer costs.
pub const COST_SCALE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    pub fn from_coords(coords: &[Coord<f64>]) -> Self {
        let n = coords.len();
        let data = coords
            .par_iter()
            .flat_map_iter(|a| coords.iter().map(move |b| (a.x - b.x).hypot(a.y - b.y)))
            .collect();
        Self { n, data }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

/// Integer arc costs for the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    n: usize,
    data: Vec<i64>,
}

impl CostMatrix {
    pub fn from_distances(distances: &DistanceMatrix) -> Self {
        let data = distances
            .data
            .iter()
            .map(|d| (d * COST_SCALE).trunc() as i64)
            .collect();
        Self {
            n: distances.n,
            data,
        }
    }

    pub fn from_rows(rows: Vec<Vec<i64>>) -> Self {
        let n = rows.len();
        Self {
            n,
            data: rows.into_iter().flatten().collect(),
        }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> i64 {
        self.data[i * self.n + j]
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Cost of an open path, no return arc.
    pub fn path_cost(&self, route: &[usize]) -> i64 {
        route.windows(2).map(|w| self.get(w[0], w[1])).sum()
    }
}
