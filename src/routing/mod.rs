pub mod exact;
pub mod gls;
pub mod matrix;
pub mod solver;

use geo::Coord;

pub use exact::ExactSolver;
pub use gls::GuidedLocalSearch;
pub use matrix::{CostMatrix, DistanceMatrix};
pub use solver::{RouteSolver, solve_checked};

/// Index of the coordinate closest to `takeoff`, lowest index on ties. 0 without a takeoff.
pub fn nearest_start(coords: &[Coord<f64>], takeoff: Option<Coord<f64>>) -> usize {
    let Some(t) = takeoff else {
        return 0;
    };

    coords
        .iter()
        .enumerate()
        .fold(None::<(usize, f64)>, |best, (i, c)| {
            let d = (c.x - t.x).hypot(c.y - t.y);
            match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((i, d)),
            }
        })
        .map_or(0, |(i, _)| i)
}
