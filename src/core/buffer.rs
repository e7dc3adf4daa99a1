use geo::{Coord, LineString, Polygon};
use std::f64::consts::{FRAC_PI_2, PI};

/// Arc resolution per quarter circle.
pub const QUADRANT_SEGMENTS: usize = 16;

/// Round buffer around a point: a regular polygon with `4 * QUADRANT_SEGMENTS` sides.
pub fn point_buffer(center: Coord<f64>, radius: f64) -> Polygon<f64> {
    let steps = 4 * QUADRANT_SEGMENTS;
    let mut ring: Vec<Coord<f64>> = (0..steps)
        .map(|k| {
            let angle = 2.0 * PI * k as f64 / steps as f64;
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect();
    ring.push(ring[0]);

    Polygon::new(LineString::new(ring), vec![])
}

/// Round-capped corridor around the segment `a`-`b`.
pub fn segment_buffer(a: Coord<f64>, b: Coord<f64>, radius: f64) -> Polygon<f64> {
    let heading = (b.y - a.y).atan2(b.x - a.x);
    if (b.x - a.x).hypot(b.y - a.y) == 0.0 {
        return point_buffer(a, radius);
    }

    let mut ring = Vec::with_capacity(4 * QUADRANT_SEGMENTS + 3);
    push_half_circle(&mut ring, b, radius, heading - FRAC_PI_2);
    push_half_circle(&mut ring, a, radius, heading + FRAC_PI_2);
    ring.push(ring[0]);

    Polygon::new(LineString::new(ring), vec![])
}

fn push_half_circle(ring: &mut Vec<Coord<f64>>, center: Coord<f64>, radius: f64, start: f64) {
    let steps = 2 * QUADRANT_SEGMENTS;
    for k in 0..=steps {
        let angle = start + PI * k as f64 / steps as f64;
        ring.push(Coord {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        });
    }
}
