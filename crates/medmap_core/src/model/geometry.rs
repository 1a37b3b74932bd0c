//! Planar ring helpers shared by lasso hit testing and contour assembly.

/// Even-odd ray casting test; the ring may be open or closed.
pub fn point_in_ring(point: [f64; 2], ring: &[[f64; 2]]) -> bool {
    let Some(&last) = ring.last() else {
        return false;
    };
    let [px, py] = point;
    let mut inside = false;
    let mut previous = last;
    for &current in ring {
        let ([xi, yi], [xj, yj]) = (current, previous);
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        previous = current;
    }
    inside
}

/// Shoelace area in plot coordinates (y grows downward).
///
/// Positive for rings that run clockwise on screen.
pub fn signed_area(ring: &[[f64; 2]]) -> f64 {
    let Some(&last) = ring.last() else {
        return 0.0;
    };
    let mut twice_area = 0.0;
    let mut previous = last;
    for &current in ring {
        twice_area += previous[0] * current[1] - current[0] * previous[1];
        previous = current;
    }
    twice_area / 2.0
}
