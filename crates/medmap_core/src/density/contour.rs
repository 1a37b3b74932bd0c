//! Marching-squares isolines over a `DensityGrid`.
//!
//! The grid is read through a virtual border of zeros, so for any positive
//! threshold every crossing edge is shared by exactly two cell segments and
//! every traced ring closes.
//!
//! Segments are oriented with the region at or above the threshold on their
//! right-hand side on screen. Rings around dense regions therefore have a
//! positive `signed_area` and rings around dips (holes) a negative one.

use super::kde::DensityGrid;
use crate::model::geometry::{point_in_ring, signed_area};
use log::debug;
use std::collections::HashMap;

/// Identifies one grid edge by its lower node and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeKey {
    /// Between node `(i, j)` and `(i + 1, j)`.
    Horizontal(isize, isize),
    /// Between node `(i, j)` and `(i, j + 1)`.
    Vertical(isize, isize),
}

/// One filled region at a threshold: an exterior ring and the dips cut out
/// of it.
#[derive(Debug, Clone, PartialEq)]
pub struct IsoPolygon {
    /// Closed ring with positive `signed_area`.
    pub exterior: Vec<[f64; 2]>,
    /// Closed rings with negative `signed_area`, each inside `exterior`.
    pub holes: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Traces closed, oriented isolines at `threshold`, in plot coordinates.
///
/// Each ring repeats its first point at the end. Rings are returned in
/// row-major discovery order. Non-positive or non-finite thresholds yield no
/// rings.
pub fn isolines(grid: &DensityGrid, threshold: f64) -> Vec<Vec<[f64; 2]>> {
    if !(threshold.is_finite() && threshold > 0.0) {
        return Vec::new();
    }

    let segments = cell_segments(grid, threshold);
    stitch(grid, threshold, &segments)
}

/// Groups the isolines at `threshold` into polygons with holes.
///
/// Each hole is attached to the smallest exterior containing it. Polygons
/// keep the discovery order of their exteriors; zero-area rings are dropped.
pub fn iso_polygons(grid: &DensityGrid, threshold: f64) -> Vec<IsoPolygon> {
    let mut polygons = Vec::new();
    let mut exterior_areas = Vec::new();
    let mut holes = Vec::new();

    for ring in isolines(grid, threshold) {
        let area = signed_area(&ring);
        if area > 0.0 {
            polygons.push(IsoPolygon {
                exterior: ring,
                holes: Vec::new(),
            });
            exterior_areas.push(area);
        } else if area < 0.0 {
            holes.push(ring);
        }
    }

    for hole in holes {
        let first_point = hole[0];
        let owner = polygons
            .iter()
            .zip(&exterior_areas)
            .enumerate()
            .filter(|(_, (polygon, _))| point_in_ring(first_point, &polygon.exterior))
            .min_by(|(_, (_, a)), (_, (_, b))| a.total_cmp(b))
            .map(|(index, _)| index);
        match owner {
            Some(index) => polygons[index].holes.push(hole),
            None => debug!("event=contour_hole module=density status=orphaned"),
        }
    }

    polygons
}

fn cell_segments(grid: &DensityGrid, threshold: f64) -> Vec<(EdgeKey, EdgeKey)> {
    let columns = grid.columns() as isize;
    let rows = grid.rows() as isize;
    let mut segments = Vec::new();

    for j in -1..rows {
        for i in -1..columns {
            let top_left = grid.value_or_zero(i, j);
            let top_right = grid.value_or_zero(i + 1, j);
            let bottom_right = grid.value_or_zero(i + 1, j + 1);
            let bottom_left = grid.value_or_zero(i, j + 1);

            let case = (usize::from(top_left >= threshold) << 3)
                | (usize::from(top_right >= threshold) << 2)
                | (usize::from(bottom_right >= threshold) << 1)
                | usize::from(bottom_left >= threshold);

            let center_inside =
                (top_left + top_right + bottom_right + bottom_left) / 4.0 >= threshold;
            let edge = |side: Side| match side {
                Side::Top => EdgeKey::Horizontal(i, j),
                Side::Bottom => EdgeKey::Horizontal(i, j + 1),
                Side::Left => EdgeKey::Vertical(i, j),
                Side::Right => EdgeKey::Vertical(i + 1, j),
            };

            for &(from, to) in case_sides(case, center_inside) {
                let (from, to) = orient(case, from, to);
                segments.push((edge(from), edge(to)));
            }
        }
    }

    segments
}

/// Edge pairs crossed by the isoline for one cell configuration.
///
/// Bits: top-left 8, top-right 4, bottom-right 2, bottom-left 1. Saddles
/// (5 and 10) connect the inside corners through the center when the center
/// average is inside.
fn case_sides(case: usize, center_inside: bool) -> &'static [(Side, Side)] {
    use Side::{Bottom, Left, Right, Top};
    match case {
        1 | 14 => &[(Left, Bottom)],
        2 | 13 => &[(Bottom, Right)],
        3 | 12 => &[(Left, Right)],
        4 | 11 => &[(Top, Right)],
        6 | 9 => &[(Top, Bottom)],
        7 | 8 => &[(Top, Left)],
        5 if center_inside => &[(Top, Left), (Bottom, Right)],
        5 => &[(Top, Right), (Left, Bottom)],
        10 if center_inside => &[(Top, Right), (Left, Bottom)],
        10 => &[(Top, Left), (Bottom, Right)],
        _ => &[],
    }
}

/// Cell-local position of an edge midpoint (y down).
fn side_point(side: Side) -> [f64; 2] {
    match side {
        Side::Top => [0.5, 0.0],
        Side::Right => [1.0, 0.5],
        Side::Bottom => [0.5, 1.0],
        Side::Left => [0.0, 0.5],
    }
}

/// Orders a segment so inside corners lie on its right on screen.
///
/// The segment splits the corners into two groups; the smaller group is
/// uniform (it is a single cut-off corner or one full side), so one corner
/// from it tells which side is inside.
fn orient(case: usize, from: Side, to: Side) -> (Side, Side) {
    const CORNERS: [([f64; 2], usize); 4] = [
        ([0.0, 0.0], 8),
        ([1.0, 0.0], 4),
        ([1.0, 1.0], 2),
        ([0.0, 1.0], 1),
    ];
    let [ax, ay] = side_point(from);
    let [bx, by] = side_point(to);
    let right_of = |[cx, cy]: [f64; 2]| (bx - ax) * (cy - ay) - (by - ay) * (cx - ax) > 0.0;

    let (right, left): (Vec<&([f64; 2], usize)>, Vec<_>) = CORNERS.iter().partition(|corner| right_of(corner.0));
    let (sample, sample_on_right) = if right.len() <= left.len() {
        (right[0], true)
    } else {
        (left[0], false)
    };
    let sample_inside = case & sample.1 != 0;

    if sample_inside == sample_on_right {
        (from, to)
    } else {
        (to, from)
    }
}

fn stitch(
    grid: &DensityGrid,
    threshold: f64,
    segments: &[(EdgeKey, EdgeKey)],
) -> Vec<Vec<[f64; 2]>> {
    let by_start = segments
        .iter()
        .enumerate()
        .map(|(index, (from, _))| (*from, index))
        .collect::<HashMap<_, _>>();

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();

    for start_index in 0..segments.len() {
        if used[start_index] {
            continue;
        }
        used[start_index] = true;
        let (start_edge, mut current_edge) = segments[start_index];
        let mut ring = vec![crossing(grid, threshold, start_edge)];

        loop {
            ring.push(crossing(grid, threshold, current_edge));
            if current_edge == start_edge {
                break;
            }
            let next = by_start
                .get(&current_edge)
                .copied()
                .filter(|index| !used[*index]);
            let Some(next) = next else {
                // Unreachable with the zero border; close what was traced.
                let first = ring[0];
                ring.push(first);
                break;
            };
            used[next] = true;
            current_edge = segments[next].1;
        }

        rings.push(ring);
    }

    rings
}

/// Linearly interpolated threshold crossing on one edge, in plot coordinates.
fn crossing(grid: &DensityGrid, threshold: f64, edge: EdgeKey) -> [f64; 2] {
    let (start_value, end_value, column, row, horizontal) = match edge {
        EdgeKey::Horizontal(i, j) => (
            grid.value_or_zero(i, j),
            grid.value_or_zero(i + 1, j),
            i,
            j,
            true,
        ),
        EdgeKey::Vertical(i, j) => (
            grid.value_or_zero(i, j),
            grid.value_or_zero(i, j + 1),
            i,
            j,
            false,
        ),
    };

    let delta = end_value - start_value;
    let t = if delta == 0.0 {
        0.5
    } else {
        ((threshold - start_value) / delta).clamp(0.0, 1.0)
    };

    if horizontal {
        grid.to_plot(column as f64 + t, row as f64)
    } else {
        grid.to_plot(column as f64, row as f64 + t)
    }
}
