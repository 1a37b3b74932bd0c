//! Grid-based weighted kernel density estimation.
//!
//! Points are splatted bilinearly onto a node grid, then blurred with a
//! separable Gaussian kernel. The grid is padded by the kernel reach so mass
//! near the plot border is not clipped.

use log::warn;
use serde::{Deserialize, Serialize};

/// Kernel truncation, in standard deviations.
const KERNEL_REACH_SIGMAS: f64 = 3.0;
/// Upper bound on grid nodes for one estimate (~128 MiB of f64).
pub(crate) const MAX_GRID_NODES: usize = 16 * 1024 * 1024;
/// Upper bound on the kernel half-width, in grid cells.
pub(crate) const MAX_KERNEL_RADIUS: usize = 4096;

/// One weighted sample in plot coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedPoint {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

impl WeightedPoint {
    pub fn new(x: f64, y: f64, weight: f64) -> Self {
        Self { x, y, weight }
    }
}

/// Density values on a regular node grid.
///
/// Node `(i, j)` sits at plot position `origin + (i, j) * spacing`; values are
/// in weight per square plot unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    columns: usize,
    rows: usize,
    origin_x: f64,
    origin_y: f64,
    spacing: f64,
    values: Vec<f64>,
}

impl DensityGrid {
    /// Builds a grid from row-major values.
    ///
    /// Returns `None` when `values.len() != columns * rows`.
    pub fn from_values(
        columns: usize,
        rows: usize,
        origin: [f64; 2],
        spacing: f64,
        values: Vec<f64>,
    ) -> Option<Self> {
        (values.len() == columns * rows).then_some(Self {
            columns,
            rows,
            origin_x: origin[0],
            origin_y: origin[1],
            spacing,
            values,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn value(&self, column: usize, row: usize) -> f64 {
        self.values[row * self.columns + column]
    }

    /// Value with everything outside the grid reading as zero.
    pub fn value_or_zero(&self, column: isize, row: isize) -> f64 {
        if column < 0 || row < 0 {
            return 0.0;
        }
        let (column, row) = (column as usize, row as usize);
        if column >= self.columns || row >= self.rows {
            return 0.0;
        }
        self.value(column, row)
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Total mass in weight units (values are per square plot unit).
    pub fn total_mass(&self) -> f64 {
        self.values.iter().sum::<f64>() * self.spacing * self.spacing
    }

    /// Converts fractional node coordinates to plot coordinates.
    pub fn to_plot(&self, column: f64, row: f64) -> [f64; 2] {
        [
            self.origin_x + column * self.spacing,
            self.origin_y + row * self.spacing,
        ]
    }
}

/// Estimates a density grid covering `[0, width] x [0, height]`.
///
/// Points outside the plot, with non-finite coordinates, or with a
/// non-positive weight are skipped. Returns `None` when nothing is left to
/// estimate or the grid would exceed the node budget.
pub fn estimate_density(
    points: &[WeightedPoint],
    bandwidth: f64,
    cell_size: f64,
    width: f64,
    height: f64,
) -> Option<DensityGrid> {
    let Some(shape) = GridShape::new(bandwidth, cell_size, width, height) else {
        warn!(
            "event=density_grid module=density status=rejected bandwidth={bandwidth} cell_size={cell_size} width={width} height={height} max_nodes={MAX_GRID_NODES}"
        );
        return None;
    };
    let GridShape {
        sigma_cells,
        radius,
        pad,
        columns,
        rows,
    } = shape;

    let mut values = vec![0.0_f64; columns * rows];
    let mut splatted = 0_usize;
    for point in points {
        if !is_usable(point, width, height) {
            continue;
        }
        let gx = point.x / cell_size + pad as f64;
        let gy = point.y / cell_size + pad as f64;
        let (x0, y0) = (gx.floor() as usize, gy.floor() as usize);
        let (tx, ty) = (gx - x0 as f64, gy - y0 as f64);

        let base = y0 * columns + x0;
        values[base] += (1.0 - tx) * (1.0 - ty) * point.weight;
        values[base + 1] += tx * (1.0 - ty) * point.weight;
        values[base + columns] += (1.0 - tx) * ty * point.weight;
        values[base + columns + 1] += tx * ty * point.weight;
        splatted += 1;
    }
    if splatted == 0 {
        return None;
    }

    let kernel = gaussian_kernel(sigma_cells, radius);
    let blurred_rows = convolve(&values, columns, rows, &kernel, Axis::Horizontal);
    let mut blurred = convolve(&blurred_rows, columns, rows, &kernel, Axis::Vertical);

    let per_unit_area = 1.0 / (cell_size * cell_size);
    for value in &mut blurred {
        *value *= per_unit_area;
    }

    let origin = -(pad as f64) * cell_size;
    DensityGrid::from_values(columns, rows, [origin, origin], cell_size, blurred)
}

/// Node layout of one estimate; `None` when the parameters would exceed the
/// kernel or node budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GridShape {
    pub sigma_cells: f64,
    pub radius: usize,
    pub pad: usize,
    pub columns: usize,
    pub rows: usize,
}

impl GridShape {
    pub(crate) fn new(bandwidth: f64, cell_size: f64, width: f64, height: f64) -> Option<Self> {
        let sigma_cells = bandwidth / cell_size;
        let reach = (KERNEL_REACH_SIGMAS * sigma_cells).ceil();
        if !(0.0..=MAX_KERNEL_RADIUS as f64).contains(&reach) {
            return None;
        }
        let radius = (reach as usize).max(1);
        let pad = radius + 1;

        let columns = axis_nodes(width / cell_size, pad)?;
        let rows = axis_nodes(height / cell_size, pad)?;
        if columns.checked_mul(rows)? > MAX_GRID_NODES {
            return None;
        }

        Some(Self {
            sigma_cells,
            radius,
            pad,
            columns,
            rows,
        })
    }
}

fn axis_nodes(span_cells: f64, pad: usize) -> Option<usize> {
    let span = span_cells.ceil();
    if !(0.0..=MAX_GRID_NODES as f64).contains(&span) {
        return None;
    }
    (span as usize).checked_add(1)?.checked_add(pad.checked_mul(2)?)
}

fn is_usable(point: &WeightedPoint, width: f64, height: f64) -> bool {
    point.weight.is_finite()
        && point.weight > 0.0
        && point.x.is_finite()
        && point.y.is_finite()
        && (0.0..=width).contains(&point.x)
        && (0.0..=height).contains(&point.y)
}

/// Normalized, truncated Gaussian weights for offsets `-radius..=radius`.
pub(crate) fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f64> {
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel = (0..=2 * radius)
        .map(|index| {
            let offset = index as f64 - radius as f64;
            (-(offset * offset) / two_sigma_sq).exp()
        })
        .collect::<Vec<_>>();
    let sum = kernel.iter().sum::<f64>();
    if sum > 0.0 && sum.is_finite() {
        for weight in &mut kernel {
            *weight /= sum;
        }
    } else {
        // sigma underflowed to zero: identity kernel
        kernel.iter_mut().for_each(|weight| *weight = 0.0);
        kernel[radius] = 1.0;
    }
    kernel
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

fn convolve(values: &[f64], columns: usize, rows: usize, kernel: &[f64], axis: Axis) -> Vec<f64> {
    let radius = kernel.len() / 2;
    let mut out = vec![0.0_f64; values.len()];

    for row in 0..rows {
        for column in 0..columns {
            let value = values[row * columns + column];
            if value == 0.0 {
                continue;
            }
            // Scatter keeps the inner loop cheap on sparse grids.
            for (index, weight) in kernel.iter().enumerate() {
                let (target_column, target_row) = match axis {
                    Axis::Horizontal => ((column + index).checked_sub(radius), Some(row)),
                    Axis::Vertical => (Some(column), (row + index).checked_sub(radius)),
                };
                let (Some(target_column), Some(target_row)) = (target_column, target_row) else {
                    continue;
                };
                if target_column >= columns || target_row >= rows {
                    continue;
                }
                out[target_row * columns + target_column] += value * weight;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{estimate_density, gaussian_kernel, GridShape, WeightedPoint};

    #[test]
    fn oversized_kernel_or_grid_is_rejected_without_panicking() {
        let points = vec![WeightedPoint::new(50.0, 50.0, 1.0)];
        assert!(estimate_density(&points, 1e300, 4.0, 100.0, 100.0).is_none());
        assert!(estimate_density(&points, 4.0, 1e-300, 100.0, 100.0).is_none());
        assert!(estimate_density(&points, 4.0, 4.0, 1e300, 100.0).is_none());
        assert!(GridShape::new(4.0, 4.0, 100.0, 100.0).is_some());
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(1.5, 5);
        assert_eq!(kernel.len(), 11);
        let sum = kernel.iter().sum::<f64>();
        assert!((sum - 1.0).abs() < 1e-12);
        for offset in 0..5 {
            assert!((kernel[offset] - kernel[10 - offset]).abs() < 1e-15);
        }
        assert!(kernel[5] > kernel[4]);
    }

    #[test]
    fn estimate_preserves_total_weight_inside_plot() {
        let points = vec![
            WeightedPoint::new(50.0, 50.0, 3.0),
            WeightedPoint::new(20.0, 70.0, 2.0),
        ];
        let grid = estimate_density(&points, 4.0, 2.0, 100.0, 100.0).expect("grid");
        assert!((grid.total_mass() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn peak_sits_near_the_single_point() {
        let points = vec![WeightedPoint::new(40.0, 24.0, 1.0)];
        let grid = estimate_density(&points, 4.0, 4.0, 100.0, 60.0).expect("grid");

        let mut best = (0, 0, f64::MIN);
        for row in 0..grid.rows() {
            for column in 0..grid.columns() {
                let value = grid.value(column, row);
                if value > best.2 {
                    best = (column, row, value);
                }
            }
        }
        let [x, y] = grid.to_plot(best.0 as f64, best.1 as f64);
        assert_eq!((x, y), (40.0, 24.0));
    }

    #[test]
    fn skips_unusable_points() {
        let points = vec![
            WeightedPoint::new(-1.0, 5.0, 1.0),
            WeightedPoint::new(5.0, f64::NAN, 1.0),
            WeightedPoint::new(5.0, 5.0, 0.0),
            WeightedPoint::new(5.0, 5.0, -2.0),
        ];
        assert!(estimate_density(&points, 4.0, 4.0, 10.0, 10.0).is_none());
    }

    #[test]
    fn points_on_the_far_border_stay_in_bounds() {
        let points = vec![WeightedPoint::new(10.0, 10.0, 1.0)];
        let grid = estimate_density(&points, 1.0, 3.0, 10.0, 10.0).expect("grid");
        assert!((grid.total_mass() - 1.0).abs() < 1e-9);
    }
}
