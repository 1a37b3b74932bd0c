//! Map and density configuration.
//!
//! # Responsibility
//! - Hold plot dimensions and kernel density parameters for one session.
//! - Validate parameters once, before any density computation runs.
//!
//! # Invariants
//! - A validated config has finite, strictly positive sizes and bandwidth.
//! - The threshold policy always yields at least one positive level.

use crate::density::kde::{GridShape, MAX_GRID_NODES, MAX_KERNEL_RADIUS};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Kernel bandwidth in plot units.
pub const DEFAULT_BANDWIDTH: f64 = 4.0;
/// Density grid spacing in plot units.
pub const DEFAULT_CELL_SIZE: f64 = 4.0;
/// One contour level per colour of the 10-stop contour ramp.
pub const DEFAULT_THRESHOLD_LEVELS: u32 = 10;
pub const DEFAULT_PLOT_WIDTH: f64 = 960.0;
pub const DEFAULT_PLOT_HEIGHT: f64 = 600.0;

const MAX_THRESHOLD_LEVELS: u32 = 64;

/// How contour levels are chosen for one density grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ThresholdPolicy {
    /// `levels` evenly spaced values strictly between 0 and the grid maximum:
    /// `max * k / (levels + 1)` for `k = 1..=levels`.
    Uniform { levels: u32 },
    /// Fixed density values in weight per square plot unit.
    ///
    /// Non-positive values are ignored; the rest are sorted and deduplicated.
    Fixed { values: Vec<f64> },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::Uniform {
            levels: DEFAULT_THRESHOLD_LEVELS,
        }
    }
}

impl ThresholdPolicy {
    /// Resolves concrete ascending threshold values for a grid maximum.
    ///
    /// Returns an empty list when `max_density` is not positive.
    pub fn resolve(&self, max_density: f64) -> Vec<f64> {
        if !(max_density.is_finite() && max_density > 0.0) {
            return Vec::new();
        }

        match self {
            Self::Uniform { levels } => {
                let denominator = f64::from(*levels) + 1.0;
                (1..=*levels)
                    .map(|k| max_density * f64::from(k) / denominator)
                    .collect()
            }
            Self::Fixed { values } => normalized_fixed_values(values),
        }
    }
}

fn normalized_fixed_values(values: &[f64]) -> Vec<f64> {
    let mut sorted = values
        .iter()
        .copied()
        .filter(|value| value.is_finite() && *value > 0.0)
        .collect::<Vec<_>>();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted
}

/// Kernel density estimation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DensityConfig {
    /// Gaussian kernel standard deviation in plot units.
    pub bandwidth: f64,
    /// Grid node spacing in plot units.
    pub cell_size: f64,
    pub thresholds: ThresholdPolicy,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            bandwidth: DEFAULT_BANDWIDTH,
            cell_size: DEFAULT_CELL_SIZE,
            thresholds: ThresholdPolicy::default(),
        }
    }
}

impl DensityConfig {
    /// Validates kernel parameters and the threshold policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("bandwidth", self.bandwidth)?;
        require_positive("cellSize", self.cell_size)?;
        let reach = (3.0 * self.bandwidth / self.cell_size).ceil();
        if !(0.0..=MAX_KERNEL_RADIUS as f64).contains(&reach) {
            return Err(ConfigError::KernelTooWide {
                bandwidth: self.bandwidth,
                cell_size: self.cell_size,
            });
        }

        match &self.thresholds {
            ThresholdPolicy::Uniform { levels: 0 } => Err(ConfigError::NoThresholdLevels),
            ThresholdPolicy::Uniform { levels } if *levels > MAX_THRESHOLD_LEVELS => {
                Err(ConfigError::TooManyThresholdLevels(*levels))
            }
            ThresholdPolicy::Uniform { .. } => Ok(()),
            ThresholdPolicy::Fixed { values } => {
                if normalized_fixed_values(values).is_empty() {
                    Err(ConfigError::NoFixedThresholds)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Session-wide map configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapConfig {
    /// Drawing area width; density grids span `[0, plot_width]`.
    pub plot_width: f64,
    /// Drawing area height; density grids span `[0, plot_height]`.
    pub plot_height: f64,
    pub density: DensityConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            plot_width: DEFAULT_PLOT_WIDTH,
            plot_height: DEFAULT_PLOT_HEIGHT,
            density: DensityConfig::default(),
        }
    }
}

impl MapConfig {
    /// Default density parameters for a specific drawing area.
    pub fn with_plot_size(plot_width: f64, plot_height: f64) -> Self {
        Self {
            plot_width,
            plot_height,
            density: DensityConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("plotWidth", self.plot_width)?;
        require_positive("plotHeight", self.plot_height)?;
        self.density.validate()?;
        let shape = GridShape::new(
            self.density.bandwidth,
            self.density.cell_size,
            self.plot_width,
            self.plot_height,
        );
        if shape.is_none() {
            return Err(ConfigError::GridTooLarge);
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositive { field: &'static str, value: f64 },
    NoThresholdLevels,
    TooManyThresholdLevels(u32),
    NoFixedThresholds,
    /// Kernel reach exceeds the supported width in grid cells.
    KernelTooWide { bandwidth: f64, cell_size: f64 },
    /// Plot area at this cell size exceeds the density grid node budget.
    GridTooLarge,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositive { field, value } => {
                write!(f, "`{field}` must be finite and > 0, got {value}")
            }
            Self::NoThresholdLevels => write!(f, "uniform threshold policy needs levels >= 1"),
            Self::TooManyThresholdLevels(levels) => write!(
                f,
                "uniform threshold policy supports at most {MAX_THRESHOLD_LEVELS} levels, got {levels}"
            ),
            Self::NoFixedThresholds => {
                write!(f, "fixed threshold policy needs at least one value > 0")
            }
            Self::KernelTooWide {
                bandwidth,
                cell_size,
            } => write!(
                f,
                "bandwidth {bandwidth} spans more than {MAX_KERNEL_RADIUS} cells of size {cell_size}"
            ),
            Self::GridTooLarge => write!(
                f,
                "plot size and cell size need more than {MAX_GRID_NODES} density grid nodes"
            ),
        }
    }
}

impl Error for ConfigError {}
