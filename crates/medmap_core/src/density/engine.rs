//! Density surface computation.
//!
//! # Responsibility
//! - Turn filtered weighted points into an ordered list of contour polygons.
//! - Resolve contour levels through an explicit `ThresholdPolicy`.
//!
//! # Invariants
//! - Pure: identical inputs and config yield identical surfaces.
//! - Empty or fully skipped input yields an empty surface, never an error.
//! - Contours are ordered by ascending level, then row-major discovery.
//! - Exterior rings have positive `signed_area` (clockwise on screen), holes
//!   negative.

use super::contour::iso_polygons;
use super::kde::{estimate_density, WeightedPoint};
use crate::config::{ConfigError, DensityConfig, MapConfig, ThresholdPolicy};
use log::{debug, warn};
use serde::Serialize;
use std::time::Instant;

/// One iso-density region: an exterior ring with its holes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contour {
    /// Index into `DensitySurface::thresholds`, usable as a colour ramp index.
    pub level: usize,
    /// Density threshold in weight per square plot unit.
    pub value: f64,
    /// Exterior in plot space; the first vertex is repeated at the end.
    pub ring: Vec<[f64; 2]>,
    /// Closed rings below `value` enclosed by `ring`, wound opposite to it.
    pub holes: Vec<Vec<[f64; 2]>>,
}

/// Contour field for one selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DensitySurface {
    pub contours: Vec<Contour>,
    /// Levels used for this surface, ascending.
    pub thresholds: Vec<f64>,
    /// Grid maximum in weight per square plot unit; 0 when empty.
    pub max_density: f64,
}

impl DensitySurface {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

/// Density computation bound to one validated config and drawing area.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityEngine {
    config: DensityConfig,
    plot_width: f64,
    plot_height: f64,
}

impl DensityEngine {
    pub fn new(
        config: DensityConfig,
        plot_width: f64,
        plot_height: f64,
    ) -> Result<Self, ConfigError> {
        let map_config = MapConfig {
            plot_width,
            plot_height,
            density: config,
        };
        Self::from_map_config(&map_config)
    }

    pub fn from_map_config(config: &MapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.density.clone(),
            plot_width: config.plot_width,
            plot_height: config.plot_height,
        })
    }

    pub fn config(&self) -> &DensityConfig {
        &self.config
    }

    pub fn compute(&self, points: &[WeightedPoint]) -> DensitySurface {
        compute_surface(
            points,
            self.config.bandwidth,
            self.config.cell_size,
            &self.config.thresholds,
            self.plot_width,
            self.plot_height,
        )
    }
}

/// Computes a surface with the default cell size and threshold policy.
///
/// Invalid parameters (non-finite or non-positive) produce an empty surface.
pub fn compute_density(
    points: &[WeightedPoint],
    bandwidth: f64,
    grid_width: f64,
    grid_height: f64,
) -> DensitySurface {
    let defaults = DensityConfig::default();
    compute_surface(
        points,
        bandwidth,
        defaults.cell_size,
        &defaults.thresholds,
        grid_width,
        grid_height,
    )
}

fn compute_surface(
    points: &[WeightedPoint],
    bandwidth: f64,
    cell_size: f64,
    policy: &ThresholdPolicy,
    width: f64,
    height: f64,
) -> DensitySurface {
    if points.is_empty() {
        return DensitySurface::empty();
    }
    let params_valid = [bandwidth, cell_size, width, height]
        .iter()
        .all(|value| value.is_finite() && *value > 0.0);
    if !params_valid {
        warn!(
            "event=density_compute module=density status=rejected bandwidth={} cell_size={} width={} height={}",
            bandwidth, cell_size, width, height
        );
        return DensitySurface::empty();
    }

    let started_at = Instant::now();
    let Some(grid) = estimate_density(points, bandwidth, cell_size, width, height) else {
        return DensitySurface::empty();
    };

    let max_density = grid.max_value();
    let thresholds = policy.resolve(max_density);
    let mut contours = Vec::new();
    for (level, value) in thresholds.iter().copied().enumerate() {
        for polygon in iso_polygons(&grid, value) {
            contours.push(Contour {
                level,
                value,
                ring: polygon.exterior,
                holes: polygon.holes,
            });
        }
    }

    debug!(
        "event=density_compute module=density status=ok points={} levels={} contours={} duration_ms={}",
        points.len(),
        thresholds.len(),
        contours.len(),
        started_at.elapsed().as_millis()
    );

    DensitySurface {
        contours,
        thresholds,
        max_density,
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_density, DensityEngine};
    use crate::config::{DensityConfig, ThresholdPolicy};
    use crate::density::kde::WeightedPoint;

    #[test]
    fn invalid_parameters_yield_empty_surface() {
        let points = vec![WeightedPoint::new(5.0, 5.0, 1.0)];
        assert!(compute_density(&points, 0.0, 10.0, 10.0).is_empty());
        assert!(compute_density(&points, 4.0, f64::INFINITY, 10.0).is_empty());
    }

    #[test]
    fn levels_are_ascending_and_indexed() {
        let points = vec![
            WeightedPoint::new(30.0, 30.0, 5.0),
            WeightedPoint::new(70.0, 40.0, 2.0),
        ];
        let surface = compute_density(&points, 4.0, 100.0, 80.0);
        assert_eq!(surface.thresholds.len(), 10);
        assert!(surface
            .thresholds
            .windows(2)
            .all(|pair| pair[0] < pair[1]));
        assert!(surface
            .contours
            .windows(2)
            .all(|pair| pair[0].level <= pair[1].level));
        for contour in &surface.contours {
            assert_eq!(contour.value, surface.thresholds[contour.level]);
        }
    }

    #[test]
    fn fixed_thresholds_above_peak_produce_no_rings() {
        let config = DensityConfig {
            thresholds: ThresholdPolicy::Fixed {
                values: vec![1_000.0],
            },
            ..DensityConfig::default()
        };
        let engine = DensityEngine::new(config, 50.0, 50.0).expect("valid config");
        let surface = engine.compute(&[WeightedPoint::new(25.0, 25.0, 1.0)]);
        assert!(surface.is_empty());
        assert_eq!(surface.thresholds, vec![1_000.0]);
        assert!(surface.max_density > 0.0);
    }

    #[test]
    fn engine_rejects_invalid_config() {
        let config = DensityConfig {
            cell_size: -1.0,
            ..DensityConfig::default()
        };
        assert!(DensityEngine::new(config, 10.0, 10.0).is_err());
    }
}
