//! Selection-driven view recomputation.
//!
//! # Responsibility
//! - Rebuild the density surface and statistics for each selection snapshot.
//! - Hand one consistent frame (map, legend, list, proportion bar) to the
//!   rendering collaborator.
//!
//! # Invariants
//! - A frame is derived only from the snapshot and the read-only dataset.
//! - Every notification produces exactly one rendered frame.

use crate::dataset::DatasetIndex;
use crate::density::{compute_aggregate_stats, AggregateStats, DensityEngine, DensitySurface};
use crate::model::school::SchoolKey;
use crate::selection::SelectionSnapshot;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One contour level as shown in the legend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub level: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    pub fn from_surface(surface: &DensitySurface) -> Self {
        Self {
            entries: surface
                .thresholds
                .iter()
                .enumerate()
                .map(|(level, value)| LegendEntry {
                    level,
                    value: *value,
                })
                .collect(),
        }
    }
}

/// Primary vs specialty split; both fractions are 0 when nothing is counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProportionBar {
    pub primary_fraction: f64,
    pub specialty_fraction: f64,
}

impl ProportionBar {
    pub fn from_stats(stats: &AggregateStats) -> Self {
        if stats.total_primary + stats.total_specialty > 0.0 {
            Self {
                primary_fraction: stats.primary_proportion,
                specialty_fraction: 1.0 - stats.primary_proportion,
            }
        } else {
            Self::default()
        }
    }
}

/// Everything the rendering layer needs for one selection state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewFrame {
    pub revision: u64,
    /// Alphabetical selection list.
    pub selection: Vec<SchoolKey>,
    pub surface: DensitySurface,
    pub legend: Legend,
    pub stats: AggregateStats,
    pub proportion_bar: ProportionBar,
}

/// Rendering collaborator fed by `ViewSync`.
pub trait ViewRenderer: Send {
    fn render(&mut self, frame: &ViewFrame);
}

/// Recomputes and renders a frame for every selection snapshot.
pub struct ViewSync {
    dataset: Arc<DatasetIndex>,
    engine: DensityEngine,
    renderer: Box<dyn ViewRenderer>,
}

impl ViewSync {
    pub fn new(
        dataset: Arc<DatasetIndex>,
        engine: DensityEngine,
        renderer: impl ViewRenderer + 'static,
    ) -> Self {
        Self {
            dataset,
            engine,
            renderer: Box::new(renderer),
        }
    }

    /// Derives the frame for `snapshot` without rendering it.
    pub fn build_frame(&self, snapshot: &SelectionSnapshot) -> ViewFrame {
        let points = self.dataset.weighted_points(&snapshot.keys);
        let surface = self.engine.compute(&points);
        let stats = compute_aggregate_stats(self.dataset.selected_infos(&snapshot.keys));

        ViewFrame {
            revision: snapshot.revision,
            selection: snapshot.keys.clone(),
            legend: Legend::from_surface(&surface),
            proportion_bar: ProportionBar::from_stats(&stats),
            surface,
            stats,
        }
    }

    pub fn on_selection_changed(&mut self, snapshot: &SelectionSnapshot) {
        let frame = self.build_frame(snapshot);
        self.renderer.render(&frame);
    }
}

/// Renderer that keeps the latest frame for pull-based hosts.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    latest: Arc<Mutex<Option<ViewFrame>>>,
    rendered: Arc<AtomicUsize>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<ViewFrame> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of frames rendered so far.
    pub fn frames_rendered(&self) -> usize {
        self.rendered.load(Ordering::SeqCst)
    }
}

impl ViewRenderer for FrameRecorder {
    fn render(&mut self, frame: &ViewFrame) {
        *self
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(frame.clone());
        self.rendered.fetch_add(1, Ordering::SeqCst);
    }
}
