//! Input event routing.
//!
//! # Responsibility
//! - Translate raw input modalities into typed `SelectionCommand`s.
//! - Resolve pointer positions to schools and validate typed names.
//!
//! # Invariants
//! - The router holds no state; all selection state lives in the store.
//! - Unknown names never produce a command and never panic.
//! - Hover never produces a selection command.

use super::spatial::SpatialIndex;
use crate::dataset::DatasetIndex;
use crate::model::school::{PlanarPoint, SchoolKey};
use crate::selection::SelectionCommand;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const SUGGEST_DEFAULT_LIMIT: usize = 10;
const SUGGEST_LIMIT_MAX: usize = 50;

/// One entity reported by the external lasso gesture recognizer.
///
/// Extra fields of the entity are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LassoEntity {
    #[serde(alias = "med_school_name")]
    pub school_name: String,
}

impl LassoEntity {
    pub fn new(school_name: impl Into<String>) -> Self {
        Self {
            school_name: school_name.into(),
        }
    }
}

/// Raw input events from the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f64, y: f64 },
    Click { x: f64, y: f64 },
    SearchSubmit(String),
    ListItemClick(SchoolKey),
    Preset(String),
    SelectAll,
    LassoEnd(Vec<LassoEntity>),
    /// Closed lasso path for hosts without their own hit testing.
    LassoPolygon(Vec<[f64; 2]>),
    ClearAll,
}

/// School under the pointer, for the hover marker and tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub key: SchoolKey,
    pub position: PlanarPoint,
}

/// Why an event produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    NoSchoolNearby,
    BlankSearch,
    UnknownSchool(String),
    UnknownPreset(String),
    EmptyLasso,
}

/// What the router decided for one event.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Hover result; `None` when no school exists.
    Highlight(Option<Highlight>),
    Command(SelectionCommand),
    Ignored(IgnoreReason),
}

/// Stateless translator from input events to selection commands.
#[derive(Debug, Clone, Copy)]
pub struct InteractionRouter<'a> {
    dataset: &'a DatasetIndex,
    spatial: &'a SpatialIndex,
}

impl<'a> InteractionRouter<'a> {
    pub fn new(dataset: &'a DatasetIndex, spatial: &'a SpatialIndex) -> Self {
        Self { dataset, spatial }
    }

    pub fn route(&self, event: InputEvent) -> RouteOutcome {
        match event {
            InputEvent::PointerMove { x, y } => RouteOutcome::Highlight(self.highlight_at(x, y)),
            InputEvent::Click { x, y } => match self.spatial.nearest(x, y) {
                Some(hit) => RouteOutcome::Command(SelectionCommand::Toggle(hit.key.clone())),
                None => RouteOutcome::Ignored(IgnoreReason::NoSchoolNearby),
            },
            InputEvent::SearchSubmit(text) => self.route_search(&text),
            InputEvent::ListItemClick(key) => {
                RouteOutcome::Command(SelectionCommand::Remove(key))
            }
            InputEvent::Preset(name) => match self.dataset.preset(&name) {
                Some(preset) => {
                    RouteOutcome::Command(SelectionCommand::BulkSelect(preset.schools.clone()))
                }
                None => RouteOutcome::Ignored(IgnoreReason::UnknownPreset(name)),
            },
            InputEvent::SelectAll => {
                RouteOutcome::Command(SelectionCommand::BulkSelect(self.dataset.all_keys()))
            }
            InputEvent::LassoEnd(entities) => self.route_lasso(
                entities
                    .iter()
                    .filter_map(|entity| self.validate_name(&entity.school_name)),
            ),
            InputEvent::LassoPolygon(ring) => {
                self.route_lasso(self.spatial.within_polygon(&ring).into_iter().cloned())
            }
            InputEvent::ClearAll => RouteOutcome::Command(SelectionCommand::Clear),
        }
    }

    /// Nearest school to the pointer.
    pub fn highlight_at(&self, x: f64, y: f64) -> Option<Highlight> {
        self.spatial.nearest(x, y).map(|hit| Highlight {
            key: hit.key.clone(),
            position: hit.position,
        })
    }

    /// Returns the canonical key for typed text, or `None` when unknown.
    pub fn validate_name(&self, text: &str) -> Option<SchoolKey> {
        let normalized = normalize_search_text(text);
        self.dataset.contains(&normalized).then_some(normalized)
    }

    /// Datalist suggestions: prefix matches first, then substring matches,
    /// both case-insensitive and in key order.
    ///
    /// `limit` defaults to 10 when `None` or 0 and is capped at 50.
    pub fn suggest(&self, text: &str, limit: Option<usize>) -> Vec<SchoolKey> {
        let limit = normalize_suggest_limit(limit);
        let needle = normalize_search_text(text).to_lowercase();
        if needle.is_empty() {
            return self.dataset.all_keys().into_iter().take(limit).collect();
        }

        let mut prefix_hits = Vec::new();
        let mut substring_hits = Vec::new();
        for key in self.dataset.schools().map(|info| &info.key) {
            let lowered = key.to_lowercase();
            if lowered.starts_with(&needle) {
                prefix_hits.push(key.clone());
            } else if lowered.contains(&needle) {
                substring_hits.push(key.clone());
            }
        }
        prefix_hits
            .into_iter()
            .chain(substring_hits)
            .take(limit)
            .collect()
    }

    fn route_search(&self, text: &str) -> RouteOutcome {
        let normalized = normalize_search_text(text);
        if normalized.is_empty() {
            return RouteOutcome::Ignored(IgnoreReason::BlankSearch);
        }
        match self.validate_name(&normalized) {
            Some(key) => RouteOutcome::Command(SelectionCommand::Toggle(key)),
            None => RouteOutcome::Ignored(IgnoreReason::UnknownSchool(normalized)),
        }
    }

    fn route_lasso(&self, keys: impl Iterator<Item = SchoolKey>) -> RouteOutcome {
        let keys = keys.collect::<Vec<_>>();
        if keys.is_empty() {
            return RouteOutcome::Ignored(IgnoreReason::EmptyLasso);
        }
        RouteOutcome::Command(SelectionCommand::ToggleMany(keys))
    }
}

/// Trims and collapses internal whitespace runs to one space.
pub fn normalize_search_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

fn normalize_suggest_limit(limit: Option<usize>) -> usize {
    match limit {
        Some(0) | None => SUGGEST_DEFAULT_LIMIT,
        Some(value) => value.min(SUGGEST_LIMIT_MAX),
    }
}
