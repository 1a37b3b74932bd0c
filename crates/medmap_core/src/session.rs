//! Map session use-case service.
//!
//! # Responsibility
//! - Wire dataset, spatial index, selection store and view sync together.
//! - Provide one entry point that turns input events into state changes.
//!
//! # Invariants
//! - The session is the only writer of its selection store.
//! - The view is rendered once at open (empty selection) and once per
//!   selection notification afterwards.
//! - Rejected input never changes state and never surfaces as an error.

use crate::config::{ConfigError, MapConfig};
use crate::dataset::{load_dataset, DatasetIndex, DatasetSources, GeoProjector, LoadResult};
use crate::density::DensityEngine;
use crate::interaction::{
    Highlight, IgnoreReason, InputEvent, InteractionRouter, RouteOutcome, SpatialIndex,
};
use crate::model::school::{Preset, SchoolKey};
use crate::selection::{SelectionSnapshot, SelectionStore, SubscriptionId};
use crate::view::{ViewRenderer, ViewSync};
use log::debug;
use std::sync::Arc;

/// Result of handling one input event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionResponse {
    /// Hover target for pointer moves; `None` otherwise.
    pub highlight: Option<Highlight>,
    /// Whether selection subscribers (and the view) were notified.
    pub notified: bool,
    /// Set when the event was dropped without effect.
    pub ignored: Option<IgnoreReason>,
}

/// One interactive map over one immutable dataset.
pub struct MapSession {
    dataset: Arc<DatasetIndex>,
    spatial: SpatialIndex,
    store: SelectionStore,
    config: MapConfig,
}

impl MapSession {
    /// Opens a session and renders the initial empty-selection frame.
    ///
    /// # Errors
    /// - Returns `ConfigError` when `config` is invalid.
    pub fn open(
        dataset: DatasetIndex,
        config: MapConfig,
        renderer: impl ViewRenderer + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let engine = DensityEngine::from_map_config(&config)?;
        let dataset = Arc::new(dataset);
        let spatial = SpatialIndex::build(&dataset);
        let mut store = SelectionStore::new(dataset.all_keys());

        let mut view = ViewSync::new(Arc::clone(&dataset), engine, renderer);
        view.on_selection_changed(&store.snapshot());
        store.subscribe(move |snapshot| view.on_selection_changed(snapshot));

        Ok(Self {
            dataset,
            spatial,
            store,
            config,
        })
    }

    /// Loads the dataset from `sources` and opens a session over it.
    ///
    /// # Errors
    /// - Any `DataLoadError` from loading, or `InvalidConfig`.
    pub fn open_from_sources(
        sources: &DatasetSources,
        projector: &dyn GeoProjector,
        config: MapConfig,
        renderer: impl ViewRenderer + 'static,
    ) -> LoadResult<Self> {
        config.validate()?;
        let dataset = load_dataset(sources, projector)?;
        Ok(Self::open(dataset, config, renderer)?)
    }

    /// Routes one input event and applies the resulting command.
    pub fn handle(&mut self, event: InputEvent) -> SessionResponse {
        let outcome = InteractionRouter::new(&self.dataset, &self.spatial).route(event);
        match outcome {
            RouteOutcome::Highlight(highlight) => SessionResponse {
                highlight,
                ..SessionResponse::default()
            },
            RouteOutcome::Ignored(reason) => {
                debug!("event=input_ignored module=session reason={reason:?}");
                SessionResponse {
                    ignored: Some(reason),
                    ..SessionResponse::default()
                }
            }
            RouteOutcome::Command(command) => match self.store.apply(command) {
                Ok(notified) => SessionResponse {
                    notified,
                    ..SessionResponse::default()
                },
                Err(err) => {
                    debug!("event=selection_rejected module=session error={err}");
                    SessionResponse {
                        ignored: Some(IgnoreReason::UnknownSchool(err.key().to_string())),
                        ..SessionResponse::default()
                    }
                }
            },
        }
    }

    pub fn selection(&self) -> SelectionSnapshot {
        self.store.snapshot()
    }

    pub fn dataset(&self) -> &DatasetIndex {
        &self.dataset
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn presets(&self) -> &[Preset] {
        self.dataset.presets()
    }

    /// Datalist suggestions for the search box.
    pub fn suggest(&self, text: &str, limit: Option<usize>) -> Vec<SchoolKey> {
        InteractionRouter::new(&self.dataset, &self.spatial).suggest(text, limit)
    }

    /// Registers an extra selection observer next to the view.
    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(&SelectionSnapshot) + Send + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}
