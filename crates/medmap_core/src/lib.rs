//! Core domain logic for the medical-school practice map.
//! Selection state, density surfaces and input routing live here; hosts only
//! render frames and forward events.

pub mod config;
pub mod dataset;
pub mod density;
pub mod interaction;
pub mod logging;
pub mod model;
pub mod selection;
pub mod session;
pub mod view;

pub use config::{ConfigError, DensityConfig, MapConfig, ThresholdPolicy};
pub use dataset::{
    load_dataset, load_map_config, DataLoadError, DatasetIndex, DatasetSources,
    EquirectangularProjector, GeoProjector, IdentityProjector, LoadReport, LoadResult,
};
pub use density::{
    compute_aggregate_stats, compute_density, AggregateStats, Contour, DensityEngine,
    DensitySurface, WeightedPoint,
};
pub use interaction::{Highlight, IgnoreReason, InputEvent, InteractionRouter, LassoEntity};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::school::{PlanarPoint, PracticeRecord, Preset, SchoolInfo, SchoolKey};
pub use selection::{SelectionCommand, SelectionError, SelectionSnapshot, SelectionStore};
pub use session::{MapSession, SessionResponse};
pub use view::{FrameRecorder, ViewFrame, ViewRenderer, ViewSync};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
