//! FFI use-case API for Flutter-facing map calls.
//!
//! # Responsibility
//! - Expose the map session to Dart via FRB as flat, use-case-level calls.
//! - Own the single process-wide session and its frame recorder.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every map call before a successful `map_open` returns `ok = false`.
//! - Frames are pulled with `map_frame`; event calls only report changes.

use medmap_core::dataset::loader::MAP_CONFIG_FILE;
use medmap_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, load_map_config,
    ping as ping_inner, DatasetSources, EquirectangularProjector, FrameRecorder, InputEvent,
    LassoEntity, MapConfig, MapSession, SessionResponse, ViewFrame,
};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

const DATA_DIR_ENV: &str = "MEDMAP_DATA_DIR";

static MAP_STATE: Mutex<Option<OpenMap>> = Mutex::new(None);

struct OpenMap {
    session: MapSession,
    recorder: FrameRecorder,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Outcome of opening the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOpenResponse {
    pub ok: bool,
    pub message: String,
    /// Schools available for selection.
    pub school_count: u32,
    pub record_count: u32,
    /// Records dropped as unprojectable or orphaned.
    pub dropped_record_count: u32,
}

impl MapOpenResponse {
    /// `stage` is logged; `message` may name schools and only reaches Dart.
    fn failure(stage: &'static str, message: impl Into<String>) -> Self {
        warn!("event=map_open module=ffi status=error stage={stage}");
        Self {
            ok: false,
            message: message.into(),
            school_count: 0,
            record_count: 0,
            dropped_record_count: 0,
        }
    }
}

/// Generic response envelope for selection-changing calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapActionResponse {
    pub ok: bool,
    /// Whether the selection (and the frame) changed.
    pub changed: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl MapActionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            message: message.into(),
        }
    }

    fn from_session(response: SessionResponse) -> Self {
        let message = match &response.ignored {
            Some(reason) => format!("ignored: {reason:?}"),
            None if response.notified => "selection updated".to_string(),
            None => "selection unchanged".to_string(),
        };
        Self {
            ok: response.ignored.is_none(),
            changed: response.notified,
            message,
        }
    }
}

/// Hover target under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct MapHoverResponse {
    pub ok: bool,
    pub message: String,
    pub school: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// Datalist suggestions for the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSuggestResponse {
    pub items: Vec<String>,
    pub message: String,
}

/// One preset as listed in the preset menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapPresetItem {
    pub name: String,
    pub schools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapPresetsResponse {
    pub items: Vec<MapPresetItem>,
    pub message: String,
}

/// One contour region, rings flattened to `x0, y0, x1, y1, ...`.
///
/// `coordinates` runs clockwise on screen and each hole counter-clockwise,
/// so nonzero and even-odd fills both leave holes empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MapContourItem {
    pub level: u32,
    pub value: f64,
    pub coordinates: Vec<f64>,
    pub holes: Vec<Vec<f64>>,
}

/// Latest rendered frame, flattened for Dart.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFrameResponse {
    pub ok: bool,
    pub message: String,
    pub revision: u64,
    /// Alphabetical selection list.
    pub selection: Vec<String>,
    pub contours: Vec<MapContourItem>,
    /// Legend values, one per contour level.
    pub thresholds: Vec<f64>,
    pub max_density: f64,
    pub mean_score: f64,
    pub total_primary: f64,
    pub total_specialty: f64,
    pub primary_proportion: f64,
    pub primary_fraction: f64,
    pub specialty_fraction: f64,
}

impl MapFrameResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            revision: 0,
            selection: Vec::new(),
            contours: Vec::new(),
            thresholds: Vec::new(),
            max_density: 0.0,
            mean_score: 0.0,
            total_primary: 0.0,
            total_specialty: 0.0,
            primary_proportion: 0.0,
            primary_fraction: 0.0,
            specialty_fraction: 0.0,
        }
    }

    fn from_frame(frame: ViewFrame) -> Self {
        Self {
            ok: true,
            message: String::new(),
            revision: frame.revision,
            selection: frame.selection,
            contours: frame
                .surface
                .contours
                .into_iter()
                .map(|contour| MapContourItem {
                    level: u32::try_from(contour.level).unwrap_or(u32::MAX),
                    value: contour.value,
                    coordinates: contour.ring.into_iter().flatten().collect(),
                    holes: contour
                        .holes
                        .into_iter()
                        .map(|hole| hole.into_iter().flatten().collect())
                        .collect(),
                })
                .collect(),
            thresholds: frame.surface.thresholds,
            max_density: frame.surface.max_density,
            mean_score: frame.stats.mean_score,
            total_primary: frame.stats.total_primary,
            total_specialty: frame.stats.total_specialty,
            primary_proportion: frame.stats.primary_proportion,
            primary_fraction: frame.proportion_bar.primary_fraction,
            specialty_fraction: frame.proportion_bar.specialty_fraction,
        }
    }
}

/// Loads the dataset and opens the process-wide map session.
///
/// Input semantics:
/// - `data_dir`: directory holding the JSON resources; falls back to
///   `MEDMAP_DATA_DIR` when `None` or blank.
/// - `plot_width`/`plot_height`: plot area in logical pixels.
///
/// # FFI contract
/// - Sync call; reads files and builds indexes.
/// - Replaces any previously open session.
/// - Never panics; load failures are reported in the envelope.
#[flutter_rust_bridge::frb(sync)]
pub fn map_open(data_dir: Option<String>, plot_width: f64, plot_height: f64) -> MapOpenResponse {
    let Some(dir) = resolve_data_dir(data_dir) else {
        return MapOpenResponse::failure(
            "data_dir",
            format!("map_open failed: no data directory given and {DATA_DIR_ENV} is unset"),
        );
    };

    let config = match load_map_config(dir.join(MAP_CONFIG_FILE)) {
        Ok(config) => MapConfig {
            plot_width,
            plot_height,
            ..config.unwrap_or_default()
        },
        Err(err) => {
            return MapOpenResponse::failure(err.kind(), format!("map_open failed: {err}"))
        }
    };

    let sources = DatasetSources::from_dir(&dir);
    let projector = EquirectangularProjector::contiguous_us(plot_width, plot_height);
    let recorder = FrameRecorder::new();
    let session =
        match MapSession::open_from_sources(&sources, &projector, config, recorder.clone()) {
            Ok(session) => session,
            Err(err) => {
                return MapOpenResponse::failure(err.kind(), format!("map_open failed: {err}"))
            }
        };

    let report = session.dataset().report();
    let response = MapOpenResponse {
        ok: true,
        message: "map opened".to_string(),
        school_count: to_u32(session.dataset().len()),
        record_count: to_u32(report.records_loaded),
        dropped_record_count: to_u32(report.records_unprojectable + report.records_orphaned),
    };
    info!(
        "event=map_open module=ffi status=ok schools={} records={}",
        response.school_count, response.record_count
    );
    *lock_state() = Some(OpenMap { session, recorder });
    response
}

/// Resolves the school under the pointer for the hover marker.
#[flutter_rust_bridge::frb(sync)]
pub fn map_pointer_move(x: f64, y: f64) -> MapHoverResponse {
    let result = with_session(|map| map.session.handle(InputEvent::PointerMove { x, y }));
    match result {
        Ok(response) => {
            let highlight = response.highlight;
            MapHoverResponse {
                ok: true,
                message: String::new(),
                school: highlight.as_ref().map(|hit| hit.key.clone()),
                x: highlight.as_ref().map(|hit| hit.position.x),
                y: highlight.as_ref().map(|hit| hit.position.y),
            }
        }
        Err(message) => MapHoverResponse {
            ok: false,
            message,
            school: None,
            x: None,
            y: None,
        },
    }
}

/// Toggles the school nearest to a map click.
#[flutter_rust_bridge::frb(sync)]
pub fn map_click(x: f64, y: f64) -> MapActionResponse {
    dispatch(InputEvent::Click { x, y })
}

/// Toggles the school typed into the search box.
///
/// Unknown names leave the selection unchanged and return `ok = false`.
#[flutter_rust_bridge::frb(sync)]
pub fn map_search(text: String) -> MapActionResponse {
    dispatch(InputEvent::SearchSubmit(text))
}

/// Suggests school names for the search datalist.
#[flutter_rust_bridge::frb(sync)]
pub fn map_suggest(text: String, limit: Option<u32>) -> MapSuggestResponse {
    let limit = limit.map(|value| value as usize);
    match with_session(|map| map.session.suggest(&text, limit)) {
        Ok(items) => MapSuggestResponse {
            items,
            message: String::new(),
        },
        Err(message) => MapSuggestResponse {
            items: Vec::new(),
            message,
        },
    }
}

/// Removes one school from the selection list.
#[flutter_rust_bridge::frb(sync)]
pub fn map_remove(school: String) -> MapActionResponse {
    dispatch(InputEvent::ListItemClick(school))
}

/// Replaces the selection with a named preset.
#[flutter_rust_bridge::frb(sync)]
pub fn map_preset(name: String) -> MapActionResponse {
    dispatch(InputEvent::Preset(name))
}

/// Selects every known school.
#[flutter_rust_bridge::frb(sync)]
pub fn map_select_all() -> MapActionResponse {
    dispatch(InputEvent::SelectAll)
}

/// Toggles the schools reported by the lasso recognizer.
#[flutter_rust_bridge::frb(sync)]
pub fn map_lasso(school_names: Vec<String>) -> MapActionResponse {
    dispatch(InputEvent::LassoEnd(
        school_names.into_iter().map(LassoEntity::new).collect(),
    ))
}

/// Toggles the schools inside a lasso path given as `x0, y0, x1, y1, ...`.
#[flutter_rust_bridge::frb(sync)]
pub fn map_lasso_polygon(coordinates: Vec<f64>) -> MapActionResponse {
    if coordinates.len() % 2 != 0 {
        return MapActionResponse::failure(format!(
            "lasso path needs x,y pairs; got {} values",
            coordinates.len()
        ));
    }
    let ring = coordinates
        .chunks_exact(2)
        .map(|pair| [pair[0], pair[1]])
        .collect();
    dispatch(InputEvent::LassoPolygon(ring))
}

/// Empties the selection.
#[flutter_rust_bridge::frb(sync)]
pub fn map_clear() -> MapActionResponse {
    dispatch(InputEvent::ClearAll)
}

/// Lists presets in file order.
#[flutter_rust_bridge::frb(sync)]
pub fn map_presets() -> MapPresetsResponse {
    let result = with_session(|map| {
        map.session
            .presets()
            .iter()
            .map(|preset| MapPresetItem {
                name: preset.name.clone(),
                schools: preset.schools.clone(),
            })
            .collect::<Vec<_>>()
    });
    match result {
        Ok(items) => MapPresetsResponse {
            items,
            message: String::new(),
        },
        Err(message) => MapPresetsResponse {
            items: Vec::new(),
            message,
        },
    }
}

/// Returns the most recently rendered frame.
#[flutter_rust_bridge::frb(sync)]
pub fn map_frame() -> MapFrameResponse {
    match with_session(|map| map.recorder.latest()) {
        Ok(Some(frame)) => MapFrameResponse::from_frame(frame),
        Ok(None) => MapFrameResponse::failure("no frame rendered yet"),
        Err(message) => MapFrameResponse::failure(message),
    }
}

fn dispatch(event: InputEvent) -> MapActionResponse {
    match with_session(|map| map.session.handle(event)) {
        Ok(response) => MapActionResponse::from_session(response),
        Err(message) => MapActionResponse::failure(message),
    }
}

fn with_session<T>(f: impl FnOnce(&mut OpenMap) -> T) -> Result<T, String> {
    let mut state = lock_state();
    match state.as_mut() {
        Some(map) => Ok(f(map)),
        None => Err("map is not open; call map_open first".to_string()),
    }
}

fn lock_state() -> MutexGuard<'static, Option<OpenMap>> {
    MAP_STATE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn resolve_data_dir(data_dir: Option<String>) -> Option<PathBuf> {
    data_dir
        .filter(|value| !value.trim().is_empty())
        .or_else(|| std::env::var(DATA_DIR_ENV).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
