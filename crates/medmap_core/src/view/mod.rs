//! View synchronization: the thin consumer between selection and rendering.

pub mod sync;

pub use sync::{
    FrameRecorder, Legend, LegendEntry, ProportionBar, ViewFrame, ViewRenderer, ViewSync,
};
