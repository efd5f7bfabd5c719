// Groove Engine - Step grids and note-timing inference
// Decides per sequence layer whether timing is quantised and at what resolution

pub mod grid;
pub mod quantize;

pub use grid::{StepGrid, StepLength, ANALYSIS_TICKS_PER_BEAT, BEATS_PER_BAR, MAX_STEPS, OUTPUT_TICKS_PER_BEAT};
pub use quantize::{infer, snap_to_grid, GridInference, InferenceSettings, TimingMode};
