// Sampler - Sample header inspection and playback-mode analysis

pub mod analysis;
pub mod inspect;

pub use analysis::{analyze, CellMode, PlaybackPlan, CLIP_ENVELOPE, CLIP_MODE_MIN_BEATS};
pub use inspect::{resolve_sample_path, SampleInfo, SampleInspector, WavInspector};
