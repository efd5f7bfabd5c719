// Rackbox - Drum rack live set to 16-pad sampler preset converter
// Module declarations

pub mod groove;
pub mod pipeline;
pub mod preset;
pub mod project;
pub mod routing;
pub mod sampler;
pub mod tree;

pub use pipeline::{build_preset, convert, convert_with, ConversionReport, ConvertError, ConvertOptions, PresetBuild};
