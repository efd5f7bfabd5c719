// Pipeline module
// Drives one conversion from live set file to preset directory

pub mod assets;
pub mod convert;
pub mod options;
pub mod trace;

pub use assets::{copy_assets, AssetFailure, AssetMaterializer, FsMaterializer};
pub use convert::{build_preset, convert, convert_with, ConversionCounts, ConversionReport, ConvertError, PresetBuild};
pub use options::{ConvertOptions, OptionsError, DEFAULT_PRESET_FILE};
pub use trace::{read_trace_file, Stage, Trace, TraceEntry, TraceError, TraceLevel, TraceWriter};
