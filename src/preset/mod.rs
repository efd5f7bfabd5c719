// Preset builder - Pad cells, sequence cells and the assembled preset document
// Pure functions of the project model; nothing here touches the filesystem

pub mod assembler;
pub mod cells;
pub mod pads;
pub mod params;
pub mod sequences;

pub use assembler::assemble;
pub use cells::grid_position;
pub use pads::{build_pads, ModSource, PadBuild, PadCell, PadKind};
pub use params::PadParams;
pub use sequences::{build_sequences, clip_length_beats, pad_note_map, SeqEvent, SequenceCell};
