// Project model - Reads a live set's drum rack and MIDI tracks into typed values
// The reader never fails on a missing node, except for the drum rack itself

pub mod clips;
pub mod models;
pub mod reader;
pub mod simpler;

pub use clips::{layer_letter, read_clip_slots};
pub use models::{
    map_choke_group, Clip, DrumPad, Envelope, KeysTarget, NoteEvent, Project, Routing, SampleFile,
    SampleRef, SequenceTrack, TriggerMode, WarpInfo, CLIP_SLOTS, DEFAULT_TEMPO, MAX_PADS, MAX_TRACKS,
};
pub use reader::{read_project, read_tempo, ReadError};
pub use simpler::read_sample;
