// Project models - Typed view of a live set's drum rack and sequence tracks
// Built once by the reader, consumed read-only by every later stage

use serde::{Deserialize, Serialize};

pub const MAX_PADS: usize = 16;
pub const MAX_TRACKS: usize = 16;
pub const CLIP_SLOTS: usize = 4;
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Whole live set as far as the converter cares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Song tempo in BPM
    pub tempo: f64,

    /// Creator string from the document root (e.g. "Ableton Live 12.1")
    pub creator: Option<String>,

    /// Drum rack slots in chain order
    pub pads: Vec<DrumPad>,

    /// MIDI tracks following the drum rack track, in order
    pub tracks: Vec<SequenceTrack>,
}

/// One branch of the drum rack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrumPad {
    /// Chain position (0-15); this is the destination pad, whatever the receiving note
    pub index: usize,

    pub name: String,

    pub sample: Option<SampleRef>,

    /// MIDI note the branch responds to
    pub receiving_note: Option<u8>,

    /// Exclusivity group, already mapped into 0..=4
    pub choke_group: u8,

    /// Stable branch id, the target of device-input routing
    pub branch_id: Option<u32>,

    pub is_empty: bool,
}

impl DrumPad {
    /// An empty slot at the given chain position
    pub fn empty(index: usize) -> Self {
        DrumPad {
            index,
            name: String::new(),
            sample: None,
            receiving_note: None,
            choke_group: 0,
            branch_id: None,
            is_empty: true,
        }
    }
}

/// Map a source choke group to one of the four exclusive groups (0 = none)
pub fn map_choke_group(value: i64) -> u8 {
    value.clamp(0, 4) as u8
}

/// A sample file inside a (possibly multi-sample) instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleFile {
    pub path: String,
    pub root_key: u8,
    pub key_min: u8,
    pub key_max: u8,
}

impl SampleFile {
    /// File name without its directory; live sets may carry either separator
    pub fn file_name(&self) -> &str {
        self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path)
    }
}

/// Amplitude envelope as stored by the source device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope {
            attack: 1.0,
            decay: 300.0,
            sustain: 1.0,
            release: 200.0,
        }
    }
}

/// How a pad responds to note on/off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    #[default]
    Gate,
    Trigger,
    Toggle,
}

impl TriggerMode {
    /// Source encoding: 0 = gate, 1 = trigger, 2 = toggle; anything else is gate
    pub fn from_value(value: i64) -> Self {
        match value {
            1 => TriggerMode::Trigger,
            2 => TriggerMode::Toggle,
            _ => TriggerMode::Gate,
        }
    }

    /// Destination `samtrigtype` code
    pub fn code(&self) -> u8 {
        match self {
            TriggerMode::Gate => 0,
            TriggerMode::Trigger => 1,
            TriggerMode::Toggle => 2,
        }
    }
}

/// Stretch metadata; its presence alone changes how loops are decided
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WarpInfo {
    pub is_warped: bool,

    /// Explicit loop length in whole beats, when the source recorded one
    pub beat_count: Option<u32>,

    pub sample_duration_seconds: Option<f64>,
}

/// Everything read from a pad's sampler device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRef {
    /// At least one file; more than one means multi-sample mode
    pub files: Vec<SampleFile>,

    pub sample_start: f64,
    pub sample_end: f64,

    /// Sample rate recorded in the source document
    pub source_sample_rate: Option<f64>,

    pub loop_on: bool,
    pub loop_start: f64,
    pub loop_end: Option<f64>,

    pub envelope: Envelope,
    pub trigger_mode: TriggerMode,
    pub warp: Option<WarpInfo>,
}

impl SampleRef {
    pub fn primary_file(&self) -> Option<&SampleFile> {
        self.files.first()
    }

    pub fn is_multi_sample(&self) -> bool {
        self.files.len() > 1
    }

    /// Loop end, defaulting to the sample end
    pub fn effective_loop_end(&self) -> f64 {
        self.loop_end.unwrap_or(self.sample_end)
    }
}

/// Where a sequence track's notes go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Routing {
    /// Whole rack; the note number picks the pad
    #[default]
    Pads,

    /// One pad played chromatically
    Keys(KeysTarget),

    /// External MIDI output on a channel (0-15)
    Midi { channel: u8 },
}

/// Identifies the pad a keys-mode track plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeysTarget {
    /// Branch id from the routing string
    Branch(u32),

    /// Positional chain index (older routing strings)
    Chain(usize),
}

impl Routing {
    pub fn mode_name(&self) -> &'static str {
        match self {
            Routing::Pads => "Pads",
            Routing::Keys(_) => "Keys",
            Routing::Midi { .. } => "MIDI",
        }
    }
}

/// A MIDI track feeding one sequence location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceTrack {
    /// Position among MIDI tracks (0-15)
    pub position: usize,

    pub name: String,

    /// Raw routing string, kept for diagnostics
    pub routing_target: Option<String>,

    pub routing: Routing,

    /// Clip slots A-D; `None` where the slot holds no MIDI clip
    pub clips: Vec<Option<Clip>>,
}

impl SequenceTrack {
    pub fn clip(&self, slot: usize) -> Option<&Clip> {
        self.clips.get(slot).and_then(Option::as_ref)
    }
}

/// A MIDI clip in one slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub loop_start: Option<f64>,
    pub loop_end: Option<f64>,

    /// Clip end marker
    pub end_marker: Option<f64>,

    /// Notes ordered by start time
    pub notes: Vec<NoteEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub time_beats: f64,
    pub duration_beats: f64,
    pub velocity: u8,
    pub midi_note: u8,
}

impl NoteEvent {
    pub fn end_beats(&self) -> f64 {
        self.time_beats + self.duration_beats
    }
}
