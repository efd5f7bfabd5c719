// Sequence builder - Turns MIDI clips into step-sequence cells
// Every track yields four sub-layer cells (A-D) at the grid slot of its position

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::groove::{
    infer, snap_to_grid, GridInference, InferenceSettings, StepGrid, StepLength, TimingMode, BEATS_PER_BAR,
    OUTPUT_TICKS_PER_BEAT,
};
use crate::project::{layer_letter, Clip, DrumPad, NoteEvent, Routing, SequenceTrack, CLIP_SLOTS};
use crate::routing::resolve_keys_target;
use crate::tree::Node;

use super::cells::{grid_position, params_node};

/// Event channel base for pad-addressed events
const PAD_CHANNEL_BASE: u32 = 256;

/// Receiving note of chain 0 when the rack carries no receiving notes
const FALLBACK_BASE_NOTE: usize = 36;

const DEFAULT_VELOCITY: u8 = 100;

/// One note in a sequence cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqEvent {
    /// Cell step containing the note start
    pub step: u32,
    pub chan: u32,
    pub start_ticks: u64,

    /// Length in grid steps; 0 for unquantised layers
    pub length_steps: u32,
    pub length_ticks: u64,
    pub pitch: u8,
    pub velocity: u8,
}

impl SeqEvent {
    pub fn to_node(&self) -> Node {
        let node = Node::new("seqevent")
            .with_attr("step", self.step)
            .with_attr("chan", self.chan)
            .with_attr("type", "note")
            .with_attr("strtks", self.start_ticks)
            .with_attr("lencount", self.length_steps)
            .with_attr("lentks", self.length_ticks)
            .with_attr("pitch", self.pitch);

        if self.velocity != DEFAULT_VELOCITY {
            node.with_attr("velocity", self.velocity)
        } else {
            node
        }
    }
}

/// One sub-layer cell of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceCell {
    pub track_position: usize,
    pub row: u8,
    pub column: u8,

    /// Sub-layer 0-3 (A-D)
    pub sublayer: usize,

    pub grid: StepGrid,

    /// `seqpadmapdest`: sequence slot (pads), target pad (keys), 0 (midi)
    pub pad_map_dest: usize,

    pub midi_out_chan: u8,

    /// `seqstepmode`: 1 for pads, 0 for keys and midi
    pub step_mode: u8,

    pub enabled: bool,

    /// First sub-layer of the track holding events, else 0
    pub active_layer: usize,

    /// Timing decision; absent when the slot holds no clip
    pub timing: Option<GridInference>,

    pub events: Vec<SeqEvent>,
}

impl SequenceCell {
    pub fn to_node(&self) -> Node {
        let params = params_node([
            ("notesteplen", self.grid.step_length.code().to_string()),
            ("notestepcount", self.grid.step_count.to_string()),
            ("dutycyc", "1000".to_string()),
            ("quantsizeseq", "1".to_string()),
            ("dispmode", u8::from(self.sublayer == 0).to_string()),
            ("seqpadmapdest", self.pad_map_dest.to_string()),
            ("seqplayenable", u8::from(self.enabled).to_string()),
            ("activeseqlayer", self.active_layer.to_string()),
            ("midioutchan", self.midi_out_chan.to_string()),
            ("seqstepmode", self.step_mode.to_string()),
            ("midiseqcellchan", "0".to_string()),
        ]);

        let sequence = self
            .events
            .iter()
            .fold(Node::new("sequence"), |seq, event| seq.with_child(event.to_node()));

        Node::new("cell")
            .with_attr("row", self.row)
            .with_attr("column", self.column)
            .with_attr("layer", 1)
            .with_attr("seqsublayer", self.sublayer)
            .with_attr("type", "noteseq")
            .with_child(params)
            .with_child(sequence)
    }
}

/// Where a cell's events are sent, resolved once per track
#[derive(Clone, Copy)]
enum Destination<'a> {
    Pads { notes: &'a HashMap<u8, usize> },
    Keys { pad: usize },
    Midi { channel: u8 },
}

impl Destination<'_> {
    /// Event channel and pitch of a note
    fn encode(&self, midi_note: u8) -> (u32, u8) {
        match self {
            Destination::Pads { notes } => {
                let pad = notes.get(&midi_note).copied().unwrap_or(0);
                (PAD_CHANNEL_BASE + pad as u32, 0)
            }
            Destination::Keys { .. } => (PAD_CHANNEL_BASE, midi_note),
            Destination::Midi { channel } => (*channel as u32, midi_note),
        }
    }
}

/// Receiving note to pad index; falls back to 36 + index when no pad has one
pub fn pad_note_map(pads: &[DrumPad]) -> HashMap<u8, usize> {
    let mut notes: HashMap<u8, usize> = pads
        .iter()
        .filter_map(|pad| pad.receiving_note.map(|note| (note, pad.index)))
        .collect();

    if notes.is_empty() {
        log::warn!("No receiving notes found in drum rack, using standard mapping (36-51 -> 0-15)");
        notes = pads
            .iter()
            .filter_map(|pad| {
                u8::try_from(FALLBACK_BASE_NOTE + pad.index)
                    .ok()
                    .map(|note| (note, pad.index))
            })
            .collect();
    }

    notes
}

/// Clip length in beats: loop region, then end marker, then notes rounded up to bars, then one beat
pub fn clip_length_beats(clip: &Clip) -> f64 {
    if let Some(end) = clip.loop_end {
        let length = end - clip.loop_start.unwrap_or(0.0);
        if length > 0.0 {
            return length;
        }
        if end > 0.0 {
            return end;
        }
    }

    if let Some(end) = clip.end_marker.filter(|end| *end > 0.0) {
        return end;
    }

    let furthest = clip.notes.iter().map(NoteEvent::end_beats).fold(0.0, f64::max);
    if furthest > 0.0 {
        return ((furthest / BEATS_PER_BAR).ceil() * BEATS_PER_BAR).max(BEATS_PER_BAR);
    }

    1.0
}

/// Build the four sub-layer cells of every track
pub fn build_sequences(
    tracks: &[SequenceTrack],
    pads: &[DrumPad],
    timing: TimingMode,
    settings: &InferenceSettings,
) -> Vec<SequenceCell> {
    let notes = pad_note_map(pads);
    let mut cells = Vec::with_capacity(tracks.len() * CLIP_SLOTS);

    for track in tracks {
        let destination = match track.routing {
            Routing::Pads => Destination::Pads { notes: &notes },
            Routing::Keys(target) => Destination::Keys {
                pad: resolve_keys_target(target, track.position, pads),
            },
            Routing::Midi { channel } => Destination::Midi { channel },
        };

        cells.extend(build_track(track, destination, timing, settings));
    }

    log::info!("Sequence extraction complete: {} cells", cells.len());
    cells
}

fn build_track(
    track: &SequenceTrack,
    destination: Destination<'_>,
    timing: TimingMode,
    settings: &InferenceSettings,
) -> Vec<SequenceCell> {
    let (row, column) = grid_position(track.position);

    let (pad_map_dest, midi_out_chan, step_mode) = match destination {
        Destination::Pads { .. } => (track.position, 0, 1),
        Destination::Keys { pad } => (pad, 0, 0),
        Destination::Midi { channel } => (0, channel, 0),
    };

    log::info!(
        "Track {}: Mode={}, Sequence Pad={}, Target Pad={}, MIDI Channel={}",
        track.position,
        track.routing.mode_name(),
        track.position,
        pad_map_dest,
        midi_out_chan
    );

    let mut cells: Vec<SequenceCell> = (0..CLIP_SLOTS)
        .map(|sublayer| {
            let (grid, inference, events) = match track.clip(sublayer) {
                Some(clip) => build_layer(clip, destination, timing, settings),
                None => (StepGrid::minimal(), None, Vec::new()),
            };

            if !events.is_empty() {
                log::info!(
                    "    Sub-layer {}: {} notes, {} x {} steps{}",
                    layer_letter(sublayer),
                    events.len(),
                    grid.step_count,
                    grid.step_length.label(),
                    if inference.is_some_and(|i| i.is_unquantised) { " (unquantised)" } else { "" }
                );
            }

            SequenceCell {
                track_position: track.position,
                row,
                column,
                sublayer,
                grid,
                pad_map_dest,
                midi_out_chan,
                step_mode,
                enabled: !events.is_empty(),
                active_layer: 0,
                timing: inference,
                events,
            }
        })
        .collect();

    let active_layer = cells.iter().position(|c| !c.events.is_empty()).unwrap_or(0);
    for cell in &mut cells {
        cell.active_layer = active_layer;
    }

    cells
}

fn build_layer(
    clip: &Clip,
    destination: Destination<'_>,
    timing: TimingMode,
    settings: &InferenceSettings,
) -> (StepGrid, Option<GridInference>, Vec<SeqEvent>) {
    let starts: Vec<f64> = clip.notes.iter().map(|n| n.time_beats).collect();
    let inference = match timing {
        TimingMode::Inferred => infer(&starts, settings),
        TimingMode::Unquantised => infer(&starts, settings).into_unquantised(),
    };

    let grid = StepGrid::fit(clip_length_beats(clip), inference.step_length);

    let events = clip
        .notes
        .iter()
        .map(|note| {
            let (chan, pitch) = destination.encode(note.midi_note);
            let placed = if inference.is_unquantised {
                place_raw(note)
            } else {
                place_on_grid(note, inference.step_length)
            };

            SeqEvent {
                step: grid.step_at(placed.start_beats),
                chan,
                start_ticks: placed.start_ticks,
                length_steps: placed.length_steps,
                length_ticks: placed.length_ticks,
                pitch,
                velocity: note.velocity,
            }
        })
        .collect();

    (grid, Some(inference), events)
}

struct Placement {
    start_beats: f64,
    start_ticks: u64,
    length_steps: u32,
    length_ticks: u64,
}

/// Snap start and length to the detected grid
fn place_on_grid(note: &NoteEvent, grid: StepLength) -> Placement {
    let index = snap_to_grid(note.time_beats, grid);
    let length_steps = ((note.duration_beats / grid.beats()).round() as u32).max(1);
    let step_ticks = grid.output_ticks() as u64;

    Placement {
        start_beats: index as f64 * grid.beats(),
        start_ticks: index.saturating_mul(step_ticks),
        length_steps,
        length_ticks: u64::from(length_steps).saturating_mul(step_ticks),
    }
}

/// Raw tick timing with no step-count length
fn place_raw(note: &NoteEvent) -> Placement {
    let ticks = |beats: f64| (beats.max(0.0) * OUTPUT_TICKS_PER_BEAT as f64).round() as u64;

    Placement {
        start_beats: note.time_beats,
        start_ticks: ticks(note.time_beats),
        length_steps: 0,
        length_ticks: ticks(note.duration_beats).max(1),
    }
}
