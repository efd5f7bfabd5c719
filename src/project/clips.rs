// Clip extraction
// Pulls up to four MIDI clips per track with their loop region, end marker and notes

use std::cmp::Ordering;

use crate::tree::{Node, PathSegment};

use super::models::{Clip, NoteEvent, CLIP_SLOTS};

const DEFAULT_VELOCITY: f64 = 100.0;

/// Read clip slots A-D of a MIDI track; missing slots stay `None`
pub fn read_clip_slots(track: &Node) -> Vec<Option<Clip>> {
    let mut clips = vec![None; CLIP_SLOTS];

    let Some(slot_list) = track.resolve_tags(&["DeviceChain", "MainSequencer", "ClipSlotList"]) else {
        log::debug!("  No ClipSlotList found");
        return clips;
    };

    let clip_path = [
        PathSegment::ByTag("ClipSlot"),
        PathSegment::ByTag("Value"),
        PathSegment::ByTag("MidiClip"),
    ];

    for (slot, container) in slot_list.children.iter().take(CLIP_SLOTS).enumerate() {
        if let Some(midi_clip) = container.resolve(&clip_path) {
            let clip = read_clip(midi_clip);
            log::info!(
                "  Clip {}: {} notes for sub-layer {}",
                slot,
                clip.notes.len(),
                layer_letter(slot)
            );
            clips[slot] = Some(clip);
        }
    }

    clips
}

/// Sub-layer letter (A-D) for logs
pub fn layer_letter(slot: usize) -> char {
    (b'A' + slot as u8) as char
}

/// Read one MIDI clip
pub fn read_clip(clip: &Node) -> Clip {
    let loop_node = clip.child("Loop");
    let loop_value = |tag: &str| {
        loop_node
            .and_then(|l| l.child(tag))
            .or_else(|| clip.child(tag))
            .and_then(Node::parse_value::<f64>)
    };

    Clip {
        loop_start: loop_value("LoopStart"),
        loop_end: loop_value("LoopEnd"),
        end_marker: clip.child("CurrentEnd").and_then(Node::parse_value::<f64>),
        notes: read_notes(clip),
    }
}

/// All notes across every key track, ordered by start time
fn read_notes(clip: &Node) -> Vec<NoteEvent> {
    let mut notes = Vec::new();

    let Some(key_tracks) = clip.resolve_tags(&["Notes", "KeyTracks"]) else {
        return notes;
    };

    for key_track in &key_tracks.children {
        let Some(midi_note) = key_track
            .child("MidiKey")
            .and_then(Node::parse_value::<i64>)
            .and_then(|n| u8::try_from(n).ok())
            .filter(|n| *n <= 127)
        else {
            continue;
        };

        let Some(events) = key_track.child("Notes") else {
            continue;
        };

        notes.extend(
            events
                .children
                .iter()
                .filter_map(|event| read_note_event(event, midi_note)),
        );
    }

    notes.sort_by(|a, b| {
        a.time_beats
            .partial_cmp(&b.time_beats)
            .unwrap_or(Ordering::Equal)
            .then(a.midi_note.cmp(&b.midi_note))
    });

    notes
}

/// Attribute form (Live 11+) or the older child-element form
fn read_note_event(event: &Node, midi_note: u8) -> Option<NoteEvent> {
    let (time, duration, velocity) = if let Some(time) = event.attr("Time") {
        let number = |name: &str| event.attr(name).and_then(|v| v.trim().parse::<f64>().ok());
        (
            time.trim().parse::<f64>().ok()?,
            number("Duration").unwrap_or(0.0),
            number("Velocity").unwrap_or(DEFAULT_VELOCITY),
        )
    } else {
        let number = |name: &str| event.child(name).and_then(Node::parse_value::<f64>);
        (
            number("Time")?,
            number("Duration")?,
            number("Velocity").unwrap_or(DEFAULT_VELOCITY),
        )
    };

    if !time.is_finite() || time < 0.0 || !duration.is_finite() || duration <= 0.0 {
        log::debug!("  Skipping note {} at {} (duration {})", midi_note, time, duration);
        return None;
    }

    Some(NoteEvent {
        time_beats: time,
        duration_beats: duration,
        velocity: velocity.clamp(0.0, 127.0) as u8,
        midi_note,
    })
}
