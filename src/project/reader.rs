// Project reader - Turns a parsed live set into the typed `Project` model
// Only a missing drum rack is fatal; every other lookup degrades to a default

use thiserror::Error;

use crate::routing;
use crate::tree::{Node, PathSegment};

use super::clips::read_clip_slots;
use super::models::{map_choke_group, DrumPad, Project, SequenceTrack, DEFAULT_TEMPO, MAX_PADS, MAX_TRACKS};
use super::simpler::read_sample;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error(
        "No DrumGroupDevice found in the first track. Set up the project with \
         track 1 = a Drum Rack with up to 16 Simplers and tracks 2-17 = MIDI tracks for sequences"
    )]
    NoDrumRack,
}

/// Read the whole project from the document root
pub fn read_project(root: &Node) -> Result<Project, ReadError> {
    let creator = root.attr("Creator").map(str::to_string);
    if let Some(creator) = &creator {
        log::info!("Live version: {}", creator);
    }

    let live_set = root.child_at(0).ok_or(ReadError::NoDrumRack)?;
    let tempo = read_tempo(live_set);

    let tracks = root
        .resolve(&[PathSegment::ByIndex(0), PathSegment::ByTag("Tracks")])
        .ok_or(ReadError::NoDrumRack)?;
    log::info!("Found {} tracks", tracks.children.len());

    let first_track = tracks.child_at(0).ok_or(ReadError::NoDrumRack)?;
    let drum_rack = first_track
        .resolve_tags(&["DeviceChain", "DeviceChain", "Devices", "DrumGroupDevice"])
        .ok_or_else(|| {
            log::error!("No DrumGroupDevice found in first track ({})", first_track.tag);
            ReadError::NoDrumRack
        })?;

    log::info!("Drum rack detected");
    log::warn!("Pad mapping uses CHAIN ORDER, not MIDI notes (chain 0 -> pad 0, chain 1 -> pad 1, ...)");

    let pads = read_pads(drum_rack);

    let sequence_tracks: Vec<SequenceTrack> = tracks
        .children
        .iter()
        .skip(1)
        .take(MAX_TRACKS)
        .filter(|track| track.tag == "MidiTrack")
        .enumerate()
        .map(|(position, track)| read_sequence_track(position, track))
        .collect();

    log::info!(
        "Extracted {} drum pads and {} MIDI tracks",
        pads.len(),
        sequence_tracks.len()
    );

    Ok(Project {
        tempo,
        creator,
        pads,
        tracks: sequence_tracks,
    })
}

/// Tempo from the main track (Live 12) or master track (Live 10/11), else 120
pub fn read_tempo(live_set: &Node) -> f64 {
    let tempo = live_set
        .child("MainTrack")
        .or_else(|| live_set.child("MasterTrack"))
        .and_then(|track| track.resolve_tags(&["DeviceChain", "Mixer", "Tempo", "Manual"]))
        .and_then(Node::parse_value::<f64>);

    match tempo {
        Some(bpm) if bpm.is_finite() && bpm > 0.0 => {
            log::info!("Found tempo: {} BPM", bpm);
            bpm
        }
        Some(bpm) => {
            log::warn!("Invalid tempo value {}, using {} BPM", bpm, DEFAULT_TEMPO);
            DEFAULT_TEMPO
        }
        None => {
            log::warn!("Could not find tempo, using {} BPM", DEFAULT_TEMPO);
            DEFAULT_TEMPO
        }
    }
}

/// Up to 16 branches in chain order; never sorted by receiving note
fn read_pads(drum_rack: &Node) -> Vec<DrumPad> {
    let Some(branches) = drum_rack.child("Branches") else {
        log::warn!("DrumGroupDevice has no Branches element");
        return Vec::new();
    };

    branches
        .children
        .iter()
        .take(MAX_PADS)
        .enumerate()
        .map(|(index, branch)| read_branch(index, branch))
        .collect()
}

fn read_branch(index: usize, branch: &Node) -> DrumPad {
    let info = branch.child("BranchInfo");

    let receiving_note = info
        .and_then(|i| i.child("ReceivingNote"))
        .and_then(Node::parse_value::<i64>)
        .and_then(|note| u8::try_from(note).ok())
        .filter(|note| *note <= 127);

    let choke_group = info
        .and_then(|i| i.child("ChokeGroup"))
        .and_then(Node::parse_value::<i64>)
        .map(map_choke_group)
        .unwrap_or(0);

    let name = branch
        .child("Name")
        .and_then(|n| n.value().or_else(|| n.child("EffectiveName").and_then(Node::value)))
        .unwrap_or_default()
        .to_string();

    let simpler = find_simpler(branch);
    let sample = simpler.and_then(read_sample);
    if simpler.is_some() && sample.is_none() {
        log::warn!("  Pad {}: sample extraction failed, creating empty pad", index);
    }

    let pad = DrumPad {
        index,
        name,
        is_empty: sample.is_none(),
        sample,
        receiving_note,
        choke_group,
        branch_id: branch.attr("Id").and_then(|id| id.trim().parse().ok()),
    };

    log::info!(
        "  Chain {} -> Pad {}: MIDI {:?}, Choke: {}, Has Simpler: {}",
        index,
        pad.index,
        pad.receiving_note,
        choke_label(pad.choke_group),
        !pad.is_empty
    );

    pad
}

/// Simpler inside the branch chain (Live 12.3 wraps devices in MidiToAudioDeviceChain)
fn find_simpler(branch: &Node) -> Option<&Node> {
    let chain = branch.child("DeviceChain")?;
    chain
        .resolve_tags(&["MidiToAudioDeviceChain", "Devices"])
        .or_else(|| chain.child("Devices"))?
        .child("OriginalSimpler")
}

fn read_sequence_track(position: usize, track: &Node) -> SequenceTrack {
    let routing_target = track
        .find_descendant("MidiOutputRouting")
        .and_then(|r| r.child("Target"))
        .and_then(Node::value)
        .map(str::to_string);

    let routing = match &routing_target {
        Some(target) => routing::classify(target),
        None => {
            log::debug!("  No routing target found, defaulting to Pads mode");
            Default::default()
        }
    };

    let name = track
        .resolve_tags(&["Name", "EffectiveName"])
        .and_then(Node::value)
        .unwrap_or_default()
        .to_string();

    log::info!(
        "Track {} '{}': {} mode ({})",
        position,
        name,
        routing.mode_name(),
        routing_target.as_deref().unwrap_or("no routing")
    );

    SequenceTrack {
        position,
        name,
        routing_target,
        routing,
        clips: read_clip_slots(track),
    }
}

fn choke_label(group: u8) -> &'static str {
    match group {
        1 => "A",
        2 => "B",
        3 => "C",
        4 => "D",
        _ => "X (none)",
    }
}
