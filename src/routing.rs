// Routing classification - Decides Pads / Keys / MIDI mode from a track's output target
// Never fails: anything unrecognised plays the whole rack (Pads)

use crate::project::{DrumPad, KeysTarget, Routing, MAX_PADS};

const DEVICE_INPUT: &str = "/DeviceIn.";
const EXTERNAL_MARKERS: [&str; 2] = ["/External.Dev:", "/External/"];

/// Classify a MIDI output routing target string
///
/// Patterns:
/// - `MidiOut/Track.12/DeviceIn.0.B40` - Keys, branch 40
/// - `MidiOut/Track.12/DeviceIn.3.1` - Keys, chain 3 (no branch marker)
/// - `MidiOut/External.Dev:Synth/2` - MIDI, channel 2
/// - `MidiOut/Track.12/TrackIn`, `MidiOut/None` - Pads
pub fn classify(target: &str) -> Routing {
    if let Some(at) = target.find(DEVICE_INPUT) {
        let device_part = &target[at + DEVICE_INPUT.len()..];
        let device_part = device_part.split('/').next().unwrap_or_default();

        if let Some(branch_id) = device_part.split('.').find_map(parse_branch_marker) {
            return Routing::Keys(KeysTarget::Branch(branch_id));
        }

        return match device_part.split('.').next().and_then(|s| s.parse::<usize>().ok()) {
            Some(chain) => Routing::Keys(KeysTarget::Chain(chain)),
            None => {
                log::debug!("  Unparseable device input in '{}', defaulting to Pads mode", target);
                Routing::Pads
            }
        };
    }

    if EXTERNAL_MARKERS.iter().any(|marker| target.contains(marker)) {
        let channel = target
            .rsplit('/')
            .next()
            .and_then(|last| last.parse::<u8>().ok())
            .map(|ch| ch.min(15))
            .unwrap_or(0);
        return Routing::Midi { channel };
    }

    Routing::Pads
}

/// `B<digits>` names a drum branch by id
fn parse_branch_marker(segment: &str) -> Option<u32> {
    let digits = segment.strip_prefix('B')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Resolve the pad a Keys-mode track plays
///
/// Branch ids are looked up among the pads; an unknown branch, or a chain
/// index outside the grid, falls back to the track's own position.
pub fn resolve_keys_target(target: KeysTarget, track_position: usize, pads: &[DrumPad]) -> usize {
    match target {
        KeysTarget::Branch(id) => pads
            .iter()
            .find(|pad| pad.branch_id == Some(id))
            .map(|pad| pad.index)
            .unwrap_or_else(|| {
                log::warn!(
                    "  Branch id {} not found in drum rack, using sequence position {}",
                    id,
                    track_position
                );
                track_position
            }),
        KeysTarget::Chain(chain) if chain < MAX_PADS => chain,
        KeysTarget::Chain(_) => track_position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad_with_branch(index: usize, branch_id: u32) -> DrumPad {
        DrumPad {
            branch_id: Some(branch_id),
            ..DrumPad::empty(index)
        }
    }

    #[test]
    fn test_device_input_with_branch_marker() {
        assert_eq!(
            classify("MidiOut/Track.12/DeviceIn.0.B40"),
            Routing::Keys(KeysTarget::Branch(40))
        );
    }

    #[test]
    fn test_device_input_without_marker_uses_chain() {
        assert_eq!(
            classify("MidiOut/Track.12/DeviceIn.3.1"),
            Routing::Keys(KeysTarget::Chain(3))
        );
    }

    #[test]
    fn test_device_input_garbage_is_pads() {
        assert_eq!(classify("MidiOut/Track.12/DeviceIn.x.y"), Routing::Pads);
        assert_eq!(classify("MidiOut/Track.12/DeviceIn."), Routing::Pads);
    }

    #[test]
    fn test_branch_marker_requires_digits() {
        assert_eq!(parse_branch_marker("B"), None);
        assert_eq!(parse_branch_marker("B4x"), None);
        assert_eq!(parse_branch_marker("b4"), None);
        assert_eq!(parse_branch_marker("B17"), Some(17));
    }

    #[test]
    fn test_external_output_channel() {
        assert_eq!(classify("MidiOut/External.Dev:Minilogue/2"), Routing::Midi { channel: 2 });
        assert_eq!(classify("MidiOut/External/All"), Routing::Midi { channel: 0 });
        assert_eq!(classify("MidiOut/External.Dev:Synth/99"), Routing::Midi { channel: 15 });
    }

    #[test]
    fn test_everything_else_is_pads() {
        assert_eq!(classify("MidiOut/Track.12/TrackIn"), Routing::Pads);
        assert_eq!(classify("MidiOut/None"), Routing::Pads);
        assert_eq!(classify(""), Routing::Pads);
        assert_eq!(classify("\u{1F941}/DeviceIn"), Routing::Pads);
    }

    #[test]
    fn test_branch_resolution_finds_pad() {
        let pads: Vec<DrumPad> = (0..16)
            .map(|i| if i == 3 { pad_with_branch(3, 40) } else { pad_with_branch(i, 100 + i as u32) })
            .collect();

        assert_eq!(resolve_keys_target(KeysTarget::Branch(40), 7, &pads), 3);
    }

    #[test]
    fn test_branch_resolution_falls_back_to_position() {
        let pads: Vec<DrumPad> = (0..16).map(DrumPad::empty).collect();
        assert_eq!(resolve_keys_target(KeysTarget::Branch(40), 7, &pads), 7);
    }

    #[test]
    fn test_chain_resolution() {
        assert_eq!(resolve_keys_target(KeysTarget::Chain(5), 1, &[]), 5);
        assert_eq!(resolve_keys_target(KeysTarget::Chain(20), 1, &[]), 1);
    }
}
