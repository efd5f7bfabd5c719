// Sampler device extraction
// Reads sample files, playback region, loop, envelope, trigger and stretch metadata from a Simpler

use crate::tree::Node;

use super::models::{Envelope, SampleFile, SampleRef, TriggerMode, WarpInfo};

const DEFAULT_ROOT_KEY: u8 = 60;
const DEFAULT_SAMPLE_END: f64 = 44100.0;
const DEFAULT_SOURCE_RATE: f64 = 48000.0;

/// Extract sample parameters from a sampler device
///
/// Returns `None` when the device has no sample map or no resolvable file,
/// in which case the pad is treated as empty.
pub fn read_sample(device: &Node) -> Option<SampleRef> {
    let player = device.child("Player");

    let Some(sample_parts) = player
        .and_then(|p| p.resolve_tags(&["MultiSampleMap", "SampleParts"]))
        .or_else(|| device.resolve_tags(&["MultiSampleMap", "SampleParts"]))
    else {
        log::warn!("  Could not find sample map in device");
        return None;
    };

    let parts: Vec<&Node> = sample_parts.children_named("MultiSamplePart").collect();
    let first_part = *parts.first()?;

    let files: Vec<SampleFile> = parts
        .iter()
        .filter_map(|part| {
            let path = read_file_path(part)?;
            Some(SampleFile {
                path,
                root_key: read_key(part, &["RootKey"]).unwrap_or(DEFAULT_ROOT_KEY),
                key_min: read_key(part, &["KeyRange", "Min"]).unwrap_or(0),
                key_max: read_key(part, &["KeyRange", "Max"]).unwrap_or(127),
            })
        })
        .collect();

    if files.is_empty() {
        log::warn!("  No samples found in device");
        return None;
    }

    let sustain_loop = first_part.child("SustainLoop");
    let loop_value = |tag: &str, loop_tag: &str| {
        first_part
            .child(tag)
            .or_else(|| sustain_loop.and_then(|l| l.child(loop_tag)))
            .and_then(Node::parse_value::<f64>)
    };

    let loop_on = match first_part.child("LoopOn").and_then(Node::value) {
        Some(flag) => flag == "1" || flag.eq_ignore_ascii_case("true"),
        None => sustain_loop
            .and_then(|l| l.child("Mode"))
            .and_then(Node::parse_value::<i64>)
            .is_some_and(|mode| mode > 0),
    };

    let sample = SampleRef {
        sample_start: read_f64(first_part, "SampleStart").unwrap_or(0.0),
        sample_end: read_f64(first_part, "SampleEnd").unwrap_or(DEFAULT_SAMPLE_END),
        source_sample_rate: first_part
            .resolve_tags(&["SampleRef", "DefaultSampleRate"])
            .and_then(Node::parse_value::<f64>)
            .filter(|rate| *rate > 0.0),
        loop_on,
        loop_start: loop_value("LoopStart", "Start").unwrap_or(0.0),
        loop_end: loop_value("LoopEnd", "End"),
        envelope: read_envelope(device),
        trigger_mode: player
            .and_then(|p| p.child("TriggerMode"))
            .and_then(Node::parse_value::<i64>)
            .map(TriggerMode::from_value)
            .unwrap_or_default(),
        warp: read_warp(first_part),
        files,
    };

    log::info!(
        "  Sample: {} ({} file{}), start {} end {}, loop {}",
        sample.files[0].file_name(),
        sample.files.len(),
        if sample.files.len() == 1 { "" } else { "s" },
        sample.sample_start,
        sample.sample_end,
        if sample.loop_on { "on" } else { "off" },
    );

    Some(sample)
}

/// Absolute path, then relative path, then the legacy name + path-hint form
fn read_file_path(part: &Node) -> Option<String> {
    let file_ref = part.resolve_tags(&["SampleRef", "FileRef"])?;

    for tag in ["Path", "RelativePath"] {
        if let Some(path) = file_ref.child(tag).and_then(Node::value).filter(|p| !p.is_empty()) {
            return Some(path.to_string());
        }
    }

    let name = file_ref
        .child("Name")
        .and_then(Node::value)
        .filter(|n| !n.is_empty())?;

    let dirs: Vec<&str> = file_ref
        .child("PathHint")
        .map(|hint| {
            hint.children_named("RelativePathElement")
                .filter_map(|element| element.attr("Dir"))
                .collect()
        })
        .unwrap_or_default();

    if dirs.is_empty() {
        Some(name.to_string())
    } else {
        Some(format!("/{}/{}", dirs.join("/"), name))
    }
}

fn read_key(part: &Node, path: &[&str]) -> Option<u8> {
    part.resolve_tags(path)
        .and_then(Node::parse_value::<i64>)
        .and_then(|key| u8::try_from(key).ok())
        .filter(|key| *key <= 127)
}

fn read_f64(node: &Node, tag: &str) -> Option<f64> {
    node.child(tag).and_then(Node::parse_value::<f64>)
}

/// Volume envelope; each stage falls back to its own default
fn read_envelope(device: &Node) -> Envelope {
    let defaults = Envelope::default();
    let Some(envelope) = device.resolve_tags(&["VolumeAndPan", "Envelope"]) else {
        log::debug!("  No volume envelope found, using defaults");
        return defaults;
    };

    let manual = |tag: &str, default: f64| {
        envelope
            .resolve_tags(&[tag, "Manual"])
            .and_then(Node::parse_value::<f64>)
            .unwrap_or(default)
    };

    Envelope {
        attack: manual("AttackTime", defaults.attack),
        decay: manual("DecayTime", defaults.decay),
        sustain: manual("SustainLevel", defaults.sustain),
        release: manual("ReleaseTime", defaults.release),
    }
}

/// Stretch metadata from the first sample part, if the part carries any
fn read_warp(part: &Node) -> Option<WarpInfo> {
    let props = part.child("SampleWarpProperties")?;

    let warp_mode = props
        .child("WarpMode")
        .and_then(Node::parse_value::<i64>)
        .unwrap_or(0);
    let warped_flag = props
        .child("IsWarped")
        .and_then(Node::value)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));

    let beat_count = props
        .child("LoopLength")
        .or_else(|| part.child("LoopLength"))
        .and_then(Node::parse_value::<f64>)
        .filter(|beats| *beats >= 1.0)
        .map(|beats| beats.trunc() as u32);

    let sample_duration_seconds = part.child("SampleRef").and_then(|sample_ref| {
        let samples = sample_ref.child("DefaultDuration")?.parse_value::<f64>()?;
        let rate = sample_ref
            .child("DefaultSampleRate")?
            .parse_value::<f64>()
            .unwrap_or(DEFAULT_SOURCE_RATE);
        (samples > 0.0 && rate > 0.0).then(|| samples / rate)
    });

    if let Some(seconds) = sample_duration_seconds {
        log::debug!("  Sample duration: {:.2}s", seconds);
    }

    Some(WarpInfo {
        is_warped: warp_mode > 0 || warped_flag,
        beat_count,
        sample_duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_document;

    fn simpler(body: &str) -> Node {
        parse_document(&format!("<OriginalSimpler>{}</OriginalSimpler>", body)).unwrap()
    }

    const TWO_PART_SIMPLER: &str = r#"
        <Player>
            <TriggerMode Value="1"/>
            <MultiSampleMap><SampleParts>
                <MultiSamplePart Id="0">
                    <RootKey Value="48"/>
                    <KeyRange><Min Value="0"/><Max Value="59"/></KeyRange>
                    <SampleStart Value="100"/>
                    <SampleEnd Value="96000"/>
                    <SustainLoop><Start Value="0"/><End Value="96000"/><Mode Value="1"/></SustainLoop>
                    <SampleRef>
                        <FileRef><Path Value="/Samples/low.wav"/></FileRef>
                        <DefaultDuration Value="192000"/>
                        <DefaultSampleRate Value="48000"/>
                    </SampleRef>
                    <SampleWarpProperties><WarpMode Value="0"/><IsWarped Value="true"/></SampleWarpProperties>
                </MultiSamplePart>
                <MultiSamplePart Id="1">
                    <KeyRange><Min Value="60"/><Max Value="127"/></KeyRange>
                    <SampleRef><FileRef><RelativePath Value="Samples/high.wav"/></FileRef></SampleRef>
                </MultiSamplePart>
            </SampleParts></MultiSampleMap>
        </Player>
        <VolumeAndPan><Envelope>
            <AttackTime><Manual Value="5"/></AttackTime>
            <ReleaseTime><Manual Value="80"/></ReleaseTime>
        </Envelope></VolumeAndPan>"#;

    #[test]
    fn test_read_multi_sample_simpler() {
        let sample = read_sample(&simpler(TWO_PART_SIMPLER)).unwrap();

        assert_eq!(sample.files.len(), 2);
        assert!(sample.is_multi_sample());
        assert_eq!(sample.files[0].path, "/Samples/low.wav");
        assert_eq!(sample.files[0].root_key, 48);
        assert_eq!(sample.files[0].key_max, 59);
        assert_eq!(sample.files[1].path, "Samples/high.wav");
        assert_eq!(sample.files[1].root_key, 60);
        assert_eq!(sample.files[1].key_min, 60);

        assert_eq!(sample.sample_start, 100.0);
        assert_eq!(sample.sample_end, 96000.0);
        assert_eq!(sample.source_sample_rate, Some(48000.0));
        assert!(sample.loop_on);
        assert_eq!(sample.effective_loop_end(), 96000.0);
        assert_eq!(sample.trigger_mode, TriggerMode::Trigger);
    }

    #[test]
    fn test_envelope_partial_defaults() {
        let sample = read_sample(&simpler(TWO_PART_SIMPLER)).unwrap();
        assert_eq!(sample.envelope.attack, 5.0);
        assert_eq!(sample.envelope.decay, 300.0);
        assert_eq!(sample.envelope.sustain, 1.0);
        assert_eq!(sample.envelope.release, 80.0);
    }

    #[test]
    fn test_warp_metadata() {
        let sample = read_sample(&simpler(TWO_PART_SIMPLER)).unwrap();
        let warp = sample.warp.unwrap();
        assert!(warp.is_warped);
        assert_eq!(warp.beat_count, None);
        assert_eq!(warp.sample_duration_seconds, Some(4.0));
    }

    #[test]
    fn test_legacy_path_hint() {
        let device = simpler(
            r#"<Player><MultiSampleMap><SampleParts><MultiSamplePart>
                <SampleRef><FileRef>
                    <Name Value="clap.wav"/>
                    <PathHint>
                        <RelativePathElement Dir="Users"/>
                        <RelativePathElement Dir="kits"/>
                    </PathHint>
                </FileRef></SampleRef>
            </MultiSamplePart></SampleParts></MultiSampleMap></Player>"#,
        );

        let sample = read_sample(&device).unwrap();
        assert_eq!(sample.files[0].path, "/Users/kits/clap.wav");
        assert!(!sample.loop_on);
        assert_eq!(sample.sample_end, 44100.0);
        assert_eq!(sample.envelope, Envelope::default());
        assert!(sample.warp.is_none());
    }

    #[test]
    fn test_no_file_means_no_sample() {
        let device = simpler(
            r#"<Player><MultiSampleMap><SampleParts><MultiSamplePart>
                <SampleRef><FileRef/></SampleRef>
            </MultiSamplePart></SampleParts></MultiSampleMap></Player>"#,
        );
        assert!(read_sample(&device).is_none());
        assert!(read_sample(&simpler("<Player/>")).is_none());
    }
}
