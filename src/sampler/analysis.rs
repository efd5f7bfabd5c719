// Sample analysis - Chooses playback mode, looping and envelope for one pad
// Stretch metadata and tempo decide between clip playback and plain sampler playback

use serde::{Deserialize, Serialize};

use crate::project::{Envelope, SampleRef};

use super::inspect::SampleInfo;

/// Beats at or above which a looping sample plays as a clip
pub const CLIP_MODE_MIN_BEATS: u32 = 8;

/// Envelope used by every clip-mode pad
pub const CLIP_ENVELOPE: Envelope = Envelope {
    attack: 0.0,
    decay: 1000.0,
    sustain: 1000.0,
    release: 200.0,
};

/// How the destination cell plays its sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellMode {
    #[default]
    Sampler,

    /// Tempo-synced clip playback for long loops
    Clip,
}

impl CellMode {
    /// Destination `cellmode` code
    pub fn code(&self) -> u8 {
        match self {
            CellMode::Sampler => 0,
            CellMode::Clip => 1,
        }
    }
}

/// Everything the pad cell needs to know about playback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackPlan {
    pub cell_mode: CellMode,
    pub loop_enabled: bool,
    pub envelope: Envelope,

    /// Destination `samtrigtype` code (gate 0, trigger 1, toggle 2)
    pub trigger_code: u8,

    pub sample_start: f64,

    /// Frames in the file, 0 when the header could not be read
    pub sample_length: u64,

    pub loop_start: f64,
    pub loop_end: f64,
    pub beat_count: u32,
}

/// Decide how a pad's sample should play
///
/// Decision table, first match wins:
/// - warped, 8+ beats: clip mode, loop on
/// - warped, fewer beats: sampler mode, loop on
/// - stretch metadata but not warped: sampler mode, loop off
/// - no metadata, manual loop: loop length in beats decides clip vs sampler, loop on
/// - otherwise: sampler mode, loop off
pub fn analyze(sample: &SampleRef, tempo: f64, info: Option<SampleInfo>) -> PlaybackPlan {
    let (cell_mode, loop_enabled, beat_count) = match sample.warp {
        Some(warp) => {
            let beats = warp
                .beat_count
                .filter(|beats| *beats > 0)
                .unwrap_or_else(|| {
                    warp.sample_duration_seconds
                        .map(|seconds| beats_for(seconds, tempo))
                        .unwrap_or(0)
                });

            match (warp.is_warped, beats >= CLIP_MODE_MIN_BEATS) {
                (true, true) => {
                    log::info!("    -> Warped sample: {} beats ({} bars), clip mode", beats, beats as f64 / 4.0);
                    (CellMode::Clip, true, beats)
                }
                (true, false) => {
                    log::info!("    -> Warped sample: {} beats, sampler mode with loop", beats);
                    (CellMode::Sampler, true, beats)
                }
                (false, _) => {
                    log::debug!("    Stretch metadata present but not warped, loop off");
                    (CellMode::Sampler, false, beats)
                }
            }
        }
        None if sample.loop_on => {
            let rate = info
                .map(|i| i.sample_rate as f64)
                .filter(|rate| *rate > 0.0)
                .or(sample.source_sample_rate);

            match rate {
                Some(rate) => {
                    let loop_seconds = (sample.effective_loop_end() - sample.loop_start) / rate;
                    let beats = beats_for(loop_seconds, tempo);
                    if beats >= CLIP_MODE_MIN_BEATS {
                        log::info!("    -> Looped sample: {:.1}s = {} beats, clip mode", loop_seconds, beats);
                        (CellMode::Clip, true, beats)
                    } else {
                        log::info!("    -> Short loop: {:.1}s = {} beats, sampler mode with loop", loop_seconds, beats);
                        (CellMode::Sampler, true, beats)
                    }
                }
                None => {
                    log::debug!("    Loop on but sample rate unknown, sampler mode with loop");
                    (CellMode::Sampler, true, 0)
                }
            }
        }
        None => (CellMode::Sampler, false, 0),
    };

    PlaybackPlan {
        cell_mode,
        loop_enabled,
        envelope: match cell_mode {
            CellMode::Clip => CLIP_ENVELOPE,
            CellMode::Sampler => sample.envelope,
        },
        trigger_code: sample.trigger_mode.code(),
        sample_start: sample.sample_start,
        sample_length: info.map(|i| i.length_samples).unwrap_or(0),
        loop_start: sample.loop_start,
        loop_end: sample.effective_loop_end(),
        beat_count,
    }
}

/// Whole beats spanned by a duration at a tempo, never negative
fn beats_for(seconds: f64, tempo: f64) -> u32 {
    let beats = (seconds * tempo / 60.0).round();
    if beats.is_finite() && beats > 0.0 {
        beats as u32
    } else {
        0
    }
}
