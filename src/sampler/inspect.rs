// Sample inspection - Reads length and rate from referenced audio files
// Absence is a normal outcome; callers fall back to zero length

use std::path::{Path, PathBuf};

use hound::WavReader;
use serde::{Deserialize, Serialize};

/// Header facts about one sample file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleInfo {
    /// Length in frames (samples per channel)
    pub length_samples: u64,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl SampleInfo {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.length_samples as f64 / self.sample_rate as f64
        }
    }
}

/// Source of sample header information
pub trait SampleInspector {
    fn inspect(&self, path: &str) -> Option<SampleInfo>;
}

/// Reads WAV headers from disk
///
/// Relative paths are taken from the project's directory when one is set.
#[derive(Debug, Clone, Default)]
pub struct WavInspector {
    base_dir: Option<PathBuf>,
}

impl WavInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        WavInspector {
            base_dir: Some(base_dir.into()),
        }
    }
}

impl SampleInspector for WavInspector {
    fn inspect(&self, path: &str) -> Option<SampleInfo> {
        let resolved = resolve_sample_path(self.base_dir.as_deref(), path);

        match WavReader::open(&resolved) {
            Ok(reader) => {
                let info = SampleInfo {
                    length_samples: reader.duration() as u64,
                    sample_rate: reader.spec().sample_rate,
                };
                log::debug!(
                    "    WAV info: {} samples, {:.2}s @ {}Hz",
                    info.length_samples,
                    info.duration_secs(),
                    info.sample_rate
                );
                Some(info)
            }
            Err(e) => {
                log::debug!("    Could not read WAV header for {}: {}", resolved.display(), e);
                None
            }
        }
    }
}

/// Resolve a sample path from the live set against the project directory
pub fn resolve_sample_path(base_dir: Option<&Path>, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    match base_dir {
        Some(base) if candidate.is_relative() => base.join(candidate),
        _ => candidate.to_path_buf(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::TempDir;

    /// Write a silent 16-bit WAV with the given frame count and rate
    pub(crate) fn write_test_wav(path: &Path, frames: u32, sample_rate: u32, channels: u16) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for _ in 0..frames * channels as u32 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_inspect_reads_frames_and_rate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kick.wav");
        write_test_wav(&path, 22050, 44100, 2);

        let info = WavInspector::new().inspect(path.to_str().unwrap()).unwrap();
        assert_eq!(info.length_samples, 22050);
        assert_eq!(info.sample_rate, 44100);
        assert!((info.duration_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_relative_paths_use_base_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Samples")).unwrap();
        write_test_wav(&dir.path().join("Samples").join("hat.wav"), 480, 48000, 1);

        let inspector = WavInspector::with_base_dir(dir.path());
        let info = inspector.inspect("Samples/hat.wav").unwrap();
        assert_eq!(info.length_samples, 480);
        assert_eq!(info.sample_rate, 48000);
    }

    #[test]
    fn test_missing_or_invalid_file_is_none() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("notes.wav");
        std::fs::write(&bogus, b"not a wav").unwrap();

        let inspector = WavInspector::new();
        assert!(inspector.inspect(bogus.to_str().unwrap()).is_none());
        assert!(inspector.inspect("/definitely/not/here.wav").is_none());
    }

    #[test]
    fn test_resolve_sample_path() {
        let base = Path::new("/projects/song");
        assert_eq!(
            resolve_sample_path(Some(base), "Samples/a.wav"),
            PathBuf::from("/projects/song/Samples/a.wav")
        );
        assert_eq!(
            resolve_sample_path(Some(base), "/abs/a.wav"),
            PathBuf::from("/abs/a.wav")
        );
        assert_eq!(resolve_sample_path(None, "a.wav"), PathBuf::from("a.wav"));
    }
}
