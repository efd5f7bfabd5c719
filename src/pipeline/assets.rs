// Sample asset copying
// Each failure is recorded and the remaining files still copy

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sampler::resolve_sample_path;

use super::trace::{Stage, Trace};

/// Places a referenced sample inside the output directory
pub trait AssetMaterializer {
    fn materialize(&self, source: &Path, dest_dir: &Path) -> io::Result<PathBuf>;
}

/// Plain filesystem copy under the source's file name
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMaterializer;

impl AssetMaterializer for FsMaterializer {
    fn materialize(&self, source: &Path, dest_dir: &Path) -> io::Result<PathBuf> {
        let name = source
            .to_str()
            .and_then(|s| s.rsplit(['/', '\\']).next())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "sample path has no file name"))?;

        let dest = dest_dir.join(name);
        fs::copy(source, &dest)?;
        Ok(dest)
    }
}

/// A sample that could not be copied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFailure {
    pub path: String,
    pub reason: String,
}

/// Copy every referenced sample, resolving relative paths against the project directory
pub fn copy_assets(
    assets: &[String],
    base_dir: Option<&Path>,
    dest_dir: &Path,
    materializer: &dyn AssetMaterializer,
    trace: &mut Trace,
) -> (Vec<PathBuf>, Vec<AssetFailure>) {
    let mut copied = Vec::new();
    let mut failures = Vec::new();

    log::info!("Processing {} sample files...", assets.len());

    for asset in assets {
        let source = resolve_sample_path(base_dir, asset);
        match materializer.materialize(&source, dest_dir) {
            Ok(dest) => {
                log::info!("  Copied: {}", dest.display());
                copied.push(dest);
            }
            Err(e) => {
                log::warn!("  Could not copy {}: {}", asset, e);
                trace.warn(Stage::Write, format!("Could not copy {}: {}", asset, e));
                failures.push(AssetFailure {
                    path: asset.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (copied, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copies_and_collects_failures() {
        let project = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir(project.path().join("Samples")).unwrap();
        fs::write(project.path().join("Samples").join("kick.wav"), b"RIFF").unwrap();
        let absolute = project.path().join("snare.wav");
        fs::write(&absolute, b"RIFF").unwrap();

        let assets = vec![
            "Samples/kick.wav".to_string(),
            "/missing/clap.wav".to_string(),
            absolute.to_string_lossy().into_owned(),
        ];

        let mut trace = Trace::new();
        let (copied, failures) = copy_assets(&assets, Some(project.path()), out.path(), &FsMaterializer, &mut trace);

        assert_eq!(copied.len(), 2);
        assert!(out.path().join("kick.wav").exists());
        assert!(out.path().join("snare.wav").exists());

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "/missing/clap.wav");
        assert_eq!(trace.warnings().count(), 1);
    }

    #[test]
    fn test_materializer_needs_file_name() {
        let out = TempDir::new().unwrap();
        let err = FsMaterializer.materialize(Path::new("/"), out.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
