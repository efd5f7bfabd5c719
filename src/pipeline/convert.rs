// Conversion driver
// Reads the live set, builds pads and sequences, assembles and writes the preset

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::groove::TimingMode;
use crate::preset::{assemble, build_pads, build_sequences, PadKind};
use crate::project::{layer_letter, read_project, Project, ReadError};
use crate::sampler::{SampleInspector, WavInspector};
use crate::tree::{read_document, write_document, Node, TreeError};

use super::assets::{copy_assets, AssetFailure, AssetMaterializer, FsMaterializer};
use super::options::ConvertOptions;
use super::trace::{Stage, Trace};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Could not load project: {0}")]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-memory result of a conversion, before anything touches the output directory
#[derive(Debug, Clone)]
pub struct PresetBuild {
    pub document: Node,

    /// Sample paths as referenced by the live set
    pub assets: Vec<String>,

    pub trace: Trace,

    pub counts: ConversionCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionCounts {
    pub pads: usize,
    pub sample_pads: usize,
    pub tracks: usize,
    pub sequence_cells: usize,
    pub events: usize,
    pub assets: usize,
}

/// Outcome of `convert`
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub preset_path: PathBuf,
    pub tempo: f64,
    pub counts: ConversionCounts,
    pub copied: Vec<PathBuf>,
    pub asset_failures: Vec<AssetFailure>,

    /// Set when the output directory could not be created
    pub output_dir_error: Option<String>,

    pub trace: Trace,
}

/// Build the preset document for an already-read project
pub fn build_preset(project: &Project, inspector: &dyn SampleInspector, options: &ConvertOptions) -> PresetBuild {
    let mut trace = Trace::new();

    trace
        .info(
            Stage::Read,
            format!(
                "Read {} pads and {} tracks at {} BPM",
                project.pads.len(),
                project.tracks.len(),
                project.tempo
            ),
        )
        .data = Some(serde_json::json!({
        "creator": project.creator,
        "tempo": project.tempo,
    }));

    log::info!("Building pads...");
    let pads = build_pads(&project.pads, project.tempo, inspector);
    for cell in &pads.cells {
        if let Some(plan) = &cell.plan {
            trace
                .info(Stage::Pads, format!("Pad {}: {}", cell.index, cell.filename))
                .data = serde_json::to_value(plan).ok();
        }
    }

    if options.timing == TimingMode::Unquantised {
        log::info!("Unquantised mode: keeping raw note timing");
    }

    log::info!("Building sequences...");
    let sequences = build_sequences(&project.tracks, &project.pads, options.timing, &options.inference);
    for cell in &sequences {
        let Some(timing) = &cell.timing else {
            continue;
        };

        let message = format!(
            "Track {} layer {}: {} events",
            cell.track_position,
            layer_letter(cell.sublayer),
            cell.events.len()
        );
        let entry = if timing.mixed {
            trace.warn(Stage::Sequences, format!("{} (mixed straight and triplet timing)", message))
        } else {
            trace.info(Stage::Sequences, message)
        };
        entry.data = serde_json::to_value(timing).ok();
    }

    let document = assemble(&pads.cells, &sequences, project.tempo);

    let counts = ConversionCounts {
        pads: pads.cells.len(),
        sample_pads: pads.cells.iter().filter(|c| c.kind == PadKind::Sample).count(),
        tracks: project.tracks.len(),
        sequence_cells: sequences.len(),
        events: sequences.iter().map(|c| c.events.len()).sum(),
        assets: pads.assets.len(),
    };
    trace.info(Stage::Assemble, "Assembled preset").data = serde_json::to_value(counts).ok();

    PresetBuild {
        document,
        assets: pads.assets,
        trace,
        counts,
    }
}

/// Convert a live set file into a preset directory
pub fn convert(project_path: &Path, output_dir: &Path, options: &ConvertOptions) -> Result<ConversionReport, ConvertError> {
    let inspector = match project_path.parent() {
        Some(dir) => WavInspector::with_base_dir(dir),
        None => WavInspector::new(),
    };
    convert_with(project_path, output_dir, options, &inspector, &FsMaterializer)
}

/// `convert` with explicit collaborators for sample headers and asset copying
pub fn convert_with(
    project_path: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
    inspector: &dyn SampleInspector,
    materializer: &dyn AssetMaterializer,
) -> Result<ConversionReport, ConvertError> {
    log::info!("Reading {}", project_path.display());
    let root = read_document(project_path)?;
    let project = read_project(&root)?;

    let PresetBuild {
        document,
        assets,
        mut trace,
        counts,
    } = build_preset(&project, inspector, options);

    let output_dir_error = match fs::create_dir_all(output_dir) {
        Ok(()) => None,
        Err(e) => {
            log::warn!("Could not create output directory {}: {}", output_dir.display(), e);
            trace.warn(Stage::Write, format!("Could not create output directory: {}", e));
            Some(e.to_string())
        }
    };

    let (copied, asset_failures) = if options.copy_samples {
        copy_assets(&assets, project_path.parent(), output_dir, materializer, &mut trace)
    } else {
        log::info!("Manual mode: skipping sample copy ({} files referenced)", assets.len());
        (Vec::new(), Vec::new())
    };

    let preset_path = output_dir.join(&options.preset_file_name);
    fs::write(&preset_path, write_document(&document)?)?;
    log::info!("Preset written to {}", preset_path.display());
    trace.info(Stage::Write, format!("Wrote {}", preset_path.display()));

    Ok(ConversionReport {
        preset_path,
        tempo: project.tempo,
        counts,
        copied,
        asset_failures,
        output_dir_error,
        trace,
    })
}
