// Pad builder - Emits the 16 pad cells of the sampler grid
// Chain order is kept as-is: drum rack chain N always lands on pad N

use serde::{Deserialize, Serialize};

use crate::project::{DrumPad, SampleRef, MAX_PADS};
use crate::sampler::{analyze, PlaybackPlan, SampleInspector};
use crate::tree::Node;

use super::cells::grid_position;
use super::params::PadParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadKind {
    Sample,

    /// Empty slot
    Template,
}

impl PadKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            PadKind::Sample => "sample",
            PadKind::Template => "samtempl",
        }
    }
}

/// A modulation routing on a pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModSource {
    /// Note pitch selects a file of a multi-sample pad
    SampleSelect { key_lo: u8, key_hi: u8, root_key: u8 },

    /// Note velocity drives gain
    Velocity,

    /// MIDI pan drives pan position
    Pan,
}

impl ModSource {
    pub fn to_node(&self) -> Node {
        match self {
            ModSource::SampleSelect {
                key_lo,
                key_hi,
                root_key,
            } => Node::new("modsource")
                .with_attr("dest", "samsel")
                .with_attr("src", "midipitch")
                .with_attr("slot", 0)
                .with_attr("amount", 100)
                .with_attr("keylo", key_lo)
                .with_attr("keyhi", key_hi)
                .with_attr("rootkey", root_key),
            ModSource::Velocity => Node::new("modsource")
                .with_attr("dest", "gaindb")
                .with_attr("src", "midivol")
                .with_attr("slot", 2)
                .with_attr("amount", 1000),
            ModSource::Pan => Node::new("modsource")
                .with_attr("dest", "panpos")
                .with_attr("src", "midipan")
                .with_attr("slot", 2)
                .with_attr("amount", 1000),
        }
    }
}

/// One output pad cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadCell {
    pub index: usize,
    pub row: u8,
    pub column: u8,

    /// `.\<basename>` for sample pads, empty for templates
    pub filename: String,

    pub kind: PadKind,
    pub params: PadParams,
    pub mod_sources: Vec<ModSource>,

    /// Analyzer decision, absent for empty slots
    pub plan: Option<PlaybackPlan>,
}

impl PadCell {
    pub fn template(index: usize) -> Self {
        let (row, column) = grid_position(index);
        PadCell {
            index,
            row,
            column,
            filename: String::new(),
            kind: PadKind::Template,
            params: PadParams::template(),
            mod_sources: Vec::new(),
            plan: None,
        }
    }

    pub fn to_node(&self) -> Node {
        let mut cell = Node::new("cell")
            .with_attr("row", self.row)
            .with_attr("column", self.column)
            .with_attr("layer", 0)
            .with_attr("filename", &self.filename)
            .with_attr("type", self.kind.type_name())
            .with_child(self.params.to_node());

        for source in &self.mod_sources {
            cell.push(source.to_node());
        }

        cell.with_child(Node::new("slices"))
    }
}

/// Pad cells plus every sample file they reference
#[derive(Debug, Clone, Default)]
pub struct PadBuild {
    /// Always `MAX_PADS` cells, in chain order
    pub cells: Vec<PadCell>,

    /// Referenced sample paths, first-seen order, no duplicates
    pub assets: Vec<String>,
}

/// Build all 16 pad cells from the drum rack
pub fn build_pads(pads: &[DrumPad], tempo: f64, inspector: &dyn SampleInspector) -> PadBuild {
    let mut build = PadBuild::default();

    for index in 0..MAX_PADS {
        let source = pads
            .iter()
            .find(|pad| pad.index == index)
            .and_then(|pad| pad.sample.as_ref().map(|sample| (pad, sample)));

        let cell = match source {
            Some((pad, sample)) => build_sample_pad(index, pad, sample, tempo, inspector, &mut build.assets),
            None => {
                log::info!("  Pad {}: Empty pad", index);
                PadCell::template(index)
            }
        };

        build.cells.push(cell);
    }

    log::info!(
        "Created {} pads ({} with samples, {} sample files)",
        build.cells.len(),
        build.cells.iter().filter(|c| c.kind == PadKind::Sample).count(),
        build.assets.len()
    );

    build
}

fn build_sample_pad(
    index: usize,
    pad: &DrumPad,
    sample: &SampleRef,
    tempo: f64,
    inspector: &dyn SampleInspector,
    assets: &mut Vec<String>,
) -> PadCell {
    let (row, column) = grid_position(index);
    let file_name = sample.primary_file().map(|f| f.file_name()).unwrap_or_default();
    log::info!("  Pad {}: {}", index, file_name);

    let info = sample.primary_file().and_then(|f| inspector.inspect(&f.path));
    let plan = analyze(sample, tempo, info);
    let multi_sample = sample.is_multi_sample();

    let mod_sources = if multi_sample {
        log::info!("    -> Multisample mode enabled ({} files)", sample.files.len());
        sample
            .files
            .iter()
            .map(|file| ModSource::SampleSelect {
                key_lo: file.key_min,
                key_hi: file.key_max,
                root_key: file.root_key,
            })
            .collect()
    } else {
        vec![ModSource::Velocity, ModSource::Pan]
    };

    let referenced = if multi_sample { sample.files.len() } else { 1 };
    for file in sample.files.iter().take(referenced) {
        if !file.path.is_empty() && !assets.contains(&file.path) {
            assets.push(file.path.clone());
        }
    }

    PadCell {
        index,
        row,
        column,
        filename: if file_name.is_empty() {
            String::new()
        } else {
            format!(".\\{}", file_name)
        },
        kind: PadKind::Sample,
        params: PadParams::from_plan(&plan, multi_sample, pad.choke_group),
        mod_sources,
        plan: Some(plan),
    }
}
