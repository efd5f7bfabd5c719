// Rackbox command line
// Converts one live set into a preset directory

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rackbox_lib::groove::TimingMode;
use rackbox_lib::pipeline::{convert, ConvertOptions, TraceWriter};

#[derive(Parser, Debug)]
#[command(name = "rackbox")]
#[command(about = "Convert a drum rack live set into a 16-pad sampler preset")]
#[command(long_about = "Converts a drum rack live set into a 16-pad sampler preset.\n\n\
    Track 1 must hold a Drum Rack with up to 16 Simplers.\n\
    Tracks 2-17 may hold MIDI clips; clip slots 1-4 become sequence layers A-D.")]
struct Args {
    /// Live set to convert (.als, gzip or plain XML)
    #[arg(short, long)]
    input: PathBuf,

    /// Preset directory to create
    #[arg(short, long)]
    output: PathBuf,

    /// Don't copy samples into the preset directory
    #[arg(short, long)]
    manual: bool,

    /// Keep raw note timing instead of snapping to an inferred grid
    #[arg(short, long)]
    unquantised: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Append the run's diagnostics to this JSONL file
    #[arg(long)]
    trace: Option<PathBuf>,

    /// JSON options file; command line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut options = match &args.config {
        Some(path) => ConvertOptions::from_json_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => ConvertOptions::default(),
    };
    if args.manual {
        options.copy_samples = false;
    }
    if args.unquantised {
        options.timing = TimingMode::Unquantised;
    }

    if !args.input.exists() {
        anyhow::bail!("Live set not found: {}", args.input.display());
    }

    log::info!("=== Drum rack conversion ===");
    let report = convert(&args.input, &args.output, &options)
        .with_context(|| format!("Conversion of {} failed", args.input.display()))?;

    if let Some(path) = args.trace {
        let writer = TraceWriter::new(path);
        writer
            .append(report.trace.entries())
            .with_context(|| format!("Failed to write trace to {}", writer.path().display()))?;
    }

    for failure in &report.asset_failures {
        log::warn!("Sample not copied: {} ({})", failure.path, failure.reason);
    }

    log::info!(
        "=== Conversion complete: {} sample pads, {} sequence events ===",
        report.counts.sample_pads,
        report.counts.events
    );
    log::info!("Output saved to: {}", args.output.display());

    Ok(())
}
