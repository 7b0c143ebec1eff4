// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod audio;
mod config;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};

use tape_app::{init_logging, ConfigFile};
use tape_core::{Confidence, DynResult};
use tape_decode_log::{resolve_file_name, write_text_dump, BitLogger, RunHeader};
use tape_pe::{Decoded, PeDecoder, TracingProgress};

use config::ReaderConfig;

const PKG_DESCRIPTION: &str = concat!(
    env!("CARGO_PKG_NAME"),
    " - 1600 bpi phase-encoded tape decoder"
);

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Sampled tape recording (WAV)
    #[arg(value_name = "INPUT", required_unless_present = "print_config")]
    input: Option<PathBuf>,
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Transport speed in inches per second
    #[arg(short = 's', long = "speed", value_name = "IPS")]
    speed: Option<f64>,
    /// Recording density in bits per inch
    #[arg(short = 'd', long = "density", value_name = "BPI")]
    density: Option<f64>,
    /// Output directory (must exist)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output: Option<PathBuf>,
    /// Debug logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
    /// Skip writing the corrected waveform
    #[arg(long = "no-waveform")]
    no_waveform: bool,
}

impl Cli {
    /// Command line values take precedence over the config file.
    fn apply(&self, cfg: &mut ReaderConfig) {
        if let Some(speed) = self.speed {
            cfg.tape.speed_ips = speed;
        }
        if let Some(density) = self.density {
            cfg.tape.density_bpi = density;
        }
        if let Some(ref output) = self.output {
            cfg.output.dir = output.to_string_lossy().to_string();
        }
        if self.no_waveform {
            cfg.output.waveform = false;
        }
    }
}

fn check_output_dir(dir: &Path) -> Result<(), String> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(format!(
            "{} is not a directory (make sure {} is a directory)",
            dir.display(),
            dir.display()
        )),
        Err(e) => Err(format!(
            "{}: {} (make sure {} is a directory)",
            dir.display(),
            e,
            dir.display()
        )),
    }
}

fn input_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "input".to_string())
}

fn run_header(input: &Path, decoded: &Decoded) -> RunHeader {
    RunHeader {
        input: input.display().to_string(),
        sample_rate: decoded.geometry.sample_rate(),
        samples: decoded.waveform.len(),
        samples_per_baud: decoded.geometry.samples_per_baud(),
        carrier_hz: decoded.geometry.carrier_hz(),
        bits: decoded.bits.len(),
        known: decoded.count(Confidence::Known),
        unknown: decoded.count(Confidence::Unknown),
        nothing: decoded.count(Confidence::Nothing),
    }
}

fn write_outputs(cfg: &ReaderConfig, input: &Path, decoded: &Decoded) -> DynResult<()> {
    let output_dir = PathBuf::from(cfg.output.dir.trim());
    let name = input_name(input);

    if cfg.output.waveform {
        let path = output_dir.join(resolve_file_name(&cfg.output.waveform_file, &name));
        audio::write_waveform(&path, &decoded.waveform)?;
    }

    if let Some(mut logger) = BitLogger::from_config(&cfg.decode_logs, &output_dir, &name)? {
        logger.log_header(&run_header(input, decoded));
        logger.log_bits(&decoded.bits);
        let path = logger.path().to_path_buf();
        match logger.finish() {
            Ok(records) => info!("wrote {} bit log records to {}", records, path.display()),
            Err(e) => warn!("{}", e),
        }
    }

    if !cfg.output.text_file.trim().is_empty() {
        let path = output_dir.join(resolve_file_name(&cfg.output.text_file, &name));
        match write_text_dump(&path, &decoded.bits) {
            Ok(()) => info!("wrote text dump to {}", path.display()),
            Err(e) => warn!("{}", e),
        }
    }
    Ok(())
}

fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ReaderConfig::example_combined_toml());
        return Ok(());
    }
    let input = cli.input.clone().ok_or("missing INPUT")?;

    let (mut cfg, config_path) = ReaderConfig::load(cli.config.as_deref())?;
    cli.apply(&mut cfg);
    cfg.validate()
        .map_err(|e| format!("Invalid reader configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref(), cli.verbose);

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let decoder = PeDecoder::new(cfg.tape, cfg.decoder)?;
    let buffer = audio::read_wav(&input)?;
    check_output_dir(Path::new(cfg.output.dir.trim()))?;

    let decoded = decoder.decode_with_progress(buffer, &mut TracingProgress)?;
    if !decoded.ambiguities.is_empty() {
        info!(
            "{} ambiguous intervals (run with --verbose for details)",
            decoded.ambiguities.len()
        );
    }

    write_outputs(&cfg, &input, &decoded)?;
    Ok(())
}
