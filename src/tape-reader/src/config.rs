// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration for the tape reader.
//!
//! Loaded from the `[tape-reader]` section of `tape-rs.toml`:
//!
//! ```toml
//! [tape-reader.general]
//! log_level = "info"
//!
//! [tape-reader.tape]
//! density_bpi = 1600.0
//! speed_ips = 15.0
//!
//! [tape-reader.decoder]
//! window_size = 400
//! threshold = 0.5
//! dropout_ratio = 0.15
//! warm_up = "uncorrected"
//! normalize_peak = "signed"
//! carrier_phase = "cycles"
//!
//! [tape-reader.output]
//! dir = "."
//! waveform_file = "out.wav"
//! ```

use serde::{Deserialize, Serialize};

use tape_app::ConfigFile;
use tape_decode_log::DecodeLogsConfig;
use tape_pe::{DecoderConfig, TapeConfig, WarmUp};

/// Top-level reader configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub general: GeneralConfig,
    pub tape: TapeConfig,
    pub decoder: DecoderConfig,
    pub output: OutputConfig,
    pub decode_logs: DecodeLogsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

/// Where decode results are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory, must already exist
    pub dir: String,
    /// Write the corrected waveform
    pub waveform: bool,
    /// Waveform filename template (`%INPUT%` and date tokens)
    pub waveform_file: String,
    /// Text dump filename template, empty disables the dump
    pub text_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            waveform: true,
            waveform_file: "out.wav".to_string(),
            text_file: "%INPUT%.bits.txt".to_string(),
        }
    }
}

impl ReaderConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        validate_positive("[tape].density_bpi", self.tape.density_bpi)?;
        validate_positive("[tape].speed_ips", self.tape.speed_ips)?;

        if self.decoder.window_size == 0 {
            return Err("[decoder].window_size must be > 0".to_string());
        }
        validate_positive("[decoder].threshold", self.decoder.threshold)?;
        let dropout = self.decoder.dropout_ratio;
        if !(dropout.is_finite() && (0.0..=self.decoder.threshold).contains(&dropout)) {
            return Err(format!(
                "[decoder].dropout_ratio must be in 0..=[decoder].threshold (got {})",
                dropout
            ));
        }

        if self.output.dir.trim().is_empty() {
            return Err("[output].dir must not be empty".to_string());
        }
        if self.output.waveform && self.output.waveform_file.trim().is_empty() {
            return Err("[output].waveform_file must not be empty when waveform is enabled".to_string());
        }
        if self.decode_logs.enabled && self.decode_logs.bits_file.trim().is_empty() {
            return Err("[decode_logs].bits_file must not be empty when enabled".to_string());
        }
        Ok(())
    }

    pub fn example_combined_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "tape-reader")]
            inner: ReaderConfig,
        }
        let example = ReaderConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            tape: TapeConfig::default(),
            decoder: DecoderConfig {
                warm_up: WarmUp::Uncorrected,
                ..DecoderConfig::default()
            },
            output: OutputConfig::default(),
            decode_logs: DecodeLogsConfig::default(),
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

fn validate_positive(key: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be > 0 (got {})", key, value))
    }
}

impl ConfigFile for ReaderConfig {
    fn section_key() -> &'static str {
        "tape-reader"
    }
}
