// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Decoded bit logging.
//!
//! Provides [`DecodeLogsConfig`] for TOML configuration, [`BitLogger`] for
//! writing JSON-Lines bit logs and [`write_text_dump`] for the compact one
//! character per bit rendering.

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use tape_core::Bit;

/// Label written into every header record.
pub const DECODER_LABEL: &str = "pe1600";

/// Bits per line of the text dump.
pub const TEXT_DUMP_WIDTH: usize = 64;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Bit log configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLogsConfig {
    /// Whether the JSON-Lines bit log is written
    pub enabled: bool,
    /// Base directory for log files. Empty means the run's output directory,
    /// or [`default_decode_logs_dir`] when that is empty too.
    pub dir: String,
    /// Bit log filename template (`%YYYY%`, `%MM%`, `%DD%`, `%INPUT%`)
    pub bits_file: String,
}

impl Default for DecodeLogsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: String::new(),
            bits_file: "%INPUT%-%YYYY%-%MM%-%DD%.bits.jsonl".to_string(),
        }
    }
}

/// Fallback when neither the config nor the caller names a directory.
pub fn default_decode_logs_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("tape-rs").join("bits"),
        None => PathBuf::from("logs/bits"),
    }
}

/// Directory the bit log is written to: `[decode_logs].dir`, else
/// `output_dir`, else [`default_decode_logs_dir`].
pub fn resolve_log_dir(cfg: &DecodeLogsConfig, output_dir: &Path) -> PathBuf {
    let dir = cfg.dir.trim();
    if !dir.is_empty() {
        PathBuf::from(dir)
    } else if !output_dir.as_os_str().is_empty() {
        output_dir.to_path_buf()
    } else {
        default_decode_logs_dir()
    }
}

/// Expand the date tokens and `%INPUT%` in a file name template.
pub fn resolve_file_name(template: &str, input: &str) -> String {
    let now = Utc::now();
    template
        .replace("%YYYY%", &now.format("%Y").to_string())
        .replace("%MM%", &now.format("%m").to_string())
        .replace("%DD%", &now.format("%d").to_string())
        .replace("%INPUT%", input)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Summary of a decode run, written as the first record of a bit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHeader {
    pub input: String,
    pub sample_rate: u32,
    pub samples: usize,
    pub samples_per_baud: f64,
    pub carrier_hz: f64,
    pub bits: usize,
    pub known: usize,
    pub unknown: usize,
    pub nothing: usize,
}

#[derive(Serialize)]
struct BitRecord<'a> {
    #[serde(flatten)]
    bit: &'a Bit,
    flags: u8,
}

fn now_ms() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as u64,
        Err(_) => 0,
    }
}

// ---------------------------------------------------------------------------
// Bit logger
// ---------------------------------------------------------------------------

pub struct BitLogger {
    path: PathBuf,
    writer: BufWriter<File>,
    records: usize,
    failed: bool,
}

impl BitLogger {
    /// Open a logger from config, or return `None` when logging is disabled.
    /// The directory comes from [`resolve_log_dir`].
    pub fn from_config(
        cfg: &DecodeLogsConfig,
        output_dir: &Path,
        input: &str,
    ) -> Result<Option<Self>, String> {
        if !cfg.enabled {
            return Ok(None);
        }
        Self::open(&resolve_log_dir(cfg, output_dir), &cfg.bits_file, input).map(Some)
    }

    pub fn open(base_dir: &Path, template: &str, input: &str) -> Result<Self, String> {
        let path = base_dir.join(resolve_file_name(template, input));
        if let Some(parent) = path.parent() {
            create_dir_all(parent)
                .map_err(|e| format!("create bit log dir '{}': {}", parent.display(), e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| format!("open bit log '{}': {}", path.display(), e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            records: 0,
            failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log_header(&mut self, header: &RunHeader) {
        let line = json!({
            "ts_ms": now_ms(),
            "decoder": DECODER_LABEL,
            "header": header,
        });
        self.write_line(&line);
    }

    pub fn log_bit(&mut self, bit: &Bit) {
        let record = BitRecord {
            bit,
            flags: bit.flags(),
        };
        self.write_line(&record);
    }

    pub fn log_bits(&mut self, bits: &[Bit]) {
        for bit in bits {
            self.log_bit(bit);
        }
    }

    /// Flush and close. Returns the record count.
    pub fn finish(mut self) -> Result<usize, String> {
        self.writer
            .flush()
            .map_err(|e| format!("flush bit log '{}': {}", self.path.display(), e))?;
        if self.failed {
            return Err(format!("bit log '{}' is incomplete", self.path.display()));
        }
        Ok(self.records)
    }

    fn write_line<T: Serialize>(&mut self, value: &T) {
        if self.failed {
            return;
        }
        if serde_json::to_writer(&mut self.writer, value).is_err() {
            warn!("bit log serialization failed for {}", self.path.display());
            self.failed = true;
            return;
        }
        if self.writer.write_all(b"\n").is_err() {
            warn!("bit log write failed for {}", self.path.display());
            self.failed = true;
            return;
        }
        self.records += 1;
    }
}

// ---------------------------------------------------------------------------
// Text dump
// ---------------------------------------------------------------------------

/// `1`/`0` for KNOWN bits, `i`/`o` for UNKNOWN, `.` for NOTHING, wrapped at
/// `width` bits per line.
pub fn render_text(bits: &[Bit], width: usize) -> String {
    let width = width.max(1);
    let mut out = String::with_capacity(bits.len() + bits.len() / width + 1);
    for line in bits.chunks(width) {
        out.extend(line.iter().map(Bit::symbol));
        out.push('\n');
    }
    out
}

pub fn write_text_dump(path: &Path, bits: &[Bit]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)
            .map_err(|e| format!("create text dump dir '{}': {}", parent.display(), e))?;
    }
    std::fs::write(path, render_text(bits, TEXT_DUMP_WIDTH))
        .map_err(|e| format!("write text dump '{}': {}", path.display(), e))
}
