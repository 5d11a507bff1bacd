//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per uso programmatico.
//!
//! ## Tipi di messaggi (uno per riga):
//! - `start`: Inizio batch (directory radice, numero file trovati)
//! - `file_complete`: Fine elaborazione di un file (size prima/dopo, optimizer vincente)
//! - `complete`: Totali del batch

use crate::report::ReportSink;
use crate::result::{FileResult, RunTotals};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum JsonMessage {
    /// Inizio del batch
    #[serde(rename = "start")]
    Start { root: PathBuf, total_files: usize },

    /// Fine elaborazione di un file specifico
    #[serde(rename = "file_complete")]
    FileComplete {
        path: PathBuf,
        size_before: u64,
        size_after: u64,
        saved_bytes: u64,
        saved_percent: f64,
        optimizer: Option<String>,
    },

    /// Batch completato
    #[serde(rename = "complete")]
    Complete {
        files: usize,
        size_before: u64,
        size_after: u64,
        saved_bytes: u64,
        saved_percent: f64,
    },
}

impl JsonMessage {
    /// Scrive il messaggio come singola riga JSON
    pub fn emit_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        serde_json::to_writer(&mut *out, self)?;
        writeln!(out)?;
        out.flush()
    }
}

impl From<&FileResult> for JsonMessage {
    fn from(result: &FileResult) -> Self {
        Self::FileComplete {
            path: result.path.clone(),
            size_before: result.size_before,
            size_after: result.size_after,
            saved_bytes: result.saved_bytes(),
            saved_percent: result.saved_percent(),
            optimizer: result.optimizer.clone(),
        }
    }
}

impl From<&RunTotals> for JsonMessage {
    fn from(totals: &RunTotals) -> Self {
        Self::Complete {
            files: totals.files,
            size_before: totals.size_before,
            size_after: totals.size_after,
            saved_bytes: totals.saved_bytes(),
            saved_percent: totals.saved_percent(),
        }
    }
}

/// Report sink emitting JSON lines
pub struct JsonReport<W: Write> {
    out: W,
}

impl<W: Write> JsonReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonReport<W> {
    fn begin(&mut self, root: &Path, total_files: usize) -> io::Result<()> {
        JsonMessage::Start {
            root: root.to_path_buf(),
            total_files,
        }
        .emit_to(&mut self.out)
    }

    fn file_result(&mut self, result: &FileResult) -> io::Result<()> {
        JsonMessage::from(result).emit_to(&mut self.out)
    }

    fn finish(&mut self, totals: &RunTotals) -> io::Result<()> {
        JsonMessage::from(totals).emit_to(&mut self.out)
    }
}
