//! # Report Module
//!
//! Consumer dello stream di risultati prodotto dal batch.
//!
//! `ReportSink` riceve l'inizio del batch, una riga per file e i totali finali.
//! `TextReport` produce la tabella leggibile:
//!
//! ```text
//! File                                                 KB removed   % removed
//! ---------------------------------------------------------------------------
//! a.png                                                      0.24       25.00
//! b.gif                                                      0.20       10.00
//! ---------------------------------------------------------------------------
//! TOTAL                                                      0.44       15.00
//! ```

use crate::result::{FileResult, RunTotals};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const PATH_WIDTH: usize = 50;
const DIVIDER_WIDTH: usize = PATH_WIDTH + 1 + 12 + 1 + 11;

/// Receives the result stream of a batch
pub trait ReportSink {
    /// Called once, after discovery and before the first file
    fn begin(&mut self, root: &Path, total_files: usize) -> io::Result<()>;

    /// Called once per processed file, in discovery order
    fn file_result(&mut self, result: &FileResult) -> io::Result<()>;

    /// Called once with the totals of every processed file
    fn finish(&mut self, totals: &RunTotals) -> io::Result<()>;
}

fn kilobytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

/// Human-readable table writer
pub struct TextReport<W: Write> {
    out: W,
    root: PathBuf,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            root: PathBuf::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn row(&mut self, label: &str, saved_bytes: u64, saved_percent: f64) -> io::Result<()> {
        writeln!(
            self.out,
            "{:<width$} {:>12.2} {:>11.2}",
            label,
            kilobytes(saved_bytes),
            saved_percent,
            width = PATH_WIDTH
        )
    }

    fn divider(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "-".repeat(DIVIDER_WIDTH))
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn begin(&mut self, root: &Path, _total_files: usize) -> io::Result<()> {
        self.root = root.to_path_buf();
        writeln!(
            self.out,
            "{:<width$} {:>12} {:>11}",
            "File",
            "KB removed",
            "% removed",
            width = PATH_WIDTH
        )?;
        self.divider()
    }

    fn file_result(&mut self, result: &FileResult) -> io::Result<()> {
        let shown = result.path.strip_prefix(&self.root).unwrap_or(&result.path);
        let label = shown.display().to_string();
        self.row(&label, result.saved_bytes(), result.saved_percent())?;
        self.out.flush()
    }

    fn finish(&mut self, totals: &RunTotals) -> io::Result<()> {
        self.divider()?;
        self.row("TOTAL", totals.saved_bytes(), totals.saved_percent())?;
        self.out.flush()
    }
}
