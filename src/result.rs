//! # Result Types Module
//!
//! Valori prodotti dalla pipeline e accumulatore dei totali del batch.
//!
//! - `FileResult`: esito immutabile di un singolo file (size prima/dopo, optimizer vincente)
//! - `RunTotals`: somma di size prima/dopo su tutti i file processati
//!
//! `saved_percent` vale 0 quando la size iniziale è 0, per evitare divisioni per zero.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn saved_percent(size_before: u64, size_after: u64) -> f64 {
    if size_before == 0 {
        0.0
    } else {
        (size_before.saturating_sub(size_after) as f64 / size_before as f64) * 100.0
    }
}

/// Outcome of optimizing one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub extension: String,
    pub size_before: u64,
    pub size_after: u64,
    /// Name of the optimizer whose candidate replaced the original
    pub optimizer: Option<String>,
}

impl FileResult {
    /// Result for a file that was left untouched
    pub fn unchanged(path: PathBuf, extension: &str, size: u64) -> Self {
        Self {
            path,
            extension: extension.to_string(),
            size_before: size,
            size_after: size,
            optimizer: None,
        }
    }

    pub fn saved_bytes(&self) -> u64 {
        self.size_before.saturating_sub(self.size_after)
    }

    pub fn saved_percent(&self) -> f64 {
        saved_percent(self.size_before, self.size_after)
    }
}

/// Running before/after sums for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub files: usize,
    pub size_before: u64,
    pub size_after: u64,
}

impl RunTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one file's sizes into the totals
    pub fn record(&mut self, result: &FileResult) {
        self.files += 1;
        self.size_before += result.size_before;
        self.size_after += result.size_after;
    }

    /// Combine totals accumulated separately
    pub fn merge(self, other: RunTotals) -> RunTotals {
        RunTotals {
            files: self.files + other.files,
            size_before: self.size_before + other.size_before,
            size_after: self.size_after + other.size_after,
        }
    }

    pub fn saved_bytes(&self) -> u64 {
        self.size_before.saturating_sub(self.size_after)
    }

    pub fn saved_percent(&self) -> f64 {
        saved_percent(self.size_before, self.size_after)
    }
}

impl<'a> FromIterator<&'a FileResult> for RunTotals {
    fn from_iter<I: IntoIterator<Item = &'a FileResult>>(iter: I) -> Self {
        let mut totals = RunTotals::new();
        for result in iter {
            totals.record(result);
        }
        totals
    }
}
