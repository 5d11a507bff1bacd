//! # Optimizer Registry Module
//!
//! Tabella statica degli optimizer esterni e associazione estensione → optimizer.
//!
//! ## Responsabilità:
//! - Definisce `Optimizer`: un variant per ogni tool esterno, risolto a compile time
//! - Costruisce la command line di ogni tool (template input/output)
//! - Definisce `FormatRegistry`: estensione (case-sensitive, senza punto) → lista
//!   ordinata di optimizer
//! - Valida la tabella all'avvio (nessun duplicato, nessun nome sconosciuto)
//!
//! ## Tabella di default:
//!
//! | Estensione | Optimizer (ordine di registrazione) |
//! |------------|-------------------------------------|
//! | png        | optipng, pngcrush, pngout, advpng   |
//! | jpg, jpeg  | jpegtran, jpegoptim                 |
//! | gif        | gifsicle                            |
//!
//! Tutti i template sono lossless: nessun parametro di qualità.
//!
//! ## Esempio:
//! ```rust
//! use space_image_optimizer::registry::{FormatRegistry, Optimizer};
//!
//! let registry = FormatRegistry::builtin();
//! assert_eq!(registry.optimizers_for("gif"), &[Optimizer::Gifsicle]);
//! assert!(registry.optimizers_for("PNG").is_empty());
//! ```

use crate::error::OptimizeError;
use crate::os_args;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One external lossless compression tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimizer {
    Optipng,
    Pngcrush,
    Pngout,
    Advpng,
    Jpegtran,
    Jpegoptim,
    Gifsicle,
}

/// How a tool delivers its optimized output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// The tool writes the output path itself
    WritesOutput,
    /// The tool prints the optimized image on stdout
    Stdout,
    /// The tool rewrites the file it is given; it must run on a copy
    InPlace,
}

/// A fully built command line for one tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub args: Vec<OsString>,
    pub mode: OutputMode,
}

impl Optimizer {
    pub const ALL: [Optimizer; 7] = [
        Optimizer::Optipng,
        Optimizer::Pngcrush,
        Optimizer::Pngout,
        Optimizer::Advpng,
        Optimizer::Jpegtran,
        Optimizer::Jpegoptim,
        Optimizer::Gifsicle,
    ];

    /// Unique key, also the binary name looked up on disk
    pub fn name(&self) -> &'static str {
        match self {
            Self::Optipng => "optipng",
            Self::Pngcrush => "pngcrush",
            Self::Pngout => "pngout",
            Self::Advpng => "advpng",
            Self::Jpegtran => "jpegtran",
            Self::Jpegoptim => "jpegoptim",
            Self::Gifsicle => "gifsicle",
        }
    }

    /// Build the command line that turns `input` into the candidate at `output`.
    ///
    /// For `OutputMode::InPlace` the caller copies `input` to `output` first and
    /// the tool only ever touches `output`.
    pub fn command(&self, input: &Path, output: &Path) -> ToolCommand {
        let (args, mode) = match self {
            Self::Optipng => (
                os_args!["-o7", "-quiet", "-out", output, input],
                OutputMode::WritesOutput,
            ),
            Self::Pngcrush => (
                os_args!["-q", "-rem", "alla", "-brute", input, output],
                OutputMode::WritesOutput,
            ),
            Self::Pngout => (
                os_args![input, output, "-y", "-q"],
                OutputMode::WritesOutput,
            ),
            Self::Advpng => (
                os_args!["-z", "-4", "-q", output],
                OutputMode::InPlace,
            ),
            Self::Jpegtran => (
                os_args!["-copy", "none", "-optimize", "-progressive", "-outfile", output, input],
                OutputMode::WritesOutput,
            ),
            Self::Jpegoptim => (
                os_args!["--strip-all", "--all-progressive", "--stdout", input],
                OutputMode::Stdout,
            ),
            Self::Gifsicle => (
                os_args!["-O3", "--no-warnings", "-o", output, input],
                OutputMode::WritesOutput,
            ),
        };
        ToolCommand { args, mode }
    }

    /// Candidate filename inside a per-file workspace; keeps the extension since
    /// some tools sniff the format from it.
    pub fn candidate_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.name(), extension)
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Optimizer {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|optimizer| optimizer.name() == s)
            .ok_or_else(|| OptimizeError::UnknownOptimizer(s.to_string()))
    }
}

/// Extension entry as written in a configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatEntry {
    pub extension: String,
    pub optimizers: Vec<String>,
}

const BUILTIN_FORMATS: &[(&str, &[Optimizer])] = &[
    (
        "png",
        &[Optimizer::Optipng, Optimizer::Pngcrush, Optimizer::Pngout, Optimizer::Advpng],
    ),
    ("jpg", &[Optimizer::Jpegtran, Optimizer::Jpegoptim]),
    ("jpeg", &[Optimizer::Jpegtran, Optimizer::Jpegoptim]),
    ("gif", &[Optimizer::Gifsicle]),
];

/// Read-only mapping from extension to the ordered optimizers that handle it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRegistry {
    entries: Vec<(String, Vec<Optimizer>)>,
}

impl FormatRegistry {
    /// The built-in png/jpg/jpeg/gif table
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_FORMATS
                .iter()
                .map(|(ext, optimizers)| (ext.to_string(), optimizers.to_vec()))
                .collect(),
        }
    }

    /// Build and validate a registry from typed entries
    pub fn new(entries: Vec<(String, Vec<Optimizer>)>) -> Result<Self, OptimizeError> {
        let registry = Self { entries };
        registry.validate()?;
        Ok(registry)
    }

    /// Build a registry from configuration entries, resolving every optimizer name
    pub fn from_entries(entries: &[FormatEntry]) -> Result<Self, OptimizeError> {
        let typed = entries
            .iter()
            .map(|entry| {
                let optimizers = entry
                    .optimizers
                    .iter()
                    .map(|name| name.parse::<Optimizer>())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((entry.extension.clone(), optimizers))
            })
            .collect::<Result<Vec<_>, OptimizeError>>()?;
        Self::new(typed)
    }

    /// Check the invariants every lookup relies on
    pub fn validate(&self) -> Result<(), OptimizeError> {
        let mut seen_extensions = HashSet::new();

        for (extension, optimizers) in &self.entries {
            if extension.is_empty() {
                return Err(OptimizeError::InvalidRegistry("empty extension".to_string()));
            }
            if extension.starts_with('.') {
                return Err(OptimizeError::InvalidRegistry(format!(
                    "extension '{}' must not start with a dot",
                    extension
                )));
            }
            if extension.contains(['/', '\\']) {
                return Err(OptimizeError::InvalidRegistry(format!(
                    "extension '{}' must not contain a path separator",
                    extension
                )));
            }
            if !seen_extensions.insert(extension.as_str()) {
                return Err(OptimizeError::InvalidRegistry(format!(
                    "extension '{}' registered twice",
                    extension
                )));
            }
            if optimizers.is_empty() {
                return Err(OptimizeError::InvalidRegistry(format!(
                    "extension '{}' has no optimizers",
                    extension
                )));
            }

            let mut seen_optimizers = HashSet::new();
            for optimizer in optimizers {
                if !seen_optimizers.insert(optimizer) {
                    return Err(OptimizeError::InvalidRegistry(format!(
                        "optimizer '{}' listed twice for extension '{}'",
                        optimizer, extension
                    )));
                }
            }
        }

        // "a.tar.gz" must not be visited once for "tar.gz" and again for "gz"
        for (extension, _) in &self.entries {
            for (other, _) in &self.entries {
                if extension != other && extension.ends_with(&format!(".{}", other)) {
                    return Err(OptimizeError::InvalidRegistry(format!(
                        "extension '{}' overlaps with '{}'",
                        extension, other
                    )));
                }
            }
        }

        Ok(())
    }

    /// Copy of this registry without the given optimizers.
    ///
    /// Extensions left with no optimizer are dropped entirely.
    pub fn without(&self, disabled: &[Optimizer]) -> Self {
        let entries = self
            .entries
            .iter()
            .filter_map(|(extension, optimizers)| {
                let kept: Vec<Optimizer> = optimizers
                    .iter()
                    .copied()
                    .filter(|optimizer| !disabled.contains(optimizer))
                    .collect();
                (!kept.is_empty()).then(|| (extension.clone(), kept))
            })
            .collect();
        Self { entries }
    }

    /// Registered extensions, in table order
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(extension, _)| extension.as_str())
    }

    /// Optimizers for an extension in registration order; empty if unregistered
    pub fn optimizers_for(&self, extension: &str) -> &[Optimizer] {
        self.entries
            .iter()
            .find(|(ext, _)| ext == extension)
            .map(|(_, optimizers)| optimizers.as_slice())
            .unwrap_or(&[])
    }

    /// Every distinct optimizer referenced by the table
    pub fn optimizers(&self) -> Vec<Optimizer> {
        let mut all = Vec::new();
        for (_, optimizers) in &self.entries {
            for optimizer in optimizers {
                if !all.contains(optimizer) {
                    all.push(*optimizer);
                }
            }
        }
        all
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
