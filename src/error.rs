//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della libreria.
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O generici (permessi, disco pieno, rename fallito)
//! - `ScopeNotFound`: La directory radice non esiste o non è una directory (fatale)
//! - `NotFound`: Un file è sparito tra discovery e lettura della dimensione (skip)
//! - `OptimizerFailed`: Un tool esterno ha fallito su un file (non fatale)
//! - `UnknownOptimizer`: Nome di optimizer non presente nella tabella statica
//! - `InvalidRegistry`: Tabella estensioni → optimizer non valida
//!
//! ## Politica di propagazione:
//! Solo `ScopeNotFound` interrompe il batch. Tutti gli errori per-file e
//! per-optimizer restano contenuti nella pipeline del singolo file.
//!
//! ## Esempio:
//! ```rust
//! use space_image_optimizer::OptimizeError;
//! use std::path::PathBuf;
//!
//! let err = OptimizeError::ScopeNotFound(PathBuf::from("/missing"));
//! assert!(err.is_fatal());
//! ```

use std::path::PathBuf;

/// Custom error types for image optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory does not exist or is not a directory: {}", .0.display())]
    ScopeNotFound(PathBuf),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Optimizer {optimizer} failed on {}: {reason}", path.display())]
    OptimizerFailed {
        optimizer: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Unknown optimizer: {0}")]
    UnknownOptimizer(String),

    #[error("Invalid format registry: {0}")]
    InvalidRegistry(String),
}

impl OptimizeError {
    /// Whether this error aborts the whole batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ScopeNotFound(_))
    }

    pub(crate) fn optimizer_failed(
        optimizer: impl Into<String>,
        path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::OptimizerFailed {
            optimizer: optimizer.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }
}
