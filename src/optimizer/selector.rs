//! # Candidate Selector
//!
//! Sceglie il candidato più piccolo tra quelli prodotti per un file.
//!
//! ## Algoritmo:
//! 1. Legge la size di ogni candidato (mai cachata)
//! 2. Scarta i candidati vuoti se l'originale non è vuoto
//! 3. Vince la size strettamente minore; a parità vince il primo registrato
//! 4. Il vincitore sostituisce l'originale solo se strettamente più piccolo
//! 5. Tutti i candidati vengono cancellati, vincitore compreso (l'originale
//!    riceve una copia atomica)

use crate::error::OptimizeError;
use crate::file_manager::FileManager;
use crate::registry::Optimizer;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// One optimizer's output for one original
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub optimizer: Optimizer,
    pub path: PathBuf,
}

/// What happened to the original
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Optimizer whose output replaced (or would replace, in dry run) the original
    pub winner: Option<Optimizer>,
    /// Size of the original after selection
    pub size_after: u64,
}

impl Selection {
    pub fn unchanged(size: u64) -> Self {
        Self {
            winner: None,
            size_after: size,
        }
    }
}

pub struct CandidateSelector;

impl CandidateSelector {
    /// Pick the smallest candidate and move it onto `original`.
    ///
    /// `candidates` must be in registration order. Every candidate file is
    /// deleted before returning, whatever the outcome.
    pub async fn select(
        original: &Path,
        size_before: u64,
        candidates: Vec<Candidate>,
        dry_run: bool,
    ) -> Result<Selection, OptimizeError> {
        let mut discarded = Vec::new();
        let mut best: Option<(Candidate, u64)> = None;

        for candidate in candidates {
            let size = match FileManager::size_of(&candidate.path).await {
                Ok(size) => size,
                Err(e) => {
                    debug!("Ignoring unreadable candidate from {}: {}", candidate.optimizer, e);
                    discarded.push(candidate.path);
                    continue;
                }
            };

            if size == 0 && size_before > 0 {
                debug!("Ignoring empty candidate from {}", candidate.optimizer);
                discarded.push(candidate.path);
                continue;
            }

            debug!("{}: {} -> {} bytes", candidate.optimizer, size_before, size);

            let improves = best.as_ref().map_or(true, |(_, best_size)| size < *best_size);
            if improves {
                if let Some((previous, _)) = best.replace((candidate, size)) {
                    discarded.push(previous.path);
                }
            } else {
                discarded.push(candidate.path);
            }
        }

        let outcome = match best {
            Some((winner, size)) if size < size_before => {
                let applied = Self::apply(original, &winner, size, dry_run).await;
                discarded.push(winner.path);
                applied
            }
            Some((winner, size)) => {
                debug!(
                    "Best candidate for {} ({} bytes from {}) is not smaller, keeping original",
                    original.display(),
                    size,
                    winner.optimizer
                );
                discarded.push(winner.path);
                Ok(Selection::unchanged(size_before))
            }
            None => Ok(Selection::unchanged(size_before)),
        };

        Self::discard(&discarded).await;
        outcome
    }

    async fn apply(
        original: &Path,
        winner: &Candidate,
        winner_size: u64,
        dry_run: bool,
    ) -> Result<Selection, OptimizeError> {
        if dry_run {
            debug!("Dry run: would replace {} with {}", original.display(), winner.optimizer);
            return Ok(Selection {
                winner: Some(winner.optimizer),
                size_after: winner_size,
            });
        }

        FileManager::replace_file(original, &winner.path).await?;
        let size_after = FileManager::size_of(original).await?;

        Ok(Selection {
            winner: Some(winner.optimizer),
            size_after,
        })
    }

    async fn discard(paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!("Failed to remove candidate {}: {}", path.display(), e);
                }
            }
        }
    }
}
