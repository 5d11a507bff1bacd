//! # File Optimization Pipeline
//!
//! Worker per l'ottimizzazione di un singolo file.
//! Separato dall'orchestratore del batch per poter girare in task paralleli.

use crate::{
    error::OptimizeError,
    file_manager::FileManager,
    optimizer::{
        invoker::OptimizerInvoker,
        selector::{Candidate, CandidateSelector, Selection},
    },
    registry::{FormatRegistry, Optimizer},
    result::FileResult,
};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs every registered optimizer on one file and keeps the best output
#[derive(Clone)]
pub struct FileOptimizationPipeline {
    registry: Arc<FormatRegistry>,
    invoker: Arc<OptimizerInvoker>,
    scratch_dir: PathBuf,
    parallel_optimizers: bool,
    dry_run: bool,
}

impl FileOptimizationPipeline {
    /// Crea una pipeline; i candidati finiscono sotto `scratch_dir`
    pub fn new(
        registry: Arc<FormatRegistry>,
        invoker: Arc<OptimizerInvoker>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            invoker,
            scratch_dir: scratch_dir.into(),
            parallel_optimizers: true,
            dry_run: false,
        }
    }

    pub fn with_parallel_optimizers(mut self, parallel: bool) -> Self {
        self.parallel_optimizers = parallel;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Processa un singolo file.
    ///
    /// Restituisce errore solo con `NotFound` (file sparito) o per I/O sulla
    /// directory di lavoro; i fallimenti degli optimizer o della sostituzione
    /// lasciano l'originale intatto e producono un risultato invariato.
    pub async fn process(&self, path: &Path, extension: &str) -> Result<FileResult, OptimizeError> {
        let size_before = FileManager::size_of(path).await?;
        let optimizers = self.registry.optimizers_for(extension);

        if optimizers.is_empty() {
            debug!("No optimizers registered for '{}': {}", extension, path.display());
            return Ok(FileResult::unchanged(path.to_path_buf(), extension, size_before));
        }

        // Removed on drop, including every early return below
        let workspace = tempfile::Builder::new()
            .prefix("file-")
            .tempdir_in(&self.scratch_dir)?;

        let candidates = self
            .produce_candidates(path, extension, optimizers, workspace.path())
            .await;
        debug!("{}: {} of {} optimizers succeeded", path.display(), candidates.len(), optimizers.len());

        let selection = match CandidateSelector::select(path, size_before, candidates, self.dry_run).await {
            Ok(selection) => selection,
            Err(OptimizeError::NotFound(missing)) => return Err(OptimizeError::NotFound(missing)),
            Err(e) => {
                warn!("Keeping original {}: {}", path.display(), e);
                Selection::unchanged(size_before)
            }
        };

        Ok(FileResult {
            path: path.to_path_buf(),
            extension: extension.to_string(),
            size_before,
            size_after: selection.size_after,
            optimizer: selection.winner.map(|optimizer| optimizer.name().to_string()),
        })
    }

    /// Esegue gli optimizer, in parallelo o in ordine di registrazione.
    ///
    /// In entrambi i casi i candidati restituiti seguono l'ordine di registrazione.
    async fn produce_candidates(
        &self,
        path: &Path,
        extension: &str,
        optimizers: &[Optimizer],
        workspace: &Path,
    ) -> Vec<Candidate> {
        let jobs = optimizers.iter().map(|&optimizer| {
            let output = workspace.join(optimizer.candidate_file_name(extension));
            async move {
                let result = self.invoker.invoke(optimizer, path, &output).await;
                (optimizer, output, result)
            }
        });

        let outcomes = if self.parallel_optimizers {
            join_all(jobs).await
        } else {
            let mut outcomes = Vec::with_capacity(optimizers.len());
            for job in jobs {
                outcomes.push(job.await);
            }
            outcomes
        };

        outcomes
            .into_iter()
            .filter_map(|(optimizer, output, result)| match result {
                Ok(()) => Some(Candidate {
                    optimizer,
                    path: output,
                }),
                Err(e) => {
                    debug!("{}", e);
                    None
                }
            })
            .collect()
    }
}
