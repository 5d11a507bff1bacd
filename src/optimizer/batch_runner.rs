//! # Batch Runner
//!
//! Orchestratore principale: scopre i file sotto la directory radice, li passa
//! alla pipeline con concorrenza limitata e accumula i totali.
//!
//! ## Flusso:
//! 1. Verifica che la radice esista e sia una directory (unico errore fatale)
//! 2. Discovery per estensione, nell'ordine della tabella (file raggruppati)
//! 3. Un task per file, limitato da un semaforo a `workers` task attivi
//! 4. I task vengono attesi in ordine di discovery: righe del report
//!    deterministiche, totali accumulati da un solo consumer
//! 5. Riga finale con i totali

use crate::{
    config::Config,
    error::OptimizeError,
    file_manager::FileManager,
    optimizer::{invoker::OptimizerInvoker, pipeline::FileOptimizationPipeline},
    progress::ProgressManager,
    registry::FormatRegistry,
    report::ReportSink,
    result::{FileResult, RunTotals},
    tool_resolver::ToolPathResolver,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Runs the optimization pipeline over every matching file under a root
pub struct BatchRunner {
    config: Config,
    registry: Arc<FormatRegistry>,
    invoker: Arc<OptimizerInvoker>,
}

impl BatchRunner {
    /// Validate the configuration and resolve every optimizer binary
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let registry = config.format_registry()?;
        let resolver = ToolPathResolver::new(config.tools_dir.clone(), config.search_system_path);
        let invoker = OptimizerInvoker::new(&resolver, &registry.optimizers(), config.tool_timeout());

        Ok(Self {
            config,
            registry: Arc::new(registry),
            invoker: Arc::new(invoker),
        })
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Optimize every file under `root`, streaming results into `sink`.
    ///
    /// Fails only with `ScopeNotFound`; per-file problems are logged and the
    /// file is left out of the totals.
    pub async fn run<S: ReportSink>(&self, root: &Path, sink: &mut S) -> Result<RunTotals, OptimizeError> {
        if !root.is_dir() {
            return Err(OptimizeError::ScopeNotFound(root.to_path_buf()));
        }

        let start_time = Instant::now();
        info!("Starting image optimization in: {}", root.display());
        if self.config.dry_run {
            info!("Dry run mode: No files will be modified");
        }
        self.invoker.report_availability(&self.registry.optimizers());

        let files = self.discover(root);
        info!("Found {} files to process", files.len());

        if let Err(e) = sink.begin(root, files.len()) {
            warn!("Failed to write report header: {}", e);
        }

        let progress = ProgressManager::new(files.len() as u64, self.config.show_progress);
        let scratch = tempfile::Builder::new().prefix("image-optimizer-").tempdir()?;
        debug!("Scratch directory: {}", scratch.path().display());

        let pipeline = FileOptimizationPipeline::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.invoker),
            scratch.path(),
        )
        .with_parallel_optimizers(self.config.parallel_optimizers)
        .with_dry_run(self.config.dry_run);

        let tasks = self.spawn_tasks(&pipeline, files);
        let mut totals = RunTotals::new();

        for (path, task) in tasks {
            let result = match task.await {
                Ok(Ok(result)) => result,
                Ok(Err(OptimizeError::NotFound(missing))) => {
                    warn!("Skipping {}: file disappeared", missing.display());
                    progress.update(&format!("{}: skipped", Self::file_label(&path)));
                    continue;
                }
                Ok(Err(e)) => {
                    error!("Failed to process {}: {}", path.display(), e);
                    progress.update(&format!("{}: failed", Self::file_label(&path)));
                    continue;
                }
                Err(e) => {
                    error!("Task for {} panicked: {}", path.display(), e);
                    progress.update(&format!("{}: failed", Self::file_label(&path)));
                    continue;
                }
            };

            totals.record(&result);
            progress.update(&Self::progress_message(&path, &result));

            if let Err(e) = progress.suspend(|| sink.file_result(&result)) {
                warn!("Failed to write report row for {}: {}", path.display(), e);
            }
        }

        progress.finish();
        if let Err(e) = sink.finish(&totals) {
            warn!("Failed to write report totals: {}", e);
        }

        info!(
            "Processed {} files in {:.2}s: {} -> {} (saved {}, {:.2}%)",
            totals.files,
            start_time.elapsed().as_secs_f64(),
            FileManager::format_size(totals.size_before),
            FileManager::format_size(totals.size_after),
            FileManager::format_size(totals.saved_bytes()),
            totals.saved_percent()
        );

        Ok(totals)
    }

    /// Every matching file, grouped by extension in table order
    fn discover(&self, root: &Path) -> Vec<(PathBuf, String)> {
        let extensions: Vec<&str> = self.registry.extensions().collect();
        let buckets = FileManager::find_files_by_extension(root, &extensions);

        extensions
            .iter()
            .zip(buckets)
            .flat_map(|(extension, found)| {
                debug!("{} files with extension '{}'", found.len(), extension);
                found.into_iter().map(move |path| (path, extension.to_string()))
            })
            .collect()
    }

    /// One task per file; at most `workers` run a pipeline at the same time
    fn spawn_tasks(
        &self,
        pipeline: &FileOptimizationPipeline,
        files: Vec<(PathBuf, String)>,
    ) -> Vec<(PathBuf, JoinHandle<Result<FileResult, OptimizeError>>)> {
        let semaphore = Arc::new(Semaphore::new(self.config.workers));

        files
            .into_iter()
            .map(|(path, extension)| {
                let semaphore = Arc::clone(&semaphore);
                let pipeline = pipeline.clone();
                let task_path = path.clone();

                let task = tokio::spawn(async move {
                    // The semaphore is never closed
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| OptimizeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
                    debug!("Processing {}", task_path.display());
                    pipeline.process(&task_path, &extension).await
                });

                (path, task)
            })
            .collect()
    }

    fn file_label(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    fn progress_message(path: &Path, result: &FileResult) -> String {
        match result.optimizer {
            Some(ref optimizer) => format!(
                "{}: {:.1}% saved ({})",
                Self::file_label(path),
                result.saved_percent(),
                optimizer
            ),
            None => format!("{}: unchanged", Self::file_label(path)),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::registry::Optimizer;
    use crate::report::TextReport;
    use crate::testing::{failing_tool, install_tool, output_redirect, shrinking_tool};
    use tempfile::TempDir;

    fn config_for(tools: &TempDir) -> Config {
        Config {
            tools_dir: Some(tools.path().to_path_buf()),
            search_system_path: false,
            show_progress: false,
            ..Default::default()
        }
    }

    fn write(dir: &Path, name: &str, size: usize) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, vec![b'o'; size]).unwrap();
        path
    }

    fn install_scenario_tools(tools: &TempDir) {
        shrinking_tool(tools.path(), Optimizer::Optipng, 800).unwrap();
        shrinking_tool(tools.path(), Optimizer::Pngcrush, 750).unwrap();
        failing_tool(tools.path(), Optimizer::Pngout).unwrap();
        shrinking_tool(tools.path(), Optimizer::Gifsicle, 1800).unwrap();
    }

    #[tokio::test]
    async fn test_png_and_gif_scenario() {
        let tools = TempDir::new().unwrap();
        let images = TempDir::new().unwrap();
        install_scenario_tools(&tools);
        let png = write(images.path(), "a.png", 1000);
        let gif = write(images.path(), "b.gif", 2000);

        let runner = BatchRunner::new(config_for(&tools)).unwrap();
        let mut report = TextReport::new(Vec::new());
        let totals = runner.run(images.path(), &mut report).await.unwrap();

        assert_eq!(std::fs::metadata(&png).unwrap().len(), 750);
        assert_eq!(std::fs::metadata(&gif).unwrap().len(), 1800);
        assert_eq!(totals.files, 2);
        assert_eq!(totals.size_before, 3000);
        assert_eq!(totals.size_after, 2550);
        assert_eq!(format!("{:.2}", totals.saved_percent()), "15.00");

        let text = String::from_utf8(report.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[2].starts_with("a.png"));
        assert!(lines[3].starts_with("b.gif"));
        assert!(lines.last().unwrap().starts_with("TOTAL"));
        assert!(lines.last().unwrap().ends_with("15.00"));
    }

    #[tokio::test]
    async fn test_missing_root_is_scope_not_found() {
        let tools = TempDir::new().unwrap();
        let runner = BatchRunner::new(config_for(&tools)).unwrap();
        let missing = tools.path().join("nope");

        let mut report = TextReport::new(Vec::new());
        let err = runner.run(&missing, &mut report).await.unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(err, OptimizeError::ScopeNotFound(path) if path == missing));
        assert!(report.into_inner().is_empty());
    }

    #[tokio::test]
    async fn test_root_that_is_a_file_is_scope_not_found() {
        let tools = TempDir::new().unwrap();
        let file = write(tools.path(), "a.png", 10);
        let runner = BatchRunner::new(config_for(&tools)).unwrap();

        let err = runner.run(&file, &mut TextReport::new(Vec::new())).await.unwrap_err();
        assert!(matches!(err, OptimizeError::ScopeNotFound(_)));
    }

    #[tokio::test]
    async fn test_totals_match_sum_of_rows_across_workers() {
        let tools = TempDir::new().unwrap();
        let images = TempDir::new().unwrap();
        shrinking_tool(tools.path(), Optimizer::Optipng, 90).unwrap();
        shrinking_tool(tools.path(), Optimizer::Jpegtran, 150).unwrap();

        for i in 0..6 {
            write(images.path(), &format!("nested/{}/img{}.png", i % 2, i), 100 + i);
        }
        write(images.path(), "photo.jpeg", 300);
        write(images.path(), "photo.JPG", 300);
        write(images.path(), "notes.txt", 300);

        let config = Config {
            workers: 3,
            ..config_for(&tools)
        };
        let runner = BatchRunner::new(config).unwrap();
        let mut report = crate::json_output::JsonReport::new(Vec::new());
        let totals = runner.run(images.path(), &mut report).await.unwrap();

        let output = String::from_utf8(report.into_inner()).unwrap();
        let rows: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .filter(|message: &serde_json::Value| message["type"] == "file_complete")
            .collect();

        assert_eq!(rows.len(), 7);
        assert_eq!(totals.files, 7);
        let before: u64 = rows.iter().map(|row| row["size_before"].as_u64().unwrap()).sum();
        let after: u64 = rows.iter().map(|row| row["size_after"].as_u64().unwrap()).sum();
        assert_eq!(totals.size_before, before);
        assert_eq!(totals.size_after, after);
        assert_eq!(std::fs::metadata(images.path().join("photo.JPG")).unwrap().len(), 300);
    }

    #[tokio::test]
    async fn test_file_vanishing_mid_batch_is_skipped() {
        let tools = TempDir::new().unwrap();
        let images = TempDir::new().unwrap();
        let png = write(images.path(), "a.png", 1000);
        let gif = write(images.path(), "b.gif", 2000);

        // Runs on a.png and deletes b.gif before its task probes it
        let body = format!(
            "rm -f '{}'\nyes optipng | head -c 800{}",
            gif.display(),
            output_redirect(Optimizer::Optipng).unwrap()
        );
        install_tool(tools.path(), Optimizer::Optipng, &body).unwrap();
        shrinking_tool(tools.path(), Optimizer::Gifsicle, 1800).unwrap();

        let config = Config {
            workers: 1,
            ..config_for(&tools)
        };
        let runner = BatchRunner::new(config).unwrap();
        let mut report = TextReport::new(Vec::new());
        let totals = runner.run(images.path(), &mut report).await.unwrap();

        assert!(!gif.exists());
        assert_eq!(std::fs::metadata(&png).unwrap().len(), 800);
        assert_eq!(totals.files, 1);
        assert_eq!(totals.size_before, 1000);
        assert_eq!(totals.size_after, 800);

        let text = String::from_utf8(report.into_inner()).unwrap();
        assert!(!text.contains("b.gif"));
        assert!(text.lines().last().unwrap().starts_with("TOTAL"));
    }

    #[tokio::test]
    async fn test_rows_grouped_by_extension() {
        let tools = TempDir::new().unwrap();
        let images = TempDir::new().unwrap();
        install_scenario_tools(&tools);
        write(images.path(), "z.gif", 2000);
        write(images.path(), "a.png", 1000);
        write(images.path(), "m.png", 1000);

        let runner = BatchRunner::new(config_for(&tools)).unwrap();
        let mut report = TextReport::new(Vec::new());
        runner.run(images.path(), &mut report).await.unwrap();

        let text = String::from_utf8(report.into_inner()).unwrap();
        let order: Vec<&str> = text
            .lines()
            .skip(2)
            .take(3)
            .map(|line| line.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(order, vec!["a.png", "m.png", "z.gif"]);
    }

    #[tokio::test]
    async fn test_empty_directory_reports_zero_totals() {
        let tools = TempDir::new().unwrap();
        let images = TempDir::new().unwrap();
        let runner = BatchRunner::new(config_for(&tools)).unwrap();

        let totals = runner
            .run(images.path(), &mut TextReport::new(Vec::new()))
            .await
            .unwrap();

        assert_eq!(totals, RunTotals::new());
        assert_eq!(totals.saved_percent(), 0.0);
    }

    #[tokio::test]
    async fn test_disabled_optimizer_is_not_run() {
        let tools = TempDir::new().unwrap();
        let images = TempDir::new().unwrap();
        install_scenario_tools(&tools);
        let png = write(images.path(), "a.png", 1000);

        let config = Config {
            disabled_optimizers: vec!["pngcrush".to_string()],
            ..config_for(&tools)
        };
        let runner = BatchRunner::new(config).unwrap();
        assert!(!runner.registry().optimizers_for("png").contains(&Optimizer::Pngcrush));

        runner.run(images.path(), &mut TextReport::new(Vec::new())).await.unwrap();
        assert_eq!(std::fs::metadata(&png).unwrap().len(), 800);
    }
}
