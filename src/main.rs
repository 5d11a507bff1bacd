//! # Space Image Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Caricamento della configurazione e applicazione degli override CLI
//! - Scelta del report (tabella o JSON) e avvio del batch
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (directory, workers, timeout, tool, etc.)
//! 2. Configura il logging (`RUST_LOG`, INFO o DEBUG a seconda del flag verbose)
//! 3. Carica il file di configurazione se indicato e applica i flag
//! 4. Crea il BatchRunner e avvia l'ottimizzazione
//! 5. Directory mancante o non valida → errore su stderr e exit code 1
//!
//! ## Esempio di utilizzo:
//! ```bash
//! image-optimizer /path/to/images --workers 8 --disable pngout --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use space_image_optimizer::{BatchRunner, Config, JsonReport, TextReport};

#[derive(Parser)]
#[command(name = "image-optimizer")]
#[command(about = "Losslessly optimize PNG, JPEG and GIF images with every available optimizer")]
struct Args {
    /// Directory containing images to optimize
    root_directory: PathBuf,

    /// Number of files processed in parallel
    #[arg(short, long)]
    workers: Option<usize>,

    /// Timeout for a single optimizer run, in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Directory containing the optimizer binaries
    #[arg(long)]
    tools_dir: Option<PathBuf>,

    /// Only use optimizers found in the tools directory
    #[arg(long)]
    no_system_path: bool,

    /// Optimizers to skip (comma separated, e.g. pngout,advpng)
    #[arg(long, value_delimiter = ',')]
    disable: Vec<String>,

    /// Run the optimizers for one file one after the other
    #[arg(long)]
    sequential_optimizers: bool,

    /// Dry run - don't actually replace files
    #[arg(long)]
    dry_run: bool,

    /// Print results as JSON lines instead of a table
    #[arg(long)]
    json: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// JSON configuration file (command line flags take precedence)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Apply command line flags on top of a loaded configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.tool_timeout_secs = timeout;
        }
        if let Some(ref tools_dir) = self.tools_dir {
            config.tools_dir = Some(tools_dir.clone());
        }
        if self.no_system_path {
            config.search_system_path = false;
        }
        for name in &self.disable {
            let name = name.trim();
            if !name.is_empty() && !config.disabled_optimizers.iter().any(|d| d == name) {
                config.disabled_optimizers.push(name.to_string());
            }
        }
        if self.sequential_optimizers {
            config.parallel_optimizers = false;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.json {
            config.json_output = true;
        }
        if self.quiet || config.json_output {
            config.show_progress = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    args.apply_to(&mut config);

    let runner = BatchRunner::new(config.clone())?;
    let stdout = io::stdout();

    if config.json_output {
        let mut report = JsonReport::new(stdout.lock());
        runner.run(&args.root_directory, &mut report).await?;
    } else {
        let mut report = TextReport::new(stdout.lock());
        runner.run(&args.root_directory, &mut report).await?;
    }

    Ok(())
}
