//! # Space Image Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per diverse operazioni
//! - `registry`: Tabella statica optimizer e estensioni
//! - `tool_resolver`: Ricerca dei binari degli optimizer
//! - `file_manager`: Size dei file, discovery e sostituzione atomica
//! - `optimizer`: Invocazione tool, selezione, pipeline per file e batch
//! - `result`: Risultati per file e totali del batch
//! - `report`: Report testuale; `json_output`: report JSON
//! - `progress`: Progress bar
//! - `testing`: Optimizer finti per i test (solo unix)
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use space_image_optimizer::{BatchRunner, Config, TextReport};
//! use std::path::Path;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let runner = BatchRunner::new(Config::default())?;
//! let mut report = TextReport::new(std::io::stdout());
//! let totals = runner.run(Path::new("/path/to/images"), &mut report).await?;
//! println!("{:.2}% saved", totals.saved_percent());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod optimizer;
pub mod progress;
pub mod registry;
pub mod report;
pub mod result;
pub mod tool_resolver;
pub mod utils;

#[cfg(unix)]
pub mod testing;

pub use config::Config;
pub use error::OptimizeError;
pub use json_output::JsonReport;
pub use optimizer::{BatchRunner, FileOptimizationPipeline, OptimizerInvoker};
pub use registry::{FormatRegistry, Optimizer};
pub use report::{ReportSink, TextReport};
pub use result::{FileResult, RunTotals};
pub use tool_resolver::ToolPathResolver;
