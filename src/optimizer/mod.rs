//! # Optimizer Module
//!
//! Modulo che separa le responsabilità in sottomoduli:
//! - `batch_runner`: Orchestratore principale del batch
//! - `pipeline`: Worker per singoli file
//! - `invoker`: Esecuzione dei tool esterni
//! - `selector`: Scelta del candidato vincente e sostituzione atomica

pub mod batch_runner;
pub mod invoker;
pub mod pipeline;
pub mod selector;

pub use batch_runner::BatchRunner;
pub use invoker::OptimizerInvoker;
pub use pipeline::FileOptimizationPipeline;
pub use selector::{Candidate, CandidateSelector, Selection};
