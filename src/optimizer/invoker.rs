//! # Optimizer Invoker
//!
//! Esegue un singolo tool esterno su un singolo file, producendo un candidato.
//!
//! ## Contratto:
//! - L'originale (`input`) non viene mai modificato: i tool in-place lavorano su
//!   una copia già posizionata in `output`
//! - Exit code non-zero, crash, timeout o tool assente → `OptimizerFailed`
//! - In caso di fallimento qualsiasi output parziale viene rimosso
//! - I processi figli vengono uccisi se il future viene droppato (timeout)

use crate::error::OptimizeError;
use crate::registry::{Optimizer, OutputMode, ToolCommand};
use crate::tool_resolver::ToolPathResolver;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Runs external optimizer binaries resolved once at startup
#[derive(Debug)]
pub struct OptimizerInvoker {
    tools: HashMap<Optimizer, PathBuf>,
    timeout: Duration,
}

impl OptimizerInvoker {
    /// Resolve every optimizer's binary up front; missing ones always fail
    pub fn new(resolver: &ToolPathResolver, optimizers: &[Optimizer], timeout: Duration) -> Self {
        let tools = optimizers
            .iter()
            .filter_map(|optimizer| {
                resolver
                    .resolve_tool(optimizer.name())
                    .map(|path| (*optimizer, path))
            })
            .collect();

        Self { tools, timeout }
    }

    pub fn is_available(&self, optimizer: Optimizer) -> bool {
        self.tools.contains_key(&optimizer)
    }

    /// Log which optimizers will run and which will be skipped
    pub fn report_availability(&self, optimizers: &[Optimizer]) {
        let (available, missing): (Vec<Optimizer>, Vec<Optimizer>) = optimizers
            .iter()
            .copied()
            .partition(|optimizer| self.is_available(*optimizer));

        let names = |list: &[Optimizer]| {
            list.iter()
                .map(|optimizer| optimizer.name())
                .collect::<Vec<_>>()
                .join(", ")
        };

        if !available.is_empty() {
            info!("Available optimizers: {}", names(available.as_slice()));
        }
        if !missing.is_empty() {
            warn!("Missing optimizers (files will be optimized without them): {}", names(missing.as_slice()));
        }
    }

    /// Run `optimizer` on `input`, leaving its result at `output`
    pub async fn invoke(
        &self,
        optimizer: Optimizer,
        input: &Path,
        output: &Path,
    ) -> Result<(), OptimizeError> {
        let tool_path = self
            .tools
            .get(&optimizer)
            .ok_or_else(|| OptimizeError::optimizer_failed(optimizer.name(), input, "tool not found"))?;

        let command = optimizer.command(input, output);

        if command.mode == OutputMode::InPlace {
            fs::copy(input, output).await.map_err(|e| {
                OptimizeError::optimizer_failed(optimizer.name(), input, format!("cannot stage copy: {}", e))
            })?;
        }

        let start_time = Instant::now();
        let outcome = self.run_tool(tool_path, &command).await;
        let elapsed = start_time.elapsed();

        let result = match outcome {
            Ok(stdout) => self.collect_output(&command, stdout, output).await,
            Err(reason) => Err(reason),
        };

        match result {
            Ok(()) => {
                debug!("{} produced {} in {:?}", optimizer, output.display(), elapsed);
                Ok(())
            }
            Err(reason) => {
                let _ = fs::remove_file(output).await;
                debug!("{} failed on {} after {:?}: {}", optimizer, input.display(), elapsed, reason);
                Err(OptimizeError::optimizer_failed(optimizer.name(), input, reason))
            }
        }
    }

    async fn run_tool(&self, tool_path: &Path, command: &ToolCommand) -> Result<Vec<u8>, String> {
        debug!("Running {:?} {:?}", tool_path, command.args);

        let stdout = if command.mode == OutputMode::Stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let child = Command::new(tool_path)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to start: {}", e))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(format!("failed while running: {}", e)),
            Err(_) => return Err(format!("timed out after {:?}", self.timeout)),
        };

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(format!("exited with {}", output.status))
        }
    }

    async fn collect_output(
        &self,
        command: &ToolCommand,
        stdout: Vec<u8>,
        output: &Path,
    ) -> Result<(), String> {
        if command.mode == OutputMode::Stdout {
            fs::write(output, stdout)
                .await
                .map_err(|e| format!("cannot write output: {}", e))?;
        }

        match fs::metadata(output).await {
            Ok(metadata) if metadata.is_file() => Ok(()),
            _ => Err("reported success but produced no output".to_string()),
        }
    }
}
