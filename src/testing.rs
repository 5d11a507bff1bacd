//! # Testing Utilities
//!
//! Script shell che sostituiscono i binari degli optimizer nei test, così la
//! pipeline completa gira senza i tool reali installati.
//!
//! ## Esempio:
//! ```rust,no_run
//! use space_image_optimizer::testing::{failing_tool, shrinking_tool};
//! use space_image_optimizer::Optimizer;
//! use std::path::Path;
//!
//! let tools = Path::new("/tmp/fake-tools");
//! shrinking_tool(tools, Optimizer::Pngcrush, 750)?;
//! failing_tool(tools, Optimizer::Pngout)?;
//! # Ok::<(), std::io::Error>(())
//! ```

use crate::registry::{Optimizer, OutputMode};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Shell redirection that sends a script's output where `optimizer` would write
pub fn output_redirect(optimizer: Optimizer) -> io::Result<String> {
    let command = optimizer.command(Path::new("IN"), Path::new("OUT"));
    if command.mode == OutputMode::Stdout {
        return Ok(String::new());
    }

    let position = command
        .args
        .iter()
        .position(|arg| arg == "OUT")
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("{} has no output argument", optimizer)))?;
    Ok(format!(" > \"${{{}}}\"", position + 1))
}

/// Install an executable script named after `optimizer` with the given body
pub fn install_tool(dir: &Path, optimizer: Optimizer, body: &str) -> io::Result<PathBuf> {
    let path = dir.join(optimizer.name());
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// Tool whose output is exactly `size` bytes, starting with the optimizer name
pub fn shrinking_tool(dir: &Path, optimizer: Optimizer, size: u64) -> io::Result<PathBuf> {
    let body = format!(
        "yes {} | head -c {}{}\nexit 0",
        optimizer.name(),
        size,
        output_redirect(optimizer)?
    );
    install_tool(dir, optimizer, &body)
}

/// Tool that always exits with a failure status
pub fn failing_tool(dir: &Path, optimizer: Optimizer) -> io::Result<PathBuf> {
    install_tool(dir, optimizer, "exit 1")
}
