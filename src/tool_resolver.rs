//! # Tool Path Resolver
//!
//! This module handles finding the optimizer binaries:
//! - An explicit tools directory (config / `--tools-dir`)
//! - `IMAGE_OPTIMIZER_TOOLS_DIR` environment variable
//! - A `tools/` directory next to the executable
//! - The system `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at a directory of optimizer binaries
pub const TOOLS_DIR_ENV: &str = "IMAGE_OPTIMIZER_TOOLS_DIR";

/// Tool path resolver for bundled and system-installed optimizers
#[derive(Debug, Clone)]
pub struct ToolPathResolver {
    /// Directory searched before `PATH`
    tools_dir: Option<PathBuf>,
    /// Whether to fall back to the system `PATH`
    search_system_path: bool,
}

impl ToolPathResolver {
    /// Create a resolver; an explicit directory wins over auto-detection
    pub fn new(tools_dir: Option<PathBuf>, search_system_path: bool) -> Self {
        let tools_dir = tools_dir.or_else(Self::detect_tools_dir);
        debug!("Tools directory: {:?} (system PATH: {})", tools_dir, search_system_path);

        Self {
            tools_dir,
            search_system_path,
        }
    }

    /// Resolver that only looks inside `tools_dir`
    pub fn isolated(tools_dir: impl Into<PathBuf>) -> Self {
        Self {
            tools_dir: Some(tools_dir.into()),
            search_system_path: false,
        }
    }

    fn detect_tools_dir() -> Option<PathBuf> {
        if let Ok(dir) = env::var(TOOLS_DIR_ENV) {
            let tools_path = PathBuf::from(dir);
            debug!("Checking {}: {:?}", TOOLS_DIR_ENV, tools_path);
            if tools_path.is_dir() {
                return Some(tools_path);
            }
        }

        let exe_path = env::current_exe().ok()?;
        let app_dir = exe_path.parent()?;
        let candidates = [
            app_dir.join("tools"),
            app_dir.join("..").join("libexec").join("image-optimizer"),
        ];

        candidates.into_iter().find(|path| {
            debug!("Checking bundled tools path: {:?}", path);
            path.is_dir()
        })
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            if let Some(bundled) = Self::find_in_tools_dir(tools_dir, tool_name) {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        if self.search_system_path {
            if let Some(system_path) = Self::find_in_system_path(tool_name) {
                debug!("Using system tool: {} -> {:?}", tool_name, system_path);
                return Some(system_path);
            }
        }

        debug!("Tool not found: {}", tool_name);
        None
    }

    /// Accepts both `<dir>/<tool>` and `<dir>/<platform>/<tool>`
    fn find_in_tools_dir(tools_dir: &Path, tool_name: &str) -> Option<PathBuf> {
        let file_name = Self::executable_name(tool_name);
        let platform = if cfg!(target_os = "macos") {
            "darwin"
        } else {
            env::consts::OS
        };

        [
            tools_dir.join(&file_name),
            tools_dir.join(platform).join(&file_name),
        ]
        .into_iter()
        .find(|path| path.is_file())
    }

    fn find_in_system_path(tool_name: &str) -> Option<PathBuf> {
        let file_name = Self::executable_name(tool_name);
        let path_var = env::var_os("PATH")?;

        env::split_paths(&path_var)
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    fn executable_name(tool_name: &str) -> String {
        if cfg!(windows) {
            format!("{}.exe", tool_name)
        } else {
            tool_name.to_string()
        }
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new(None, true)
    }
}
