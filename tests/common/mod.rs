//! Image fixtures shared by the integration tests.

use space_image_optimizer::testing::{failing_tool, shrinking_tool};
use space_image_optimizer::Optimizer;
use std::path::{Path, PathBuf};

/// The png/gif scenario tools: optipng 800, pngcrush 750, pngout fails, gifsicle 1800
pub fn scenario_tools(dir: &Path) {
    shrinking_tool(dir, Optimizer::Optipng, 800).unwrap();
    shrinking_tool(dir, Optimizer::Pngcrush, 750).unwrap();
    failing_tool(dir, Optimizer::Pngout).unwrap();
    shrinking_tool(dir, Optimizer::Gifsicle, 1800).unwrap();
}

pub fn image(dir: &Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![b'o'; size]).unwrap();
    path
}

pub fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}

/// Regular files left anywhere under `dir`
pub fn file_count(dir: &Path) -> usize {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .count()
}
