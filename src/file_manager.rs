//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file e la discovery delle immagini.
//!
//! ## Responsabilità:
//! - Lettura della dimensione di un file (`size_of`), mai cachata tra una
//!   modifica e l'altra
//! - Discovery ricorsiva in un'unica visita, file raggruppati per estensione
//!   (suffisso esatto, case-sensitive)
//! - Sostituzione atomica dell'originale (write-then-rename)
//! - Formattazione human-readable delle dimensioni
//!
//! ## Sicurezza operazioni:
//! - Il file vincente viene copiato in un file temporaneo nella stessa directory
//!   dell'originale, sincronizzato su disco e poi rinominato sopra l'originale
//! - L'originale non è mai assente o troncato, neanche in caso di errore
//! - I permessi dell'originale vengono preservati
//!
//! ## Esempio:
//! ```rust,no_run
//! use space_image_optimizer::file_manager::FileManager;
//! use std::path::Path;
//!
//! let buckets = FileManager::find_files_by_extension(Path::new("/photos"), &["png", "gif"]);
//! for file in &buckets[0] {
//!     println!("{}", file.display());
//! }
//! ```

use crate::error::OptimizeError;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Current byte length of a file.
    ///
    /// A missing file maps to `OptimizeError::NotFound`.
    pub async fn size_of(path: &Path) -> Result<u64, OptimizeError> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.len()),
            Err(e) => Err(Self::map_not_found(e, path)),
        }
    }

    /// Walk `root` once, bucketing regular files by the extension their name
    /// ends with (`.<extension>`, case-sensitive).
    ///
    /// Buckets follow the order of `extensions`; a file goes into the first
    /// bucket it matches. Symlinks are not followed. Unreadable entries are skipped.
    pub fn find_files_by_extension(root: &Path, extensions: &[&str]) -> Vec<Vec<PathBuf>> {
        let suffixes: Vec<String> = extensions.iter().map(|ext| format!(".{}", ext)).collect();
        let mut buckets = vec![Vec::new(); extensions.len()];

        let entries = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file());

        for entry in entries {
            let matched = suffixes
                .iter()
                .position(|suffix| entry.file_name().as_encoded_bytes().ends_with(suffix.as_bytes()));
            if let Some(index) = matched {
                buckets[index].push(entry.into_path());
            }
        }

        buckets
    }

    /// Atomically replace `original` with the contents of `replacement`.
    ///
    /// `replacement` is left in place; the caller owns its cleanup.
    pub async fn replace_file(original: &Path, replacement: &Path) -> Result<(), OptimizeError> {
        let original = original.to_path_buf();
        let replacement = replacement.to_path_buf();

        tokio::task::spawn_blocking(move || Self::replace_file_blocking(&original, &replacement))
            .await
            .map_err(|e| OptimizeError::Io(io::Error::new(io::ErrorKind::Other, e)))?
    }

    fn replace_file_blocking(original: &Path, replacement: &Path) -> Result<(), OptimizeError> {
        let parent = original
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let permissions = std::fs::metadata(original)
            .map_err(|e| Self::map_not_found(e, original))?
            .permissions();

        // Staged next to the original so the final rename never crosses filesystems
        let mut staged = tempfile::Builder::new()
            .prefix(".image-optimizer-")
            .tempfile_in(parent)?;

        let mut source = std::fs::File::open(replacement)?;
        io::copy(&mut source, staged.as_file_mut())?;
        staged.as_file().sync_all()?;
        staged.as_file().set_permissions(permissions)?;

        staged.persist(original).map_err(|e| OptimizeError::Io(e.error))?;
        debug!("Replaced {} with {}", original.display(), replacement.display());
        Ok(())
    }

    fn map_not_found(e: io::Error, path: &Path) -> OptimizeError {
        if e.kind() == io::ErrorKind::NotFound {
            OptimizeError::NotFound(path.to_path_buf())
        } else {
            OptimizeError::Io(e)
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
