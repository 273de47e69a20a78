//! Locating local model files.

use std::path::{Path, PathBuf};

/// Where a backend looks for its model files.
pub struct ModelDirConfig {
    /// Subdirectory name under the data directory (e.g., "scribo-ner").
    pub subdir: &'static str,
    /// Files that must all be present for a directory to qualify.
    pub required_files: &'static [&'static str],
}

impl ModelDirConfig {
    /// Default model directory for this backend.
    pub fn default_dir(&self) -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join(self.subdir)
            .join("models")
    }

    /// Standard directories to search, most specific first.
    pub fn candidate_dirs(&self) -> Vec<PathBuf> {
        [
            dirs::data_dir().map(|d| d.join(self.subdir).join("models")),
            dirs::home_dir().map(|d| d.join(format!(".{}", self.subdir)).join("models")),
            Some(PathBuf::from(format!("/usr/share/{}/models", self.subdir))),
            Some(PathBuf::from("./models")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Check if a directory contains all required model files.
    pub fn has_required_files(&self, dir: &Path) -> bool {
        self.required_files
            .iter()
            .all(|file| dir.join(file).is_file())
    }

    /// First candidate directory holding every required file.
    pub fn find(&self) -> Option<PathBuf> {
        self.candidate_dirs()
            .into_iter()
            .find(|dir| self.has_required_files(dir))
    }
}

/// Expand `~` and environment variables in a configured path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}
