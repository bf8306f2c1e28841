use crate::url::sanitize_filename;
use crate::HarvestError;
use std::path::{Path, PathBuf};

/// Flat output folder holding `.txt` page dumps and downloaded documents
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Creates the directory (and parents) if missing
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, HarvestError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| HarvestError::Write {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes page text under a sanitized name
    ///
    /// Every character of `filename` that is not an ASCII letter or digit
    /// becomes `_`, then `.txt` is appended. An existing file with the same
    /// name is overwritten.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written file
    /// * `Err(HarvestError::Write)` - The file could not be written
    pub fn save_text(&self, text: &str, filename: &str) -> Result<PathBuf, HarvestError> {
        let mut name = sanitize_filename(filename);
        if name.is_empty() {
            name.push('_');
        }
        name.push_str(".txt");

        let path = self.root.join(name);
        std::fs::write(&path, text.as_bytes()).map_err(|source| HarvestError::Write {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!("Saved text: {}", path.display());
        Ok(path)
    }

    /// Path a downloaded document with the given basename is written to
    pub fn document_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}
