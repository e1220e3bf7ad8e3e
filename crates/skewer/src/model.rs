//! # Model artifacts
//!
//! Helpers used while constructing a predictor, before any engine exists: resolving where a
//! model artifact lives, and picking the single model file out of that location. Failures
//! here are fatal at startup rather than per request.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use crate::error::{Error, Result};

/// File extensions recognised as serialized model artifacts.
pub const MODEL_EXTENSIONS: &[&str] = &["joblib", "pkl", "pickle"];

/// Resolves an artifact locator to a local path.
pub trait ArtifactResolver {
    /// # Errors
    ///
    /// [`Error::ModelMissing`] if nothing exists at the location.
    fn resolve(&self, locator: &str) -> Result<PathBuf>;
}

/// Resolves plain paths and `file://` URIs on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalResolver;

impl ArtifactResolver for LocalResolver {
    fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let path = PathBuf::from(locator.strip_prefix("file://").unwrap_or(locator));
        if !path.exists() {
            return Err(Error::ModelMissing(path));
        }
        Ok(path)
    }
}

/// Finds the one model file in `dir`.
///
/// Only regular files directly inside `dir` whose extension is in `extensions` count.
///
/// # Errors
///
/// * [`Error::ModelMissing`] if there is no such file, or `dir` cannot be read
/// * [`Error::ModelAmbiguous`] if there is more than one, listed in sorted order
pub fn locate_model_file(dir: &Path, extensions: &[&str]) -> Result<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|_| Error::ModelMissing(dir.to_path_buf()))?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(Error::ModelMissing(dir.to_path_buf())),
        1 => {
            let path = candidates.remove(0);
            info!(path = %path.display(), "located model file");
            Ok(path)
        }
        _ => Err(Error::ModelAmbiguous(candidates)),
    }
}

/// Resolves `locator` and locates the model file at the result.
///
/// A locator that resolves straight to a file is taken as the model itself.
pub fn resolve_model<R: ArtifactResolver>(resolver: &R, locator: &str) -> Result<PathBuf> {
    let path = resolver.resolve(locator)?;
    if path.is_file() {
        return Ok(path);
    }
    locate_model_file(&path, MODEL_EXTENSIONS)
}
