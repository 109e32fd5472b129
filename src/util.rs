//! Utility functions used in all other clusterroi modules.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Strip a NIFTI extension (".nii.gz" or ".nii") from a file name. Other names are returned unchanged.
pub fn remove_nifti_ext(name: &str) -> &str {
    if let Some(stem) = name.strip_suffix(".nii.gz") {
        stem
    } else if let Some(stem) = name.strip_suffix(".nii") {
        stem
    } else {
        name
    }
}


/// The file name of a NIFTI path without its extension, e.g. "zstat1" for "/data/zstat1.nii.gz".
pub fn nifti_basename<P: AsRef<Path>>(path: P) -> String {
    let name = path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_default();
    remove_nifti_ext(&name).to_string()
}


/// Make a path absolute against the current working directory, without touching the file system otherwise.
pub fn absolute_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
