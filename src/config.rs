//! Runtime configuration: where the external tools live and the cluster-forming parameters.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable pointing to the FSL installation. FSL tools are in its `bin` subdirectory.
pub const FSLDIR_ENV: &str = "FSLDIR";


/// Locations of the external command line tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolPaths {
    pub wb_command: PathBuf,
    pub cluster: PathBuf,
    pub atlasquery: PathBuf,
    pub fslmaths: PathBuf,
}

impl ToolPaths {

    /// Resolve the tools from the environment: Connectome Workbench from `PATH`, FSL tools from `$FSLDIR/bin` if `FSLDIR` is set.
    pub fn from_env() -> ToolPaths {
        match env::var_os(FSLDIR_ENV) {
            Some(dir) if !dir.is_empty() => ToolPaths::with_fsl_dir(Path::new(&dir)),
            _ => ToolPaths::default(),
        }
    }

    /// Use the FSL tools from the given FSL installation directory.
    pub fn with_fsl_dir(fsl_dir: &Path) -> ToolPaths {
        let bin = fsl_dir.join("bin");
        ToolPaths {
            cluster: bin.join("cluster"),
            atlasquery: bin.join("atlasquery"),
            fslmaths: bin.join("fslmaths"),
            ..ToolPaths::default()
        }
    }
}

impl Default for ToolPaths {
    /// All tools are looked up in `PATH`.
    fn default() -> ToolPaths {
        ToolPaths {
            wb_command: PathBuf::from("wb_command"),
            cluster: PathBuf::from("cluster"),
            atlasquery: PathBuf::from("atlasquery"),
            fslmaths: PathBuf::from("fslmaths"),
        }
    }
}


/// Cluster-forming parameters passed to `wb_command -cifti-find-clusters` and FSL `cluster`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    /// Values below this threshold are not part of any cluster.
    pub threshold: f64,
    /// Minimum distance between clusters (mm).
    pub min_distance: f64,
}

impl ClusterParams {
    pub const CIFTI_DEFAULT: ClusterParams = ClusterParams { threshold: 1.77, min_distance: 20.0 };
    pub const NIFTI_DEFAULT: ClusterParams = ClusterParams { threshold: 0.95, min_distance: 0.0 };

    pub fn new(threshold: f64, min_distance: f64) -> ClusterParams {
        ClusterParams { threshold, min_distance }
    }
}

impl fmt::Display for ClusterParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "threshold {}, minimum cluster distance {}", self.threshold, self.min_distance)
    }
}
