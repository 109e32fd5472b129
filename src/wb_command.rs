//! Wrappers for the Connectome Workbench `wb_command` operations used on CIFTI files.

use std::fmt;
use std::path::Path;

use crate::command::ExternalCommand;
use crate::config::{ClusterParams, ToolPaths};
use crate::error::Result;


/// A CIFTI brain structure that can be separated into its own file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    CortexLeft,
    CortexRight,
}

impl Structure {
    /// Both cortical hemispheres, left first.
    pub const CORTEX: [Structure; 2] = [Structure::CortexLeft, Structure::CortexRight];

    /// The structure name as used on the `wb_command` command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Structure::CortexLeft => "CORTEX_LEFT",
            Structure::CortexRight => "CORTEX_RIGHT",
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}


/// Build the `-cifti-find-clusters` command. Surface and volume use the same threshold and distance.
pub fn find_clusters_cmd(tools: &ToolPaths, input: &Path, params: &ClusterParams, output: &Path, left_surface: &Path, right_surface: &Path) -> ExternalCommand {
    let thresh = params.threshold.to_string();
    let distance = params.min_distance.to_string();

    let mut cmd = ExternalCommand::new(&tools.wb_command);
    cmd.arg("-cifti-find-clusters")
        .arg(input)
        .args(&[&thresh, &distance, &thresh, &distance])
        .arg("COLUMN")
        .arg(output)
        .arg("-left-surface")
        .arg(left_surface)
        .arg("-right-surface")
        .arg(right_surface);
    cmd
}

/// Find clusters in a CIFTI dense scalar file, writing a CIFTI file in which each cluster has its own non-zero value.
pub fn cifti_find_clusters(tools: &ToolPaths, input: &Path, params: &ClusterParams, output: &Path, left_surface: &Path, right_surface: &Path) -> Result<()> {
    find_clusters_cmd(tools, input, params, output, left_surface, right_surface).run()
}


/// Build a `-cifti-separate` command that extracts one part of a CIFTI file, `kind` is e.g. "-label" or "-metric".
fn separate_cmd(tools: &ToolPaths, input: &Path, kind: &str, structure: Option<Structure>, output: &Path) -> ExternalCommand {
    let mut cmd = ExternalCommand::new(&tools.wb_command);
    cmd.arg("-cifti-separate").arg(input).arg("COLUMN").arg(kind);
    if let Some(s) = structure {
        cmd.arg(s.as_str());
    }
    cmd.arg(output);
    cmd
}

pub fn separate_label_cmd(tools: &ToolPaths, input: &Path, structure: Structure, output: &Path) -> ExternalCommand {
    separate_cmd(tools, input, "-label", Some(structure), output)
}

pub fn separate_metric_cmd(tools: &ToolPaths, input: &Path, structure: Structure, output: &Path) -> ExternalCommand {
    separate_cmd(tools, input, "-metric", Some(structure), output)
}

pub fn separate_volume_all_cmd(tools: &ToolPaths, input: &Path, output: &Path) -> ExternalCommand {
    separate_cmd(tools, input, "-volume-all", None, output)
}

/// Extract the labels of one hemisphere of a CIFTI dense label file into a GIFTI label file.
pub fn cifti_separate_label(tools: &ToolPaths, input: &Path, structure: Structure, output: &Path) -> Result<()> {
    separate_label_cmd(tools, input, structure, output).run()
}

/// Extract the data of one hemisphere of a CIFTI dense scalar file into a GIFTI metric file.
pub fn cifti_separate_metric(tools: &ToolPaths, input: &Path, structure: Structure, output: &Path) -> Result<()> {
    separate_metric_cmd(tools, input, structure, output).run()
}

/// Extract all volume structures of a CIFTI file into one NIFTI volume.
pub fn cifti_separate_volume_all(tools: &ToolPaths, input: &Path, output: &Path) -> Result<()> {
    separate_volume_all_cmd(tools, input, output).run()
}
