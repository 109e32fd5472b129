//! Wrappers for the FSL tools `cluster`, `atlasquery` and `fslmaths`, and parsers for their text output.

use csv::{ReaderBuilder, StringRecord};
use log::debug;

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::atlas::VolumeAtlas;
use crate::command::ExternalCommand;
use crate::config::{ClusterParams, ToolPaths};
use crate::error::{Result, RoiError};

pub const COL_CLUSTER_INDEX: &str = "Cluster Index";
pub const COL_VOXELS: &str = "Voxels";
pub const COL_MAX_X_MM: &str = "MAX X (mm)";
pub const COL_MAX_Y_MM: &str = "MAX Y (mm)";
pub const COL_MAX_Z_MM: &str = "MAX Z (mm)";

/// Printed by `atlasquery` for coordinates outside of all atlas regions.
const NO_LABEL_FOUND: &str = "No label found!";


/// One row of the FSL `cluster` table: a cluster and the location of its maximum in MNI space.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPeak {
    pub index: u32,
    pub voxels: u64,
    /// The x, y, z coordinates (mm) of the cluster maximum.
    pub max_mm: [f32; 3],
}


fn flag_path(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path);
    arg
}

fn cluster_cmd(tools: &ToolPaths, input: &Path, params: &ClusterParams) -> ExternalCommand {
    let mut cmd = ExternalCommand::new(&tools.cluster);
    cmd.arg(flag_path("--in=", input))
        .arg(format!("--thresh={}", params.threshold))
        .arg(format!("--peakdist={}", params.min_distance));
    cmd
}

/// Build the `cluster` command that reports the cluster table with coordinates in mm.
pub fn cluster_peaks_cmd(tools: &ToolPaths, input: &Path, params: &ClusterParams) -> ExternalCommand {
    let mut cmd = cluster_cmd(tools, input, params);
    cmd.arg("--mm");
    cmd
}

/// Build the `cluster` command that writes a cluster index volume, in which each voxel holds the index of its cluster.
pub fn cluster_index_cmd(tools: &ToolPaths, input: &Path, params: &ClusterParams, output: &Path) -> ExternalCommand {
    let mut cmd = cluster_cmd(tools, input, params);
    cmd.arg(flag_path("--oindex=", output));
    cmd
}

/// Run FSL `cluster` on a volume and parse the resulting cluster table.
pub fn cluster_peaks(tools: &ToolPaths, input: &Path, params: &ClusterParams, table_file: &Path) -> Result<Vec<ClusterPeak>> {
    cluster_peaks_cmd(tools, input, params).run_to_file(table_file)?;
    let peaks = parse_cluster_table(BufReader::new(File::open(table_file)?))?;
    debug!("FSL cluster found {} clusters in '{}'.", peaks.len(), input.display());
    Ok(peaks)
}

/// Run FSL `cluster` and write the cluster index volume to `output`. The cluster table goes to `table_file`.
pub fn cluster_index_volume(tools: &ToolPaths, input: &Path, params: &ClusterParams, output: &Path, table_file: &Path) -> Result<()> {
    cluster_index_cmd(tools, input, params, output).run_to_file(table_file)
}


fn column_index(header: &StringRecord, name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| RoiError::MissingColumn(name.to_string()))
}

fn parse_field<T: std::str::FromStr>(record: &StringRecord, idx: usize, name: &str) -> Result<T> {
    let field = record.get(idx).unwrap_or("").trim();
    field
        .parse()
        .map_err(|_| RoiError::InvalidClusterTable(format!("invalid value '{}' in column '{}'", field, name)))
}

/// Parse the tab separated table that FSL `cluster` prints, with `--mm` coordinates.
pub fn parse_cluster_table<R: Read>(input: R) -> Result<Vec<ClusterPeak>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let header = rdr.headers()?.clone();
    let idx_col = column_index(&header, COL_CLUSTER_INDEX)?;
    let vox_col = column_index(&header, COL_VOXELS)?;
    let xyz_cols = [
        column_index(&header, COL_MAX_X_MM)?,
        column_index(&header, COL_MAX_Y_MM)?,
        column_index(&header, COL_MAX_Z_MM)?,
    ];

    let mut peaks = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        peaks.push(ClusterPeak {
            index: parse_field(&record, idx_col, COL_CLUSTER_INDEX)?,
            voxels: parse_field(&record, vox_col, COL_VOXELS)?,
            max_mm: [
                parse_field(&record, xyz_cols[0], COL_MAX_X_MM)?,
                parse_field(&record, xyz_cols[1], COL_MAX_Y_MM)?,
                parse_field(&record, xyz_cols[2], COL_MAX_Z_MM)?,
            ],
        });
    }
    Ok(peaks)
}


/// Build the `atlasquery` command for a single MNI coordinate.
pub fn atlas_query_cmd(tools: &ToolPaths, atlas: VolumeAtlas, coord: [f32; 3]) -> ExternalCommand {
    let mut cmd = ExternalCommand::new(&tools.atlasquery);
    cmd.arg("-a")
        .arg(atlas.name())
        .arg("-c")
        .arg(format!("{},{},{}", coord[0], coord[1], coord[2]));
    cmd
}

/// Look up the atlas regions at an MNI coordinate (mm) with `atlasquery`.
pub fn atlas_query(tools: &ToolPaths, atlas: VolumeAtlas, coord: [f32; 3]) -> Result<Vec<String>> {
    let output = atlas_query_cmd(tools, atlas, coord).run_capture()?;
    Ok(parse_atlas_query(&output, atlas))
}

/// Extract the region descriptions from `atlasquery` output, which prefixes them with the bold atlas name.
///
/// Empty lines and the "No label found!" message are dropped.
pub fn parse_atlas_query(output: &str, atlas: VolumeAtlas) -> Vec<String> {
    let prefix = format!("<b>{}</b><br>", atlas.name());
    output
        .lines()
        .map(|line| line.trim_end().replace(&prefix, ""))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty() && line != NO_LABEL_FOUND)
        .collect()
}


/// Look up the atlas regions at the peaks of all clusters, in cluster table order.
pub fn query_peaks(tools: &ToolPaths, atlas: VolumeAtlas, peaks: &[ClusterPeak]) -> Result<Vec<String>> {
    let mut rois = Vec::new();
    for peak in peaks {
        let peak_rois = atlas_query(tools, atlas, peak.max_mm)?;
        debug!("Cluster {} ({} voxels) peak at {:?}: {:?}", peak.index, peak.voxels, peak.max_mm, peak_rois);
        rois.extend(peak_rois);
    }
    Ok(rois)
}


/// Build the `fslmaths` command that converts an image to the given data type, e.g. "int".
pub fn convert_datatype_cmd(tools: &ToolPaths, input: &Path, output: &Path, data_type: &str) -> ExternalCommand {
    let mut cmd = ExternalCommand::new(&tools.fslmaths);
    cmd.arg("-dt")
        .arg(data_type)
        .arg(input)
        .arg(output)
        .arg("-odt")
        .arg(data_type);
    cmd
}

/// Convert an image to another data type with `fslmaths`.
pub fn convert_datatype(tools: &ToolPaths, input: &Path, output: &Path, data_type: &str) -> Result<()> {
    convert_datatype_cmd(tools, input, output, data_type).run()
}
