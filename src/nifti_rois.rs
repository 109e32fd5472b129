//! Find the ROIs overlapping significant clusters of a NIFTI volume.
//!
//! Two kinds of atlas are supported. A labelled atlas volume in the space of the statistics image, together with a
//! CSV table of its labels, is matched voxel by voxel against the FSL cluster index volume. Alternatively, the peaks of
//! all clusters are looked up by their MNI coordinates in one of the FSL atlases, which requires the statistics image
//! to be in MNI space.

use log::info;

use std::fs;
use std::path::{Path, PathBuf};

use crate::atlas::{AtlasDict, VolumeAtlas};
use crate::config::{ClusterParams, ToolPaths};
use crate::error::Result;
use crate::fsl;
use crate::nifti_vol::{num_clusters, read_cluster_volume, read_label_volume};
use crate::overlap::overlapping_rois;
use crate::report::{write_rois, RoiReport};
use crate::util::nifti_basename;

/// Data type the atlas volume is converted to before its labels are read.
const ATLAS_DATA_TYPE: &str = "int";


/// Where the ROI names come from.
#[derive(Debug, Clone, PartialEq)]
pub enum AtlasSource {
    /// A labelled atlas volume and its `label,name` CSV table.
    Image { atlas: PathBuf, info: PathBuf },
    /// An FSL atlas queried at the cluster peaks.
    Query(VolumeAtlas),
}


/// All inputs of a NIFTI ROI search.
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiRoiJob {
    pub stats_file: PathBuf,
    pub out_file: PathBuf,
    pub atlas: AtlasSource,
    pub params: ClusterParams,
    pub tools: ToolPaths,
}

impl NiftiRoiJob {

    /// A job with the default cluster parameters and tools from the environment.
    pub fn new<P: Into<PathBuf>>(stats_file: P, out_file: P, atlas: AtlasSource) -> NiftiRoiJob {
        NiftiRoiJob {
            stats_file: stats_file.into(),
            out_file: out_file.into(),
            atlas,
            params: ClusterParams::NIFTI_DEFAULT,
            tools: ToolPaths::from_env(),
        }
    }

    /// Find the clusters, collect the overlapping ROIs and append them to the output table.
    pub fn run(&self) -> Result<RoiReport> {
        let scratch = tempfile::Builder::new().prefix("clusterroi-nifti").tempdir()?;

        info!("Finding clusters in '{}' ({}).", self.stats_file.display(), self.params);
        let rois = match &self.atlas {
            AtlasSource::Image { atlas, info } => {
                image_atlas_rois(&self.tools, &self.stats_file, &self.params, atlas, info, scratch.path())?
            }
            AtlasSource::Query(atlas) => {
                query_atlas_rois(&self.tools, &self.stats_file, &self.params, *atlas, scratch.path())?
            }
        };
        info!("{} ROIs overlap clusters.", rois.len());

        let written = write_rois(&self.stats_file, &self.out_file, &rois)?;
        Ok(RoiReport { rois, written })
    }
}


/// Match the FSL cluster index volume of `stats_file` against a labelled atlas volume.
pub fn image_atlas_rois(tools: &ToolPaths, stats_file: &Path, params: &ClusterParams, atlas_file: &Path, info_file: &Path, scratch_dir: &Path) -> Result<Vec<String>> {
    let dict = AtlasDict::from_csv_file(info_file)?;
    info!("Loaded {}", dict);

    let int_atlas = scratch_dir.join(format!("{}.int.nii.gz", nifti_basename(atlas_file)));
    fsl::convert_datatype(tools, atlas_file, &int_atlas, ATLAS_DATA_TYPE)?;
    let atlas = read_label_volume(&int_atlas)?;
    fs::remove_file(&int_atlas)?;

    let prefix = format!("{}.cluster", nifti_basename(stats_file));
    let index_file = scratch_dir.join(format!("{}.nii.gz", prefix));
    let table_file = scratch_dir.join(format!("{}.txt", prefix));
    fsl::cluster_index_volume(tools, stats_file, params, &index_file, &table_file)?;
    let clusters = read_cluster_volume(&index_file)?;
    fs::remove_file(&index_file)?;
    fs::remove_file(&table_file)?;
    info!("Found {} clusters.", num_clusters(&clusters));

    overlapping_rois(&clusters, &atlas, &dict)
}


/// Look up the peaks of the clusters of `stats_file` in an FSL atlas.
pub fn query_atlas_rois(tools: &ToolPaths, stats_file: &Path, params: &ClusterParams, atlas: VolumeAtlas, scratch_dir: &Path) -> Result<Vec<String>> {
    let table_file = scratch_dir.join("vol.cluster.tsv");
    let peaks = fsl::cluster_peaks(tools, stats_file, params, &table_file)?;
    fs::remove_file(&table_file)?;
    info!("Found {} clusters, querying the {}.", peaks.len(), atlas);
    fsl::query_peaks(tools, atlas, &peaks)
}
