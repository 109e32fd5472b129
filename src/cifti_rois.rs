//! Find the ROIs overlapping significant clusters of a CIFTI dense scalar file.
//!
//! The cortical surface clusters are matched against a CIFTI dense label atlas per hemisphere, vertex by vertex.
//! Clusters in the volume part of the CIFTI file (subcortical structures) are located by their peak coordinates,
//! which are looked up in a volumetric FSL atlas.

use log::info;
use ndarray::Array1;

use std::fs;
use std::path::{Path, PathBuf};

use crate::atlas::{AtlasDict, VolumeAtlas, HARVARD_OXFORD_SUBCORTICAL};
use crate::config::{ClusterParams, ToolPaths};
use crate::error::Result;
use crate::fsl;
use crate::gifti::read_gifti;
use crate::overlap::{any_nonzero_rows, overlapping_rois};
use crate::report::{write_rois, RoiReport};
use crate::wb_command::{self, Structure};

const CLUSTERS_FILE: &str = "clusters.dscalar.nii";
const LABEL_FILE: &str = "data.label.gii";
const METRIC_FILE: &str = "data.func.gii";
const VOLUME_FILE: &str = "data.nii.gz";
const VOLUME_TABLE_FILE: &str = "vol.cluster.tsv";


/// All inputs of a CIFTI ROI search.
#[derive(Debug, Clone, PartialEq)]
pub struct CiftiRoiJob {
    /// The CIFTI dense scalar statistics file.
    pub stats_file: PathBuf,
    /// The CIFTI dense label atlas.
    pub atlas_file: PathBuf,
    /// Left and right surfaces (preferably midthickness) used for surface distances.
    pub left_surface: PathBuf,
    pub right_surface: PathBuf,
    pub out_file: PathBuf,
    pub params: ClusterParams,
    /// The atlas for subcortical cluster peaks. `None` skips the volume part.
    pub volume_atlas: Option<VolumeAtlas>,
    pub tools: ToolPaths,
}

impl CiftiRoiJob {

    /// A job with the default cluster parameters, the Harvard-Oxford subcortical atlas and tools from the environment.
    pub fn new<P: Into<PathBuf>>(stats_file: P, atlas_file: P, left_surface: P, right_surface: P, out_file: P) -> Result<CiftiRoiJob> {
        Ok(CiftiRoiJob {
            stats_file: stats_file.into(),
            atlas_file: atlas_file.into(),
            left_surface: left_surface.into(),
            right_surface: right_surface.into(),
            out_file: out_file.into(),
            params: ClusterParams::CIFTI_DEFAULT,
            volume_atlas: Some(VolumeAtlas::from_number(HARVARD_OXFORD_SUBCORTICAL)?),
            tools: ToolPaths::from_env(),
        })
    }

    /// Find the clusters, collect the overlapping ROIs of both hemispheres and the subcortical volume, and
    /// append them to the output table.
    pub fn run(&self) -> Result<RoiReport> {
        let scratch = tempfile::Builder::new().prefix("clusterroi-cifti").tempdir()?;
        let clusters_file = scratch.path().join(CLUSTERS_FILE);

        info!("Finding clusters in '{}' ({}).", self.stats_file.display(), self.params);
        wb_command::cifti_find_clusters(
            &self.tools, &self.stats_file, &self.params, &clusters_file, &self.left_surface, &self.right_surface)?;

        let mut rois = Vec::new();
        for structure in Structure::CORTEX.iter() {
            let hemi_rois = hemisphere_rois(&self.tools, &clusters_file, &self.atlas_file, *structure, scratch.path())?;
            info!("{}: {} ROIs overlap clusters.", structure, hemi_rois.len());
            rois.extend(hemi_rois);
        }
        fs::remove_file(&clusters_file)?;

        match self.volume_atlas {
            Some(atlas) if !cfg!(windows) => {
                let vol_rois = subcortical_rois(&self.tools, &self.stats_file, &self.params, atlas, scratch.path())?;
                info!("Volume: {} cluster peaks located in the {}.", vol_rois.len(), atlas);
                rois.extend(vol_rois);
            }
            Some(_) => info!("FSL is not available on Windows, skipping the volume part."),
            None => {}
        }

        let written = write_rois(&self.stats_file, &self.out_file, &rois)?;
        Ok(RoiReport { rois, written })
    }
}


/// Find the atlas ROIs overlapped by the clusters of one cortical hemisphere.
///
/// `clusters_file` is the output of `wb_command -cifti-find-clusters`. Intermediate GIFTI files go to `scratch_dir`.
pub fn hemisphere_rois(tools: &ToolPaths, clusters_file: &Path, atlas_file: &Path, structure: Structure, scratch_dir: &Path) -> Result<Vec<String>> {
    let label_file = scratch_dir.join(LABEL_FILE);
    wb_command::cifti_separate_label(tools, atlas_file, structure, &label_file)?;
    let (atlas, dict) = load_hemi_labels(&label_file)?;
    fs::remove_file(&label_file)?;

    let metric_file = scratch_dir.join(METRIC_FILE);
    wb_command::cifti_separate_metric(tools, clusters_file, structure, &metric_file)?;
    let clusters = load_hemi_clusters(&metric_file)?;
    fs::remove_file(&metric_file)?;

    overlapping_rois(&clusters, &atlas, &dict)
}


/// Read the first label map of a GIFTI label file, with its label table.
pub fn load_hemi_labels(label_file: &Path) -> Result<(Array1<i32>, AtlasDict)> {
    let gii = read_gifti(label_file)?;
    let atlas = Array1::from(gii.label_data(1)?);
    let dict = AtlasDict::from_label_table(&gii.label_table);
    Ok((atlas, dict))
}


/// Read the cluster maps of a GIFTI metric file into one cluster array.
pub fn load_hemi_clusters(metric_file: &Path) -> Result<Array1<f32>> {
    let gii = read_gifti(metric_file)?;
    Ok(any_nonzero_rows(&gii.stacked_metric_data()?))
}


/// Locate the clusters of the volume part of a CIFTI file by querying their peaks in a volumetric atlas.
pub fn subcortical_rois(tools: &ToolPaths, stats_file: &Path, params: &ClusterParams, atlas: VolumeAtlas, scratch_dir: &Path) -> Result<Vec<String>> {
    let volume_file = scratch_dir.join(VOLUME_FILE);
    wb_command::cifti_separate_volume_all(tools, stats_file, &volume_file)?;

    let table_file = scratch_dir.join(VOLUME_TABLE_FILE);
    let peaks = fsl::cluster_peaks(tools, &volume_file, params, &table_file)?;
    fs::remove_file(&table_file)?;
    fs::remove_file(&volume_file)?;

    fsl::query_peaks(tools, atlas, &peaks)
}


#[cfg(test)]
mod test {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    fn write_label_gifti(path: &Path, labels: &[i32]) {
        let mut bytes = Vec::new();
        for v in labels {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let xml = format!(r#"<?xml version="1.0" encoding="UTF-8"?>
<GIFTI Version="1.0" NumberOfDataArrays="1">
  <LabelTable>
    <Label Key="0"><![CDATA[???]]></Label>
    <Label Key="1"><![CDATA[L_V1_ROI]]></Label>
    <Label Key="2"><![CDATA[L_MST_ROI]]></Label>
    <Label Key="3"><![CDATA[L_V6_ROI]]></Label>
  </LabelTable>
  <DataArray Intent="NIFTI_INTENT_LABEL" DataType="NIFTI_TYPE_INT32" Dimensionality="1" Dim0="{}" Encoding="Base64Binary" Endian="LittleEndian">
    <Data>{}</Data>
  </DataArray>
</GIFTI>"#, labels.len(), STANDARD.encode(bytes));
        fs::write(path, xml).unwrap();
    }

    fn write_metric_gifti(path: &Path, maps: &[&[f32]]) {
        let mut xml = String::from("<GIFTI Version=\"1.0\">\n");
        for map in maps {
            let values: Vec<String> = map.iter().map(|v| v.to_string()).collect();
            xml.push_str(&format!(
                "<DataArray Intent=\"NIFTI_INTENT_NORMAL\" DataType=\"NIFTI_TYPE_FLOAT32\" Dimensionality=\"1\" Dim0=\"{}\" Encoding=\"ASCII\"><Data>{}</Data></DataArray>\n",
                map.len(), values.join(" ")));
        }
        xml.push_str("</GIFTI>\n");
        fs::write(path, xml).unwrap();
    }

    #[test]
    fn hemisphere_files_are_matched_vertex_by_vertex() {
        let dir = tempfile::tempdir().unwrap();
        let label_file = dir.path().join(LABEL_FILE);
        let metric_file = dir.path().join(METRIC_FILE);
        write_label_gifti(&label_file, &[1, 1, 2, 3, 0, 2]);
        write_metric_gifti(&metric_file, &[&[0.0, 0.0, 1.0, 0.0, 1.0, 0.0], &[0.0, 0.0, 0.0, 2.0, 0.0, 0.0]]);

        let (atlas, dict) = load_hemi_labels(&label_file).unwrap();
        assert_eq!(4, dict.len());
        let clusters = load_hemi_clusters(&metric_file).unwrap();
        assert_eq!(atlas.len(), clusters.len());

        assert_eq!(vec!["L_MST_ROI", "L_V6_ROI"], overlapping_rois(&clusters, &atlas, &dict).unwrap());
    }

    #[test]
    fn jobs_use_the_cifti_defaults() {
        let job = CiftiRoiJob::new("stats.dscalar.nii", "atlas.dlabel.nii", "L.surf.gii", "R.surf.gii", "rois.csv").unwrap();
        assert_eq!(ClusterParams::CIFTI_DEFAULT, job.params);
        assert_eq!(Some(HARVARD_OXFORD_SUBCORTICAL), job.volume_atlas.map(|a| a.number()));
    }

    #[test]
    fn missing_workbench_is_an_error() {
        let mut job = CiftiRoiJob::new("stats.dscalar.nii", "atlas.dlabel.nii", "L.surf.gii", "R.surf.gii", "rois.csv").unwrap();
        job.tools.wb_command = PathBuf::from("clusterroi-no-such-wb_command");
        assert!(job.run().is_err());
    }
}
