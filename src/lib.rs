//! Find the anatomical regions of interest (ROIs) that overlap significant clusters in neuroimaging statistics.
//!
//! Supports CIFTI dense scalar files (surface clusters matched against a CIFTI label atlas, volume clusters looked
//! up in an FSL atlas) and NIFTI volumes. Cluster detection, CIFTI separation and atlas queries are done by the
//! external tools of Connectome Workbench and FSL.

pub mod atlas;
pub mod cifti_rois;
pub mod command;
pub mod config;
pub mod error;
pub mod fsl;
pub mod gifti;
pub mod nifti_rois;
pub mod nifti_vol;
pub mod overlap;
pub mod report;
pub mod util;
pub mod wb_command;

pub use atlas::{AtlasDict, VolumeAtlas};
pub use cifti_rois::CiftiRoiJob;
pub use config::{ClusterParams, ToolPaths};
pub use error::{Result, RoiError};
pub use gifti::{read_gifti, GiftiImage};
pub use nifti_rois::{AtlasSource, NiftiRoiJob};
pub use nifti_vol::{read_cluster_volume, read_label_volume};
pub use overlap::{mask_atlas, overlapping_labels, overlapping_rois};
pub use report::{write_rois, RoiReport};
