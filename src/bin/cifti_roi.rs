//! cifti_roi -- finds CIFTI surface and volume clusters and writes the overlapping ROIs to a CSV file.
//!
//! Requires Connectome Workbench (`wb_command`) and, for the volume part, FSL (`cluster`, `atlasquery`).

use clap::Parser;
use log::error;

use std::path::PathBuf;
use std::process::exit;

use clusterroi::atlas::HARVARD_OXFORD_SUBCORTICAL;
use clusterroi::{CiftiRoiJob, ClusterParams, Result, ToolPaths, VolumeAtlas};

#[derive(Parser, Debug)]
#[command(author, version, about = "Finds CIFTI surface clusters and writes the overlapping ROIs to a CSV file.")]
struct Args {
    /// CIFTI dense scalar statistics file.
    #[arg(short, long, value_name = "STATS.dscalar.nii")]
    input: PathBuf,

    /// Output spreadsheet name. Rows are appended if it exists.
    #[arg(short, long, value_name = "OUTPUT.csv")]
    output: PathBuf,

    /// Left GIFTI surface (preferably midthickness).
    #[arg(short, long = "left-surface", value_name = "GII")]
    left: PathBuf,

    /// Right GIFTI surface (preferably midthickness).
    #[arg(short, long = "right-surface", value_name = "GII")]
    right: PathBuf,

    /// CIFTI dense label atlas file.
    #[arg(short, long, value_name = "ATLAS.dlabel.nii")]
    atlas: PathBuf,

    /// Cluster threshold.
    #[arg(short, long, value_name = "FLOAT", default_value_t = ClusterParams::CIFTI_DEFAULT.threshold)]
    thresh: f64,

    /// Minimum distance between clusters.
    #[arg(short, long = "distance", value_name = "FLOAT", default_value_t = ClusterParams::CIFTI_DEFAULT.min_distance)]
    dist: f64,

    /// FSL atlas number for the volume (subcortical) clusters. See 'nifti_roi --dump-atlases'.
    #[arg(long = "atlas-num", value_name = "INT", default_value_t = HARVARD_OXFORD_SUBCORTICAL)]
    atlas_num: u32,
}

fn run(args: Args) -> Result<()> {
    let job = CiftiRoiJob {
        stats_file: args.input,
        atlas_file: args.atlas,
        left_surface: args.left,
        right_surface: args.right,
        out_file: args.output,
        params: ClusterParams::new(args.thresh, args.dist),
        volume_atlas: Some(VolumeAtlas::from_number(args.atlas_num)?),
        tools: ToolPaths::from_env(),
    };

    let report = job.run()?;
    match report.written {
        Some(path) => println!("{}", path.display()),
        None => println!("No ROIs overlap the clusters of '{}'.", job.stats_file.display()),
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        exit(1);
    }
}
