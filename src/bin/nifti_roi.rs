//! nifti_roi -- finds NIFTI volume clusters and writes the overlapping ROIs to a CSV file.
//!
//! Requires FSL (`cluster`, plus `fslmaths` or `atlasquery` depending on the atlas).

use clap::Parser;
use log::error;

use std::path::PathBuf;
use std::process::exit;

use clusterroi::{AtlasSource, ClusterParams, NiftiRoiJob, Result, ToolPaths, VolumeAtlas};

const ABOUT: &str = "Finds NIFTI volume clusters and writes the overlapping ROIs to a CSV file.";

const LONG_ABOUT: &str = "Finds NIFTI volume clusters and writes the overlapping ROIs to a CSV file.

The ROIs are found with one of two methods:

1. An FSL atlas number is given with '--atlas-num'. The peak of each cluster is looked up in
   that atlas, which requires the input volume to be in MNI space.
2. An atlas volume is given with '--atlas', along with a CSV file ('--atlas-info') of
   'label,name' rows for its ROIs. Clusters are matched voxel by voxel, which requires the
   input volume to be in the space of the atlas.

For a list of available atlases, see the '--dump-atlases' option.";

#[derive(Parser, Debug)]
#[command(author, version, about = ABOUT, long_about = LONG_ABOUT)]
struct Args {
    /// NIFTI statistics image.
    #[arg(short, long, value_name = "STATS.nii.gz")]
    input: Option<PathBuf>,

    /// Output spreadsheet name. Rows are appended if it exists.
    #[arg(short, long, value_name = "OUTPUT.csv")]
    output: Option<PathBuf>,

    /// Atlas number. See '--dump-atlases' for details.
    #[arg(long = "atlas-num", value_name = "INT", help_heading = "Atlasquery options")]
    atlas_num: Option<u32>,

    /// NIFTI atlas file.
    #[arg(short, long, value_name = "ATLAS.nii.gz", help_heading = "Stand-alone atlas options")]
    atlas: Option<PathBuf>,

    /// Atlas information file with 'label,name' rows.
    #[arg(long = "atlas-info", value_name = "ATLAS.info.csv", help_heading = "Stand-alone atlas options")]
    info: Option<PathBuf>,

    /// Cluster threshold.
    #[arg(short, long, value_name = "FLOAT", default_value_t = ClusterParams::NIFTI_DEFAULT.threshold)]
    thresh: f64,

    /// Minimum distance between clusters.
    #[arg(short, long = "distance", value_name = "FLOAT", default_value_t = ClusterParams::NIFTI_DEFAULT.min_distance)]
    dist: f64,

    /// Prints the available atlases and their atlas numbers.
    #[arg(long = "dump-atlases")]
    dump_atlases: bool,
}

/// Choose the atlas from the options. A stand-alone atlas takes precedence over an atlas number.
fn atlas_source(args: &Args) -> Option<Result<AtlasSource>> {
    match (&args.atlas, &args.info, args.atlas_num) {
        (Some(atlas), Some(info), _) => Some(Ok(AtlasSource::Image { atlas: atlas.clone(), info: info.clone() })),
        (_, _, Some(num)) => Some(VolumeAtlas::from_number(num).map(AtlasSource::Query)),
        _ => None,
    }
}

fn invalid_options() -> ! {
    eprintln!();
    eprintln!("No valid options specified. Please see help menu for details.");
    eprintln!();
    exit(1);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if cfg!(windows) {
        eprintln!("The required software (FSL) is not installable on Windows platforms. Exiting.");
        exit(1);
    }

    let args = Args::parse();
    if args.dump_atlases {
        print!("{}", VolumeAtlas::listing());
        return;
    }

    let (input, output) = match (&args.input, &args.output) {
        (Some(i), Some(o)) => (i.clone(), o.clone()),
        _ => invalid_options(),
    };
    let source = match atlas_source(&args) {
        Some(Ok(source)) => source,
        Some(Err(e)) => {
            error!("{}", e);
            exit(1);
        }
        None => invalid_options(),
    };

    let job = NiftiRoiJob {
        stats_file: input,
        out_file: output,
        atlas: source,
        params: ClusterParams::new(args.thresh, args.dist),
        tools: ToolPaths::from_env(),
    };
    match job.run() {
        Ok(report) => match report.written {
            Some(path) => println!("{}", path.display()),
            None => println!("No ROIs overlap the clusters of '{}'.", job.stats_file.display()),
        },
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    }
}
