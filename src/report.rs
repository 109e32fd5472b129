//! Writing the ROI table. Each processed statistical image adds one row, so results of many runs
//! accumulate in the same CSV file.

use csv::WriterBuilder;
use log::info;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::util::absolute_path;

pub const HEADER: [&str; 2] = ["File", "ROIs"];

/// Separator between the ROI names within the `ROIs` column.
pub const ROI_SEPARATOR: &str = "; ";


/// The outcome of one ROI search.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiReport {
    /// The ROIs overlapping any cluster, surface ROIs first.
    pub rois: Vec<String>,
    /// The table the ROIs were written to. `None` if no ROI was found and nothing was written.
    pub written: Option<PathBuf>,
}


/// Normalise the output file name: ".csv", ".tsv" and ".txt" extensions become ".csv", any other name gets ".csv" appended.
pub fn csv_output_path<P: AsRef<Path>>(out_file: P) -> PathBuf {
    let out_file = out_file.as_ref();
    match out_file.extension().and_then(|e| e.to_str()) {
        Some("csv") | Some("tsv") | Some("txt") => out_file.with_extension("csv"),
        _ => {
            let mut name = out_file.as_os_str().to_os_string();
            name.push(".csv");
            PathBuf::from(name)
        }
    }
}


/// Render a ROI list as the content of a single CSV field.
pub fn format_roi_list(rois: &[String]) -> String {
    rois.join(ROI_SEPARATOR)
}


/// Append a row for `image_file` to the CSV table at `out_file` (normalised with [`csv_output_path`]).
///
/// The header is written only if the table does not exist yet or is empty. Nothing is written for an empty ROI list.
///
/// The `ROIs` field is always rendered with [`format_roi_list`]. Existing rows are never rewritten: a table started
/// by a tool that wrote the field as a bracketed list such as `['L_V1_ROI', 'R_V1_ROI']` keeps those rows as they
/// are, so its `ROIs` column then holds both forms.
///
/// Returns the path of the table if a row was written.
pub fn write_rois<P: AsRef<Path>, Q: AsRef<Path>>(image_file: P, out_file: Q, rois: &[String]) -> Result<Option<PathBuf>> {
    if rois.is_empty() {
        info!("No ROIs overlap any cluster of '{}', nothing written.", image_file.as_ref().display());
        return Ok(None);
    }

    let out_file = csv_output_path(out_file);
    let file = OpenOptions::new().create(true).append(true).open(&out_file)?;
    let needs_header = file.metadata()?.len() == 0;

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
    if needs_header {
        wtr.write_record(&HEADER)?;
    }
    let image_file = absolute_path(image_file)?;
    wtr.write_record(&[image_file.to_string_lossy().into_owned(), format_roi_list(rois)])?;
    wtr.flush()?;

    info!("Wrote {} ROIs for '{}' to '{}'.", rois.len(), image_file.display(), out_file.display());
    Ok(Some(out_file))
}
