//! Functions for reading NIFTI brain volumes into arrays.
//!
//! Cluster volumes (e.g. the cluster index image written by FSL `cluster --oindex`) are read as
//! `f32`, atlas volumes as integer labels.

use ndarray::{ArrayD, Axis};
use ndarray_stats::QuantileExt;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use std::path::Path;

use crate::error::Result;


/// Read a NIFTI volume (".nii" or ".nii.gz") as `f32` values. Scaling from the header is applied.
///
/// Trailing axes of length one are dropped, so a 4D image holding a single volume has the same
/// shape as its 3D counterpart.
pub fn read_cluster_volume<P: AsRef<Path>>(path: P) -> Result<ArrayD<f32>> {
    let obj = ReaderOptions::new().read_file(path.as_ref())?;
    Ok(squeeze_trailing(obj.into_volume().into_ndarray::<f32>()?))
}


/// Drop trailing axes of length one, e.g. the time axis of a single-volume image. At least one axis is kept.
pub fn squeeze_trailing<A>(mut data: ArrayD<A>) -> ArrayD<A> {
    while data.ndim() > 1 && data.shape()[data.ndim() - 1] == 1 {
        let last = Axis(data.ndim() - 1);
        data = data.index_axis_move(last, 0);
    }
    data
}


/// Read a NIFTI label volume. Values are rounded to the nearest integer label.
pub fn read_label_volume<P: AsRef<Path>>(path: P) -> Result<ArrayD<i32>> {
    let data = read_cluster_volume(path)?;
    Ok(data.mapv(|v| v.round() as i32))
}


/// The number of clusters in a cluster index volume, i.e. its highest cluster index. Empty or all-zero volumes have none.
pub fn num_clusters(clusters: &ArrayD<f32>) -> usize {
    match clusters.max() {
        Ok(&max) if max > 0.0 => max.round() as usize,
        _ => 0,
    }
}
