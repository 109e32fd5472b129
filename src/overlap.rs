//! Find the atlas regions that overlap clusters.
//!
//! The cluster array and the atlas array are parallel: index `i` in both refers to the same vertex
//! (surface data) or voxel (volume data). Cluster values of zero mark locations outside of any
//! surviving cluster, atlas values of zero mark unlabeled background.

use ndarray::{Array, Array1, ArrayBase, Axis, Data, Dimension, Ix2, Zip};

use std::collections::BTreeSet;

use crate::atlas::AtlasDict;
use crate::error::{Result, RoiError};


fn check_shapes<S1, S2, D>(clusters: &ArrayBase<S1, D>, atlas: &ArrayBase<S2, D>) -> Result<()>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = i32>,
    D: Dimension,
{
    if clusters.shape() != atlas.shape() {
        return Err(RoiError::ShapeMismatch(clusters.shape().to_vec(), atlas.shape().to_vec()));
    }
    Ok(())
}


/// Copy of the atlas with all labels outside of the clusters set to zero.
pub fn mask_atlas<S1, S2, D>(clusters: &ArrayBase<S1, D>, atlas: &ArrayBase<S2, D>) -> Result<Array<i32, D>>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = i32>,
    D: Dimension,
{
    check_shapes(clusters, atlas)?;
    let mut masked = atlas.to_owned();
    Zip::from(&mut masked).and(clusters).for_each(|label, &c| {
        if c == 0.0 {
            *label = 0;
        }
    });
    Ok(masked)
}


/// The distinct non-zero atlas labels that overlap any cluster, in ascending order.
pub fn overlapping_labels<S1, S2, D>(clusters: &ArrayBase<S1, D>, atlas: &ArrayBase<S2, D>) -> Result<BTreeSet<i32>>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = i32>,
    D: Dimension,
{
    let masked = mask_atlas(clusters, atlas)?;
    Ok(masked.iter().copied().filter(|&label| label != 0).collect())
}


/// Get the names of the ROIs overlapped by the clusters, ordered by ascending atlas label and free of duplicates.
///
/// # Errors
///
/// * [`RoiError::ShapeMismatch`] if the arrays do not have the same shape.
/// * [`RoiError::MissingLabel`] if an overlapping label is unknown to the dictionary.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use clusterroi::{overlapping_rois, AtlasDict};
///
/// let dict: AtlasDict = vec![(1, String::from("V1")), (2, String::from("V2"))].into_iter().collect();
/// let clusters = array![0.0_f32, 1.0, 1.0, 0.0];
/// let atlas = array![1, 2, 2, 1];
/// assert_eq!(vec!["V2"], overlapping_rois(&clusters, &atlas, &dict).unwrap());
/// ```
pub fn overlapping_rois<S1, S2, D>(clusters: &ArrayBase<S1, D>, atlas: &ArrayBase<S2, D>, dict: &AtlasDict) -> Result<Vec<String>>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = i32>,
    D: Dimension,
{
    overlapping_labels(clusters, atlas)?
        .into_iter()
        .map(|label| dict.name(label).map(String::from))
        .collect()
}


/// Reduce per-map cluster data (vertices x maps) to a single cluster array. A vertex belongs to a cluster if any map is non-zero there.
pub fn any_nonzero_rows<S>(data: &ArrayBase<S, Ix2>) -> Array1<f32>
where
    S: Data<Elem = f32>,
{
    data.map_axis(Axis(1), |row| {
        if row.iter().any(|&v| v != 0.0) { 1.0 } else { 0.0 }
    })
}


#[cfg(test)]
mod test {
    use super::*;
    use ndarray::{array, Array3};

    fn demo_dict() -> AtlasDict {
        vec![
            (0, String::from("???")),
            (1, String::from("L_V1_ROI")),
            (2, String::from("L_MST_ROI")),
            (3, String::from("L_V6_ROI")),
        ].into_iter().collect()
    }

    #[test]
    fn zero_cluster_entries_contribute_no_labels() {
        let clusters = array![0.0_f32, 0.0, 2.0, 0.0, 1.0];
        let atlas = array![1, 3, 2, 3, 2];
        let rois = overlapping_rois(&clusters, &atlas, &demo_dict()).unwrap();
        assert_eq!(vec!["L_MST_ROI"], rois);
    }

    #[test]
    fn rois_are_unique_and_ordered_by_label() {
        let clusters = array![1.0_f32, 1.0, 1.0, 1.0, 1.0, 0.0];
        let atlas = array![3, 1, 3, 2, 1, 0];
        let rois = overlapping_rois(&clusters, &atlas, &demo_dict()).unwrap();
        assert_eq!(vec!["L_V1_ROI", "L_MST_ROI", "L_V6_ROI"], rois);
    }

    #[test]
    fn background_label_is_never_reported() {
        let clusters = array![1.0_f32, 1.0];
        let atlas = array![0, 0];
        assert!(overlapping_rois(&clusters, &atlas, &demo_dict()).unwrap().is_empty());
    }

    #[test]
    fn all_zero_clusters_yield_no_rois() {
        let clusters = Array3::<f32>::zeros((4, 3, 2));
        let atlas = Array3::<i32>::from_elem((4, 3, 2), 2);
        assert!(overlapping_rois(&clusters, &atlas, &demo_dict()).unwrap().is_empty());
    }

    #[test]
    fn masking_keeps_the_input_atlas_untouched() {
        let clusters = array![[0.0_f32, 1.0], [1.0, 0.0]];
        let atlas = array![[1, 2], [3, 1]];
        let masked = mask_atlas(&clusters, &atlas).unwrap();
        assert_eq!(array![[0, 2], [3, 0]], masked);
        assert_eq!(array![[1, 2], [3, 1]], atlas);
    }

    #[test]
    fn unknown_labels_are_a_lookup_error() {
        let clusters = array![1.0_f32];
        let atlas = array![42];
        match overlapping_rois(&clusters, &atlas, &demo_dict()) {
            Err(RoiError::MissingLabel(42)) => {}
            other => panic!("expected MissingLabel, got {:?}", other),
        }
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let clusters = array![1.0_f32, 0.0, 1.0];
        let atlas = array![1, 2];
        assert!(matches!(overlapping_labels(&clusters, &atlas), Err(RoiError::ShapeMismatch(_, _))));
    }

    #[test]
    fn negative_cluster_values_count_as_clusters() {
        let clusters = array![-1.0_f32, 0.0];
        let atlas = array![1, 2];
        assert_eq!(vec![1], overlapping_labels(&clusters, &atlas).unwrap().into_iter().collect::<Vec<i32>>());
    }

    #[test]
    fn multi_map_data_is_reduced_per_vertex() {
        let data = array![[0.0_f32, 0.0], [0.0, 3.0], [1.0, 0.0], [0.0, 0.0]];
        assert_eq!(array![0.0_f32, 1.0, 1.0, 0.0], any_nonzero_rows(&data));
    }
}
