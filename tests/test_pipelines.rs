//! Full pipeline runs with small shell scripts standing in for Connectome Workbench and FSL.
#![cfg(unix)]

use clusterroi::atlas::HARVARD_OXFORD_SUBCORTICAL;
use clusterroi::{AtlasSource, CiftiRoiJob, ClusterParams, NiftiRoiJob, ToolPaths, VolumeAtlas};
use ndarray::{Array3, Array4};
use nifti::writer::WriterOptions;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// A script still open for writing cannot be executed, so no tool may be spawned while another test writes its scripts.
static TOOLS_LOCK: Mutex<()> = Mutex::new(());

/// Each tool appends the paths it writes to this file.
const OUTPUTS_LOG: &str = "outputs.txt";

const WB_COMMAND: &str = r#"#!/bin/sh
case "$1" in
  -cifti-find-clusters)
    touch "$8"; echo "$8" >> "@DIR@/outputs.txt" ;;
  -cifti-separate)
    if [ "$4" = "-volume-all" ]; then
      touch "$5"; echo "$5" >> "@DIR@/outputs.txt"
    else
      cp "@DIR@/$5$4.gii" "$6"; echo "$6" >> "@DIR@/outputs.txt"
    fi ;;
esac
exit 1
"#;

const CLUSTER: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --oindex=*)
      cp "@DIR@/index.nii.gz" "${arg#--oindex=}"; echo "${arg#--oindex=}" >> "@DIR@/outputs.txt" ;;
  esac
done
printf 'Cluster Index\tVoxels\tMAX\tMAX X (mm)\tMAX Y (mm)\tMAX Z (mm)\n'
printf '2\t10\t3.1\t-24\t-12\t8\n'
printf '1\t5\t2.0\t30\t4\t-2\n'
"#;

const ATLASQUERY: &str = r#"#!/bin/sh
case "$4" in
  -24,-12,8) echo "<b>$2</b><br>96% Left Putamen" ;;
  *) echo "<b>$2</b><br>No label found!" ;;
esac
"#;

const FSLMATHS: &str = r#"#!/bin/sh
cp "$3" "$4"
echo "$4" >> "@DIR@/outputs.txt"
exit 1
"#;


fn write_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, script.replace("@DIR@", &dir.to_string_lossy())).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn fake_tools(dir: &Path) -> ToolPaths {
    ToolPaths {
        wb_command: write_tool(dir, "wb_command", WB_COMMAND),
        cluster: write_tool(dir, "cluster", CLUSTER),
        atlasquery: write_tool(dir, "atlasquery", ATLASQUERY),
        fslmaths: write_tool(dir, "fslmaths", FSLMATHS),
    }
}

fn label_gifti(table: &[(i32, &str)], labels: &[i32]) -> String {
    let entries: Vec<String> = table.iter().map(|(k, n)| format!("<Label Key=\"{}\"><![CDATA[{}]]></Label>", k, n)).collect();
    let values: Vec<String> = labels.iter().map(|v| v.to_string()).collect();
    format!(
        "<GIFTI Version=\"1.0\"><LabelTable>{}</LabelTable>\
         <DataArray Intent=\"NIFTI_INTENT_LABEL\" DataType=\"NIFTI_TYPE_INT32\" Dimensionality=\"1\" Dim0=\"{}\" Encoding=\"ASCII\">\
         <Data>{}</Data></DataArray></GIFTI>",
        entries.join(""), labels.len(), values.join(" "))
}

fn metric_gifti(values: &[f32]) -> String {
    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!(
        "<GIFTI Version=\"1.0\">\
         <DataArray Intent=\"NIFTI_INTENT_NORMAL\" DataType=\"NIFTI_TYPE_FLOAT32\" Dimensionality=\"1\" Dim0=\"{}\" Encoding=\"ASCII\">\
         <Data>{}</Data></DataArray></GIFTI>",
        values.len(), values.join(" "))
}

fn assert_scratch_files_removed(dir: &Path) {
    let log = fs::read_to_string(dir.join(OUTPUTS_LOG)).unwrap();
    assert!(!log.trim().is_empty());
    for line in log.lines() {
        assert!(!Path::new(line).exists(), "'{}' was left behind", line);
    }
}


#[test]
fn cifti_rois_are_collected_left_right_then_volume() {
    let _lock = TOOLS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let tools = fake_tools(dir.path());

    let left_table = [(0, "???"), (1, "L_V1_ROI"), (2, "L_MST_ROI"), (3, "L_V6_ROI")];
    let right_table = [(0, "???"), (1, "R_V1_ROI"), (2, "R_MST_ROI")];
    fs::write(dir.path().join("CORTEX_LEFT-label.gii"), label_gifti(&left_table, &[1, 1, 2, 3, 0, 2])).unwrap();
    fs::write(dir.path().join("CORTEX_LEFT-metric.gii"), metric_gifti(&[0.0, 0.0, 1.0, 0.0, 1.0, 0.0])).unwrap();
    fs::write(dir.path().join("CORTEX_RIGHT-label.gii"), label_gifti(&right_table, &[1, 2, 2, 0])).unwrap();
    fs::write(dir.path().join("CORTEX_RIGHT-metric.gii"), metric_gifti(&[2.0, 0.0, 0.0, 0.0])).unwrap();

    let stats = dir.path().join("stats.dscalar.nii");
    let out = dir.path().join("rois.csv");
    let job = CiftiRoiJob {
        stats_file: stats.clone(),
        atlas_file: dir.path().join("atlas.dlabel.nii"),
        left_surface: dir.path().join("L.surf.gii"),
        right_surface: dir.path().join("R.surf.gii"),
        out_file: out.clone(),
        params: ClusterParams::CIFTI_DEFAULT,
        volume_atlas: Some(VolumeAtlas::from_number(HARVARD_OXFORD_SUBCORTICAL).unwrap()),
        tools,
    };

    let report = job.run().unwrap();
    assert_eq!(vec!["L_MST_ROI", "R_V1_ROI", "96% Left Putamen"], report.rois);
    assert_eq!(Some(out.clone()), report.written);

    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(format!("File,ROIs\n{},L_MST_ROI; R_V1_ROI; 96% Left Putamen\n", stats.display()), content);
    assert_scratch_files_removed(dir.path());
}

#[test]
fn cifti_volume_part_can_be_skipped() {
    let _lock = TOOLS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let tools = fake_tools(dir.path());

    for hemi in &["CORTEX_LEFT", "CORTEX_RIGHT"] {
        fs::write(dir.path().join(format!("{}-label.gii", hemi)), label_gifti(&[(1, "V1")], &[1, 1])).unwrap();
        fs::write(dir.path().join(format!("{}-metric.gii", hemi)), metric_gifti(&[0.0, 0.0])).unwrap();
    }

    let out = dir.path().join("rois.csv");
    let mut job = CiftiRoiJob::new(
        dir.path().join("stats.dscalar.nii"),
        dir.path().join("atlas.dlabel.nii"),
        dir.path().join("L.surf.gii"),
        dir.path().join("R.surf.gii"),
        out.clone(),
    ).unwrap();
    job.tools = tools;
    job.volume_atlas = None;

    let report = job.run().unwrap();
    assert!(report.rois.is_empty());
    assert_eq!(None, report.written);
    assert!(!out.exists());
}

#[test]
fn nifti_image_atlas_is_matched_voxel_by_voxel() {
    let _lock = TOOLS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let tools = fake_tools(dir.path());

    // Single-volume 4D atlas against the 3D cluster index volume written by `cluster`.
    let mut atlas = Array4::<f32>::zeros((2, 2, 2, 1));
    atlas[[1, 1, 1, 0]] = 3.0;
    atlas[[0, 0, 0, 0]] = 5.0;
    let atlas_file = dir.path().join("atlas.nii.gz");
    WriterOptions::new(&atlas_file).write_nifti(&atlas).unwrap();
    let info_file = dir.path().join("atlas.csv");
    fs::write(&info_file, "3,Putamen\n5,Caudate\n").unwrap();

    let mut index = Array3::<f32>::zeros((2, 2, 2));
    index[[1, 1, 1]] = 1.0;
    WriterOptions::new(&dir.path().join("index.nii.gz")).write_nifti(&index).unwrap();

    let stats = dir.path().join("zstat1.nii.gz");
    let out = dir.path().join("rois.txt");
    let mut job = NiftiRoiJob::new(stats.clone(), out, AtlasSource::Image { atlas: atlas_file, info: info_file });
    job.tools = tools;

    let report = job.run().unwrap();
    assert_eq!(vec!["Putamen"], report.rois);

    let written = dir.path().join("rois.csv");
    assert_eq!(Some(written.clone()), report.written);
    let content = fs::read_to_string(&written).unwrap();
    assert_eq!(format!("File,ROIs\n{},Putamen\n", stats.display()), content);
    assert_scratch_files_removed(dir.path());
}

#[test]
fn nifti_cluster_peaks_are_queried_in_table_order() {
    let _lock = TOOLS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let tools = fake_tools(dir.path());

    let stats = dir.path().join("zstat1.nii.gz");
    let out = dir.path().join("rois.csv");
    let atlas = VolumeAtlas::from_number(HARVARD_OXFORD_SUBCORTICAL).unwrap();
    let mut job = NiftiRoiJob::new(stats.clone(), out.clone(), AtlasSource::Query(atlas));
    job.tools = tools;

    let report = job.run().unwrap();
    assert_eq!(vec!["96% Left Putamen"], report.rois);

    // A second image appends below the existing header.
    let second = dir.path().join("zstat2.nii.gz");
    job.stats_file = second.clone();
    job.run().unwrap();

    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(
        format!("File,ROIs\n{},96% Left Putamen\n{},96% Left Putamen\n", stats.display(), second.display()),
        content
    );
}
