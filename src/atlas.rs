//! Atlas dictionaries, mapping integer region labels to region names.
//!
//! A labelled atlas image assigns each vertex or voxel an integer label. The dictionary pairs these
//! labels with human-readable ROI names. It comes either from the label table of a GIFTI label file
//! or from a plain CSV file with `label,name` rows that accompanies a NIFTI atlas volume.

use csv::{ReaderBuilder, Trim};

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, RoiError};


/// Maps atlas labels to ROI names. Built once per atlas, not modified afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtlasDict {
    names: BTreeMap<i32, String>,
}

impl AtlasDict {

    /// Read an atlas dictionary from a header-less CSV file of `label,name` pairs.
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<AtlasDict> {
        let file = BufReader::new(File::open(path)?);
        AtlasDict::from_csv_reader(file)
    }

    /// Read an atlas dictionary from CSV data, see [`AtlasDict::from_csv_file`].
    pub fn from_csv_reader<R: Read>(input: R) -> Result<AtlasDict> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .flexible(false)
            .from_reader(input);

        let mut names = BTreeMap::new();
        for result in rdr.records() {
            let record = result?;
            if record.len() != 2 {
                return Err(RoiError::InvalidLabelTable(format!("expected 2 columns, found {} in row {:?}", record.len(), record)));
            }
            let label = parse_label(&record[0])?;
            names.insert(label, record[1].to_string());
        }
        Ok(AtlasDict { names })
    }

    /// Build an atlas dictionary from an already parsed label table, e.g. the one of a GIFTI file.
    pub fn from_label_table(table: &BTreeMap<i32, String>) -> AtlasDict {
        AtlasDict { names: table.clone() }
    }

    /// Get the ROI name for the given label.
    ///
    /// # Errors
    ///
    /// [`RoiError::MissingLabel`] if the label is not part of this dictionary.
    pub fn name(&self, label: i32) -> Result<&str> {
        self.names
            .get(&label)
            .map(|n| n.as_str())
            .ok_or(RoiError::MissingLabel(label))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over `(label, name)` pairs in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.names.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl std::iter::FromIterator<(i32, String)> for AtlasDict {
    fn from_iter<I: IntoIterator<Item = (i32, String)>>(iter: I) -> Self {
        AtlasDict { names: iter.into_iter().collect() }
    }
}

impl fmt::Display for AtlasDict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Atlas dictionary with {} regions.", self.names.len())
    }
}


/// Parse a label column. Tables exported from float images write labels like "3.0", these are accepted if integral.
fn parse_label(field: &str) -> Result<i32> {
    if let Ok(label) = field.parse::<i32>() {
        return Ok(label);
    }
    match field.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 => Ok(v as i32),
        _ => Err(RoiError::InvalidLabelTable(format!("'{}' is not an integer label", field))),
    }
}


/// Names of the FSL atlases that `atlasquery` knows, in the order of their atlas numbers (starting at 1).
pub const VOLUME_ATLAS_NAMES: [&str; 19] = [
    "Cerebellar Atlas in MNI152 space after normalization with FLIRT",
    "Cerebellar Atlas in MNI152 space after normalization with FNIRT",
    "Harvard-Oxford Cortical Structural Atlas",
    "Harvard-Oxford Subcortical Structural Atlas",
    "Human Sensorimotor Tracts Labels",
    "JHU ICBM-DTI-81 White-Matter Labels",
    "JHU White-Matter Tractography Atlas",
    "Juelich Histological Atlas",
    "MNI Structural Atlas",
    "Mars Parietal connectivity-based parcellation",
    "Mars TPJ connectivity-based parcellation",
    "Neubert Ventral Frontal connectivity-based parcellation",
    "Oxford Thalamic Connectivity Probability Atlas",
    "Oxford-Imanova Striatal Connectivity Atlas 3 sub-regions",
    "Oxford-Imanova Striatal Connectivity Atlas 7 sub-regions",
    "Oxford-Imanova Striatal Structural Atlas",
    "Sallet Dorsal Frontal connectivity-based parcellation",
    "Subthalamic Nucleus Atlas",
    "Talairach Daemon Labels",
];

pub const HARVARD_OXFORD_CORTICAL: u32 = 3;
pub const HARVARD_OXFORD_SUBCORTICAL: u32 = 4;


/// A volumetric FSL atlas, identified by its atlas number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeAtlas {
    number: u32,
}

impl VolumeAtlas {

    /// Get the atlas with the given number, see [`VOLUME_ATLAS_NAMES`].
    pub fn from_number(number: u32) -> Result<VolumeAtlas> {
        if number >= 1 && number as usize <= VOLUME_ATLAS_NAMES.len() {
            Ok(VolumeAtlas { number })
        } else {
            Err(RoiError::InvalidAtlasNumber(number))
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// The atlas name as used by `atlasquery`.
    pub fn name(&self) -> &'static str {
        VOLUME_ATLAS_NAMES[self.number as usize - 1]
    }

    pub fn all() -> impl Iterator<Item = VolumeAtlas> {
        (1..=VOLUME_ATLAS_NAMES.len() as u32).map(|number| VolumeAtlas { number })
    }

    /// The numbered listing of all atlases, as printed by `nifti_roi --dump-atlases`.
    pub fn listing() -> String {
        let mut txt = String::from("Atlas Numbers (for atlasquery wrapper)\n\n");
        for atlas in VolumeAtlas::all() {
            txt.push_str(&format!("{:<4}{}\n", format!("{}.", atlas.number), atlas.name()));
        }
        txt
    }
}

impl fmt::Display for VolumeAtlas {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
