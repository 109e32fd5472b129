//! Functions for reading GIFTI surface data files.
//!
//! GIFTI files are XML documents. Each `DataArray` element holds one array of per-vertex data
//! (e.g. a metric map or a label map), encoded as ASCII text or as base64 encoded binary data
//! that is optionally zlib compressed. Label files also carry a `LabelTable`, which assigns region
//! names to the integer labels used in the label arrays.
//!
//! This reader supports the subset of GIFTI written by `wb_command -cifti-separate`: external
//! file storage is not supported.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use byteordered::{ByteOrdered, Endianness};
use flate2::read::ZlibDecoder;
use ndarray::Array2;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, RoiError};

pub const INTENT_LABEL: &str = "NIFTI_INTENT_LABEL";
pub const INTENT_NORMAL: &str = "NIFTI_INTENT_NORMAL";
pub const INTENT_NONE: &str = "NIFTI_INTENT_NONE";


/// The element type of a GIFTI data array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftiDataType {
    UInt8,
    Int32,
    Float32,
}

impl GiftiDataType {
    fn parse(s: &str) -> Result<GiftiDataType> {
        match s {
            "NIFTI_TYPE_UINT8" => Ok(GiftiDataType::UInt8),
            "NIFTI_TYPE_INT32" => Ok(GiftiDataType::Int32),
            "NIFTI_TYPE_FLOAT32" => Ok(GiftiDataType::Float32),
            other => Err(RoiError::InvalidGifti(format!("unsupported DataType '{}'", other))),
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftiEncoding {
    Ascii,
    Base64Binary,
    GZipBase64Binary,
}

impl GiftiEncoding {
    fn parse(s: &str) -> Result<GiftiEncoding> {
        match s {
            "ASCII" => Ok(GiftiEncoding::Ascii),
            "Base64Binary" => Ok(GiftiEncoding::Base64Binary),
            "GZipBase64Binary" => Ok(GiftiEncoding::GZipBase64Binary),
            other => Err(RoiError::UnsupportedGiftiEncoding(other.to_string())),
        }
    }
}


/// The decoded values of a data array, in file order.
#[derive(Debug, Clone, PartialEq)]
pub enum GiftiData {
    UInt8(Vec<u8>),
    Int32(Vec<i32>),
    Float32(Vec<f32>),
}

impl GiftiData {
    pub fn len(&self) -> usize {
        match self {
            GiftiData::UInt8(v) => v.len(),
            GiftiData::Int32(v) => v.len(),
            GiftiData::Float32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The values as `f32`.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            GiftiData::UInt8(v) => v.iter().map(|&x| x as f32).collect(),
            GiftiData::Int32(v) => v.iter().map(|&x| x as f32).collect(),
            GiftiData::Float32(v) => v.clone(),
        }
    }

    /// The values as `i32`, float values are rounded.
    pub fn to_i32(&self) -> Vec<i32> {
        match self {
            GiftiData::UInt8(v) => v.iter().map(|&x| x as i32).collect(),
            GiftiData::Int32(v) => v.clone(),
            GiftiData::Float32(v) => v.iter().map(|&x| x.round() as i32).collect(),
        }
    }
}


/// A single GIFTI `DataArray`.
#[derive(Debug, Clone, PartialEq)]
pub struct GiftiDataArray {
    pub intent: String,
    pub data_type: GiftiDataType,
    pub encoding: GiftiEncoding,
    pub endian: Endianness,
    pub dims: Vec<usize>,
    pub data: GiftiData,
}

impl GiftiDataArray {
    pub fn num_values(&self) -> usize {
        self.dims.iter().product()
    }
}


/// Models a GIFTI file: its label table (empty for metric files) and its data arrays in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GiftiImage {
    pub label_table: BTreeMap<i32, String>,
    pub data_arrays: Vec<GiftiDataArray>,
}

impl GiftiImage {

    /// Read a GIFTI file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<GiftiImage> {
        let mut content = String::new();
        BufReader::new(File::open(path)?).read_to_string(&mut content)?;
        GiftiImage::from_str(&content)
    }

    /// Parse GIFTI XML content.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<GiftiImage> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(true);

        let mut gii = GiftiImage::default();
        let mut current_label: Option<i32> = None;
        let mut current_array: Option<ArrayAttrs> = None;
        let mut in_data = false;
        let mut data_text = String::new();

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"Label" => current_label = Some(parse_label_key(e)?),
                    b"DataArray" => current_array = Some(ArrayAttrs::from_element(e)?),
                    b"Data" => {
                        in_data = current_array.is_some();
                        data_text.clear();
                    }
                    _ => {}
                },
                Event::Empty(ref e) => match e.local_name().as_ref() {
                    b"Label" => {
                        gii.label_table.insert(parse_label_key(e)?, String::new());
                    }
                    b"DataArray" => {
                        let attrs = ArrayAttrs::from_element(e)?;
                        gii.data_arrays.push(attrs.decode("")?);
                    }
                    _ => {}
                },
                Event::Text(ref e) => {
                    let text = e.unescape()?;
                    if let Some(key) = current_label {
                        gii.label_table.entry(key).or_default().push_str(&text);
                    } else if in_data {
                        data_text.push_str(&text);
                    }
                }
                Event::CData(ref e) => {
                    let text = String::from_utf8_lossy(e).into_owned();
                    if let Some(key) = current_label {
                        gii.label_table.entry(key).or_default().push_str(&text);
                    } else if in_data {
                        data_text.push_str(&text);
                    }
                }
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"Label" => {
                        if let Some(key) = current_label.take() {
                            gii.label_table.entry(key).or_default();
                        }
                    }
                    b"Data" => in_data = false,
                    b"DataArray" => {
                        if let Some(attrs) = current_array.take() {
                            gii.data_arrays.push(attrs.decode(&data_text)?);
                        }
                        data_text.clear();
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if current_array.is_some() {
            return Err(RoiError::InvalidGifti(String::from("unterminated DataArray element")));
        }
        Ok(gii)
    }

    /// Get the data arrays with the given intent, in file order.
    pub fn arrays_from_intent<'a>(&'a self, intent: &'a str) -> impl Iterator<Item = &'a GiftiDataArray> + 'a {
        self.data_arrays.iter().filter(move |da| da.intent == intent)
    }

    /// Get the labels of the `map_number`-th label map (1-based).
    pub fn label_data(&self, map_number: usize) -> Result<Vec<i32>> {
        map_number
            .checked_sub(1)
            .and_then(|idx| self.arrays_from_intent(INTENT_LABEL).nth(idx))
            .map(|da| da.data.to_i32())
            .ok_or_else(|| RoiError::InvalidGifti(format!("no label map number {}", map_number)))
    }

    /// Stack all data arrays with the given intent into a matrix with one row per vertex and one column per array.
    pub fn stacked_data(&self, intent: &str) -> Result<Array2<f32>> {
        let arrays: Vec<&GiftiDataArray> = self.arrays_from_intent(intent).collect();
        stack_arrays(&arrays, intent)
    }

    /// Like [`GiftiImage::stacked_data`], for metric maps. Writers differ in the intent they give those, both
    /// `NIFTI_INTENT_NORMAL` and `NIFTI_INTENT_NONE` arrays are included.
    pub fn stacked_metric_data(&self) -> Result<Array2<f32>> {
        let arrays: Vec<&GiftiDataArray> = self.data_arrays
            .iter()
            .filter(|da| da.intent == INTENT_NORMAL || da.intent == INTENT_NONE)
            .collect();
        stack_arrays(&arrays, INTENT_NORMAL)
    }
}

fn stack_arrays(arrays: &[&GiftiDataArray], intent: &str) -> Result<Array2<f32>> {
    let first = arrays
        .first()
        .ok_or_else(|| RoiError::InvalidGifti(format!("no data array with intent {}", intent)))?;
    let num_vertices = first.data.len();

    let mut stacked = Array2::<f32>::zeros((num_vertices, arrays.len()));
    for (col, da) in arrays.iter().enumerate() {
        if da.data.len() != num_vertices {
            return Err(RoiError::InvalidGifti(format!(
                "data arrays of intent {} differ in length: {} vs {}", intent, num_vertices, da.data.len())));
        }
        for (row, v) in da.data.to_f32().into_iter().enumerate() {
            stacked[[row, col]] = v;
        }
    }
    Ok(stacked)
}

impl fmt::Display for GiftiImage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GIFTI image with {} data arrays and {} labels.", self.data_arrays.len(), self.label_table.len())
    }
}


/// Read a GIFTI file.
///
/// # Examples
///
/// ```no_run
/// let gii = clusterroi::read_gifti("/tmp/data.label.gii").unwrap();
/// let labels = gii.label_data(1).unwrap();
/// println!("Label map covers {} vertices.", labels.len());
/// ```
pub fn read_gifti<P: AsRef<Path>>(path: P) -> Result<GiftiImage> {
    GiftiImage::from_file(path)
}


fn attr_value(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_label_key(e: &BytesStart) -> Result<i32> {
    // GIFTI 1.0 uses "Key", some older writers use "Index".
    let key = match attr_value(e, b"Key")? {
        Some(k) => k,
        None => attr_value(e, b"Index")?
            .ok_or_else(|| RoiError::InvalidGifti(String::from("Label without Key attribute")))?,
    };
    key.trim()
        .parse::<i32>()
        .map_err(|_| RoiError::InvalidGifti(format!("invalid label key '{}'", key)))
}


/// The attributes of a `DataArray` element, needed to decode its `Data` child.
#[derive(Debug)]
struct ArrayAttrs {
    intent: String,
    data_type: GiftiDataType,
    encoding: GiftiEncoding,
    endian: Endianness,
    dims: Vec<usize>,
}

impl ArrayAttrs {
    fn from_element(e: &BytesStart) -> Result<ArrayAttrs> {
        let required = |name: &str| -> Result<String> {
            attr_value(e, name.as_bytes())?
                .ok_or_else(|| RoiError::InvalidGifti(format!("DataArray without {} attribute", name)))
        };

        let intent = required("Intent")?;
        let data_type = GiftiDataType::parse(&required("DataType")?)?;
        let encoding = GiftiEncoding::parse(&required("Encoding")?)?;
        let endian = match attr_value(e, b"Endian")?.as_deref() {
            Some("BigEndian") => Endianness::Big,
            Some("LittleEndian") | None => Endianness::Little,
            Some(other) => return Err(RoiError::InvalidGifti(format!("invalid Endian '{}'", other))),
        };

        let dimensionality: usize = required("Dimensionality")?
            .trim()
            .parse()
            .map_err(|_| RoiError::InvalidGifti(String::from("invalid Dimensionality")))?;
        let mut dims = Vec::with_capacity(dimensionality);
        for idx in 0..dimensionality {
            let dim = required(format!("Dim{}", idx).as_str())?;
            dims.push(dim.trim().parse().map_err(|_| RoiError::InvalidGifti(format!("invalid Dim{} '{}'", idx, dim)))?);
        }

        Ok(ArrayAttrs { intent, data_type, encoding, endian, dims })
    }

    fn decode(self, text: &str) -> Result<GiftiDataArray> {
        let num_values: usize = self.dims.iter().product();
        let data = match self.encoding {
            GiftiEncoding::Ascii => parse_ascii(text, self.data_type)?,
            GiftiEncoding::Base64Binary | GiftiEncoding::GZipBase64Binary => {
                let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                let mut bytes = STANDARD.decode(compact.as_bytes())?;
                if self.encoding == GiftiEncoding::GZipBase64Binary {
                    let mut inflated = Vec::new();
                    ZlibDecoder::new(bytes.as_slice()).read_to_end(&mut inflated)?;
                    bytes = inflated;
                }
                read_binary(&bytes, self.data_type, self.endian, num_values)?
            }
        };

        if data.len() != num_values {
            return Err(RoiError::InvalidGifti(format!(
                "DataArray holds {} values, but its dimensions require {}", data.len(), num_values)));
        }

        Ok(GiftiDataArray {
            intent: self.intent,
            data_type: self.data_type,
            encoding: self.encoding,
            endian: self.endian,
            dims: self.dims,
            data,
        })
    }
}


fn parse_ascii(text: &str, data_type: GiftiDataType) -> Result<GiftiData> {
    let bad = |tok: &str| RoiError::InvalidGifti(format!("invalid ASCII value '{}'", tok));
    let tokens = text.split_whitespace();
    Ok(match data_type {
        GiftiDataType::UInt8 => GiftiData::UInt8(tokens.map(|t| t.parse().map_err(|_| bad(t))).collect::<Result<_>>()?),
        GiftiDataType::Int32 => GiftiData::Int32(tokens.map(|t| t.parse().map_err(|_| bad(t))).collect::<Result<_>>()?),
        GiftiDataType::Float32 => GiftiData::Float32(tokens.map(|t| t.parse().map_err(|_| bad(t))).collect::<Result<_>>()?),
    })
}


/// Interpret decoded binary data. The byte count must match `num_values` exactly.
fn read_binary(bytes: &[u8], data_type: GiftiDataType, endian: Endianness, num_values: usize) -> Result<GiftiData> {
    let value_size = match data_type {
        GiftiDataType::UInt8 => 1,
        GiftiDataType::Int32 | GiftiDataType::Float32 => 4,
    };
    if bytes.len() != num_values * value_size {
        return Err(RoiError::InvalidGifti(format!(
            "binary data has {} bytes, expected {} values of {} bytes", bytes.len(), num_values, value_size)));
    }

    let mut input = ByteOrdered::runtime(bytes, endian);
    Ok(match data_type {
        GiftiDataType::UInt8 => GiftiData::UInt8(bytes.to_vec()),
        GiftiDataType::Int32 => {
            let mut values = Vec::with_capacity(num_values);
            for _ in 0..num_values {
                values.push(input.read_i32()?);
            }
            GiftiData::Int32(values)
        }
        GiftiDataType::Float32 => {
            let mut values = Vec::with_capacity(num_values);
            for _ in 0..num_values {
                values.push(input.read_f32()?);
            }
            GiftiData::Float32(values)
        }
    })
}
