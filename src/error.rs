use quick_error::quick_error;
use std::io::Error as IOError;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum RoiError {
        /// An atlas label has no entry in the atlas dictionary. Atlas image and dictionary do not belong together.
        MissingLabel(id: i32) {
            display("Atlas label {} has no entry in the atlas dictionary", id)
        }

        /// Cluster array and atlas array do not cover the same locations.
        ShapeMismatch(cluster: Vec<usize>, atlas: Vec<usize>) {
            display("Cluster data shape {:?} does not match atlas shape {:?}", cluster, atlas)
        }

        InvalidGifti(msg: String) {
            display("Invalid GIFTI file: {}", msg)
        }

        UnsupportedGiftiEncoding(encoding: String) {
            display("Unsupported GIFTI data encoding '{}'", encoding)
        }

        /// A required column is missing from a tool's output table.
        MissingColumn(name: String) {
            display("Column '{}' not found in cluster table", name)
        }

        InvalidClusterTable(msg: String) {
            display("Invalid cluster table: {}", msg)
        }

        InvalidAtlasNumber(num: u32) {
            display("No volume atlas with number {}, see '--dump-atlases'", num)
        }

        InvalidLabelTable(msg: String) {
            display("Invalid atlas label table: {}", msg)
        }

        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
            display("I/O error: {}", err)
        }

        Csv(err: csv::Error) {
            from()
            source(err)
            display("CSV error: {}", err)
        }

        Xml(err: quick_xml::Error) {
            from()
            source(err)
            display("XML error: {}", err)
        }

        Base64(err: base64::DecodeError) {
            from()
            source(err)
            display("Base64 decoding error: {}", err)
        }

        Nifti(err: nifti::NiftiError) {
            from()
            source(err)
            display("NIFTI error: {}", err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, RoiError>;
