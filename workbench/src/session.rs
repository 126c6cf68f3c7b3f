//! # Session store
//!
//! A [`CodecSession`] holds everything one panel knows about the current
//! encode or decode cycle: the selected source file and, once a round trip
//! succeeded, the artifact, the auxiliary display data and the metrics
//! reported by the codec service. Each file selection starts a brand new
//! session; a result is only ever replaced as a whole.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::common::error::PayloadError;
use crate::common::SourceFile;

/// Width and height of every image the predictive codec works on.
pub const RASTER_SIDE: usize = 256;
/// Number of bins of every histogram.
pub const HISTOGRAM_BINS: usize = 256;

/// The bytes of an artifact, as the service delivered them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactPayload {
    /// Delivered as a JSON array of numbers
    Raw(Vec<u8>),
    /// Delivered as standard base64 text
    Base64(String),
}

/// The byte payload produced by a round trip, with the name the service
/// suggests saving it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Suggested output file name
    pub filename: String,
    /// The payload, still in transport form
    pub payload: ArtifactPayload,
}

impl Artifact {
    /// An artifact delivered as a numeric byte array.
    pub fn raw(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            payload: ArtifactPayload::Raw(bytes),
        }
    }

    /// An artifact delivered as base64 text. The text is checked here so that
    /// a malformed payload fails the round trip instead of the later export.
    pub fn base64(filename: impl Into<String>, encoded: String) -> Result<Self, PayloadError> {
        STANDARD.decode(encoded.as_bytes())?;
        Ok(Self {
            filename: filename.into(),
            payload: ArtifactPayload::Base64(encoded),
        })
    }
}

/// One row of a Huffman code table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    /// Human readable symbol label, e.g. `A (0x41)` or `byte 0x0A`
    pub symbol: String,
    /// The code as a string of `0` and `1`
    pub code: String,
}

/// One LZ77 match record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct Token {
    /// Distance back into the window
    pub offset: u64,
    /// Number of matched bytes
    pub match_length: u64,
    /// The literal following the match
    pub next_char: u8,
}

/// A square matrix of pixel or prediction error values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMatrix {
    rows: Vec<Vec<i32>>,
}

impl PixelMatrix {
    /// Check that `rows` is exactly 256x256.
    pub fn new(field: &'static str, rows: Vec<Vec<i32>>) -> Result<Self, PayloadError> {
        let shape_error = |row: usize, columns: usize| PayloadError::MatrixShape {
            field,
            rows: rows.len(),
            row,
            columns,
        };

        if rows.len() != RASTER_SIDE {
            return Err(shape_error(0, rows.first().map_or(0, Vec::len)));
        }
        if let Some((row, columns)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, columns)| *columns != RASTER_SIDE)
        {
            return Err(shape_error(row, columns));
        }

        Ok(Self { rows })
    }

    /// A matrix with every cell set to `value`.
    pub fn filled(value: i32) -> Self {
        Self {
            rows: vec![vec![value; RASTER_SIDE]; RASTER_SIDE],
        }
    }

    /// The value at column `x` of row `y`.
    pub fn get(&self, x: usize, y: usize) -> i32 {
        self.rows[y][x]
    }

    /// Set the value at column `x` of row `y`.
    pub fn set(&mut self, x: usize, y: usize, value: i32) {
        self.rows[y][x] = value;
    }

    /// Iterate over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// A 256 bin frequency histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: Vec<u64>,
}

impl Histogram {
    /// Check that the histogram has either 256 bins or none at all. The
    /// service omits histograms it did not compute.
    pub fn new(field: &'static str, bins: Vec<u64>) -> Result<Self, PayloadError> {
        if !bins.is_empty() && bins.len() != HISTOGRAM_BINS {
            return Err(PayloadError::HistogramBins { field, bins: bins.len() });
        }
        Ok(Self { bins })
    }

    /// The bin counts, empty when the service sent no histogram.
    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    /// Whether there is anything to draw.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Data returned by a predictive encode.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// The source image as the service read it
    pub original: PixelMatrix,
    /// Signed prediction residuals
    pub error: PixelMatrix,
    /// Histogram of the source image
    pub original_histogram: Histogram,
    /// Histogram of the residuals
    pub error_histogram: Histogram,
    /// The predictor that was applied
    pub predictor: u8,
}

/// Data returned by a predictive decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// The rebuilt image
    pub decoded: PixelMatrix,
    /// Histogram of the rebuilt image
    pub decoded_histogram: Histogram,
    /// The predictor recovered from the artifact, if the service reported it
    pub predictor: Option<u8>,
}

/// Family specific data shown next to the metrics.
#[derive(Debug, Clone, PartialEq)]
pub enum AuxiliaryData {
    /// Huffman symbol to code mapping, in the order the codec built it
    CodeTable(Vec<CodeEntry>),
    /// LZ77 tokens, in emission order
    Tokens(Vec<Token>),
    /// LZW codes, in emission order
    EmittedCodes(Vec<u64>),
    /// LZW dictionary index to decoded string
    DecodedCodes(Vec<(String, String)>),
    /// Predictive encode matrices and histograms
    Prediction(Box<Prediction>),
    /// Predictive decode matrix and histogram
    Reconstruction(Box<Reconstruction>),
}

/// Sizes and ratios exactly as reported by the codec service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    /// Size of the input the service received, when it reports one
    pub original_size: Option<u64>,
    /// Size of the produced artifact
    pub result_size: u64,
    /// Size of the codec header (bytes for entropy, bits for dictionary)
    pub header_size: Option<u64>,
    /// Size of the coded data without header
    pub compressed_data_size: Option<u64>,
    /// Compression ratio as reported
    pub compression_ratio: Option<f64>,
    /// Bytes saved
    pub space_saved: Option<u64>,
    /// Percentage of the input saved
    pub percentage_saved: Option<f64>,
}

/// Everything one successful round trip produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    /// The bytes to export
    pub artifact: Artifact,
    /// Optional display data
    pub auxiliary: Option<AuxiliaryData>,
    /// Reported metrics
    pub metrics: Metrics,
}

/// The in-memory state of one panel's current cycle.
#[derive(Debug, Clone, Default)]
pub struct CodecSession {
    source: Option<SourceFile>,
    result: Option<RoundTrip>,
}

impl CodecSession {
    /// A session for a freshly selected file, with no result yet.
    pub fn with_source(source: SourceFile) -> Self {
        Self { source: Some(source), result: None }
    }

    /// The selected file, if any.
    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    /// The last successful round trip, if any.
    pub fn result(&self) -> Option<&RoundTrip> {
        self.result.as_ref()
    }

    /// Store the outcome of a successful round trip, replacing the previous
    /// one as a whole.
    pub fn commit(&mut self, round_trip: RoundTrip) {
        self.result = Some(round_trip);
    }

    /// Whether there is anything to export or render.
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(name: &str, bytes: Vec<u8>) -> RoundTrip {
        RoundTrip {
            artifact: Artifact::raw(name, bytes.clone()),
            auxiliary: Some(AuxiliaryData::EmittedCodes(vec![65, 66])),
            metrics: Metrics {
                original_size: Some(10),
                result_size: bytes.len() as u64,
                ..Default::default()
            },
        }
    }

    #[test]
    fn new_session_starts_without_result() {
        let session = CodecSession::with_source(SourceFile::new("a.txt", b"abc".to_vec()));
        assert_eq!(session.source().unwrap().filename, "a.txt");
        assert!(!session.has_result());
    }

    #[test]
    fn commit_replaces_the_whole_result() {
        let mut session = CodecSession::with_source(SourceFile::new("a.txt", b"abc".to_vec()));
        session.commit(round_trip("first.lzw", vec![1, 2, 3]));
        session.commit(RoundTrip { auxiliary: None, ..round_trip("second.lzw", vec![4]) });

        let result = session.result().unwrap();
        assert_eq!(result.artifact.filename, "second.lzw");
        assert_eq!(result.auxiliary, None);
        assert_eq!(result.metrics.result_size, 1);
    }

    #[test]
    fn base64_artifact_is_checked_on_receipt() {
        assert!(Artifact::base64("ok.bin", "AAE=".to_string()).is_ok());
        assert!(matches!(
            Artifact::base64("bad.bin", "not*base64".to_string()),
            Err(PayloadError::Base64(_))
        ));
    }

    #[test]
    fn matrix_must_be_square_raster() {
        let short = vec![vec![0; RASTER_SIDE]; 10];
        assert!(matches!(
            PixelMatrix::new("original_image", short),
            Err(PayloadError::MatrixShape { rows: 10, .. })
        ));

        let mut ragged = vec![vec![0; RASTER_SIDE]; RASTER_SIDE];
        ragged[7].pop();
        assert!(matches!(
            PixelMatrix::new("error_matrix", ragged),
            Err(PayloadError::MatrixShape { row: 7, columns: 255, .. })
        ));

        assert!(PixelMatrix::new("ok", vec![vec![1; RASTER_SIDE]; RASTER_SIDE]).is_ok());
    }

    #[test]
    fn histogram_is_empty_or_complete() {
        assert!(Histogram::new("h", Vec::new()).unwrap().is_empty());
        assert!(Histogram::new("h", vec![0; HISTOGRAM_BINS]).is_ok());
        assert!(matches!(
            Histogram::new("h", vec![0; 255]),
            Err(PayloadError::HistogramBins { bins: 255, .. })
        ));
    }
}
