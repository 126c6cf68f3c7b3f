//! # Result renderer
//!
//! Pure functions from a committed [`RoundTrip`] to something a person can
//! look at. Nothing in here touches the session or the network, so a result
//! can be rendered any number of times with identical output.

use std::fmt;

use image::RgbaImage;

use crate::common::{Family, Operation};
use crate::config::RenderConfig;
use crate::session::{AuxiliaryData, RoundTrip};

pub mod bitmap;
pub mod histogram;
pub mod stats;
pub mod table;

pub use bitmap::{error_overlay, grayscale};
pub use histogram::HistogramChart;
pub use stats::{format_bytes, metric_lines, MetricLine};
pub use table::{code_rows, token_rows, CodeListView};

/// Knobs that change the rendering without changing the data.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Show the codec's internal artifacts
    pub show_details: bool,
    /// Gain of the error overlay
    pub error_scale: f64,
    /// Emitted dictionary codes listed before truncating
    pub emitted_code_limit: usize,
    /// Decoded dictionary entries listed before truncating
    pub decoded_code_limit: usize,
}

impl RenderOptions {
    /// Options seeded from the configuration, details hidden.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            show_details: false,
            error_scale: config.error_scale,
            emitted_code_limit: config.emitted_code_limit,
            decoded_code_limit: config.decoded_code_limit,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_details: false,
            error_scale: bitmap::DEFAULT_ERROR_SCALE,
            emitted_code_limit: 500,
            decoded_code_limit: 100,
        }
    }
}

/// Which histogram of a predictive result to chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HistogramSource {
    /// The source image
    Original,
    /// The prediction residuals
    Error,
    /// The reconstructed image
    Decoded,
}

impl fmt::Display for HistogramSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistogramSource::Original => f.write_str("original"),
            HistogramSource::Error => f.write_str("error"),
            HistogramSource::Decoded => f.write_str("decoded"),
        }
    }
}

/// What a raster shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterKind {
    /// The source image
    Original,
    /// The prediction residuals, scaled around mid gray
    ErrorOverlay,
    /// The reconstructed image
    Decoded,
}

impl RasterKind {
    /// Short name, used in file names of saved rasters.
    pub fn as_str(&self) -> &'static str {
        match self {
            RasterKind::Original => "original",
            RasterKind::ErrorOverlay => "error",
            RasterKind::Decoded => "decoded",
        }
    }
}

/// The internal artifacts of a round trip, as shown in the details pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailsView {
    /// Huffman code table rows
    Codes(Vec<String>),
    /// LZ77 token rows
    Tokens(Vec<String>),
    /// LZW code list
    CodeList(CodeListView),
}

impl fmt::Display for DetailsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailsView::Codes(rows) | DetailsView::Tokens(rows) => {
                write!(f, "{}", rows.join("\n"))
            }
            DetailsView::CodeList(list) => write!(f, "{list}"),
        }
    }
}

/// A rendered round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    /// Suggested name of the exported artifact
    pub artifact_name: String,
    /// Metric lines
    pub metrics: Vec<MetricLine>,
    /// Extra lines such as the recovered predictor
    pub notes: Vec<String>,
    /// Details pane, present only when requested and available
    pub details: Option<DetailsView>,
    /// Rasters of predictive results
    pub rasters: Vec<(RasterKind, RgbaImage)>,
}

/// Render a committed round trip.
pub fn render_result(
    family: Family,
    operation: Operation,
    round_trip: &RoundTrip,
    options: &RenderOptions,
) -> ResultView {
    let mut notes = Vec::new();
    let mut rasters = Vec::new();
    let mut details = None;

    match &round_trip.auxiliary {
        Some(AuxiliaryData::CodeTable(entries)) if options.show_details => {
            details = Some(DetailsView::Codes(code_rows(entries)));
        }
        Some(AuxiliaryData::Tokens(tokens)) if options.show_details => {
            details = Some(DetailsView::Tokens(token_rows(tokens)));
        }
        Some(AuxiliaryData::EmittedCodes(codes)) if options.show_details && !codes.is_empty() => {
            details = Some(DetailsView::CodeList(CodeListView::emitted_codes(
                codes,
                options.emitted_code_limit,
            )));
        }
        Some(AuxiliaryData::DecodedCodes(codes)) if options.show_details && !codes.is_empty() => {
            details = Some(DetailsView::CodeList(CodeListView::decoded_codes(
                codes,
                options.decoded_code_limit,
            )));
        }
        Some(AuxiliaryData::Prediction(prediction)) => {
            notes.push(format!("Encoded with predictor {}", prediction.predictor));
            rasters.push((RasterKind::Original, grayscale(&prediction.original)));
            rasters.push((
                RasterKind::ErrorOverlay,
                error_overlay(&prediction.error, options.error_scale),
            ));
        }
        Some(AuxiliaryData::Reconstruction(reconstruction)) => {
            let predictor = reconstruction
                .predictor
                .map_or_else(|| "unknown".to_string(), |id| id.to_string());
            notes.push(format!("Decoded successfully with predictor {predictor}"));
            rasters.push((RasterKind::Decoded, grayscale(&reconstruction.decoded)));
        }
        _ => {}
    }

    ResultView {
        artifact_name: round_trip.artifact.filename.clone(),
        metrics: metric_lines(family, operation, &round_trip.metrics),
        notes,
        details,
        rasters,
    }
}

/// Chart one of the histograms of a predictive result. `None` when the
/// result carries no such histogram or it is empty.
pub fn histogram_chart(round_trip: &RoundTrip, source: HistogramSource) -> Option<HistogramChart> {
    let histogram = match (&round_trip.auxiliary, source) {
        (Some(AuxiliaryData::Prediction(p)), HistogramSource::Original) => &p.original_histogram,
        (Some(AuxiliaryData::Prediction(p)), HistogramSource::Error) => &p.error_histogram,
        (Some(AuxiliaryData::Reconstruction(r)), HistogramSource::Decoded) => &r.decoded_histogram,
        _ => return None,
    };

    (!histogram.is_empty()).then(|| HistogramChart::new(histogram))
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Output file: {}", self.artifact_name)?;
        for line in &self.metrics {
            writeln!(f, "{line}")?;
        }
        for note in &self.notes {
            writeln!(f, "{note}")?;
        }
        if let Some(details) = &self.details {
            writeln!(f, "{details}")?;
        }
        Ok(())
    }
}
