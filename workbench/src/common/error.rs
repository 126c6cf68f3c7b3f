//! Top-level error type for the codec workbench

use reqwest::StatusCode;

/// Local precondition failures. These never reach the network.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A numeric parameter is smaller than the smallest value the wire
    /// format can carry
    #[error("{parameter} is {value}, below the minimum of {min}")]
    BelowMinimum {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Value supplied by the user
        value: i64,
        /// Inclusive lower bound
        min: i64,
    },

    /// A numeric parameter is larger than the largest value the wire format
    /// can carry
    #[error("{parameter} is {value}, above the maximum of {max}")]
    AboveMaximum {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Value supplied by the user
        value: i64,
        /// Inclusive upper bound
        max: i64,
    },

    /// A required parameter was not supplied
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The manual dictionary index width is not one the service supports
    #[error("manual index bits must be one of 9 through 15, got {0}")]
    UnsupportedIndexBits(i64),

    /// The predictor id is not a member of the predictor set
    #[error("unknown predictor {0}, expected 0 through 9")]
    UnknownPredictor(i64),

    /// The parameter set does not belong to the requested family/operation
    #[error("parameters for {expected} were expected")]
    ParameterMismatch {
        /// The family and operation the request targets
        expected: String,
    },

    /// No source file has been selected yet
    #[error("no file selected")]
    NoFileSelected,

    /// The selected file does not carry the family's decode extension
    #[error("file must have {expected} extension, got '{filename}'")]
    WrongExtension {
        /// The rejected file name
        filename: String,
        /// The extension the family requires
        expected: &'static str,
    },

    /// The error overlay gain is not a positive finite number
    #[error("error scale must be a positive number, got {0}")]
    InvalidErrorScale(String),

    /// The requested histogram is absent from the panel's current result
    #[error("No histogram data for selected source")]
    NoHistogramData,

    /// The requested action is disabled in the current panel state
    #[error("{action} is not available while the panel is {state}")]
    ActionDisabled {
        /// The action that was attempted
        action: &'static str,
        /// The panel state at the time
        state: &'static str,
    },
}

/// Failures of the round trip itself: the network or the service said no.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The service answered with a non-success status code
    #[error("HTTP request failed with status code {status}: {message}")]
    Status {
        /// The status code returned by the service
        status: StatusCode,
        /// The server supplied message, or a generic description
        message: String,
    },

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a success status but flagged the operation
    /// as failed in the body
    #[error("{0}")]
    Rejected(String),
}

/// A success response that cannot be turned into a session result.
#[derive(thiserror::Error, Debug)]
pub enum PayloadError {
    /// Mismatch between the expected response model and what the service
    /// returned, usually a missing required field
    #[error("Invalid API response structure: {0}")]
    InvalidApiResponse(String),

    /// The body is not valid JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The artifact is not valid standard base64
    #[error("artifact is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A pixel matrix does not have the fixed raster dimensions
    #[error("{field} must be 256x256, got {rows} rows with {columns} columns in row {row}")]
    MatrixShape {
        /// Response field holding the matrix
        field: &'static str,
        /// Number of rows received
        rows: usize,
        /// Index of the first offending row
        row: usize,
        /// Number of columns in that row
        columns: usize,
    },

    /// A histogram does not have 256 bins
    #[error("{field} must have 256 bins, got {bins}")]
    HistogramBins {
        /// Response field holding the histogram
        field: &'static str,
        /// Number of bins received
        bins: usize,
    },
}

/// Errors occurring anywhere in the workbench
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A local precondition failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The round trip failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response could not be interpreted
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Reading a source file or writing an export failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a rendered raster failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::Network(err))
    }
}

impl Error {
    /// Converts the error into the message shown to the user in the error
    /// banner. Payload errors are shown the same way as transport errors.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(err) => err.to_string(),
            Error::Transport(TransportError::Status { message, .. }) => message.clone(),
            Error::Transport(TransportError::Network(_)) => {
                "Network error - the codec service could not be reached".to_string()
            }
            Error::Transport(TransportError::Rejected(message)) => message.clone(),
            Error::Payload(err) => format!("Unexpected response from the codec service: {err}"),
            Error::Config(err) => format!("Configuration error: {err}"),
            Error::Io(err) => format!("File error: {err}"),
            Error::Image(err) => format!("Image error: {err}"),
        }
    }

    /// Whether the error was raised before any request was issued.
    pub fn is_local(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
