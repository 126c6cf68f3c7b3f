/// Configuration error variants.
#[derive(Debug, thiserror::Error)]
pub enum WorkbenchConfigError {
    /// Scheme must be HTTP or HTTPS
    #[error("[codec_service.endpoints.{0}] Invalid URL scheme: must be HTTP or HTTPS, got '{1}'")]
    InvalidUrlScheme(&'static str, String),

    /// Host is required
    #[error("[codec_service.endpoints.{0}] Invalid URL: host is required")]
    UrlHostRequired(&'static str),

    /// An error returned for duration parameters that must be positive.
    #[error("Duration for {0} must be nonzero")]
    ZeroDurationForbidden(&'static str),

    /// The error overlay gain must be a positive, finite number
    #[error("[render] error_scale must be a positive number, got {0}")]
    InvalidErrorScale(f64),

    /// Truncation caps must allow at least one entry to be shown
    #[error("[render] {0} must be at least 1")]
    ZeroCodeLimit(&'static str),
}
