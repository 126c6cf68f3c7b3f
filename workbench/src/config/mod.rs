//! Configuration management for the workbench
use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use config::FileFormat;
use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::common::Family;
use crate::config::error::WorkbenchConfigError;
use crate::config::serialization::duration_seconds_deserializer;
use crate::config::serialization::url_deserializer_single;

mod error;
mod serialization;

/// The configuration shipped with the binary. Loaded first so that files and
/// environment variables only need to carry overrides.
const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Trait for validating configuration values.
trait Validatable {
    /// Validate the configuration values.
    fn validate(&self, cfg: &Settings) -> Result<(), ConfigError>;
}

/// Top-level configuration for the workbench
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    /// Where the remote codec service lives
    pub codec_service: CodecServiceConfig,
    /// Result renderer settings
    pub render: RenderConfig,
    /// Interaction surface settings
    pub ui: UiConfig,
    /// Export settings
    pub export: ExportConfig,
}

/// Codec service configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct CodecServiceConfig {
    /// How long a round trip may take before it is reported as failed.
    #[serde(deserialize_with = "duration_seconds_deserializer")]
    pub request_timeout: Duration,
    /// One base URL per codec family.
    pub endpoints: EndpointsConfig,
}

/// Base URLs of the per-family codec services.
#[derive(Deserialize, Clone, Debug)]
pub struct EndpointsConfig {
    /// Entropy (Huffman) coding service
    #[serde(deserialize_with = "url_deserializer_single")]
    pub entropy: Url,
    /// Window (LZ77) coding service
    #[serde(deserialize_with = "url_deserializer_single")]
    pub window: Url,
    /// Dictionary (LZW) coding service
    #[serde(deserialize_with = "url_deserializer_single")]
    pub dictionary: Url,
    /// Predictive image coding service
    #[serde(deserialize_with = "url_deserializer_single")]
    pub predictive: Url,
}

impl EndpointsConfig {
    /// The base URL of the service implementing the given family.
    pub fn endpoint(&self, family: Family) -> &Url {
        match family {
            Family::Entropy => &self.entropy,
            Family::Window => &self.window,
            Family::Dictionary => &self.dictionary,
            Family::Predictive => &self.predictive,
        }
    }
}

impl Validatable for CodecServiceConfig {
    fn validate(&self, _: &Settings) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Message(
                WorkbenchConfigError::ZeroDurationForbidden("codec_service.request_timeout")
                    .to_string(),
            ));
        }

        for family in Family::ALL {
            let name = family_key(family);
            let endpoint = self.endpoints.endpoint(family);
            if !["http", "https"].contains(&endpoint.scheme()) {
                let err =
                    WorkbenchConfigError::InvalidUrlScheme(name, endpoint.scheme().to_string());
                return Err(ConfigError::Message(err.to_string()));
            }
            if endpoint.host_str().is_none() {
                let err = WorkbenchConfigError::UrlHostRequired(name);
                return Err(ConfigError::Message(err.to_string()));
            }
        }

        Ok(())
    }
}

fn family_key(family: Family) -> &'static str {
    match family {
        Family::Entropy => "entropy",
        Family::Window => "window",
        Family::Dictionary => "dictionary",
        Family::Predictive => "predictive",
    }
}

/// Result renderer configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct RenderConfig {
    /// Initial gain of the error-diffusion overlay.
    pub error_scale: f64,
    /// How many emitted dictionary codes are listed before truncating.
    pub emitted_code_limit: usize,
    /// How many decoded dictionary entries are listed before truncating.
    pub decoded_code_limit: usize,
}

impl Validatable for RenderConfig {
    fn validate(&self, _: &Settings) -> Result<(), ConfigError> {
        if !self.error_scale.is_finite() || self.error_scale <= 0.0 {
            let err = WorkbenchConfigError::InvalidErrorScale(self.error_scale);
            return Err(ConfigError::Message(err.to_string()));
        }
        if self.emitted_code_limit == 0 {
            let err = WorkbenchConfigError::ZeroCodeLimit("emitted_code_limit");
            return Err(ConfigError::Message(err.to_string()));
        }
        if self.decoded_code_limit == 0 {
            let err = WorkbenchConfigError::ZeroCodeLimit("decoded_code_limit");
            return Err(ConfigError::Message(err.to_string()));
        }
        Ok(())
    }
}

/// Interaction surface configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct UiConfig {
    /// How long an error banner stays visible.
    #[serde(
        rename = "error_banner_secs",
        deserialize_with = "duration_seconds_deserializer"
    )]
    pub error_banner_duration: Duration,
}

/// Export configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct ExportConfig {
    /// Directory exported artifacts are written into.
    pub output_dir: PathBuf,
}

impl Settings {
    /// Initializing the config first with the embedded default values, then
    /// with an optional file and finally with provided/overwritten environment
    /// variables. The explicit separator with double underscores is needed to
    /// correctly parse the nested config structure.
    ///
    /// The environment variables are prefixed with `WORKBENCH_` and the nested
    /// fields are separated with double underscores. For example, the path
    /// `codec_service.endpoints.window` is set with
    /// `WORKBENCH_CODEC_SERVICE__ENDPOINTS__WINDOW`.
    pub fn new(config_path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        let env = Environment::with_prefix("WORKBENCH")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);

        let mut cfg_builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(path) = config_path {
            cfg_builder = cfg_builder.add_source(File::from(path.as_ref()));
        }
        cfg_builder = cfg_builder.add_source(env);

        let cfg = cfg_builder.build()?;

        let settings: Settings = cfg.try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    /// Load the embedded defaults and environment overrides only.
    pub fn new_from_default_config() -> Result<Self, ConfigError> {
        Self::new(None::<&Path>)
    }

    /// Perform validation on the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.codec_service.validate(self)?;
        self.render.validate(self)?;

        if self.ui.error_banner_duration.is_zero() {
            return Err(ConfigError::Message(
                WorkbenchConfigError::ZeroDurationForbidden("ui.error_banner_secs").to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    /// Helper function to quickly create a URL from a string in tests.
    fn url(s: &str) -> Url {
        s.parse().unwrap()
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    /// This test checks that the default configuration values are loaded
    /// correctly from the default.toml file.
    // !! NOTE: This test needs to be updated if the default values in the
    // !! default.toml file are changed.
    #[test]
    fn default_config_toml_loads() {
        let settings = Settings::new_from_default_config()
            .expect("Failed create settings from default config");

        assert_eq!(settings.codec_service.request_timeout, Duration::from_secs(30));
        assert_eq!(
            settings.codec_service.endpoints.entropy,
            url("http://127.0.0.1:8080")
        );
        assert_eq!(
            settings.codec_service.endpoints.endpoint(Family::Predictive),
            &url("http://127.0.0.1:8083")
        );
        assert_eq!(settings.render.error_scale, 1.5);
        assert_eq!(settings.render.emitted_code_limit, 500);
        assert_eq!(settings.render.decoded_code_limit, 100);
        assert_eq!(settings.ui.error_banner_duration, Duration::from_secs(5));
    }

    #[test]
    fn file_overrides_defaults() {
        let file = config_file(
            r#"
            [codec_service.endpoints]
            window = "https://codec.example.com:9000"

            [render]
            error_scale = 3.0
            "#,
        );

        let settings = Settings::new(Some(file.path())).unwrap();
        assert_eq!(
            settings.codec_service.endpoints.window,
            url("https://codec.example.com:9000")
        );
        assert_eq!(settings.render.error_scale, 3.0);
        assert_eq!(settings.render.emitted_code_limit, 500);
    }

    #[test]
    fn environment_overrides_export_dir() {
        std::env::set_var("WORKBENCH_EXPORT__OUTPUT_DIR", "/tmp/workbench-exports");
        let settings = Settings::new_from_default_config();
        std::env::remove_var("WORKBENCH_EXPORT__OUTPUT_DIR");

        assert_eq!(
            settings.unwrap().export.output_dir,
            PathBuf::from("/tmp/workbench-exports")
        );
    }

    #[test_case::test_case("ftp://127.0.0.1:21"; "ftp scheme")]
    #[test_case::test_case("file:///tmp/codec"; "file scheme")]
    fn invalid_endpoint_scheme_is_rejected(endpoint: &str) {
        let file = config_file(&format!(
            "[codec_service.endpoints]\ndictionary = \"{endpoint}\"\n"
        ));

        let err = Settings::new(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Invalid URL scheme"), "{err}");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let file = config_file("[codec_service]\nrequest_timeout = 0\n");

        let err = Settings::new(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("must be nonzero"), "{err}");
    }

    #[test_case::test_case("error_scale = 0.0"; "zero scale")]
    #[test_case::test_case("error_scale = -1.5"; "negative scale")]
    #[test_case::test_case("emitted_code_limit = 0"; "zero emitted limit")]
    #[test_case::test_case("decoded_code_limit = 0"; "zero decoded limit")]
    fn invalid_render_settings_are_rejected(line: &str) {
        let file = config_file(&format!("[render]\n{line}\n"));

        assert!(Settings::new(Some(file.path())).is_err());
    }
}
