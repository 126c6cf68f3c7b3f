//! # Panel controller
//!
//! A [`Controller`] drives one panel (one operation of one family). It owns
//! the panel's [`CodecSession`] and [`Gate`] and exposes one handler per
//! user action. Every failure is caught here, turned into an error banner
//! and also returned to the caller.
//!
//! A [`FamilyWorkbench`] pairs the encode and decode panels of a family.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::client::CodecService;
use crate::common::error::{Error, ValidationError};
use crate::common::{Family, Operation, SourceFile};
use crate::config::Settings;
use crate::descriptor::{descriptor, CodecDescriptor};
use crate::export::{self, Blob};
use crate::gate::{Control, Gate, GateState};
use crate::params::RawOptions;
use crate::render::{self, HistogramChart, HistogramSource, RenderOptions, ResultView};
use crate::session::CodecSession;

/// State and action handlers of one panel.
#[derive(Debug)]
pub struct Controller {
    descriptor: &'static CodecDescriptor,
    operation: Operation,
    session: CodecSession,
    gate: Gate,
    options: RawOptions,
    render: RenderOptions,
}

impl Controller {
    /// An idle panel.
    pub fn new(
        descriptor: &'static CodecDescriptor,
        operation: Operation,
        render: RenderOptions,
        banner_duration: Duration,
    ) -> Self {
        Self {
            descriptor,
            operation,
            session: CodecSession::default(),
            gate: Gate::new(banner_duration),
            options: RawOptions {
                show_details: render.show_details,
                ..Default::default()
            },
            render,
        }
    }

    /// The family this panel belongs to.
    pub fn family(&self) -> Family {
        self.descriptor.family
    }

    /// Encode or decode.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The current gate state.
    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    /// The panel's session.
    pub fn session(&self) -> &CodecSession {
        &self.session
    }

    /// The options that will be validated on the next submission.
    pub fn options(&self) -> &RawOptions {
        &self.options
    }

    /// Replace the options used by the next submission. The details toggle
    /// is applied like [`Controller::set_show_details`].
    pub fn set_options(&mut self, options: RawOptions) {
        self.render.show_details = options.show_details;
        self.options = options;
    }

    /// Whether `control` is currently usable.
    pub fn is_enabled(&self, control: Control) -> bool {
        self.gate.is_enabled(control, self.session.has_result())
    }

    /// Handle a file selection. The previous session is discarded. A decode
    /// source with the wrong extension is refused and leaves the panel idle.
    /// Families that decode on selection submit right away.
    #[tracing::instrument(skip_all, fields(
        family = %self.descriptor.family,
        operation = %self.operation,
        filename = %source.filename,
    ))]
    pub async fn select_file<S>(&mut self, source: SourceFile, service: &S) -> Result<(), Error>
    where
        S: CodecService,
    {
        let now = Instant::now();
        self.gate.require(Control::SelectFile, self.session.has_result())?;

        if self.operation == Operation::Decode {
            if let Err(err) = self.descriptor.check_decode_source(&source.filename) {
                warn!(%err, "refused decode source");
                self.session = CodecSession::default();
                self.gate.file_rejected(err.to_string(), now);
                return Err(err.into());
            }
        }

        debug!(size = source.len(), "file selected");
        self.session = CodecSession::with_source(source);
        self.gate.file_selected();

        if self.operation == Operation::Decode && self.descriptor.auto_decode_on_select {
            return self.submit(service).await;
        }
        Ok(())
    }

    /// Handle the primary action: validate, round trip, commit. On failure
    /// the previous result, if any, stays in place.
    #[tracing::instrument(skip_all, fields(
        family = %self.descriptor.family,
        operation = %self.operation,
    ))]
    pub async fn submit<S>(&mut self, service: &S) -> Result<(), Error>
    where
        S: CodecService,
    {
        let guard = self.gate.begin_submit()?;

        let outcome = match self.descriptor.validate(self.operation, &self.options) {
            Ok(params) => match self.session.source() {
                Some(source) => {
                    service
                        .submit(self.descriptor.family, self.operation, source, &params)
                        .await
                }
                None => Err(ValidationError::NoFileSelected.into()),
            },
            Err(err) => Err(err.into()),
        };

        match outcome {
            Ok(round_trip) => {
                info!(artifact = %round_trip.artifact.filename, "round trip committed");
                self.session.commit(round_trip);
                guard.succeeded();
                Ok(())
            }
            Err(err) => {
                warn!(%err, "round trip failed");
                guard.failed(err.user_message(), Instant::now());
                Err(err)
            }
        }
    }

    /// Show or hide the details pane. Takes effect on the cached result
    /// immediately and on what the next submission asks for.
    pub fn set_show_details(&mut self, show: bool) {
        self.options.show_details = show;
        self.render.show_details = show;
    }

    /// Change the gain of the error overlay.
    pub fn set_error_scale(&mut self, scale: f64) -> Result<(), ValidationError> {
        if !scale.is_finite() || scale <= 0.0 {
            let err = ValidationError::InvalidErrorScale(scale.to_string());
            self.gate.raise(err.to_string(), Instant::now());
            return Err(err);
        }
        self.render.error_scale = scale;
        Ok(())
    }

    /// Chart one of the histograms of the current result. Raises a banner
    /// when there is nothing to chart.
    pub fn histogram(&mut self, source: HistogramSource) -> Result<HistogramChart, ValidationError> {
        self.session
            .result()
            .and_then(|result| render::histogram_chart(result, source))
            .ok_or_else(|| {
                let err = ValidationError::NoHistogramData;
                self.gate.raise(err.to_string(), Instant::now());
                err
            })
    }

    /// Rebuild the artifact for saving.
    pub fn export(&self) -> Result<Blob, Error> {
        self.gate.require(Control::Export, self.session.has_result())?;
        let result = self
            .session
            .result()
            .ok_or(ValidationError::ActionDisabled { action: "export", state: "idle" })?;
        Ok(export::build_blob(self.descriptor.family, self.operation, &result.artifact)?)
    }

    /// Render the panel as it looks at `now`.
    pub fn render(&self, now: Instant) -> PanelView {
        let options = RenderOptions {
            show_details: self.render.show_details && self.is_enabled(Control::Details),
            ..self.render.clone()
        };
        PanelView {
            title: self.descriptor.title,
            operation: self.operation,
            state: self.gate.state(),
            source: self
                .session
                .source()
                .map(|source| (source.filename.clone(), source.len() as u64)),
            banner: self.gate.banner(now).map(|banner| banner.message.clone()),
            result: self.session.result().map(|result| {
                render::render_result(self.descriptor.family, self.operation, result, &options)
            }),
            export_enabled: self.is_enabled(Control::Export),
        }
    }
}

/// A rendered panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    /// Scheme name
    pub title: &'static str,
    /// Encode or decode
    pub operation: Operation,
    /// Gate state
    pub state: GateState,
    /// Selected file name and size
    pub source: Option<(String, u64)>,
    /// Visible error banner
    pub banner: Option<String>,
    /// Rendered result
    pub result: Option<ResultView>,
    /// Whether the artifact can be saved
    pub export_enabled: bool,
}

impl fmt::Display for PanelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) - {}", self.title, self.operation, self.state)?;
        if let Some((name, size)) = &self.source {
            writeln!(f, "Selected: {name} ({})", render::format_bytes(*size))?;
        }
        if let Some(banner) = &self.banner {
            writeln!(f, "Error: {banner}")?;
        }
        if let Some(result) = &self.result {
            write!(f, "{result}")?;
        }
        Ok(())
    }
}

/// The encode and decode panels of one family.
#[derive(Debug)]
pub struct FamilyWorkbench {
    encode: Controller,
    decode: Controller,
}

impl FamilyWorkbench {
    /// Both panels of `family`, idle.
    pub fn new(family: Family, settings: &Settings) -> Self {
        let descriptor = descriptor(family);
        let render = RenderOptions::from_config(&settings.render);
        let banner = settings.ui.error_banner_duration;
        Self {
            encode: Controller::new(descriptor, Operation::Encode, render.clone(), banner),
            decode: Controller::new(descriptor, Operation::Decode, render, banner),
        }
    }

    /// The panel of an operation.
    pub fn panel(&self, operation: Operation) -> &Controller {
        match operation {
            Operation::Encode => &self.encode,
            Operation::Decode => &self.decode,
        }
    }

    /// The panel of an operation, for handling actions.
    pub fn panel_mut(&mut self, operation: Operation) -> &mut Controller {
        match operation {
            Operation::Encode => &mut self.encode,
            Operation::Decode => &mut self.decode,
        }
    }

    /// Chart a histogram from whichever panel holds it. The banner of a
    /// missing histogram is raised on that panel and also returned.
    pub fn histogram(&mut self, source: HistogramSource) -> Result<HistogramChart, ValidationError> {
        match source {
            HistogramSource::Original | HistogramSource::Error => self.encode.histogram(source),
            HistogramSource::Decoded => self.decode.histogram(source),
        }
    }
}
