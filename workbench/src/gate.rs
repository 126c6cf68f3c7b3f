//! # UI gate
//!
//! The state machine deciding which controls of a panel are enabled:
//!
//! ```text
//! Idle -> FileSelected -> Submitting -> Ready
//!                                    \-> Failed
//! ```
//!
//! `Ready` and `Failed` both allow another submission. Selecting a new file
//! is possible from every state except `Submitting`, which also guarantees
//! at most one in-flight round trip per panel. A submission that is dropped
//! before it settles leaves the gate in `Failed`.
//!
//! The gate also owns the error banner. A banner expires a fixed time after
//! it was raised and a newer error replaces it.

use std::fmt;
use std::time::{Duration, Instant};

use crate::common::error::ValidationError;

/// Banner shown when a submission is abandoned mid-flight.
pub const CANCELLED: &str = "The request was cancelled before it completed";

/// States of one panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GateState {
    /// Nothing selected
    #[default]
    Idle,
    /// A file is loaded and can be submitted
    FileSelected,
    /// A round trip is in flight
    Submitting,
    /// The last round trip succeeded
    Ready,
    /// The last attempt failed
    Failed,
}

impl GateState {
    fn name(&self) -> &'static str {
        match self {
            GateState::Idle => "idle",
            GateState::FileSelected => "waiting for submission",
            GateState::Submitting => "submitting",
            GateState::Ready => "ready",
            GateState::Failed => "failed",
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Controls whose availability depends on the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Choose a source file
    SelectFile,
    /// Encode or decode
    Primary,
    /// Save the artifact
    Export,
    /// Show the codec's internal artifacts
    Details,
}

impl Control {
    fn name(&self) -> &'static str {
        match self {
            Control::SelectFile => "file selection",
            Control::Primary => "submission",
            Control::Export => "export",
            Control::Details => "details",
        }
    }
}

/// A transient error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    /// Text shown to the user
    pub message: String,
    raised_at: Instant,
    duration: Duration,
}

impl ErrorBanner {
    /// Whether the banner is still on screen at `now`.
    pub fn is_visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) < self.duration
    }
}

/// Control availability for one panel.
#[derive(Debug, Clone)]
pub struct Gate {
    state: GateState,
    banner: Option<ErrorBanner>,
    banner_duration: Duration,
}

impl Gate {
    /// A gate in `Idle`, showing banners for `banner_duration`.
    pub fn new(banner_duration: Duration) -> Self {
        Self {
            state: GateState::Idle,
            banner: None,
            banner_duration,
        }
    }

    /// The current state.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Whether `control` can be used. `has_result` tells whether the session
    /// holds a committed round trip.
    pub fn is_enabled(&self, control: Control, has_result: bool) -> bool {
        use GateState::*;
        match control {
            Control::SelectFile => self.state != Submitting,
            Control::Primary => matches!(self.state, FileSelected | Ready | Failed),
            Control::Export | Control::Details => has_result && matches!(self.state, Ready | Failed),
        }
    }

    /// Fail with [`ValidationError::ActionDisabled`] unless `control` is
    /// enabled.
    pub fn require(&self, control: Control, has_result: bool) -> Result<(), ValidationError> {
        if self.is_enabled(control, has_result) {
            return Ok(());
        }
        Err(ValidationError::ActionDisabled {
            action: control.name(),
            state: self.state.name(),
        })
    }

    /// A file was loaded.
    pub fn file_selected(&mut self) {
        self.state = GateState::FileSelected;
    }

    /// A file was refused before it became the session source.
    pub fn file_rejected(&mut self, message: String, now: Instant) {
        self.state = GateState::Idle;
        self.raise(message, now);
    }

    /// Enter `Submitting`, if the primary action is enabled. The gate stays
    /// there until the returned guard settles or is dropped.
    pub fn begin_submit(&mut self) -> Result<SubmitGuard<'_>, ValidationError> {
        self.require(Control::Primary, false)?;
        self.state = GateState::Submitting;
        Ok(SubmitGuard { gate: self })
    }

    /// Show an error banner, replacing any older one.
    pub fn raise(&mut self, message: String, now: Instant) {
        self.banner = Some(ErrorBanner {
            message,
            raised_at: now,
            duration: self.banner_duration,
        });
    }

    /// The banner visible at `now`, if any.
    pub fn banner(&self, now: Instant) -> Option<&ErrorBanner> {
        self.banner.as_ref().filter(|banner| banner.is_visible(now))
    }
}

/// An in-flight submission. Dropping it unsettled moves the gate to
/// `Failed` with the [`CANCELLED`] banner.
#[derive(Debug)]
pub struct SubmitGuard<'a> {
    gate: &'a mut Gate,
}

impl SubmitGuard<'_> {
    /// The round trip succeeded.
    pub fn succeeded(self) {
        self.gate.state = GateState::Ready;
    }

    /// Validation or the round trip failed.
    pub fn failed(self, message: String, now: Instant) {
        self.gate.state = GateState::Failed;
        self.gate.raise(message, now);
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if self.gate.state == GateState::Submitting {
            self.gate.state = GateState::Failed;
            self.gate.raise(CANCELLED.to_string(), Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const BANNER: Duration = Duration::from_secs(5);

    fn gate_in(state: GateState) -> Gate {
        Gate { state, banner: None, banner_duration: BANNER }
    }

    #[test_case(GateState::Idle, false; "idle")]
    #[test_case(GateState::FileSelected, true; "file selected")]
    #[test_case(GateState::Submitting, false; "submitting")]
    #[test_case(GateState::Ready, true; "ready")]
    #[test_case(GateState::Failed, true; "failed")]
    fn primary_action_availability(state: GateState, enabled: bool) {
        assert_eq!(gate_in(state).is_enabled(Control::Primary, false), enabled);
    }

    #[test]
    fn second_submission_is_refused_while_in_flight() {
        let mut gate = gate_in(GateState::Submitting);

        let err = gate.begin_submit().unwrap_err();
        assert_eq!(
            err,
            ValidationError::ActionDisabled { action: "submission", state: "submitting" }
        );
        assert!(!gate.is_enabled(Control::SelectFile, false));
        assert!(!gate.is_enabled(Control::Export, true));
    }

    #[test]
    fn export_needs_a_result_and_a_settled_state() {
        let mut gate = gate_in(GateState::FileSelected);
        assert!(!gate.is_enabled(Control::Export, false));

        gate.begin_submit().unwrap().succeeded();
        assert_eq!(gate.state(), GateState::Ready);
        assert!(gate.is_enabled(Control::Export, true));
        assert!(gate.is_enabled(Control::Details, true));
        assert!(gate.banner(Instant::now()).is_none());
    }

    #[test]
    fn abandoned_submission_leaves_the_panel_usable() {
        let mut gate = gate_in(GateState::FileSelected);
        drop(gate.begin_submit().unwrap());

        assert_eq!(gate.state(), GateState::Failed);
        assert!(gate.is_enabled(Control::SelectFile, false));
        assert!(gate.is_enabled(Control::Primary, false));
        assert_eq!(gate.banner(Instant::now()).unwrap().message, CANCELLED);
    }

    #[test]
    fn failure_keeps_prior_result_exportable() {
        let mut gate = gate_in(GateState::Ready);
        let guard = gate.begin_submit().unwrap();
        guard.failed("boom".to_string(), Instant::now());

        assert_eq!(gate.state(), GateState::Failed);
        assert!(gate.is_enabled(Control::Primary, true));
        assert!(gate.is_enabled(Control::Export, true));
        assert!(!gate.is_enabled(Control::Export, false));
    }

    #[test]
    fn rejected_file_returns_to_idle() {
        let mut gate = gate_in(GateState::Ready);
        gate.file_rejected("wrong extension".to_string(), Instant::now());

        assert_eq!(gate.state(), GateState::Idle);
        assert!(!gate.is_enabled(Control::Primary, false));
    }

    #[test]
    fn banner_expires_after_its_window() {
        let mut gate = Gate::new(BANNER);
        let raised = Instant::now();
        gate.raise("Network error".to_string(), raised);

        assert!(gate.banner(raised).is_some());
        assert!(gate.banner(raised + Duration::from_millis(4_999)).is_some());
        assert!(gate.banner(raised + BANNER).is_none());
    }

    #[test]
    fn newer_banner_replaces_older_one() {
        let mut gate = Gate::new(BANNER);
        let first = Instant::now();
        gate.raise("first".to_string(), first);
        gate.raise("second".to_string(), first + Duration::from_secs(4));

        let banner = gate.banner(first + Duration::from_secs(6)).unwrap();
        assert_eq!(banner.message, "second");
    }
}
