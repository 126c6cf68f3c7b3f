//! This module provides the transport to the remote codec service

use std::future::Future;

use crate::common::error::Error;
use crate::common::{Family, Operation, SourceFile};
use crate::params::ParameterSet;
use crate::session::RoundTrip;

/// Client for the HTTP codec service
pub mod codec_client;
/// Request and response models of the codec service
pub mod models;

pub use codec_client::CodecClient;

/// Everything needed to issue one encode or decode request.
#[derive(Debug, Clone, Copy)]
pub struct CodecRequest<'a> {
    /// The family whose service is addressed
    pub family: Family,
    /// Encode or decode
    pub operation: Operation,
    /// The file to send
    pub source: &'a SourceFile,
    /// Validated parameters, which must target `family` and `operation`
    pub params: &'a ParameterSet,
}

/// A remote codec: one opaque round trip per request.
#[cfg_attr(test, mockall::automock())]
pub trait CodecService: Send + Sync {
    /// Send `source` to the `family` service for `operation` and turn the
    /// response into a [`RoundTrip`]. `params` must target the same family
    /// and operation.
    fn submit(
        &self,
        family: Family,
        operation: Operation,
        source: &SourceFile,
        params: &ParameterSet,
    ) -> impl Future<Output = Result<RoundTrip, Error>> + Send;
}
