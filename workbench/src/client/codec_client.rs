//! This module sends encode and decode requests to the codec services.
//!
//! Each family is served from its own base URL and exposes `api/encode` and
//! `api/decode`. Entropy and dictionary coding take a multipart upload with
//! their parameters in the query string, window and predictive coding take a
//! JSON body carrying the file as a numeric byte array.
//!
//! Non-success statuses are mapped to [`TransportError::Status`] with the
//! message the service put in the body, if any.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::common::error::{Error, TransportError, ValidationError};
use crate::common::{Family, Operation, SourceFile};
use crate::config::{CodecServiceConfig, EndpointsConfig};
use crate::descriptor::{descriptor, RequestShape};
use crate::params::ParameterSet;
use crate::session::RoundTrip;

use super::{models, CodecRequest, CodecService};

/// Path prefix shared by every codec service
const API_BASE_PATH: &str = "api";

/// HTTP client for the per-family codec services
#[derive(Debug, Clone)]
pub struct CodecClient {
    client: Client,
    endpoints: EndpointsConfig,
}

impl CodecClient {
    /// Build a client with the configured timeout and endpoints.
    pub fn new(config: &CodecServiceConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoints: config.endpoints.clone(),
        })
    }

    fn endpoint_url(&self, family: Family, operation: Operation) -> Url {
        operation_url(self.endpoints.endpoint(family), operation)
    }

    fn build_request(&self, request: &CodecRequest<'_>) -> Result<RequestBuilder, Error> {
        let url = self.endpoint_url(request.family, request.operation);
        let builder = self.client.post(url);

        match descriptor(request.family).request_shape {
            RequestShape::Json => {
                let body = models::json_body(request).ok_or_else(|| mismatch(request))?;
                Ok(builder.json(&body))
            }
            RequestShape::Multipart => {
                let part = Part::bytes(request.source.bytes.clone())
                    .file_name(request.source.filename.clone());
                Ok(builder
                    .query(&models::query_pairs(request.params))
                    .multipart(Form::new().part("file", part)))
            }
        }
    }
}

impl CodecService for CodecClient {
    #[tracing::instrument(skip_all, fields(%family, %operation, filename = %source.filename))]
    async fn submit(
        &self,
        family: Family,
        operation: Operation,
        source: &SourceFile,
        params: &ParameterSet,
    ) -> Result<RoundTrip, Error> {
        let request = CodecRequest { family, operation, source, params };
        if request.params.target() != (request.family, request.operation) {
            return Err(mismatch(&request));
        }

        debug!(size = request.source.len(), "sending codec request");
        let response = self.build_request(&request)?.send().await?;
        let checked_response = check_api_response(response).await?;
        let body = checked_response.bytes().await?;

        let round_trip = (descriptor(request.family).parse_response)(&request, &body)?;
        debug!(
            artifact = %round_trip.artifact.filename,
            result_size = round_trip.metrics.result_size,
            "codec round trip complete"
        );
        Ok(round_trip)
    }
}

fn mismatch(request: &CodecRequest<'_>) -> Error {
    ValidationError::ParameterMismatch {
        expected: format!("{} {}", request.family, request.operation),
    }
    .into()
}

/// Append `api/{encode|decode}` to a base URL, keeping any path it already has.
fn operation_url(base: &Url, operation: Operation) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend([API_BASE_PATH, operation.path_segment()]);
    }
    url
}

/// Evaluates the HTTP response from the codec service and translates
/// non-success status codes into transport errors
async fn check_api_response(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = models::server_message(&body).unwrap_or_else(|| generic_message(status));
    warn!(%status, %message, "codec service returned an error");

    Err(TransportError::Status { status, message }.into())
}

fn generic_message(status: StatusCode) -> String {
    match status {
        StatusCode::BAD_REQUEST => "Bad request - Invalid parameters or data".to_string(),
        StatusCode::NOT_FOUND => "Not found - the codec service has no such endpoint".to_string(),
        StatusCode::PAYLOAD_TOO_LARGE => "The file is too large for the codec service".to_string(),
        StatusCode::REQUEST_TIMEOUT => "Request timeout".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
        StatusCode::SERVICE_UNAVAILABLE => "Service unavailable".to_string(),
        status => format!("Unhandled status code {status}"),
    }
}
