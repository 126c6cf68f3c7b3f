//! # Codec descriptors
//!
//! Everything that differs between the four codec families is captured in a
//! static [`CodecDescriptor`]. The controller, transport and renderer are
//! written once against this table.

use crate::client::models;
use crate::client::CodecRequest;
use crate::common::error::{Error, ValidationError};
use crate::common::{Family, Operation};
use crate::params::{self, ParameterSet, RawOptions};
use crate::session::RoundTrip;

/// How the request body is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// JSON body with the file as a numeric byte array
    Json,
    /// Multipart body with a `file` part, parameters in the query string
    Multipart,
}

/// The extension a file must carry before it can be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeExtension {
    /// Any file may be decoded
    Any,
    /// The name must end with this exact suffix
    Exact(&'static str),
    /// The name must end with this suffix, ignoring ASCII case
    IgnoreCase(&'static str),
}

impl DecodeExtension {
    /// Whether `filename` carries the required extension.
    pub fn matches(&self, filename: &str) -> bool {
        match *self {
            DecodeExtension::Any => true,
            DecodeExtension::Exact(suffix) => filename.ends_with(suffix),
            DecodeExtension::IgnoreCase(suffix) => filename
                .len()
                .checked_sub(suffix.len())
                .and_then(|start| filename.get(start..))
                .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix)),
        }
    }
}

/// Turns a success body into a [`RoundTrip`].
pub type ResponseParser = fn(&CodecRequest<'_>, &[u8]) -> Result<RoundTrip, Error>;

/// The static description of one codec family.
#[derive(Clone, Copy)]
pub struct CodecDescriptor {
    /// The family described
    pub family: Family,
    /// Human readable name of the scheme
    pub title: &'static str,
    /// Request body format
    pub request_shape: RequestShape,
    /// Extension gate applied to decode sources
    pub decode_extension: DecodeExtension,
    /// Whether selecting a decode source submits it right away
    pub auto_decode_on_select: bool,
    /// Response parser for both operations
    pub parse_response: ResponseParser,
}

impl std::fmt::Debug for CodecDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecDescriptor")
            .field("family", &self.family)
            .field("request_shape", &self.request_shape)
            .field("decode_extension", &self.decode_extension)
            .field("auto_decode_on_select", &self.auto_decode_on_select)
            .finish_non_exhaustive()
    }
}

/// Huffman coding.
pub static ENTROPY: CodecDescriptor = CodecDescriptor {
    family: Family::Entropy,
    title: "Huffman coding",
    request_shape: RequestShape::Multipart,
    decode_extension: DecodeExtension::Any,
    auto_decode_on_select: false,
    parse_response: models::parse_entropy,
};

/// LZ77 coding.
pub static WINDOW: CodecDescriptor = CodecDescriptor {
    family: Family::Window,
    title: "LZ77 coding",
    request_shape: RequestShape::Json,
    decode_extension: DecodeExtension::Exact(".lz77"),
    auto_decode_on_select: false,
    parse_response: models::parse_window,
};

/// LZW coding.
pub static DICTIONARY: CodecDescriptor = CodecDescriptor {
    family: Family::Dictionary,
    title: "LZW coding",
    request_shape: RequestShape::Multipart,
    decode_extension: DecodeExtension::IgnoreCase(".lzw"),
    auto_decode_on_select: false,
    parse_response: models::parse_dictionary,
};

/// Predictive image coding.
pub static PREDICTIVE: CodecDescriptor = CodecDescriptor {
    family: Family::Predictive,
    title: "Predictive image coding",
    request_shape: RequestShape::Json,
    decode_extension: DecodeExtension::Any,
    auto_decode_on_select: true,
    parse_response: models::parse_predictive,
};

/// Look up the descriptor of a family.
pub fn descriptor(family: Family) -> &'static CodecDescriptor {
    match family {
        Family::Entropy => &ENTROPY,
        Family::Window => &WINDOW,
        Family::Dictionary => &DICTIONARY,
        Family::Predictive => &PREDICTIVE,
    }
}

impl CodecDescriptor {
    /// Reject a decode source that lacks the family's extension.
    pub fn check_decode_source(&self, filename: &str) -> Result<(), ValidationError> {
        match self.decode_extension {
            DecodeExtension::Exact(expected) | DecodeExtension::IgnoreCase(expected)
                if !self.decode_extension.matches(filename) =>
            {
                Err(ValidationError::WrongExtension {
                    filename: filename.to_string(),
                    expected,
                })
            }
            _ => Ok(()),
        }
    }

    /// Validate raw options for one of this family's operations.
    pub fn validate(
        &self,
        operation: Operation,
        raw: &RawOptions,
    ) -> Result<ParameterSet, ValidationError> {
        params::validate(self.family, operation, raw)
    }
}
