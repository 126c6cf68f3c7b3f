//! # Parameter validation
//!
//! Turns the raw options a user entered for a panel into an immutable
//! [`ParameterSet`], or rejects them with a [`ValidationError`] before any
//! request is built. The numeric bounds enforced here are the widths of the
//! fields in each codec's wire format.

use std::fmt;
use std::ops::RangeInclusive;

use crate::common::error::ValidationError;
use crate::common::{Family, Operation};

/// Bit widths the LZ77 offset field can be encoded with.
pub const OFFSET_BITS: RangeInclusive<i64> = 2..=15;
/// Bit widths the LZ77 match length field can be encoded with.
pub const LENGTH_BITS: RangeInclusive<i64> = 2..=7;
/// Dictionary index widths the LZW service accepts in manual mode.
pub const MANUAL_INDEX_BITS: RangeInclusive<i64> = 9..=15;

/// What the dictionary coder does once a manually sized dictionary is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OnFullPolicy {
    /// Stop adding entries and keep using the current dictionary
    #[default]
    Freeze,
    /// Empty the dictionary and start over
    Reset,
}

impl OnFullPolicy {
    /// The query value the service expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            OnFullPolicy::Freeze => "freeze",
            OnFullPolicy::Reset => "reset",
        }
    }
}

/// The pixel predictors the predictive image codec implements. `a` is the
/// left neighbour, `b` the one above and `c` the upper-left one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Predictor {
    /// Always 128
    Constant = 0,
    /// a
    Left = 1,
    /// b
    Above = 2,
    /// c
    UpperLeft = 3,
    /// a + b - c
    Gradient = 4,
    /// (a + (b - c)) / 2
    LeftGradient = 5,
    /// (b + (c - a)) / 2
    AboveGradient = 6,
    /// (a + b) / 2
    Average = 7,
    /// Paeth predictor over a, b, c
    Paeth = 8,
    /// sqrt(|a² - b² - c²|)
    Magnitude = 9,
}

impl Predictor {
    /// Every predictor, indexed by its id.
    pub const ALL: [Predictor; 10] = [
        Predictor::Constant,
        Predictor::Left,
        Predictor::Above,
        Predictor::UpperLeft,
        Predictor::Gradient,
        Predictor::LeftGradient,
        Predictor::AboveGradient,
        Predictor::Average,
        Predictor::Paeth,
        Predictor::Magnitude,
    ];

    /// The id sent on the wire as `prediction_number`.
    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Look a predictor up by id.
    pub fn from_id(id: i64) -> Result<Self, ValidationError> {
        usize::try_from(id)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(ValidationError::UnknownPredictor(id))
    }
}

impl fmt::Display for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formula = match self {
            Predictor::Constant => "128",
            Predictor::Left => "A",
            Predictor::Above => "B",
            Predictor::UpperLeft => "C",
            Predictor::Gradient => "A+B-C",
            Predictor::LeftGradient => "(A+(B-C))/2",
            Predictor::AboveGradient => "(B+(C-A))/2",
            Predictor::Average => "(A+B)/2",
            Predictor::Paeth => "Paeth",
            Predictor::Magnitude => "sqrt|A²-B²-C²|",
        };
        write!(f, "{} ({formula})", self.id())
    }
}

/// The options a user can set on any panel, exactly as entered. Which of
/// them matter depends on the family and operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOptions {
    /// LZ77 offset field width
    pub offset_bits: Option<i64>,
    /// LZ77 match length field width
    pub length_bits: Option<i64>,
    /// Let the LZW dictionary index width grow on demand
    pub auto_grow_index: bool,
    /// LZW index width used when auto grow is off
    pub manual_index_bits: Option<i64>,
    /// LZW behaviour once a manual dictionary is full
    pub on_full: OnFullPolicy,
    /// Widen the Huffman alphabet to 16-bit symbols
    pub two_bytes: bool,
    /// Predictor id for predictive coding
    pub predictor: Option<i64>,
    /// Ask the service for, and show, the codec's internal artifacts
    /// (codes, tokens, emitted codes)
    pub show_details: bool,
}

/// Dictionary index width selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    /// The service grows the index width as the dictionary fills
    Auto,
    /// A fixed width with an overflow policy
    Manual {
        /// Index width in bits
        bits: u8,
        /// What happens when the dictionary is full
        on_full: OnFullPolicy,
    },
}

/// A validated, immutable set of parameters for exactly one request.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterSet {
    /// Huffman encode
    EntropyEncode {
        /// Return the code table
        show_codes: bool,
        /// Use 16-bit symbols
        two_bytes: bool,
    },
    /// Huffman decode
    EntropyDecode {
        /// Return the code table
        show_codes: bool,
    },
    /// LZ77 encode
    WindowEncode {
        /// Offset field width
        offset_bits: u8,
        /// Length field width
        length_bits: u8,
        /// Return the emitted tokens
        display_tokens: bool,
    },
    /// LZ77 decode, the field widths are read from the artifact
    WindowDecode,
    /// LZW encode
    DictionaryEncode {
        /// Index width selection
        index: IndexWidth,
        /// Return the emitted codes
        show_emitted_codes: bool,
    },
    /// LZW decode
    DictionaryDecode {
        /// Return the decoded dictionary entries
        show_codes: bool,
    },
    /// Predictive encode
    PredictiveEncode {
        /// The predictor to run
        predictor: Predictor,
    },
    /// Predictive decode, the predictor is read from the artifact
    PredictiveDecode,
}

impl ParameterSet {
    /// The family and operation these parameters were validated for.
    pub fn target(&self) -> (Family, Operation) {
        match self {
            ParameterSet::EntropyEncode { .. } => (Family::Entropy, Operation::Encode),
            ParameterSet::EntropyDecode { .. } => (Family::Entropy, Operation::Decode),
            ParameterSet::WindowEncode { .. } => (Family::Window, Operation::Encode),
            ParameterSet::WindowDecode => (Family::Window, Operation::Decode),
            ParameterSet::DictionaryEncode { .. } => (Family::Dictionary, Operation::Encode),
            ParameterSet::DictionaryDecode { .. } => (Family::Dictionary, Operation::Decode),
            ParameterSet::PredictiveEncode { .. } => (Family::Predictive, Operation::Encode),
            ParameterSet::PredictiveDecode => (Family::Predictive, Operation::Decode),
        }
    }
}

/// Check a raw option set against the rules of a family and operation.
pub fn validate(
    family: Family,
    operation: Operation,
    raw: &RawOptions,
) -> Result<ParameterSet, ValidationError> {
    let params = match (family, operation) {
        (Family::Entropy, Operation::Encode) => ParameterSet::EntropyEncode {
            show_codes: raw.show_details,
            two_bytes: raw.two_bytes,
        },
        (Family::Entropy, Operation::Decode) => {
            ParameterSet::EntropyDecode { show_codes: raw.show_details }
        }
        (Family::Window, Operation::Encode) => ParameterSet::WindowEncode {
            offset_bits: bounded("offset_bits", raw.offset_bits, &OFFSET_BITS)?,
            length_bits: bounded("length_bits", raw.length_bits, &LENGTH_BITS)?,
            display_tokens: raw.show_details,
        },
        (Family::Window, Operation::Decode) => ParameterSet::WindowDecode,
        (Family::Dictionary, Operation::Encode) => ParameterSet::DictionaryEncode {
            index: index_width(raw)?,
            show_emitted_codes: raw.show_details,
        },
        (Family::Dictionary, Operation::Decode) => {
            ParameterSet::DictionaryDecode { show_codes: raw.show_details }
        }
        (Family::Predictive, Operation::Encode) => {
            let id = raw
                .predictor
                .ok_or(ValidationError::MissingParameter("predictor"))?;
            ParameterSet::PredictiveEncode { predictor: Predictor::from_id(id)? }
        }
        (Family::Predictive, Operation::Decode) => ParameterSet::PredictiveDecode,
    };

    Ok(params)
}

fn bounded(
    parameter: &'static str,
    value: Option<i64>,
    range: &RangeInclusive<i64>,
) -> Result<u8, ValidationError> {
    let value = value.ok_or(ValidationError::MissingParameter(parameter))?;
    if value < *range.start() {
        return Err(ValidationError::BelowMinimum {
            parameter,
            value,
            min: *range.start(),
        });
    }
    if value > *range.end() {
        return Err(ValidationError::AboveMaximum {
            parameter,
            value,
            max: *range.end(),
        });
    }
    // The ranges above all fit in a byte.
    u8::try_from(value).map_err(|_| ValidationError::AboveMaximum {
        parameter,
        value,
        max: *range.end(),
    })
}

fn index_width(raw: &RawOptions) -> Result<IndexWidth, ValidationError> {
    if raw.auto_grow_index {
        return Ok(IndexWidth::Auto);
    }

    let bits = raw
        .manual_index_bits
        .ok_or(ValidationError::MissingParameter("manual_index_bits"))?;
    if !MANUAL_INDEX_BITS.contains(&bits) {
        return Err(ValidationError::UnsupportedIndexBits(bits));
    }

    Ok(IndexWidth::Manual {
        bits: bits as u8,
        on_full: raw.on_full,
    })
}
