//! Wire models of the codec service, one request/response pair per family
//! and operation, and their conversion into a [`RoundTrip`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::common::error::{Error, PayloadError, TransportError};
use crate::params::{IndexWidth, ParameterSet};
use crate::session::{
    Artifact, AuxiliaryData, CodeEntry, Histogram, Metrics, PixelMatrix, Prediction,
    Reconstruction, RoundTrip, Token,
};

use super::CodecRequest;

/// JSON request bodies, for the families that post raw bytes as a numeric
/// array.
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum JsonBody<'a> {
    /// LZ77 encode
    WindowEncode {
        /// Source file name
        filename: &'a str,
        /// Source bytes
        file_data: &'a [u8],
        /// Offset field width
        offset_bits: u8,
        /// Length field width
        length_bits: u8,
        /// Return tokens
        display_tokens: bool,
    },
    /// LZ77 decode
    WindowDecode {
        /// Artifact file name
        filename: &'a str,
        /// Artifact bytes
        file_data: &'a [u8],
    },
    /// Predictive encode
    PredictiveEncode {
        /// Source bitmap name
        file_name: &'a str,
        /// Source bitmap bytes
        file_data: &'a [u8],
        /// Predictor id
        prediction_number: u8,
    },
    /// Predictive decode
    PredictiveDecode {
        /// Artifact file name
        file_name: &'a str,
        /// Artifact bytes
        file_data: &'a [u8],
    },
}

/// Build the JSON body of a request, or `None` when the family posts a
/// multipart form instead.
pub fn json_body<'a>(request: &CodecRequest<'a>) -> Option<JsonBody<'a>> {
    let source = request.source;
    let body = match *request.params {
        ParameterSet::WindowEncode { offset_bits, length_bits, display_tokens } => {
            JsonBody::WindowEncode {
                filename: &source.filename,
                file_data: &source.bytes,
                offset_bits,
                length_bits,
                display_tokens,
            }
        }
        ParameterSet::WindowDecode => JsonBody::WindowDecode {
            filename: &source.filename,
            file_data: &source.bytes,
        },
        ParameterSet::PredictiveEncode { predictor } => JsonBody::PredictiveEncode {
            file_name: &source.filename,
            file_data: &source.bytes,
            prediction_number: predictor.id(),
        },
        ParameterSet::PredictiveDecode => JsonBody::PredictiveDecode {
            file_name: &source.filename,
            file_data: &source.bytes,
        },
        _ => return None,
    };
    Some(body)
}

/// Query parameters of a multipart request. Empty for JSON requests.
pub fn query_pairs(params: &ParameterSet) -> Vec<(&'static str, String)> {
    match *params {
        ParameterSet::EntropyEncode { show_codes, two_bytes } => vec![
            ("show_codes", show_codes.to_string()),
            ("two_bytes", two_bytes.to_string()),
        ],
        ParameterSet::EntropyDecode { show_codes } | ParameterSet::DictionaryDecode { show_codes } => {
            vec![("show_codes", show_codes.to_string())]
        }
        ParameterSet::DictionaryEncode { index, show_emitted_codes } => {
            let mut pairs = vec![
                ("auto_update_index", matches!(index, IndexWidth::Auto).to_string()),
                ("show_emitted_codes", show_emitted_codes.to_string()),
            ];
            if let IndexWidth::Manual { bits, on_full } = index {
                pairs.push(("manual_index_bits", bits.to_string()));
                pairs.push(("on_full", on_full.as_str().to_string()));
            }
            pairs
        }
        _ => Vec::new(),
    }
}

/// Fields shared by every response that can flag a failure in its body.
#[derive(Deserialize, Debug, Default)]
struct Envelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Extract a human readable message from an error body, if the service sent
/// one in its `error` or `message` field.
pub fn server_message(body: &[u8]) -> Option<String> {
    let envelope: Envelope = serde_json::from_slice(body).ok()?;
    envelope.error.or(envelope.message).filter(|m| !m.is_empty())
}

/// Deserialize a success body, separating structural mismatches from bodies
/// that are not JSON at all.
fn from_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    if let Ok(envelope) = serde_json::from_slice::<Envelope>(body) {
        if envelope.success == Some(false) {
            let message = envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "The codec service reported a failure".to_string());
            return Err(TransportError::Rejected(message).into());
        }
    }

    serde_json::from_slice(body).map_err(|err| {
        let err = match err.classify() {
            serde_json::error::Category::Data => {
                PayloadError::InvalidApiResponse(err.to_string())
            }
            _ => PayloadError::Serialization(err.to_string()),
        };
        Error::Payload(err)
    })
}

#[derive(Deserialize, Debug)]
struct EntropyEncodeResponse {
    filename: String,
    original_size: u64,
    compressed_size: u64,
    header_size: u64,
    compressed_data_size: u64,
    compression_ratio: f64,
    space_saved: u64,
    percentage_saved: f64,
    file_data: String,
    #[serde(default)]
    codes: Option<Vec<(String, String)>>,
}

#[derive(Deserialize, Debug)]
struct EntropyDecodeResponse {
    filename: String,
    original_size: u64,
    decompressed_size: u64,
    file_data: String,
    #[serde(default)]
    codes: Option<Vec<(String, String)>>,
}

fn code_table(codes: Option<Vec<(String, String)>>) -> Option<AuxiliaryData> {
    codes.map(|codes| {
        let entries = codes
            .into_iter()
            .map(|(symbol, code)| CodeEntry { symbol, code })
            .collect();
        AuxiliaryData::CodeTable(entries)
    })
}

/// Parse an entropy coding response.
pub fn parse_entropy(request: &CodecRequest<'_>, body: &[u8]) -> Result<RoundTrip, Error> {
    if let ParameterSet::EntropyEncode { .. } = request.params {
        let resp: EntropyEncodeResponse = from_body(body)?;
        return Ok(RoundTrip {
            artifact: Artifact::base64(resp.filename, resp.file_data)?,
            auxiliary: code_table(resp.codes),
            metrics: Metrics {
                original_size: Some(resp.original_size),
                result_size: resp.compressed_size,
                header_size: Some(resp.header_size),
                compressed_data_size: Some(resp.compressed_data_size),
                compression_ratio: Some(resp.compression_ratio),
                space_saved: Some(resp.space_saved),
                percentage_saved: Some(resp.percentage_saved),
            },
        });
    }

    let resp: EntropyDecodeResponse = from_body(body)?;
    Ok(RoundTrip {
        artifact: Artifact::base64(resp.filename, resp.file_data)?,
        auxiliary: code_table(resp.codes),
        metrics: Metrics {
            original_size: Some(resp.original_size),
            result_size: resp.decompressed_size,
            ..Default::default()
        },
    })
}

#[derive(Deserialize, Debug)]
struct WindowEncodeResponse {
    encoded_filename: String,
    original_size: u64,
    compressed_size: u64,
    compression_ratio: f64,
    encoded_data: Vec<u8>,
    #[serde(default)]
    tokens: Option<Vec<Token>>,
}

#[derive(Deserialize, Debug)]
struct WindowDecodeResponse {
    decoded_filename: String,
    original_compressed_size: u64,
    decompressed_size: u64,
    decoded_data: Vec<u8>,
}

/// Parse a window coding response.
pub fn parse_window(request: &CodecRequest<'_>, body: &[u8]) -> Result<RoundTrip, Error> {
    if let ParameterSet::WindowEncode { .. } = request.params {
        let resp: WindowEncodeResponse = from_body(body)?;
        return Ok(RoundTrip {
            artifact: Artifact::raw(resp.encoded_filename, resp.encoded_data),
            auxiliary: resp
                .tokens
                .filter(|tokens| !tokens.is_empty())
                .map(AuxiliaryData::Tokens),
            metrics: Metrics {
                original_size: Some(resp.original_size),
                result_size: resp.compressed_size,
                compression_ratio: Some(resp.compression_ratio),
                ..Default::default()
            },
        });
    }

    let resp: WindowDecodeResponse = from_body(body)?;
    Ok(RoundTrip {
        artifact: Artifact::raw(resp.decoded_filename, resp.decoded_data),
        auxiliary: None,
        metrics: Metrics {
            original_size: Some(resp.original_compressed_size),
            result_size: resp.decompressed_size,
            ..Default::default()
        },
    })
}

#[derive(Deserialize, Debug)]
struct DictionaryEncodeResponse {
    filename: String,
    original_size: u64,
    compressed_size: u64,
    header_size: u64,
    #[serde(default)]
    compressed_data_size: Option<u64>,
    compression_ratio: f64,
    space_saved: u64,
    percentage_saved: f64,
    file_data: String,
    #[serde(default)]
    codes: Option<Vec<u64>>,
}

#[derive(Deserialize, Debug)]
struct DictionaryDecodeResponse {
    filename: String,
    original_size: u64,
    decompressed_size: u64,
    file_data: String,
    #[serde(default)]
    codes: Option<Vec<(String, String)>>,
}

/// Parse a dictionary coding response.
pub fn parse_dictionary(request: &CodecRequest<'_>, body: &[u8]) -> Result<RoundTrip, Error> {
    if let ParameterSet::DictionaryEncode { .. } = request.params {
        let resp: DictionaryEncodeResponse = from_body(body)?;
        return Ok(RoundTrip {
            artifact: Artifact::base64(resp.filename, resp.file_data)?,
            auxiliary: resp.codes.map(AuxiliaryData::EmittedCodes),
            metrics: Metrics {
                original_size: Some(resp.original_size),
                result_size: resp.compressed_size,
                header_size: Some(resp.header_size),
                compressed_data_size: resp.compressed_data_size,
                compression_ratio: Some(resp.compression_ratio),
                space_saved: Some(resp.space_saved),
                percentage_saved: Some(resp.percentage_saved),
            },
        });
    }

    let resp: DictionaryDecodeResponse = from_body(body)?;
    Ok(RoundTrip {
        artifact: Artifact::base64(resp.filename, resp.file_data)?,
        auxiliary: resp.codes.map(AuxiliaryData::DecodedCodes),
        metrics: Metrics {
            original_size: Some(resp.original_size),
            result_size: resp.decompressed_size,
            ..Default::default()
        },
    })
}

#[derive(Deserialize, Debug)]
struct PredictiveEncodeResponse {
    #[serde(default)]
    encoded_filename: Option<String>,
    original_image: Vec<Vec<i32>>,
    error_matrix: Vec<Vec<i32>>,
    encoded_data: Vec<u8>,
    #[serde(default)]
    original_histogram: Vec<u64>,
    #[serde(default)]
    error_histogram: Vec<u64>,
}

#[derive(Deserialize, Debug)]
struct PredictiveDecodeResponse {
    decoded_filename: String,
    decoded_image: Vec<Vec<i32>>,
    decoded_bmp_data: Vec<u8>,
    #[serde(default)]
    decoded_histogram: Vec<u64>,
    #[serde(default, alias = "predicted_type")]
    prediction_type: Option<u8>,
}

/// Parse a predictive image coding response.
pub fn parse_predictive(request: &CodecRequest<'_>, body: &[u8]) -> Result<RoundTrip, Error> {
    if let ParameterSet::PredictiveEncode { predictor } = request.params {
        let resp: PredictiveEncodeResponse = from_body(body)?;
        let filename = resp.encoded_filename.unwrap_or_else(|| {
            format!("{}[{}].pre", request.source.filename, predictor.id())
        });
        let prediction = Prediction {
            original: PixelMatrix::new("original_image", resp.original_image)?,
            error: PixelMatrix::new("error_matrix", resp.error_matrix)?,
            original_histogram: Histogram::new("original_histogram", resp.original_histogram)?,
            error_histogram: Histogram::new("error_histogram", resp.error_histogram)?,
            predictor: predictor.id(),
        };
        return Ok(RoundTrip {
            metrics: Metrics {
                result_size: resp.encoded_data.len() as u64,
                ..Default::default()
            },
            artifact: Artifact::raw(filename, resp.encoded_data),
            auxiliary: Some(AuxiliaryData::Prediction(Box::new(prediction))),
        });
    }

    let resp: PredictiveDecodeResponse = from_body(body)?;
    let reconstruction = Reconstruction {
        decoded: PixelMatrix::new("decoded_image", resp.decoded_image)?,
        decoded_histogram: Histogram::new("decoded_histogram", resp.decoded_histogram)?,
        predictor: resp.prediction_type,
    };
    Ok(RoundTrip {
        metrics: Metrics {
            result_size: resp.decoded_bmp_data.len() as u64,
            ..Default::default()
        },
        artifact: Artifact::raw(resp.decoded_filename, resp.decoded_bmp_data),
        auxiliary: Some(AuxiliaryData::Reconstruction(Box::new(reconstruction))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Family, Operation, SourceFile};
    use crate::params::{OnFullPolicy, Predictor};
    use crate::session::ArtifactPayload;
    use serde_json::json;

    fn request<'a>(source: &'a SourceFile, params: &'a ParameterSet) -> CodecRequest<'a> {
        let (family, operation) = params.target();
        CodecRequest { family, operation, source, params }
    }

    #[test]
    fn window_encode_body_carries_numeric_bytes() {
        let source = SourceFile::new("a.txt", vec![97, 98]);
        let params =
            ParameterSet::WindowEncode { offset_bits: 10, length_bits: 4, display_tokens: true };
        let body = serde_json::to_value(json_body(&request(&source, &params)).unwrap()).unwrap();

        assert_eq!(
            body,
            json!({
                "filename": "a.txt",
                "file_data": [97, 98],
                "offset_bits": 10,
                "length_bits": 4,
                "display_tokens": true,
            })
        );
    }

    #[test]
    fn predictive_bodies_use_file_name() {
        let source = SourceFile::new("img.bmp", vec![1]);
        let params = ParameterSet::PredictiveEncode { predictor: Predictor::Paeth };
        let body = serde_json::to_value(json_body(&request(&source, &params)).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"file_name": "img.bmp", "file_data": [1], "prediction_number": 8})
        );

        let body = serde_json::to_value(
            json_body(&request(&source, &ParameterSet::PredictiveDecode)).unwrap(),
        )
        .unwrap();
        assert_eq!(body, json!({"file_name": "img.bmp", "file_data": [1]}));
    }

    #[test]
    fn multipart_families_have_no_json_body() {
        let source = SourceFile::new("a.txt", vec![1]);
        let params = ParameterSet::EntropyDecode { show_codes: false };
        assert!(json_body(&request(&source, &params)).is_none());
    }

    #[test]
    fn dictionary_query_omits_manual_width_when_auto() {
        let pairs = query_pairs(&ParameterSet::DictionaryEncode {
            index: IndexWidth::Auto,
            show_emitted_codes: true,
        });
        assert_eq!(
            pairs,
            vec![
                ("auto_update_index", "true".to_string()),
                ("show_emitted_codes", "true".to_string()),
            ]
        );

        let pairs = query_pairs(&ParameterSet::DictionaryEncode {
            index: IndexWidth::Manual { bits: 12, on_full: OnFullPolicy::Reset },
            show_emitted_codes: false,
        });
        assert!(pairs.contains(&("auto_update_index", "false".to_string())));
        assert!(pairs.contains(&("manual_index_bits", "12".to_string())));
        assert!(pairs.contains(&("on_full", "reset".to_string())));
    }

    #[test]
    fn entropy_query_carries_both_flags() {
        let pairs = query_pairs(&ParameterSet::EntropyEncode { show_codes: false, two_bytes: true });
        assert_eq!(
            pairs,
            vec![
                ("show_codes", "false".to_string()),
                ("two_bytes", "true".to_string()),
            ]
        );
    }

    #[test]
    fn server_message_prefers_error_field() {
        assert_eq!(
            server_message(br#"{"success": false, "error": "No file data received"}"#),
            Some("No file data received".to_string())
        );
        assert_eq!(
            server_message(br#"{"message": "Bad request"}"#),
            Some("Bad request".to_string())
        );
        assert_eq!(server_message(b"Not found"), None);
    }

    #[test]
    fn entropy_codes_keep_their_order() {
        let source = SourceFile::new("a.txt", b"ba".to_vec());
        let params = ParameterSet::EntropyEncode { show_codes: true, two_bytes: false };
        let body = json!({
            "success": true,
            "message": "File encoded successfully",
            "filename": "a.txt.hsa",
            "original_size": 2,
            "compressed_size": 9,
            "header_size": 8,
            "compressed_data_size": 1,
            "compression_ratio": 450.0,
            "space_saved": 0,
            "percentage_saved": 0.0,
            "codes": [["b (0x62)", "1"], ["a (0x61)", "0"]],
            "file_data": "AAE=",
        });

        let round_trip =
            parse_entropy(&request(&source, &params), body.to_string().as_bytes()).unwrap();
        assert_eq!(round_trip.artifact.filename, "a.txt.hsa");
        assert_eq!(round_trip.artifact.payload, ArtifactPayload::Base64("AAE=".to_string()));
        assert_eq!(round_trip.metrics.result_size, 9);
        assert_eq!(
            round_trip.auxiliary,
            Some(AuxiliaryData::CodeTable(vec![
                CodeEntry { symbol: "b (0x62)".into(), code: "1".into() },
                CodeEntry { symbol: "a (0x61)".into(), code: "0".into() },
            ]))
        );
    }

    #[test]
    fn success_false_is_a_rejection() {
        let source = SourceFile::new("a.hsa", vec![1]);
        let params = ParameterSet::EntropyDecode { show_codes: false };
        let body = br#"{"success": false, "error": "Invalid file extension"}"#;

        let err = parse_entropy(&request(&source, &params), body).unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Rejected(ref message)) if message == "Invalid file extension"
        ));
    }

    #[test]
    fn missing_required_field_is_payload_error() {
        let source = SourceFile::new("a.txt.o10l4.lz77", vec![1]);
        let body = json!({"decoded_filename": "a.txt", "decoded_data": [1]});

        let err = parse_window(&request(&source, &ParameterSet::WindowDecode), body.to_string().as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::Payload(PayloadError::InvalidApiResponse(_))), "{err:?}");
    }

    #[test]
    fn garbage_body_is_serialization_error() {
        let source = SourceFile::new("a.txt", vec![1]);
        let err = parse_window(&request(&source, &ParameterSet::WindowDecode), b"<html>")
            .unwrap_err();
        assert!(matches!(err, Error::Payload(PayloadError::Serialization(_))), "{err:?}");
    }

    #[test]
    fn malformed_base64_fails_the_round_trip() {
        let source = SourceFile::new("a.lzw", vec![1]);
        let params = ParameterSet::DictionaryDecode { show_codes: false };
        let body = json!({
            "success": true,
            "filename": "a.txt",
            "original_size": 1,
            "decompressed_size": 3,
            "file_data": "%%%",
        });

        let err = parse_dictionary(&request(&source, &params), body.to_string().as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::Payload(PayloadError::Base64(_))));
    }

    #[test]
    fn predictive_encode_names_the_export_after_the_predictor() {
        let source = SourceFile::new("lena.bmp", vec![1]);
        let params = ParameterSet::PredictiveEncode { predictor: Predictor::Average };
        let body = json!({
            "original_image": vec![vec![10; 256]; 256],
            "error_matrix": vec![vec![-3; 256]; 256],
            "encoded_data": [1, 2, 3],
            "original_histogram": vec![1; 256],
        });

        let round_trip =
            parse_predictive(&request(&source, &params), body.to_string().as_bytes()).unwrap();
        assert_eq!(round_trip.artifact.filename, "lena.bmp[7].pre");
        assert_eq!(round_trip.metrics.result_size, 3);
        assert_eq!(round_trip.metrics.original_size, None);
        match round_trip.auxiliary {
            Some(AuxiliaryData::Prediction(prediction)) => {
                assert_eq!(prediction.error.get(0, 0), -3);
                assert_eq!(prediction.original_histogram.bins().len(), 256);
                assert!(prediction.error_histogram.is_empty());
            }
            other => panic!("unexpected auxiliary data {other:?}"),
        }
    }

    #[test]
    fn predictive_decode_accepts_either_predictor_field() {
        let source = SourceFile::new("lena.bmp[7].pre", vec![1]);
        let body = json!({
            "decoded_filename": "lena.bmp[7].pre.decoded.bmp",
            "decoded_image": vec![vec![0; 256]; 256],
            "decoded_bmp_data": [66, 77],
            "predicted_type": 7,
        });

        let round_trip = parse_predictive(
            &request(&source, &ParameterSet::PredictiveDecode),
            body.to_string().as_bytes(),
        )
        .unwrap();
        match round_trip.auxiliary {
            Some(AuxiliaryData::Reconstruction(reconstruction)) => {
                assert_eq!(reconstruction.predictor, Some(7))
            }
            other => panic!("unexpected auxiliary data {other:?}"),
        }
        let (family, operation) = ParameterSet::PredictiveDecode.target();
        assert_eq!((family, operation), (Family::Predictive, Operation::Decode));
    }
}
