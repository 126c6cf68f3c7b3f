//! # Export
//!
//! Turns a stored artifact back into the exact bytes the codec service
//! produced and writes them to disk. Base64 artifacts are decoded with the
//! standard RFC 4648 alphabet, accepting exactly the padding the service
//! emits.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};

use crate::common::error::{Error, PayloadError};
use crate::common::{Family, Operation};
use crate::session::{Artifact, ArtifactPayload};

/// Content type of generic artifacts.
pub const OCTET_STREAM: &str = "application/octet-stream";
/// Content type of reconstructed bitmaps.
pub const BITMAP: &str = "image/bmp";

/// Name used when the service suggested none.
const FALLBACK_NAME: &str = "output.bin";

/// A binary object ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Suggested file name
    pub filename: String,
    /// MIME type
    pub content_type: &'static str,
    /// Content
    pub bytes: Vec<u8>,
}

/// Rebuild the artifact's bytes.
pub fn build_blob(
    family: Family,
    operation: Operation,
    artifact: &Artifact,
) -> Result<Blob, PayloadError> {
    let bytes = match &artifact.payload {
        ArtifactPayload::Raw(bytes) => bytes.clone(),
        ArtifactPayload::Base64(encoded) => STANDARD.decode(encoded.as_bytes())?,
    };
    let content_type = match (family, operation) {
        (Family::Predictive, Operation::Decode) => BITMAP,
        _ => OCTET_STREAM,
    };

    Ok(Blob {
        filename: artifact.filename.clone(),
        content_type,
        bytes,
    })
}

/// Only the last path component of a suggested name is used, so that a
/// name coming from the service cannot point outside the output directory.
fn target_path(output_dir: &Path, filename: &str) -> PathBuf {
    let name = Path::new(filename)
        .file_name()
        .filter(|name| !name.is_empty())
        .map_or_else(|| FALLBACK_NAME.into(), |name| name.to_os_string());
    output_dir.join(name)
}

/// Write the blob into `output_dir`, creating the directory if needed.
#[tracing::instrument(skip_all, fields(filename = %blob.filename, size = blob.bytes.len()))]
pub async fn save(blob: &Blob, output_dir: &Path) -> Result<PathBuf, Error> {
    tokio::fs::create_dir_all(output_dir).await?;
    let path = target_path(output_dir, &blob.filename);
    tokio::fs::write(&path, &blob.bytes).await?;

    tracing::info!(path = %path.display(), "saved artifact");
    Ok(path)
}

/// Encode a raster as PNG and write it into `output_dir` under `filename`.
pub async fn save_png(
    raster: &RgbaImage,
    output_dir: &Path,
    filename: &str,
) -> Result<PathBuf, Error> {
    let mut encoded = Cursor::new(Vec::new());
    raster.write_to(&mut encoded, ImageFormat::Png)?;

    let blob = Blob {
        filename: filename.to_string(),
        content_type: "image/png",
        bytes: encoded.into_inner(),
    };
    save(&blob, output_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_artifact_is_decoded_exactly() {
        let artifact = Artifact::base64("a.txt.hsa", "AAE=".to_string()).unwrap();
        let blob = build_blob(Family::Entropy, Operation::Encode, &artifact).unwrap();

        assert_eq!(blob.bytes, vec![0, 1]);
        assert_eq!(blob.content_type, OCTET_STREAM);
        assert_eq!(blob.filename, "a.txt.hsa");
    }

    #[test]
    fn raw_artifact_is_kept_as_is() {
        let artifact = Artifact::raw("a.txt.o10l4.lz77", vec![10, 4, 0, 97]);
        let blob = build_blob(Family::Window, Operation::Encode, &artifact).unwrap();

        assert_eq!(blob.bytes, vec![10, 4, 0, 97]);
    }

    #[test]
    fn decoded_bitmaps_are_typed_as_bmp() {
        let artifact = Artifact::raw("img.decoded.bmp", vec![66, 77]);
        let blob = build_blob(Family::Predictive, Operation::Decode, &artifact).unwrap();
        assert_eq!(blob.content_type, BITMAP);

        let blob = build_blob(Family::Predictive, Operation::Encode, &artifact).unwrap();
        assert_eq!(blob.content_type, OCTET_STREAM);
    }

    #[test]
    fn url_safe_alphabet_is_refused() {
        let artifact = Artifact {
            filename: "x".to_string(),
            payload: ArtifactPayload::Base64("-_8=".to_string()),
        };
        assert!(build_blob(Family::Dictionary, Operation::Encode, &artifact).is_err());
    }

    #[test]
    fn target_path_drops_directories() {
        let dir = Path::new("/out");
        assert_eq!(target_path(dir, "../../etc/passwd"), PathBuf::from("/out/passwd"));
        assert_eq!(target_path(dir, ""), PathBuf::from("/out/output.bin"));
        assert_eq!(target_path(dir, "a.lzw"), PathBuf::from("/out/a.lzw"));
    }

    #[tokio::test]
    async fn save_writes_the_blob() {
        let dir = tempfile::tempdir().unwrap();
        let blob = Blob {
            filename: "a.txt.lzw".to_string(),
            content_type: OCTET_STREAM,
            bytes: vec![0, 1],
        };

        let path = save(&blob, &dir.path().join("nested")).await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![0, 1]);
    }

    #[tokio::test]
    async fn rasters_are_saved_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let raster = RgbaImage::new(4, 4);

        let path = save_png(&raster, dir.path(), "error.png").await.unwrap();
        let bytes = tokio::fs::read(&path).await.unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}
