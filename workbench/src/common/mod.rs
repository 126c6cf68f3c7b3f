use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;

/// One of the four codec domains the workbench can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Huffman entropy coding
    Entropy,
    /// LZ77 sliding-window matching
    Window,
    /// LZW adaptive-dictionary coding
    Dictionary,
    /// Predictive image coding
    Predictive,
}

impl Family {
    /// All families, in the order they are presented.
    pub const ALL: [Family; 4] = [
        Family::Entropy,
        Family::Window,
        Family::Dictionary,
        Family::Predictive,
    ];
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Family::Entropy => write!(f, "entropy"),
            Family::Window => write!(f, "window"),
            Family::Dictionary => write!(f, "dictionary"),
            Family::Predictive => write!(f, "predictive"),
        }
    }
}

/// The direction of a codec round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Compress the source file
    Encode,
    /// Reverse a previously produced artifact
    Decode,
}

impl Operation {
    /// The path segment the codec service exposes for this operation.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Operation::Encode => "encode",
            Operation::Decode => "decode",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// A file picked by the user, read fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// The original file name, without any directory components
    pub filename: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Create a source file from a name and its bytes.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { filename: filename.into(), bytes }
    }

    /// Read a file from disk. This is one of the two suspension points of a
    /// panel, the other being the codec round trip.
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self, error::Error> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::debug!(%filename, size = bytes.len(), "loaded source file");
        Ok(Self { filename, bytes })
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn load_keeps_only_the_file_name() {
        let mut file = tempfile::Builder::new()
            .suffix(".lzw")
            .tempfile()
            .unwrap();
        file.write_all(&[1, 2, 3]).unwrap();

        let source = SourceFile::load(file.path()).await.unwrap();
        assert_eq!(source.bytes, vec![1, 2, 3]);
        assert!(source.filename.ends_with(".lzw"));
        assert!(!source.filename.contains('/'));
    }

    #[tokio::test]
    async fn load_missing_file_is_io_error() {
        let result = SourceFile::load("/definitely/not/here.bin").await;
        assert!(matches!(result, Err(error::Error::Io(_))));
    }
}
