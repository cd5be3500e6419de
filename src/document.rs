//! Uploaded PDF documents.

use bytes::Bytes;
use sha2::{Digest, Sha256};

/// Raw content of an uploaded PDF, identified by its filename.
#[derive(Debug, Clone)]
pub struct Document {
    /// Filename supplied by the uploader (no directory components).
    pub filename: String,
    /// Raw PDF bytes.
    pub bytes: Bytes,
}

impl Document {
    /// Wrap uploaded bytes under the given filename.
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Hex-encoded SHA-256 of the document bytes.
    pub fn digest(&self) -> String {
        compute_digest(&self.bytes)
    }
}

/// Hex-encoded SHA-256 digest used to detect re-uploaded content.
pub fn compute_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Accept only plain `*.pdf` filenames without path separators.
pub fn is_valid_pdf_filename(filename: &str) -> bool {
    let trimmed = filename.trim();
    !trimmed.is_empty()
        && trimmed == filename
        && !trimmed.contains(['/', '\\'])
        && trimmed != ".pdf"
        && trimmed.to_lowercase().ends_with(".pdf")
}
