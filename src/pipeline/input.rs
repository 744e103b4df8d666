//! Upload handling: the raw file and its format dispatch.
//!
//! The filename is only used to decide whether the upload matches the chosen
//! direction. A mismatch is not an error by default: the run simply produces
//! nothing, which is how the converter has always behaved.

use crate::config::{Direction, FileFormat};
use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an upload from disk; the file name becomes the upload name.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ConvertError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;
        let name = file_name(path);
        debug!("Read upload '{}' ({} bytes)", name, bytes.len());
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Size in KiB, as shown next to the file name.
    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}

/// Check the upload against the direction.
///
/// Returns the input format to parse with, `Ok(None)` for a silent mismatch,
/// or [`ConvertError::ExtensionMismatch`] when `strict` is set.
pub fn dispatch(
    file: &UploadedFile,
    direction: Direction,
    strict: bool,
) -> Result<Option<FileFormat>, ConvertError> {
    let format = direction.input_format();
    if file.name.ends_with(format.extension()) {
        return Ok(Some(format));
    }
    if strict {
        return Err(ConvertError::ExtensionMismatch {
            filename: file.name.clone(),
            expected: format,
            extension: format.extension(),
        });
    }
    warn!(
        "'{}' does not end with '{}' for {}; nothing to convert",
        file.name,
        format.extension(),
        direction
    );
    Ok(None)
}
