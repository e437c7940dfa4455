//! Error taxonomy for manifest ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning a manifest source into a graph.
///
/// Unknown package names are deliberately *not* an error anywhere in the
/// engine: they are implicit dependency-free leaves.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The referenced manifest file does not exist.
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The manifest exists but could not be read.
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input does not match the declared format. Carries the offending
    /// path (or a source description) and what went wrong.
    #[error("failed to parse {origin}: {detail}")]
    Parse { origin: String, detail: String },
}

impl ManifestError {
    pub(crate) fn parse(origin: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            origin: origin.into(),
            detail: detail.into(),
        }
    }
}
