//! Pipeline error taxonomy.
//!
//! Only [`PipelineError::SourceNotFound`] is recoverable; the importer downgrades it to a
//! partial outcome. Everything else aborts the run before any document is replaced.

use std::path::PathBuf;

/// Errors raised by the import and export pipelines.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required flat report is absent from the import folder.
    #[error("source report not found: {0}")]
    SourceNotFound(String),

    /// A flat report line has fewer fields than its format defines.
    #[error("malformed record in {report} line {line}: expected at least {expected} fields, found {found}")]
    MalformedRecord {
        /// Report label.
        report: &'static str,
        /// 1-based line number.
        line: usize,
        /// Fields the format requires.
        expected: usize,
        /// Fields on the line.
        found: usize,
    },

    /// A locations line names a track type outside the fixed table.
    #[error("unknown track type '{0}'")]
    UnknownTrackType(String),

    /// An inventory line carries a type code that cannot be classified.
    #[error("unknown type code '{code}' for {car_id}")]
    UnknownTypeCode {
        /// Car id from the inventory line.
        car_id: String,
        /// The unclassifiable code.
        code: String,
    },

    /// A built train could not be found in the host's manifest folder.
    #[error("no built train named '{0}'")]
    UnknownTrain(String),

    /// Reading or writing a persisted document failed.
    #[error("persistence failure at {}: {source}", path.display())]
    Persistence {
        /// Document being read or written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted document could not be encoded or decoded.
    #[error("invalid document at {}: {source}", path.display())]
    Document {
        /// Document being encoded or decoded.
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    /// Whether the importer may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::SourceNotFound(_))
    }
}
