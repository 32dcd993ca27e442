use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Core error type
// ---------------------------------------------------------------------------

/// Errors raised by the filter / compare / classify stages and by intake.
///
/// Stages never recover from these themselves; they bubble up to `main`,
/// which aborts the run.
#[derive(Debug, Error)]
pub enum ProteoError {
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("{path} has no sheet named '{sheet}'")]
    MissingSheet { path: PathBuf, sheet: String },

    #[error("table '{table}', row {row}: column '{column}' is not numeric ({value})")]
    NotNumeric {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse error family, used to decide whether a failure is recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing sheet / column or unusable cell. Fatal to the run.
    DataFormat,
    /// Malformed operator input. Recoverable by asking again.
    InputValidation,
    /// File or terminal unreadable / unwritable. Fatal.
    Io,
}

impl ProteoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProteoError::MissingColumn { .. }
            | ProteoError::MissingSheet { .. }
            | ProteoError::NotNumeric { .. } => ErrorKind::DataFormat,
            ProteoError::InvalidRange(_) | ProteoError::InvalidSetting { .. } => {
                ErrorKind::InputValidation
            }
            ProteoError::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ProteoError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = ProteoError> = std::result::Result<T, E>;
