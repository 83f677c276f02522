use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// The first thing that went wrong while scanning. Both variants are terminal:
/// a scanner that recorded one of them yields no more lines.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The opener could not produce a stream for a source
    #[error("{source_name}: {source}")]
    Open {
        source_name: String,
        #[source]
        source: io::Error,
    },

    /// Reading or splitting an already opened source failed
    #[error("{source_name}:{line}: {source}")]
    Read {
        source_name: String,
        // lines successfully read from this source before the failure
        line: usize,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub fn source_name(&self) -> &str {
        match self {
            ScanError::Open { source_name, .. } | ScanError::Read { source_name, .. } => source_name,
        }
    }

    pub fn kind(&self) -> io::ErrorKind {
        match self {
            ScanError::Open { source, .. } | ScanError::Read { source, .. } => source.kind(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ScanError::Open { .. })
    }

    /// Same variant, name, kind and message; `io::Error` itself can't be cloned
    pub fn duplicate(&self) -> ScanError {
        match self {
            ScanError::Open { source_name, source } => ScanError::Open {
                source_name: source_name.clone(),
                source: io::Error::new(source.kind(), source.to_string()),
            },
            ScanError::Read { source_name, line, source } => ScanError::Read {
                source_name: source_name.clone(),
                line: *line,
                source: io::Error::new(source.kind(), source.to_string()),
            },
        }
    }
}
