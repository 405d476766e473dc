use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("no *.{extension} files found in {}", .dir.display())]
    NoInputFiles { dir: PathBuf, extension: String },
    #[error("could not read input file")]
    FileError(#[from] std::io::Error),
    #[error("could not parse CSV rows")]
    CsvError(#[from] csv::Error),
    #[error("line {line} has {found} fields but the header has {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("could not read spreadsheet {}", .path.display())]
    SpreadsheetError {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("could not write spreadsheet")]
    ExportError(#[from] rust_xlsxwriter::XlsxError),
    #[error("invalid configuration in {}", .path.display())]
    ConfigError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    SchemaError(#[from] crate::domain::error::Error),
}

impl Error {
    /// Whether the input was missing, as opposed to present but unusable.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) | Error::NoInputFiles { .. } => true,
            Error::FileError(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
