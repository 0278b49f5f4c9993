use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Header requirement that was not met when a file was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderField {
    DeviceName,
    Date,
    SamplingRate,
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderField::DeviceName => f.write_str("device name"),
            HeaderField::Date => f.write_str("start date"),
            HeaderField::SamplingRate => f.write_str("sampling rate"),
        }
    }
}

fn join_fields(fields: &[HeaderField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reasons a file is refused at import. Never fatal to a batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("unsupported format: no \"TimeStamp\" data header line found")]
    FormatRejected,
    #[error("incomplete or invalid header (missing {})", join_fields(.missing))]
    HeaderInvalid { missing: Vec<HeaderField> },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file {name} rejected: {source}")]
    Rejected {
        name: String,
        #[source]
        source: Rejection,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("file {} is empty", .path.display())]
    Empty { path: PathBuf },
}

impl ImportError {
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ImportError::Rejected { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Name of the file the error is about, for per-file reporting.
    pub fn file_name(&self) -> String {
        match self {
            ImportError::Rejected { name, .. } => name.clone(),
            ImportError::Io { path, .. } | ImportError::Empty { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("view has no points to draw")]
    EmptyView,
    #[error("failed to render plot: {0}")]
    Render(String),
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for PlotError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        PlotError::Render(format!("{value:?}"))
    }
}

impl From<image::ImageError> for PlotError {
    fn from(value: image::ImageError) -> Self {
        PlotError::Render(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
