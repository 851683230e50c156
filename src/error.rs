//! Error types for the layout pipeline.
//!
//! Range/skip grammar failures are hard errors, numbering-override tokens are
//! dropped instead (see `range::parse_numbering_overrides`). Decode failures are
//! per image and never reach this type at batch level; they are collected as
//! `report::ImageIssue` entries.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Malformed range or ratio expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid number '{token}' in '{expr}'")]
    InvalidNumber { expr: String, token: String },

    #[error("range '{token}' in '{expr}' has start greater than end")]
    DescendingRange { expr: String, token: String },

    #[error("range '{token}' in '{expr}' covers more than {max} values")]
    SpanTooWide { expr: String, token: String, max: u32 },

    #[error("'{token}' in '{expr}' must be a positive integer")]
    NotPositive { expr: String, token: String },

    #[error("invalid ratio '{0}' (expected 1/N or a decimal between 0 and 1)")]
    InvalidRatio(String),
}

/// Text measurement failure. Drawing itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("font face has no glyph for {0:?}")]
    MissingGlyph(char),

    #[error("empty text cannot be measured")]
    EmptyText,
}

#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    #[error("enhancer changed dimensions from {from:?} to {to:?}")]
    DimensionMismatch { from: (u32, u32), to: (u32, u32) },

    #[error("enhancement failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("{field}: {source}")]
    Parse {
        field: String,
        #[source]
        source: ParseError,
    },

    #[error("cannot decode {file}: {source}")]
    Decode {
        file: String,
        #[source]
        source: image::ImageError,
    },

    #[error("no document produced: {0}")]
    Serialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LayoutError {
    pub fn parse(field: impl Into<String>, source: ParseError) -> Self {
        LayoutError::Parse {
            field: field.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LayoutError::Io {
            path: path.into(),
            source,
        }
    }
}
