//! # Error Types
//!
//! Errors raised by the transcoding core. Every variant is fatal for the
//! pipeline: nothing is retried and no partial output is kept.

use thiserror::Error;

/// Errors that can occur while subsetting, converting or writing a dataset
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Bounding box selects no grid cells: {0}")]
    EmptyRegion(String),

    #[error("Shape mismatch: {left} has shape {left_shape:?}, {right} has shape {right_shape:?}")]
    ShapeMismatch {
        left: String,
        left_shape: Vec<usize>,
        right: String,
        right_shape: Vec<usize>,
    },

    #[error("Dimension mismatch for '{variable}': expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        variable: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Variable '{0}' not found in NetCDF file")]
    MissingVariable(String),

    #[error("Attribute '{attribute}' not found on variable '{variable}'")]
    MissingAttribute { variable: String, attribute: String },

    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("Unexpected units for '{variable}': expected '{expected}', found '{found}'")]
    UnitMismatch {
        variable: String,
        expected: String,
        found: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transcoding operations
pub type TranscodeResult<T> = Result<T, TranscodeError>;

impl TranscodeError {
    pub(crate) fn shape_mismatch(
        left: &str,
        left_shape: &[usize],
        right: &str,
        right_shape: &[usize],
    ) -> Self {
        TranscodeError::ShapeMismatch {
            left: left.to_string(),
            left_shape: left_shape.to_vec(),
            right: right.to_string(),
            right_shape: right_shape.to_vec(),
        }
    }

    pub(crate) fn dimension_mismatch(variable: &str, expected: &[usize], found: &[usize]) -> Self {
        TranscodeError::DimensionMismatch {
            variable: variable.to_string(),
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}
