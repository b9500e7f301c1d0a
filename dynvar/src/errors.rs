use std::result;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Invalid shape, validation flag or conversion factor at construction
    #[error("{name}: bad configuration: {reason}")]
    Configuration { name: String, reason: String },

    /// The dataset doesn't have the variable for the requested slice
    #[error("{name}: variable not found in dataset (dim1 {dim1_name}, time index {index})")]
    DataMissing {
        name: String,
        dim1_name: String,
        index: usize,
    },

    /// A row of a fractional distribution doesn't sum to 1
    #[error("{name}: row {row} of time index {index} sums to {sum}, expected 1")]
    DistributionInvalid {
        name: String,
        index: usize,
        row: usize,
        sum: f64,
    },

    /// Current value requested before any slice was read
    #[error("{name}: no data read yet")]
    NotReady { name: String },

    /// Interpolation weight outside [0, 1]
    #[error("{name}: interpolation weight {weight} outside [0, 1]")]
    InvariantViolation { name: String, weight: f64 },

    #[error("{name}: time index {index} out of range for dataset with {count} slices")]
    IndexOutOfRange {
        name: String,
        index: usize,
        count: usize,
    },

    #[error("{name}: slice {index} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        index: usize,
        found: Vec<usize>,
        expected: Vec<usize>,
    },

    #[error("{name}: output buffer has length {found}, expected {expected}")]
    BufferSize {
        name: String,
        found: usize,
        expected: usize,
    },
}

impl Error {
    /// Name of the variable the error was raised for
    pub fn variable(&self) -> &str {
        match self {
            Self::Configuration { name, .. }
            | Self::DataMissing { name, .. }
            | Self::DistributionInvalid { name, .. }
            | Self::NotReady { name }
            | Self::InvariantViolation { name, .. }
            | Self::IndexOutOfRange { name, .. }
            | Self::ShapeMismatch { name, .. }
            | Self::BufferSize { name, .. } => name,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
