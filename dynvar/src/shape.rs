use std::fmt;

use ndarray::IxDyn;
use serde::{Deserialize, Serialize};

/// Shape of a dynamic variable.
///
/// The first dimension is always the spatial extent (e.g. grid cells). A second dimension, when
/// present, is a per-cell breakdown such as plant functional types or elevation classes.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub enum Shape {
    One(usize),
    Two(usize, usize),
}

impl Shape {
    /// Validate a list of dimensions.
    ///
    /// Returns the reason as a string, so callers can attach the name of the variable being
    /// configured.
    ///
    pub fn new(dims: &[usize]) -> Result<Self, String> {
        if dims.iter().any(|&dim| dim == 0) {
            return Err(format!("dimensions must be positive, got {dims:?}"));
        }

        match *dims {
            [n] => Ok(Self::One(n)),
            [n1, n2] if n1.checked_mul(n2).is_none() => {
                Err(format!("dimensions {dims:?} have too many elements"))
            }
            [n1, n2] => Ok(Self::Two(n1, n2)),
            _ => Err(format!(
                "only 1 or 2 dimensions are supported, got {} ({dims:?})",
                dims.len()
            )),
        }
    }

    pub fn ndim(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Two(_, _) => 2,
        }
    }

    /// Extent of the spatial (first) dimension
    pub fn rows(&self) -> usize {
        match *self {
            Self::One(n) | Self::Two(n, _) => n,
        }
    }

    /// Number of elements, the length of a flat buffer holding one slice
    pub fn len(&self) -> usize {
        match *self {
            Self::One(n) => n,
            Self::Two(n1, n2) => n1 * n2,
        }
    }

    pub fn dims(&self) -> Vec<usize> {
        match *self {
            Self::One(n) => vec![n],
            Self::Two(n1, n2) => vec![n1, n2],
        }
    }

    pub fn ix(&self) -> IxDyn {
        IxDyn(&self.dims())
    }
}

impl TryFrom<Vec<usize>> for Shape {
    type Error = String;

    fn try_from(dims: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(&dims)
    }
}

impl From<Shape> for Vec<usize> {
    fn from(shape: Shape) -> Self {
        shape.dims()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(n) => write!(f, "[{n}]"),
            Self::Two(n1, n2) => write!(f, "[{n1}, {n2}]"),
        }
    }
}
