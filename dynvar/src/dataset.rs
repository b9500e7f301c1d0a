use std::collections::HashMap;

use ndarray::{Array, ArrayD, Dimension};

/// A time-indexed gridded dataset, as seen by dynamic variables.
///
/// Implementations wrap whatever file or store holds the data. Opening and closing it is the
/// implementation's business; variables only hold a shared reference and read slices from it.
///
pub trait SliceSource<N> {
    /// Number of time slices in the dataset
    fn slice_count(&self) -> usize;

    /// Year of the slice at `index`
    fn year_of(&self, index: usize) -> i32;

    /// Read one time slice of a variable.
    ///
    /// `dim1_name` names the spatial axis the caller expects the variable to be laid out on.
    /// Should return `Option::None` if the variable isn't in the dataset.
    ///
    fn read_slice(&self, name: &str, dim1_name: &str, index: usize) -> Option<ArrayD<N>>;
}

/// A dataset held entirely in memory.
///
pub struct MemoryDataset<N> {
    years: Vec<i32>,
    variables: HashMap<String, MemoryVariable<N>>,
}

struct MemoryVariable<N> {
    dim1_name: String,
    slices: Vec<ArrayD<N>>,
}

impl<N> MemoryDataset<N>
where
    N: Clone,
{
    pub fn new(years: Vec<i32>) -> Self {
        if years.windows(2).any(|pair| pair[0] >= pair[1]) {
            panic!("Years must be strictly increasing: {years:?}");
        }

        Self {
            years,
            variables: HashMap::new(),
        }
    }

    /// Add a variable, one array per time slice.
    ///
    pub fn insert<S, D>(&mut self, name: S, dim1_name: S, slices: Vec<Array<N, D>>) -> &mut Self
    where
        S: Into<String>,
        D: Dimension,
    {
        if slices.len() != self.years.len() {
            panic!(
                "Variable has {} slices but dataset has {} years",
                slices.len(),
                self.years.len()
            );
        }

        let variable = MemoryVariable {
            dim1_name: dim1_name.into(),
            slices: slices.into_iter().map(|slice| slice.into_dyn()).collect(),
        };
        self.variables.insert(name.into(), variable);

        self
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }
}

impl<N> SliceSource<N> for MemoryDataset<N>
where
    N: Clone,
{
    fn slice_count(&self) -> usize {
        self.years.len()
    }

    fn year_of(&self, index: usize) -> i32 {
        self.years[index]
    }

    fn read_slice(&self, name: &str, dim1_name: &str, index: usize) -> Option<ArrayD<N>> {
        let variable = self.variables.get(name)?;
        if variable.dim1_name != dim1_name {
            return None;
        }

        variable.slices.get(index).cloned()
    }
}
