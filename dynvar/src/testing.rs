use std::{fmt::Debug, sync::Arc};

use ndarray::{Array1, Array2, ArrayD};
use num_traits::Float;
use parking_lot::Mutex;

use crate::{
    dataset::{MemoryDataset, SliceSource},
    observe::{ReadObserver, SliceAction, SliceEvent},
};

/// A dataset that remembers every slice read made against it
///
pub(crate) struct CountingDataset<N> {
    inner: MemoryDataset<N>,
    reads: Mutex<Vec<(String, usize)>>,
}

impl<N> CountingDataset<N>
where
    N: Clone,
{
    pub(crate) fn new(inner: MemoryDataset<N>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            reads: Mutex::new(vec![]),
        })
    }

    pub(crate) fn read_count(&self) -> usize {
        self.reads.lock().len()
    }

    pub(crate) fn reads_of(&self, index: usize) -> usize {
        self.reads.lock().iter().filter(|(_, i)| *i == index).count()
    }
}

impl<N> SliceSource<N> for CountingDataset<N>
where
    N: Clone,
{
    fn slice_count(&self) -> usize {
        self.inner.slice_count()
    }

    fn year_of(&self, index: usize) -> i32 {
        self.inner.year_of(index)
    }

    fn read_slice(&self, name: &str, dim1_name: &str, index: usize) -> Option<ArrayD<N>> {
        self.reads.lock().push((name.to_string(), index));
        self.inner.read_slice(name, dim1_name, index)
    }
}

/// An observer that keeps every event it sees
///
#[derive(Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<(SliceAction, usize, i32)>>,
}

impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<(SliceAction, usize, i32)> {
        self.events.lock().clone()
    }
}

impl ReadObserver for RecordingObserver {
    fn on_slice(&self, event: &SliceEvent<'_>) {
        self.events
            .lock()
            .push((event.action, event.index, event.year));
    }
}

pub(crate) fn n<N: Float>(value: f64) -> N {
    N::from(value).unwrap()
}

pub(crate) fn assert_close<N: Float + Debug>(actual: &[N], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        let a = a.to_f64().unwrap();
        assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
    }
}

/// Years 2000, 2005 and 2010, with a 1-D variable "FOO" on 4 grid cells holding 1, 2 and 3.
///
pub(crate) fn years_dataset<N: Float>() -> MemoryDataset<N> {
    let mut data = MemoryDataset::new(vec![2000, 2005, 2010]);
    data.insert(
        "FOO",
        "gridcell",
        (1..=3).map(|i| Array1::from_elem(4, n(i as f64))).collect(),
    );

    data
}

/// Years 2000, 2010 and 2020, with a 1-D variable "BAR" on 3 grid cells holding 10, 20 and 30.
///
pub(crate) fn decades_dataset<N: Float>() -> MemoryDataset<N> {
    let mut data = MemoryDataset::new(vec![2000, 2010, 2020]);
    data.insert(
        "BAR",
        "gridcell",
        (1..=3)
            .map(|i| Array1::from_elem(3, n(i as f64 * 10.0)))
            .collect(),
    );

    data
}

/// Years 2000, 2010, 2020, 2030, with a 2-D variable "PCT_PFT" on 2 grid cells and 3 plant
/// types. Rows are fractional distributions, except in slice 3, where the second row sums to
/// 0.5.
///
pub(crate) fn distribution_dataset<N: Float>() -> MemoryDataset<N> {
    let mut data = MemoryDataset::new(vec![2000, 2010, 2020, 2030]);
    let slice = |rows: [[f64; 3]; 2]| Array2::from_shape_fn((2, 3), |(r, c)| n::<N>(rows[r][c]));
    data.insert(
        "PCT_PFT",
        "gridcell",
        vec![
            slice([[1.0, 0.0, 0.0], [0.5, 0.5, 0.0]]),
            slice([[0.5, 0.5, 0.0], [0.25, 0.25, 0.5]]),
            slice([[0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
            slice([[0.0, 0.0, 1.0], [0.25, 0.25, 0.0]]),
        ],
    );

    data
}
