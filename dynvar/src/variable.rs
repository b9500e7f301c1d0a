use std::{fmt::Debug, sync::Arc};

use ndarray::{Array, Array1, ArrayD, ArrayView2, ArrayViewMut1, Axis, Dimension, Ix1, Ix2};
use num_traits::Float;
use tracing::error;

use crate::{
    dataset::SliceSource,
    errors::{Error, Result},
    observe::{ReadObserver, SliceAction, SliceEvent, TracingObserver},
    shape::Shape,
    time::TimeInfo,
};

/// Rows of a fractional distribution must sum to 1 within this tolerance
pub const SUM_TOLERANCE: f64 = 1e-13;

/// A gridded quantity that changes over simulation time.
///
/// Callers advance the calendar, call `read_if_needed` once, then query `current_value` as
/// often as they like until the next step.
///
pub trait DynamicVariable<N>
where
    N: Float + Debug + 'static,
{
    fn meta(&self) -> &VariableMeta<N>;

    /// Stage whatever slices the calendar's current year calls for.
    ///
    /// Reads nothing if the slices already staged are still the right ones.
    ///
    fn read_if_needed(&mut self, time: &dyn TimeInfo) -> Result<()>;

    /// Write the current value into `out`, a flat row-major buffer of length
    /// `meta().shape().len()`.
    ///
    fn current_value(&self, out: &mut [N]) -> Result<()>;

    /// Same as `current_value`, but returns a newly allocated array shaped like the variable.
    ///
    fn current_array(&self) -> Result<ArrayD<N>> {
        let meta = self.meta();
        let mut out = vec![N::zero(); meta.shape().len()];
        self.current_value(&mut out)?;

        let mut array = ArrayD::zeros(meta.shape().ix());
        for (dest, value) in array.iter_mut().zip(out) {
            *dest = value;
        }

        Ok(array)
    }
}

/// Metadata and slice reading shared by all dynamic variables, whatever their time strategy.
///
/// Reading goes through a single pipeline: fetch the raw slice, check its shape, divide by the
/// conversion factor, and for 2-D distributions check that each row sums to 1.
///
pub struct VariableMeta<N> {
    name: String,
    dim1_name: String,
    conversion_factor: N,
    validate_distribution: bool,
    shape: Shape,
    source: Arc<dyn SliceSource<N>>,
    observer: Arc<dyn ReadObserver>,
}

impl<N> VariableMeta<N>
where
    N: Float + Debug + 'static,
{
    pub fn new<S: Into<String>>(
        source: Arc<dyn SliceSource<N>>,
        name: S,
        dim1_name: S,
        conversion_factor: N,
        validate_distribution: bool,
        dims: &[usize],
    ) -> Result<Self> {
        let name = name.into();
        let configuration = |reason: String| Error::Configuration {
            name: name.clone(),
            reason,
        };

        let shape = Shape::new(dims).map_err(configuration)?;
        if validate_distribution && shape.ndim() != 2 {
            return Err(configuration(format!(
                "distribution validation requires 2 dimensions, got shape {shape}"
            )));
        }
        if conversion_factor.is_zero() || !conversion_factor.is_finite() {
            return Err(configuration(format!(
                "conversion factor must be finite and nonzero, got {conversion_factor:?}"
            )));
        }

        Ok(Self {
            name,
            dim1_name: dim1_name.into(),
            conversion_factor,
            validate_distribution,
            shape,
            source,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replace the default `tracing` observer.
    ///
    pub fn with_observer(mut self, observer: Arc<dyn ReadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dim1_name(&self) -> &str {
        &self.dim1_name
    }

    pub fn conversion_factor(&self) -> N {
        self.conversion_factor
    }

    pub fn validate_distribution(&self) -> bool {
        self.validate_distribution
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Read one time slice, converted and validated, flattened in row-major order.
    ///
    pub fn read_time_slice(&self, index: usize) -> Result<Array1<N>> {
        let result = match self.shape {
            Shape::One(n) => self.read_slice_as(index, Ix1(n)),
            Shape::Two(n1, n2) => self.read_slice_as(index, Ix2(n1, n2)).and_then(|data| {
                if self.validate_distribution {
                    self.check_distribution(index, data.view())?;
                }
                Ok(Array1::from_iter(data.iter().cloned()))
            }),
        };

        match result {
            Ok(data) => {
                self.notify(index, SliceAction::Read);
                Ok(data)
            }
            Err(err) => {
                error!(variable = %self.name, index, "{err}");
                Err(err)
            }
        }
    }

    /// Fetch a raw slice as an array of the given dimensionality and apply the unit conversion.
    ///
    fn read_slice_as<D: Dimension>(&self, index: usize, dim: D) -> Result<Array<N, D>> {
        let count = self.source.slice_count();
        if index >= count {
            return Err(Error::IndexOutOfRange {
                name: self.name.clone(),
                index,
                count,
            });
        }

        let raw = self
            .source
            .read_slice(&self.name, &self.dim1_name, index)
            .ok_or_else(|| Error::DataMissing {
                name: self.name.clone(),
                dim1_name: self.dim1_name.clone(),
                index,
            })?;

        let found = raw.shape().to_vec();
        let mismatch = || Error::ShapeMismatch {
            name: self.name.clone(),
            index,
            found: found.clone(),
            expected: dim.slice().to_vec(),
        };
        if found != dim.slice() {
            return Err(mismatch());
        }
        let raw = raw.into_dimensionality::<D>().map_err(|_| mismatch())?;

        let factor = self.conversion_factor;
        Ok(raw.mapv(|value| value / factor))
    }

    fn check_distribution(&self, index: usize, data: ArrayView2<'_, N>) -> Result<()> {
        let tolerance = N::from(SUM_TOLERANCE).unwrap_or_else(N::epsilon);
        let tolerance = if N::epsilon() > tolerance {
            // Single precision can't resolve SUM_TOLERANCE, so allow an epsilon per term
            N::epsilon() * N::from(data.ncols()).unwrap_or_else(N::one)
        } else {
            tolerance
        };
        for (row, values) in data.axis_iter(Axis(0)).enumerate() {
            let sum = values.sum();
            if (sum - N::one()).abs() > tolerance || sum.is_nan() {
                return Err(Error::DistributionInvalid {
                    name: self.name.clone(),
                    index,
                    row,
                    sum: sum.to_f64().unwrap_or(f64::NAN),
                });
            }
        }

        Ok(())
    }

    pub(crate) fn notify(&self, index: usize, action: SliceAction) {
        self.observer.on_slice(&SliceEvent {
            variable: &self.name,
            index,
            year: self.source.year_of(index),
            action,
        });
    }

    pub(crate) fn check_buffer(&self, out: &[N]) -> Result<()> {
        let expected = self.shape.len();
        if out.len() != expected {
            return Err(Error::BufferSize {
                name: self.name.clone(),
                found: out.len(),
                expected,
            });
        }

        Ok(())
    }

    pub(crate) fn not_ready(&self) -> Error {
        let err = Error::NotReady {
            name: self.name.clone(),
        };
        error!(variable = %self.name, "{err}");

        err
    }
}

/// Copy a flat slice into a caller's buffer of the same length.
///
pub(crate) fn copy_into<N: Float>(data: &Array1<N>, out: &mut [N]) {
    ArrayViewMut1::from(out).assign(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::{array, Array2};

    use crate::{
        dataset::MemoryDataset,
        testing::{distribution_dataset, years_dataset, CountingDataset},
    };

    fn meta(
        data: MemoryDataset<f64>,
        name: &str,
        conversion_factor: f64,
        validate_distribution: bool,
        dims: &[usize],
    ) -> Result<VariableMeta<f64>> {
        VariableMeta::new(
            Arc::new(data) as Arc<dyn SliceSource<f64>>,
            name,
            "gridcell",
            conversion_factor,
            validate_distribution,
            dims,
        )
    }

    #[test]
    fn test_read_time_slice_converts() -> Result<()> {
        for factor in [1.0, 2.0, 0.5, -4.0] {
            let var = meta(years_dataset(), "FOO", factor, false, &[4])?;
            for index in 0..3 {
                let expected = (index + 1) as f64 / factor;
                assert_eq!(var.read_time_slice(index)?, Array1::from_elem(4, expected));
            }
        }

        Ok(())
    }

    #[test]
    fn test_read_time_slice_2d_row_major() -> Result<()> {
        let mut data = MemoryDataset::new(vec![1990]);
        data.insert(
            "HEIGHT",
            "gridcell",
            vec![array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]],
        );
        let var = meta(data, "HEIGHT", 10.0, false, &[2, 3])?;

        assert_eq!(
            var.read_time_slice(0)?,
            array![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]
        );

        Ok(())
    }

    #[test]
    fn test_distribution_within_tolerance() -> Result<()> {
        let mut data = MemoryDataset::new(vec![1990]);
        data.insert(
            "PCT_LANDUNIT",
            "gridcell",
            vec![array![[0.1, 0.2, 0.7], [0.3, 0.3, 0.4]]],
        );
        let var = meta(data, "PCT_LANDUNIT", 1.0, true, &[2, 3])?;
        var.read_time_slice(0)?;

        Ok(())
    }

    #[test]
    fn test_distribution_outside_tolerance() -> Result<()> {
        let mut data = MemoryDataset::new(vec![1990]);
        let mut slice = Array2::from_elem((3, 2), 0.5);
        slice[[2, 1]] += 1e-12;
        data.insert("PCT_LANDUNIT", "gridcell", vec![slice]);
        let var = meta(data, "PCT_LANDUNIT", 1.0, true, &[3, 2])?;

        assert!(matches!(
            var.read_time_slice(0),
            Err(Error::DistributionInvalid { index: 0, row: 2, .. })
        ));

        Ok(())
    }

    #[test]
    fn test_distribution_wide_row_keeps_tolerance() -> Result<()> {
        let mut data = MemoryDataset::new(vec![1990]);
        let mut slice = Array2::from_elem((1, 1000), 0.0);
        slice[[0, 0]] = 1.0 + 1.5e-13;
        data.insert("PCT_CFT", "gridcell", vec![slice]);
        let var = meta(data, "PCT_CFT", 1.0, true, &[1, 1000])?;

        assert!(matches!(
            var.read_time_slice(0),
            Err(Error::DistributionInvalid { index: 0, row: 0, .. })
        ));

        Ok(())
    }

    #[test]
    fn test_distribution_single_precision() {
        let data = Arc::new(distribution_dataset::<f32>());
        let var = VariableMeta::new(
            data as Arc<dyn SliceSource<f32>>,
            "PCT_PFT",
            "gridcell",
            1.0,
            true,
            &[2, 3],
        )
        .unwrap();

        assert!(var.read_time_slice(1).is_ok());
        assert!(matches!(
            var.read_time_slice(3),
            Err(Error::DistributionInvalid { index: 3, row: 1, .. })
        ));
    }

    #[test]
    fn test_distribution_half() -> Result<()> {
        let var = meta(distribution_dataset(), "PCT_PFT", 1.0, true, &[2, 3])?;
        var.read_time_slice(2)?;
        assert_eq!(
            var.read_time_slice(3),
            Err(Error::DistributionInvalid {
                name: String::from("PCT_PFT"),
                index: 3,
                row: 1,
                sum: 0.5,
            })
        );

        Ok(())
    }

    #[test]
    fn test_distribution_not_checked_unless_asked() -> Result<()> {
        let var = meta(distribution_dataset(), "PCT_PFT", 1.0, false, &[2, 3])?;
        var.read_time_slice(3)?;

        Ok(())
    }

    #[test]
    fn test_shape_mismatch() -> Result<()> {
        let var = meta(distribution_dataset(), "PCT_PFT", 1.0, false, &[3, 2])?;
        assert_eq!(
            var.read_time_slice(0),
            Err(Error::ShapeMismatch {
                name: String::from("PCT_PFT"),
                index: 0,
                found: vec![2, 3],
                expected: vec![3, 2],
            })
        );

        let var = meta(years_dataset(), "FOO", 1.0, false, &[4, 1])?;
        assert!(matches!(
            var.read_time_slice(0),
            Err(Error::ShapeMismatch { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_missing_variable_is_read_once() {
        let data = CountingDataset::new(years_dataset::<f64>());
        let var = VariableMeta::new(
            Arc::clone(&data) as Arc<dyn SliceSource<f64>>,
            "FOO",
            "landunit",
            1.0,
            false,
            &[4],
        )
        .unwrap();

        assert!(matches!(
            var.read_time_slice(1),
            Err(Error::DataMissing { index: 1, .. })
        ));
        assert_eq!(data.read_count(), 1);
    }

    #[test]
    fn test_three_dimensions() {
        let result = meta(years_dataset(), "FOO", 1.0, false, &[4, 3, 2]);
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_validation_on_one_dimension() {
        let result = meta(years_dataset(), "FOO", 1.0, true, &[4]);
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_bad_conversion_factor() {
        for factor in [0.0, f64::INFINITY, f64::NAN] {
            let result = meta(years_dataset(), "FOO", factor, false, &[4]);
            assert!(matches!(result, Err(Error::Configuration { .. })));
        }
    }
}
