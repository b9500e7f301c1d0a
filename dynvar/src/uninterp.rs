use std::{fmt::Debug, sync::Arc};

use ndarray::Array1;
use num_traits::Float;

use crate::{
    dataset::SliceSource,
    errors::Result,
    observe::ReadObserver,
    time::TimeInfo,
    variable::{copy_into, DynamicVariable, VariableMeta},
};

/// A dynamic variable that snaps to the slice in effect for the current year.
///
/// Only one slice is held at a time. It is replaced when the calendar resolves a different
/// slice index.
///
pub struct UninterpolatedVariable<N> {
    meta: VariableMeta<N>,
    cached: Option<(usize, Array1<N>)>,
}

impl<N> UninterpolatedVariable<N>
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
        let meta = VariableMeta::new(
            source,
            name,
            dim1_name,
            conversion_factor,
            validate_distribution,
            dims,
        )?;

        Ok(Self::from_meta(meta))
    }

    pub fn from_meta(meta: VariableMeta<N>) -> Self {
        Self { meta, cached: None }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ReadObserver>) -> Self {
        self.meta = self.meta.with_observer(observer);
        self
    }

    /// Index of the slice currently held, if any
    pub fn cached_index(&self) -> Option<usize> {
        self.cached.as_ref().map(|(index, _)| *index)
    }
}

impl<N> DynamicVariable<N> for UninterpolatedVariable<N>
where
    N: Float + Debug + 'static,
{
    fn meta(&self) -> &VariableMeta<N> {
        &self.meta
    }

    fn read_if_needed(&mut self, time: &dyn TimeInfo) -> Result<()> {
        let index = time.resolve_nearest(time.current_year());
        if self.cached_index() == Some(index) {
            return Ok(());
        }

        let data = self.meta.read_time_slice(index)?;
        self.cached = Some((index, data));

        Ok(())
    }

    fn current_value(&self, out: &mut [N]) -> Result<()> {
        let (_, data) = self.cached.as_ref().ok_or_else(|| self.meta.not_ready())?;
        self.meta.check_buffer(out)?;
        copy_into(data, out);

        Ok(())
    }
}
