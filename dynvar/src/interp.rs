use std::{fmt::Debug, sync::Arc};

use ndarray::{Array1, ArrayViewMut1, Zip};
use num_traits::Float;
use tracing::error;

use crate::{
    dataset::SliceSource,
    errors::{Error, Result},
    observe::{ReadObserver, SliceAction},
    time::{Bracket, TimeInfo},
    variable::{DynamicVariable, VariableMeta},
};

/// A dynamic variable blended linearly between the slices surrounding the current year.
///
/// Two slices are held, the lower and upper ends of the bracket. When the bracket moves, a
/// slice that is already held (typically the old upper slice becoming the new lower one) is
/// copied rather than read again.
///
pub struct InterpolatedVariable<N> {
    meta: VariableMeta<N>,
    cached: Option<Staged<N>>,
}

struct Staged<N> {
    lower: (usize, Array1<N>),
    upper: (usize, Array1<N>),
    weight: f64,
}

impl<N> InterpolatedVariable<N>
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

    /// The bracket currently staged, if any
    pub fn bracket(&self) -> Option<Bracket> {
        self.cached.as_ref().map(|staged| Bracket {
            lower: staged.lower.0,
            upper: staged.upper.0,
            weight: staged.weight,
        })
    }

    /// Get the data for a slice, copying it if it's already staged on either side.
    ///
    fn stage(&self, index: usize) -> Result<Array1<N>> {
        if let Some(staged) = &self.cached {
            for (staged_index, data) in [&staged.lower, &staged.upper] {
                if *staged_index == index {
                    self.meta.notify(index, SliceAction::Reused);
                    return Ok(data.clone());
                }
            }
        }

        self.meta.read_time_slice(index)
    }
}

impl<N> DynamicVariable<N> for InterpolatedVariable<N>
where
    N: Float + Debug + 'static,
{
    fn meta(&self) -> &VariableMeta<N> {
        &self.meta
    }

    fn read_if_needed(&mut self, time: &dyn TimeInfo) -> Result<()> {
        let Bracket {
            lower,
            upper,
            weight,
        } = time.resolve_bracket(time.current_year());

        if let Some(staged) = self.cached.as_mut() {
            if staged.lower.0 == lower && staged.upper.0 == upper {
                staged.weight = weight;
                return Ok(());
            }
        }

        // Nothing is replaced until both slices are in hand
        let lower_data = self.stage(lower)?;
        let upper_data = if upper == lower {
            lower_data.clone()
        } else {
            self.stage(upper)?
        };

        self.cached = Some(Staged {
            lower: (lower, lower_data),
            upper: (upper, upper_data),
            weight,
        });

        Ok(())
    }

    fn current_value(&self, out: &mut [N]) -> Result<()> {
        let staged = self.cached.as_ref().ok_or_else(|| self.meta.not_ready())?;
        self.meta.check_buffer(out)?;

        let weight = staged.weight;
        let upper_weight = N::from(weight).filter(|_| (0.0..=1.0).contains(&weight));
        let upper_weight = match upper_weight {
            Some(upper_weight) => upper_weight,
            None => {
                let err = Error::InvariantViolation {
                    name: self.meta.name().to_string(),
                    weight,
                };
                error!(variable = self.meta.name(), weight, "{err}");
                return Err(err);
            }
        };
        let lower_weight = N::one() - upper_weight;

        Zip::from(ArrayViewMut1::from(out))
            .and(&staged.lower.1)
            .and(&staged.upper.1)
            .for_each(|out, &lower, &upper| {
                *out = lower * lower_weight + upper * upper_weight;
            });

        Ok(())
    }
}
