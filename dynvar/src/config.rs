use std::{fmt::Debug, sync::Arc};

use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::{
    dataset::SliceSource,
    errors::{Error, Result},
    interp::InterpolatedVariable,
    observe::{ReadObserver, TracingObserver},
    uninterp::UninterpolatedVariable,
    variable::{DynamicVariable, VariableMeta},
};

/// How a variable's value is derived from the slices around the current year
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeStrategy {
    #[default]
    Uninterpolated,
    Interpolated,
}

/// Description of a dynamic variable, as it might appear in a driver's configuration.
///
/// ```json
/// {
///     "name": "PCT_NAT_PFT",
///     "dim1_name": "gridcell",
///     "conversion_factor": 100.0,
///     "validate_distribution": true,
///     "shape": [1024, 15],
///     "strategy": "interpolated"
/// }
/// ```
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub dim1_name: String,

    /// Raw values are divided by this
    #[serde(default = "unit_factor")]
    pub conversion_factor: f64,

    /// Check that each row of a 2-D variable sums to 1
    #[serde(default)]
    pub validate_distribution: bool,

    pub shape: Vec<usize>,

    #[serde(default)]
    pub strategy: TimeStrategy,
}

fn unit_factor() -> f64 {
    1.0
}

impl VariableSpec {
    pub fn new<S: Into<String>>(name: S, dim1_name: S, shape: &[usize]) -> Self {
        Self {
            name: name.into(),
            dim1_name: dim1_name.into(),
            conversion_factor: unit_factor(),
            validate_distribution: false,
            shape: shape.to_vec(),
            strategy: TimeStrategy::default(),
        }
    }

    pub fn conversion_factor(mut self, conversion_factor: f64) -> Self {
        self.conversion_factor = conversion_factor;
        self
    }

    pub fn validate_distribution(mut self, validate_distribution: bool) -> Self {
        self.validate_distribution = validate_distribution;
        self
    }

    pub fn strategy(mut self, strategy: TimeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Construct the variable, choosing its time strategy once and for all.
    ///
    pub fn build<N>(&self, source: Arc<dyn SliceSource<N>>) -> Result<Box<dyn DynamicVariable<N>>>
    where
        N: Float + Debug + 'static,
    {
        self.build_with_observer(source, Arc::new(TracingObserver))
    }

    pub fn build_with_observer<N>(
        &self,
        source: Arc<dyn SliceSource<N>>,
        observer: Arc<dyn ReadObserver>,
    ) -> Result<Box<dyn DynamicVariable<N>>>
    where
        N: Float + Debug + 'static,
    {
        let conversion_factor =
            N::from(self.conversion_factor).ok_or_else(|| Error::Configuration {
                name: self.name.clone(),
                reason: format!(
                    "conversion factor {} can't be represented",
                    self.conversion_factor
                ),
            })?;

        let meta = VariableMeta::new(
            source,
            self.name.as_str(),
            self.dim1_name.as_str(),
            conversion_factor,
            self.validate_distribution,
            &self.shape,
        )?
        .with_observer(observer);

        let variable: Box<dyn DynamicVariable<N>> = match self.strategy {
            TimeStrategy::Uninterpolated => Box::new(UninterpolatedVariable::from_meta(meta)),
            TimeStrategy::Interpolated => Box::new(InterpolatedVariable::from_meta(meta)),
        };

        Ok(variable)
    }
}
