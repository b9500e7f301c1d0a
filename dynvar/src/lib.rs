//! Time-varying gridded inputs for a running simulation.
//!
//! A dynamic variable is read from a time-indexed dataset, one slice per dataset year. Each step
//! the driver advances its calendar and asks every variable to `read_if_needed`; variables
//! fetch new slices only when the calendar has moved on to different ones, then serve
//! `current_value` from what they hold.

mod config;
mod dataset;
mod errors;
mod interp;
mod observe;
mod shape;
mod time;
mod uninterp;
mod variable;

#[cfg(test)]
mod testing;

pub use config::TimeStrategy;
pub use config::VariableSpec;
pub use dataset::MemoryDataset;
pub use dataset::SliceSource;
pub use errors::Error;
pub use errors::Result;
pub use interp::InterpolatedVariable;
pub use observe::NullObserver;
pub use observe::ReadObserver;
pub use observe::SliceAction;
pub use observe::SliceEvent;
pub use observe::TracingObserver;
pub use shape::Shape;
pub use time::Bracket;
pub use time::TimeInfo;
pub use time::YearCalendar;
pub use uninterp::UninterpolatedVariable;
pub use variable::DynamicVariable;
pub use variable::VariableMeta;
pub use variable::SUM_TOLERANCE;
