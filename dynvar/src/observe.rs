//! Hooks for watching dynamic variables stage their data.

use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceAction {
    /// The slice was read from the dataset
    Read,

    /// The slice was already cached by the variable and was copied instead of read
    Reused,
}

#[derive(Clone, Copy, Debug)]
pub struct SliceEvent<'a> {
    pub variable: &'a str,
    pub index: usize,
    pub year: i32,
    pub action: SliceAction,
}

/// Receives an event each time a variable stages a time slice.
///
pub trait ReadObserver {
    fn on_slice(&self, event: &SliceEvent<'_>);
}

/// Reports slice events through `tracing`.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl ReadObserver for TracingObserver {
    fn on_slice(&self, event: &SliceEvent<'_>) {
        match event.action {
            SliceAction::Read => info!(
                variable = event.variable,
                index = event.index,
                year = event.year,
                "Read dynamic variable slice"
            ),
            SliceAction::Reused => debug!(
                variable = event.variable,
                index = event.index,
                year = event.year,
                "Reused cached dynamic variable slice"
            ),
        }
    }
}

/// Discards all events.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl ReadObserver for NullObserver {
    fn on_slice(&self, _event: &SliceEvent<'_>) {}
}
