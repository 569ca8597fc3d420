//! Application state for the web layer.

use std::sync::Arc;

use crate::continuous::ContinuousScheduler;
use crate::engine::Scheduler;
use crate::store::TransitStore;

/// Shared application state.
///
/// Contains the engine and its periodic driver.
pub struct AppState<S> {
    /// The scheduling engine
    pub scheduler: Arc<Scheduler<S>>,

    /// Periodic driver over the engine
    pub continuous: Arc<ContinuousScheduler<S>>,
}

impl<S: TransitStore + 'static> AppState<S> {
    /// Create a new app state, wiring a continuous driver onto the engine.
    pub fn new(scheduler: Scheduler<S>) -> Self {
        let scheduler = Arc::new(scheduler);
        let continuous = Arc::new(ContinuousScheduler::new(Arc::clone(&scheduler)));
        Self {
            scheduler,
            continuous,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            scheduler: Arc::clone(&self.scheduler),
            continuous: Arc::clone(&self.continuous),
        }
    }
}
