use crate::error::Failure;
use fleet_structs::core::{DisplayPreferences, OptimizationResult, RequestParameters};
use serde::Serialize;
use std::sync::Arc;

/// Holds the most recent successful result.
///
/// A result is only ever swapped in whole, so readers see either the previous
/// generation or the new one.
#[derive(Serialize, Debug, Clone, Default)]
pub struct ResultStore {
    generation: u64,
    result: Option<Arc<OptimizationResult>>,
}

impl ResultStore {
    pub fn get(&self) -> Option<Arc<OptimizationResult>> {
        self.result.clone()
    }
    pub fn current(&self) -> Option<&OptimizationResult> {
        self.result.as_deref()
    }
    pub fn set(&mut self, result: Arc<OptimizationResult>) -> u64 {
        self.result = Some(result);
        self.generation += 1;
        self.generation
    }
    /// Number of results stored so far; 0 while empty.
    pub fn generation(&self) -> u64 {
        self.generation
    }
    pub fn is_empty(&self) -> bool {
        self.result.is_none()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Notification {
    pub category: String,
    pub message: String,
}

impl From<&Failure> for Notification {
    fn from(failure: &Failure) -> Self {
        Self {
            category: failure.category().to_string(),
            message: failure.notification(),
        }
    }
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct DashboardState {
    pub loading: bool,
    /// Parameters of the request in flight.
    pub pending: Option<RequestParameters>,
    pub store: ResultStore,
    pub preferences: DisplayPreferences,
    pub notification: Option<Notification>,
}

impl DashboardState {
    pub fn can_submit(&self) -> bool {
        !self.loading
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    SubmitStarted(RequestParameters),
    SubmitSucceeded(Arc<OptimizationResult>),
    SubmitFailed(Failure),
    ToggleBefore,
    ToggleAfter,
    SetPreferences(DisplayPreferences),
    DismissNotification,
}

/// Applies one event to the dashboard state.
///
/// Completions are ignored unless a request is in flight, and a start is
/// ignored while one already is.
pub fn apply(mut state: DashboardState, event: Event) -> DashboardState {
    match event {
        Event::SubmitStarted(params) => {
            if !state.loading {
                state.loading = true;
                state.pending = Some(params);
                state.notification = None;
            }
        }
        Event::SubmitSucceeded(result) => {
            if state.loading {
                state.store.set(result);
                state.loading = false;
                state.pending = None;
            }
        }
        Event::SubmitFailed(failure) => {
            if state.loading {
                state.notification = Some(Notification::from(&failure));
                state.loading = false;
                state.pending = None;
            }
        }
        Event::ToggleBefore => state.preferences.show_before = !state.preferences.show_before,
        Event::ToggleAfter => state.preferences.show_after = !state.preferences.show_after,
        Event::SetPreferences(preferences) => state.preferences = preferences,
        Event::DismissNotification => state.notification = None,
    }
    state
}
