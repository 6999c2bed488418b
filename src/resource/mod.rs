//! Remote Resource State
//!
//! Generic `{data, is_loading, error}` holder for one remote collection.
//! Expense charts, expense items and chat turns are all instances of
//! [`ResourceFetcher`].
//!
//! Every operation applies its transitions under a single lock acquisition,
//! so observers never see a half-applied call. The lock is never held across
//! an `.await`; overlapping fetches on the same fetcher are not serialized
//! and the last one to complete wins.
//!
//! Guarded calls (`begin_with` / `finish`) have their own in-flight slot, so
//! a running fetch never blocks them and a completing fetch never releases
//! the slot. `is_loading` is true while either kind of call is running.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use crate::backend::BackendError;

/// View state of one remote resource
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    pub data: T,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<T: Default> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            is_loading: false,
            error: None,
        }
    }
}

/// State holder for one remote collection
pub struct ResourceFetcher<T> {
    /// Resource name for logs
    label: &'static str,
    /// Error text used when a fetch fails without a server message
    fallback_message: String,
    state: Mutex<Inner<T>>,
}

struct Inner<T> {
    view: RequestState<Vec<T>>,
    /// Fetches currently awaiting their operation
    fetches: usize,
    /// Set between `begin_with` and `finish`
    sending: bool,
    /// Bumped whenever `data` is replaced or reset
    generation: u64,
}

impl<T> Inner<T> {
    fn sync_loading(&mut self) {
        self.view.is_loading = self.fetches > 0 || self.sending;
    }
}

impl<T: Clone> ResourceFetcher<T> {
    pub fn new(label: &'static str, fallback_message: impl Into<String>) -> Self {
        Self {
            label,
            fallback_message: fallback_message.into(),
            state: Mutex::new(Inner {
                view: RequestState::default(),
                fetches: 0,
                sending: false,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> RequestState<Vec<T>> {
        self.lock().view.clone()
    }

    pub fn data(&self) -> Vec<T> {
        self.lock().view.data.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().view.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().view.data.is_empty()
    }

    /// True while a fetch or a guarded call is in flight
    pub fn is_loading(&self) -> bool {
        self.lock().view.is_loading
    }

    /// True between [`ResourceFetcher::begin_with`] and [`ResourceFetcher::finish`]
    pub fn is_sending(&self) -> bool {
        self.lock().sending
    }

    pub fn error(&self) -> Option<String> {
        self.lock().view.error.clone()
    }

    /// Load the collection, replacing `data` on success
    ///
    /// Items appended locally while the fetch was running are kept after the
    /// fetched ones. On failure `data` keeps its last-known-good value and
    /// `error` holds the server message or this fetcher's fallback message.
    pub async fn fetch<F>(&self, op: F) -> Result<(), String>
    where
        F: Future<Output = Result<Vec<T>, BackendError>>,
    {
        let (generation, start_len) = {
            let mut state = self.lock();
            state.fetches += 1;
            state.view.error = None;
            state.sync_loading();
            (state.generation, state.view.data.len())
        };

        let result = op.await;

        let mut state = self.lock();
        state.fetches = state.fetches.saturating_sub(1);
        state.sync_loading();
        match result {
            Ok(mut data) => {
                tracing::debug!(resource = self.label, items = data.len(), "Resource loaded");
                if state.generation == generation {
                    let split = start_len.min(state.view.data.len());
                    data.extend(state.view.data.split_off(split));
                }
                state.generation += 1;
                state.view.data = data;
                Ok(())
            }
            Err(e) => {
                let message = e.user_message(&self.fallback_message);
                tracing::warn!(resource = self.label, error = %e, "Resource fetch failed");
                state.view.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Same as [`ResourceFetcher::fetch`]; callers avoid overlapping refreshes
    pub async fn refresh<F>(&self, op: F) -> Result<(), String>
    where
        F: Future<Output = Result<Vec<T>, BackendError>>,
    {
        self.fetch(op).await
    }

    /// Create one item remotely and append it to `data`
    ///
    /// Loading state is left alone. On failure `error` is set from the server
    /// message or `fallback` and `data` is unchanged.
    pub async fn append<F>(&self, op: F, fallback: &str) -> Result<T, String>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        let result = op.await;

        let mut state = self.lock();
        match result {
            Ok(item) => {
                state.view.data.push(item.clone());
                Ok(item)
            }
            Err(e) => {
                let message = e.user_message(fallback);
                tracing::warn!(resource = self.label, error = %e, "Resource append failed");
                state.view.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Append a local item without any remote call
    pub fn push(&self, item: T) {
        self.lock().view.data.push(item);
    }

    /// Claim the in-flight slot and append `item` optimistically
    ///
    /// Returns `false` and changes nothing when a guarded call is already in
    /// flight. Fetches do not hold the slot.
    pub fn begin_with(&self, item: T) -> bool {
        let mut state = self.lock();
        if state.sending {
            return false;
        }
        state.view.data.push(item);
        state.sending = true;
        state.view.error = None;
        state.sync_loading();
        true
    }

    /// Release the in-flight slot claimed by [`ResourceFetcher::begin_with`]
    ///
    /// A successful result is appended; a failure sets `error` from the server
    /// message or `fallback`.
    pub fn finish(&self, result: Result<T, BackendError>, fallback: &str) -> Result<T, String> {
        let mut state = self.lock();
        state.sending = false;
        state.sync_loading();
        match result {
            Ok(item) => {
                state.view.data.push(item.clone());
                Ok(item)
            }
            Err(e) => {
                let message = e.user_message(fallback);
                tracing::warn!(resource = self.label, error = %e, "Resource call failed");
                state.view.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Clear `error`, leaving data and loading state alone
    pub fn clear_error(&self) {
        self.lock().view.error = None;
    }

    /// Empty data, no error
    ///
    /// Calls still in flight keep `is_loading` set until they complete.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.view.data.clear();
        state.view.error = None;
        state.generation += 1;
        state.sync_loading();
    }
}
