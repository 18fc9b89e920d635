//! Debounced search controller.
//!
//! Turns a stream of query edits into at most one lookup per pause in typing
//! and publishes the outcome through a `watch` channel. Every state change
//! (query, results, loading flag, error) is published as one snapshot, so
//! subscribers never observe a half-applied fetch cycle.

use crate::config::Config;
use crate::search::providers::HttpSearchBackend;
use crate::search::{ResultRecord, SearchBackend, SearchError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Observable state of a controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Latest query exactly as the caller set it
    pub query: String,
    /// Records from the latest applied lookup
    pub results: Vec<ResultRecord>,
    /// True while a lookup is outstanding
    pub loading: bool,
    /// User-facing message for the latest failed lookup
    pub error: Option<String>,
}

impl SearchState {
    fn clear_results(&mut self) {
        self.results.clear();
        self.error = None;
        self.loading = false;
    }
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Quiescence interval after the last edit before a lookup is issued
    pub debounce: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(crate::config::settings::DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Debounced, cancellable search client.
///
/// Must be created and driven from within a Tokio runtime. Dropping the
/// controller aborts the pending timer and any in-flight lookup.
pub struct SearchController {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn SearchBackend>,
    debounce: Duration,
    state: watch::Sender<SearchState>,
    tasks: Mutex<Tasks>,
}

#[derive(Default)]
struct Tasks {
    timer: Option<JoinHandle<()>>,
    /// Bumped whenever the timer is cancelled; a timer whose token is stale
    /// must not fire even if it already woke up.
    timer_token: u64,
    in_flight: Option<JoinHandle<()>>,
    /// Tag of the most recently issued lookup.
    generation: u64,
}

impl Tasks {
    fn cancel_timer(&mut self) {
        self.timer_token += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Abort the outstanding lookup and make sure its result is never applied.
    fn invalidate_lookup(&mut self) {
        self.generation += 1;
        if let Some(lookup) = self.in_flight.take() {
            lookup.abort();
            tracing::debug!("aborted in-flight lookup");
        }
    }
}

impl SearchController {
    pub fn new(backend: Arc<dyn SearchBackend>, options: ControllerOptions) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            inner: Arc::new(Inner {
                backend,
                debounce: options.debounce,
                state,
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    /// Build a controller talking HTTP to `config.endpoint`
    pub fn from_config(config: &Config) -> Result<Self, SearchError> {
        let backend = HttpSearchBackend::new(&config.endpoint)?;
        Ok(Self::new(
            Arc::new(backend),
            ControllerOptions {
                debounce: config.debounce(),
            },
        ))
    }

    /// Replace the query.
    ///
    /// A blank query clears results synchronously and issues nothing. Any
    /// other value (re)arms the debounce timer; the lookup happens once the
    /// query has been left alone for the debounce interval. Setting the
    /// value the controller already holds does nothing.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let inner = &self.inner;
        let mut tasks = inner.lock_tasks();

        let unchanged = inner.state.borrow().query == query;
        if unchanged {
            tracing::trace!(query = %query, "query unchanged");
            return;
        }

        tasks.cancel_timer();

        if query.trim().is_empty() {
            tasks.invalidate_lookup();
            inner.state.send_modify(|s| {
                s.query = query;
                s.clear_results();
            });
            tracing::debug!("query cleared");
            return;
        }

        tracing::debug!(
            query = %query,
            debounce_ms = inner.debounce.as_millis() as u64,
            "lookup scheduled"
        );
        inner.state.send_modify(|s| s.query = query);

        let token = tasks.timer_token;
        let debounce = inner.debounce;
        let fired = Arc::clone(inner);
        tasks.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            fired.on_debounce_fire(token);
        }));
    }

    pub fn query(&self) -> String {
        self.inner.state.borrow().query.clone()
    }

    pub fn results(&self) -> Vec<ResultRecord> {
        self.inner.state.borrow().results.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    /// All four cells read together
    pub fn snapshot(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        let mut tasks = self.inner.lock_tasks();
        tasks.cancel_timer();
        tasks.invalidate_lookup();
    }
}

impl Inner {
    fn lock_tasks(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_debounce_fire(self: &Arc<Self>, token: u64) {
        let mut tasks = self.lock_tasks();
        if tasks.timer_token != token {
            tracing::trace!("stale debounce timer ignored");
            return;
        }
        // Our own handle; dropping it just detaches.
        tasks.timer = None;

        let query = self.state.borrow().query.trim().to_string();
        if query.is_empty() {
            tasks.invalidate_lookup();
            self.state.send_modify(SearchState::clear_results);
            return;
        }

        tasks.invalidate_lookup();
        let generation = tasks.generation;

        tracing::debug!(query = %query, generation, "debounce fired, issuing lookup");
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let inner = Arc::clone(self);
        tasks.in_flight = Some(tokio::spawn(async move {
            let outcome = inner.backend.lookup(&query).await;
            inner.complete(generation, &query, outcome);
        }));
    }

    /// Apply a finished lookup if it is still the latest one issued.
    fn complete(
        &self,
        generation: u64,
        query: &str,
        outcome: Result<Vec<ResultRecord>, SearchError>,
    ) -> bool {
        let mut tasks = self.lock_tasks();
        if tasks.generation != generation {
            tracing::debug!(
                query = %query,
                generation,
                current = tasks.generation,
                "dropping superseded lookup result"
            );
            return false;
        }
        tasks.in_flight = None;

        match outcome {
            Ok(records) => {
                tracing::debug!(query = %query, result_count = records.len(), "lookup applied");
                self.state.send_modify(|s| {
                    s.results = records;
                    s.error = None;
                    s.loading = false;
                });
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "lookup failed");
                let message = e.user_message();
                self.state.send_modify(|s| {
                    s.results.clear();
                    s.error = Some(message);
                    s.loading = false;
                });
            }
        }
        true
    }
}
