//! # Customer Service Runtime
//!
//! The [`Store`] hosts one aggregate state and is its only writer.
//!
//! Aggregates such as the customer ticket carry no locking of their own; the
//! store serializes every action under a write lock, runs the reducer, then
//! executes the returned effects. Actions produced by effects are fed back
//! through the same path.
//!
//! ## Example
//!
//! ```ignore
//! use customer_service_runtime::Store;
//!
//! let store = Store::new(TicketState::new(), TicketReducer::new(), environment);
//! store.send(TicketAction::ApplyTicket { command }).await?;
//!
//! let status = store.state(|s| s.ticket.as_ref().map(Ticket::status)).await;
//! ```

use customer_service_core::{effect::Effect, reducer::Reducer};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

pub use error::StoreError;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Effects kept producing actions past the configured depth
        #[error("Effect feedback exceeded maximum depth of {0}")]
        FeedbackDepthExceeded(usize),
    }
}

/// Default limit on nested effect feedback
pub const DEFAULT_MAX_FEEDBACK_DEPTH: usize = 32;

/// Single-writer host for an aggregate state
///
/// Cloning a store yields another handle onto the same state.
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: Arc<R>,
    environment: Arc<E>,
    max_feedback_depth: usize,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
            max_feedback_depth: self.max_feedback_depth,
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: std::fmt::Debug + Send + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
            max_feedback_depth: DEFAULT_MAX_FEEDBACK_DEPTH,
        }
    }

    /// Override the feedback depth limit
    #[must_use]
    pub const fn with_max_feedback_depth(mut self, depth: usize) -> Self {
        self.max_feedback_depth = depth;
        self
    }

    /// Send an action to the store
    ///
    /// Returns once the reducer has run and every effect it produced,
    /// including effects of fed-back actions, has completed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FeedbackDepthExceeded`] if effects keep
    /// producing actions beyond the configured depth.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<(), StoreError> {
        self.dispatch(action, 0).await
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let messages = store.state(|s| s.message_count()).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    fn dispatch(&self, action: A, depth: usize) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            if depth > self.max_feedback_depth {
                tracing::error!(depth, "Effect feedback loop exceeded maximum depth");
                return Err(StoreError::FeedbackDepthExceeded(self.max_feedback_depth));
            }

            tracing::debug!(?action, depth, "Processing action");
            metrics::counter!("store.actions.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;

                let start = Instant::now();
                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute(effect, depth).await?;
            }

            Ok(())
        }
        .boxed()
    }

    fn execute(&self, effect: Effect<A>, depth: usize) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(future) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    if let Some(action) = future.await {
                        tracing::trace!("Effect::Future produced an action, feeding back");
                        self.dispatch(action, depth + 1).await?;
                    }
                },
            }
            Ok(())
        }
        .boxed()
    }
}
