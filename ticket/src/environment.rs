//! Injected dependencies for the ticket aggregate.

use crate::config::TicketPolicy;
use customer_service_core::environment::{Clock, IdGenerator, RandomIdGenerator, SystemClock};
use std::sync::Arc;

/// Environment dependencies for the ticket aggregate
#[derive(Clone)]
pub struct TicketEnvironment {
    /// Clock for message timestamps
    pub clock: Arc<dyn Clock>,
    /// Source of consultation identifiers
    pub ids: Arc<dyn IdGenerator>,
    /// Lifecycle guards
    pub policy: TicketPolicy,
}

impl TicketEnvironment {
    /// Creates a new `TicketEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>, policy: TicketPolicy) -> Self {
        Self { clock, ids, policy }
    }

    /// System clock and random identifiers
    #[must_use]
    pub fn production(policy: TicketPolicy) -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(RandomIdGenerator), policy)
    }
}

impl std::fmt::Debug for TicketEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketEnvironment")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
