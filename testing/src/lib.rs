//! # Customer Service Testing
//!
//! Testing utilities for reducers built on `customer-service-core`.
//!
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - [`FixedClock`]: deterministic time
//! - [`SequentialIdGenerator`]: predictable identifiers
//!
//! ## Example
//!
//! ```ignore
//! use customer_service_testing::{ReducerTest, SequentialIdGenerator, test_clock};
//!
//! ReducerTest::new(TicketReducer::new())
//!     .with_env(TicketEnvironment::new(
//!         Arc::new(test_clock()),
//!         Arc::new(SequentialIdGenerator::new()),
//!         TicketPolicy::default(),
//!     ))
//!     .given_state(TicketState::new())
//!     .when_action(apply_action())
//!     .then_state(|state| assert!(state.ticket.is_some()))
//!     .run();
//! ```


/// Mock implementations of environment traits
pub mod mocks {
    use chrono::{DateTime, Utc};
    use customer_service_core::environment::{Clock, IdGenerator};
    use std::sync::atomic::{AtomicU64, Ordering};
    use uuid::Uuid;

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use customer_service_testing::mocks::FixedClock;
    /// use customer_service_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Fixed clock at 2025-01-01 00:00:00 UTC
    ///
    /// # Panics
    ///
    /// Only if the hardcoded timestamp fails to parse.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Identifier generator yielding `1, 2, 3, ...` as UUIDs
    #[derive(Debug, Default)]
    pub struct SequentialIdGenerator {
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Start the sequence at 1
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> Uuid {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            Uuid::from_u128(u128::from(n))
        }
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, SequentialIdGenerator, test_clock};
pub use reducer_test::{ReducerTest, assertions};
