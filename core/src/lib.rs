//! # Customer Service Core
//!
//! Core traits and types shared by the customer service aggregates.
//!
//! Every aggregate is expressed with the same small vocabulary:
//!
//! - **State**: the aggregate data owned by a single writer
//! - **Action**: commands (intent) and events (facts) in one enum
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of follow-up work, executed by the runtime
//! - **Environment**: capabilities injected through traits (`Clock`, `IdGenerator`)
//!
//! Reducers never read the wall clock or a random source directly. Both come
//! from the environment so that tests can pin them down.
//!
//! ## Example
//!
//! ```ignore
//! use customer_service_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! impl Reducer for TicketReducer {
//!     type State = TicketState;
//!     type Action = TicketAction;
//!     type Environment = TicketEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut TicketState,
//!         action: TicketAction,
//!         env: &TicketEnvironment,
//!     ) -> SmallVec<[Effect<TicketAction>; 4]> {
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - the trait every aggregate's business logic implements
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait
    ///
    /// A reducer validates an action against the current state, mutates the
    /// state in place, and describes any follow-up work as effects. It must not
    /// perform I/O itself.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values. The runtime decides when and how they run; reducers
/// only return them.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Describes a side effect to be executed by the runtime
    ///
    /// Any action produced by an effect is fed back into the reducer.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation, optionally yielding a follow-up action
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Future is not Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::None => write!(f, "Effect::None"),
                Self::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Returns true for `Effect::None`
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Self::None)
        }
    }
}

/// Environment module - capabilities injected into reducers
pub mod environment {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    /// Abstracts the wall clock
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Abstracts identifier generation
    ///
    /// Aggregates that mint identifiers for their child entities take one of
    /// these from the environment instead of calling a process-wide generator.
    pub trait IdGenerator: Send + Sync {
        /// Produce the next identifier
        fn next_id(&self) -> Uuid;
    }

    /// Production generator producing random v4 UUIDs
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RandomIdGenerator;

    impl IdGenerator for RandomIdGenerator {
        fn next_id(&self) -> Uuid {
            Uuid::new_v4()
        }
    }
}
