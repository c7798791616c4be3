//! Customer service tickets.
//!
//! A customer opens a consultation ticket for one of their orders, a staff
//! member works it through message exchanges, and the customer closes it with
//! a satisfaction score.
//!
//! - [`Ticket`]: the aggregate, with `apply`, `process` and `finish`
//! - [`TicketReducer`]: hosts one ticket for the [`Store`](customer_service_runtime::Store)
//! - [`TicketPolicy`]: how strictly identity and the closed state are guarded
//!
//! # Quick Start
//!
//! ```no_run
//! use customer_service_runtime::Store;
//! use ticket_service::{
//!     ApplyTicketCommand, StaffProfile, TicketAction, TicketEnvironment, TicketPolicy,
//!     TicketReducer, TicketState,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = TicketEnvironment::production(TicketPolicy::default());
//! let store = Store::new(TicketState::new(), TicketReducer::new(), env);
//!
//! store
//!     .send(TicketAction::ApplyTicket(ApplyTicketCommand {
//!         ticket_id: "T1".into(),
//!         account: "A1".into(),
//!         order: "O1".into(),
//!         inquiry: "help".to_string(),
//!         staff: StaffProfile::new("S1", "Sam"),
//!     }))
//!     .await?;
//!
//! let messages = store.state(TicketState::message_count).await;
//! assert_eq!(messages, 0);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod environment;
pub mod error;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use aggregate::{Ticket, TicketApplied, TicketEvent};
pub use config::{Config, MismatchHandling, TicketPolicy};
pub use environment::TicketEnvironment;
pub use error::TicketError;
pub use reducer::{TicketAction, TicketReducer, TicketState};
pub use types::{
    AccountId, ApplyTicketCommand, Consultation, ConsultationId, FinishTicketCommand, Message,
    MessageSource, OrderId, ProcessTicketCommand, StaffId, StaffProfile, TicketId, TicketScore,
    TicketStatus,
};
