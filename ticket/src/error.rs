//! Errors raised by ticket commands.

use crate::types::TicketId;
use thiserror::Error;

/// Why a ticket command was rejected
///
/// A rejected command never changes the ticket.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    /// The command names a different ticket than the one it was sent to
    #[error("command for ticket {actual} sent to ticket {expected}")]
    IdentityMismatch {
        /// Identifier of the ticket receiving the command
        expected: TicketId,
        /// Identifier carried by the command
        actual: TicketId,
    },

    /// The ticket was already closed by the customer
    #[error("ticket {0} is closed")]
    TicketClosed(TicketId),

    /// No ticket has been applied yet
    #[error("ticket {0} has not been applied")]
    NotApplied(TicketId),

    /// A ticket already exists in this state
    #[error("ticket {0} has already been applied")]
    AlreadyApplied(TicketId),
}
