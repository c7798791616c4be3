//! Value objects and commands for the customer ticket.
//!
//! Identifiers are issued outside this crate (order system, account system,
//! staff directory) and carried through verbatim, so they are string-backed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an externally issued identifier
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

string_id!(
    /// Unique identifier of a customer ticket
    TicketId
);
string_id!(
    /// Customer account that opened the ticket
    AccountId
);
string_id!(
    /// Purchase order the consultation refers to
    OrderId
);
string_id!(
    /// Staff member identifier from the staff directory
    StaffId
);

/// Identifier of the consultation embedded in a ticket
///
/// Rendered as `Consultation` followed by an upper-case hyphenated UUID.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsultationId(String);

impl ConsultationId {
    /// Prefix shared by every consultation identifier
    pub const PREFIX: &'static str = "Consultation";

    /// Builds the identifier from a generated UUID
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(format!(
            "{}{}",
            Self::PREFIX,
            id.hyphenated().to_string().to_uppercase()
        ))
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConsultationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Staff member assigned to a ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffProfile {
    /// Directory identifier
    pub staff_id: StaffId,
    /// Display name, stamped on every message of the ticket
    pub staff_name: String,
}

impl StaffProfile {
    /// Creates a staff profile
    #[must_use]
    pub fn new(staff_id: impl Into<StaffId>, staff_name: impl Into<String>) -> Self {
        Self {
            staff_id: staff_id.into(),
            staff_name: staff_name.into(),
        }
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageSource {
    /// The customer who opened the ticket
    Customer,
    /// The assigned staff member
    Staff,
}

/// Lifecycle status of a ticket
///
/// Ordered: `Initialized < InProcess < Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketStatus {
    /// Opened, no messages exchanged yet
    Initialized,
    /// At least one message exchanged
    InProcess,
    /// Closed by the customer with a score
    Closed,
}

impl TicketStatus {
    /// Returns true once the customer has closed the ticket
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Initialized => "INITIALIZED",
            Self::InProcess => "INPROCESS",
            Self::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// Satisfaction score given when the ticket is closed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketScore(u32);

impl TicketScore {
    /// Creates a score
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the numeric value
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TicketScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The customer's originating request, embedded once per ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consultation {
    /// Consultation identifier
    pub id: ConsultationId,
    /// Account that asked
    pub account: AccountId,
    /// Order being asked about
    pub order: OrderId,
    /// Initial inquiry text
    pub inquiry: String,
}

/// One exchanged utterance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Ticket the message was sent on
    pub ticket_id: TicketId,
    /// Customer account of the ticket
    pub account: AccountId,
    /// Name of the assigned staff member
    pub staff_name: String,
    /// Sender
    pub source: MessageSource,
    /// Message text
    pub content: String,
    /// When the message was recorded
    pub sent_at: DateTime<Utc>,
}

// ============================================================================
// Commands
// ============================================================================

/// Customer opens a ticket; the staff member has already been resolved
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyTicketCommand {
    /// Identifier for the new ticket
    pub ticket_id: TicketId,
    /// Customer account
    pub account: AccountId,
    /// Purchase order in question
    pub order: OrderId,
    /// What the customer is asking
    pub inquiry: String,
    /// Staff member handling the ticket
    pub staff: StaffProfile,
}

/// Customer or staff sends a message on an open ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTicketCommand {
    /// Target ticket
    pub ticket_id: TicketId,
    /// Sender
    pub source: MessageSource,
    /// Message text
    pub message: String,
}

/// Customer closes a ticket with a final message and a score
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishTicketCommand {
    /// Target ticket
    pub ticket_id: TicketId,
    /// Closing message text
    pub message: String,
    /// Satisfaction score
    pub score: u32,
}
