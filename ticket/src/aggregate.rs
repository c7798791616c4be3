//! The customer ticket aggregate.
//!
//! A customer applies for a ticket against one of their orders, the assigned
//! staff member and the customer exchange messages, and the customer finishes
//! the ticket with a satisfaction score.
//!
//! ```text
//! INITIALIZED --process--> INPROCESS --process--> INPROCESS --finish--> CLOSED
//! ```
//!
//! Every change goes through a decide step that validates a command and
//! produces a [`TicketEvent`], followed by `evolve`, which applies it. There
//! are no setters.

use crate::config::{MismatchHandling, TicketPolicy};
use crate::environment::TicketEnvironment;
use crate::error::TicketError;
use crate::types::{
    ApplyTicketCommand, Consultation, ConsultationId, FinishTicketCommand, Message, MessageSource,
    ProcessTicketCommand, StaffProfile, TicketId, TicketScore, TicketStatus,
};
use chrono::{DateTime, Utc};
use customer_service_macros::Action;
use serde::{Deserialize, Serialize};

/// Payload of [`TicketEvent::Applied`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketApplied {
    /// New ticket
    pub ticket_id: TicketId,
    /// Consultation created with the ticket
    pub consultation: Consultation,
    /// Assigned staff member
    pub staff: StaffProfile,
    /// When the ticket was opened
    pub applied_at: DateTime<Utc>,
}

/// Facts recorded by the ticket aggregate
#[derive(Action, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketEvent {
    /// Ticket was opened
    #[event(name = "ticket.applied")]
    Applied(TicketApplied),

    /// A message was exchanged
    #[event(name = "ticket.message_recorded")]
    MessageRecorded {
        /// The message
        message: Message,
    },

    /// The customer closed the ticket
    #[event(name = "ticket.finished")]
    Finished {
        /// Closing message, always from the customer
        message: Message,
        /// Satisfaction score
        score: TicketScore,
    },
}

impl TicketEvent {
    /// Ticket the event belongs to
    #[must_use]
    pub const fn ticket_id(&self) -> &TicketId {
        match self {
            Self::Applied(applied) => &applied.ticket_id,
            Self::MessageRecorded { message } | Self::Finished { message, .. } => {
                &message.ticket_id
            },
        }
    }
}

/// A single customer service ticket
///
/// # Invariants
///
/// - exactly one consultation and one staff assignment, fixed at apply
/// - `messages` only grows, in conversation order
/// - `latest_message()` is the last element of `messages`
/// - `score` stays zero until the ticket is finished
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ticket {
    id: TicketId,
    consultation: Consultation,
    staff: StaffProfile,
    status: TicketStatus,
    messages: Vec<Message>,
    score: TicketScore,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    // ========== Operations ==========

    /// Opens a ticket from an apply command
    #[must_use]
    pub fn apply(command: ApplyTicketCommand, env: &TicketEnvironment) -> Self {
        Self::open(Self::decide_apply(command, env))
    }

    /// Records a message from the customer or the staff member
    ///
    /// Returns `Ok(false)` when the command targets another ticket and the
    /// policy ignores such mismatches; nothing changes in that case.
    ///
    /// # Errors
    ///
    /// - [`TicketError::IdentityMismatch`] for a foreign ticket id under
    ///   [`MismatchHandling::Reject`]
    /// - [`TicketError::TicketClosed`] when closed tickets are terminal
    pub fn process(
        &mut self,
        command: ProcessTicketCommand,
        env: &TicketEnvironment,
    ) -> Result<bool, TicketError> {
        match self.decide_process(command, env)? {
            Some(event) => {
                self.evolve(&event);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Closes the ticket with the customer's final message and score
    ///
    /// # Errors
    ///
    /// - [`TicketError::IdentityMismatch`] for a foreign ticket id under
    ///   [`MismatchHandling::Reject`]
    /// - [`TicketError::TicketClosed`] when closed tickets are terminal
    pub fn finish(
        &mut self,
        command: FinishTicketCommand,
        env: &TicketEnvironment,
    ) -> Result<(), TicketError> {
        let event = self.decide_finish(command, env)?;
        self.evolve(&event);
        Ok(())
    }

    // ========== Decide ==========

    /// Builds the opening event, minting the consultation id
    #[must_use]
    pub fn decide_apply(command: ApplyTicketCommand, env: &TicketEnvironment) -> TicketApplied {
        let consultation = Consultation {
            id: ConsultationId::from_uuid(env.ids.next_id()),
            account: command.account,
            order: command.order,
            inquiry: command.inquiry,
        };

        TicketApplied {
            ticket_id: command.ticket_id,
            consultation,
            staff: command.staff,
            applied_at: env.clock.now(),
        }
    }

    /// Validates a process command without changing the ticket
    ///
    /// # Errors
    ///
    /// See [`Ticket::process`].
    pub fn decide_process(
        &self,
        command: ProcessTicketCommand,
        env: &TicketEnvironment,
    ) -> Result<Option<TicketEvent>, TicketError> {
        if command.ticket_id != self.id {
            return match env.policy.identity_mismatch {
                MismatchHandling::Reject => Err(TicketError::IdentityMismatch {
                    expected: self.id.clone(),
                    actual: command.ticket_id,
                }),
                MismatchHandling::Ignore => {
                    tracing::debug!(
                        ticket_id = %self.id,
                        command_ticket_id = %command.ticket_id,
                        "Ignoring message addressed to another ticket"
                    );
                    Ok(None)
                },
            };
        }

        self.ensure_open(&env.policy)?;

        let message = self.compose(command.ticket_id, command.source, command.message, env);
        Ok(Some(TicketEvent::MessageRecorded { message }))
    }

    /// Validates a finish command without changing the ticket
    ///
    /// Under [`MismatchHandling::Ignore`] the ticket id is not checked and the
    /// closing message carries the command's id.
    ///
    /// # Errors
    ///
    /// See [`Ticket::finish`].
    pub fn decide_finish(
        &self,
        command: FinishTicketCommand,
        env: &TicketEnvironment,
    ) -> Result<TicketEvent, TicketError> {
        if env.policy.identity_mismatch == MismatchHandling::Reject && command.ticket_id != self.id
        {
            return Err(TicketError::IdentityMismatch {
                expected: self.id.clone(),
                actual: command.ticket_id,
            });
        }

        self.ensure_open(&env.policy)?;

        // Only the customer can close a ticket
        let message = self.compose(
            command.ticket_id,
            MessageSource::Customer,
            command.message,
            env,
        );
        Ok(TicketEvent::Finished {
            message,
            score: TicketScore::new(command.score),
        })
    }

    // ========== Evolve ==========

    /// Opens a ticket from its first event
    ///
    /// Returns `None` unless the event is [`TicketEvent::Applied`].
    #[must_use]
    pub fn from_event(event: &TicketEvent) -> Option<Self> {
        match event {
            TicketEvent::Applied(applied) => Some(Self::open(applied.clone())),
            TicketEvent::MessageRecorded { .. } | TicketEvent::Finished { .. } => None,
        }
    }

    /// Rebuilds a ticket from its recorded events
    ///
    /// Returns `Ok(None)` for an empty history. Every event after the first
    /// is checked with [`Ticket::validate_event`] before it is applied.
    ///
    /// # Errors
    ///
    /// - [`TicketError::NotApplied`] if the history does not start with
    ///   [`TicketEvent::Applied`]
    /// - any error from [`Ticket::validate_event`]
    pub fn replay<'a, I>(events: I, policy: &TicketPolicy) -> Result<Option<Self>, TicketError>
    where
        I: IntoIterator<Item = &'a TicketEvent>,
    {
        let mut events = events.into_iter();
        let Some(first) = events.next() else {
            return Ok(None);
        };
        let mut ticket = Self::from_event(first)
            .ok_or_else(|| TicketError::NotApplied(first.ticket_id().clone()))?;
        for event in events {
            ticket.validate_event(event, policy)?;
            ticket.evolve(event);
        }
        Ok(Some(ticket))
    }

    /// Checks that a recorded event could have been produced by this ticket
    ///
    /// Applies the same rules as the decide step: a message must belong to
    /// this ticket, a closing message must too under
    /// [`MismatchHandling::Reject`], and a closed ticket accepts nothing when
    /// closed tickets are terminal.
    ///
    /// # Errors
    ///
    /// - [`TicketError::AlreadyApplied`] for a second opening event
    /// - [`TicketError::IdentityMismatch`] for an event of another ticket
    /// - [`TicketError::TicketClosed`] when closed tickets are terminal
    pub fn validate_event(
        &self,
        event: &TicketEvent,
        policy: &TicketPolicy,
    ) -> Result<(), TicketError> {
        let check_identity = match event {
            TicketEvent::Applied(_) => return Err(TicketError::AlreadyApplied(self.id.clone())),
            TicketEvent::MessageRecorded { .. } => true,
            TicketEvent::Finished { .. } => policy.identity_mismatch == MismatchHandling::Reject,
        };

        if check_identity && *event.ticket_id() != self.id {
            return Err(TicketError::IdentityMismatch {
                expected: self.id.clone(),
                actual: event.ticket_id().clone(),
            });
        }

        self.ensure_open(policy)
    }

    pub(crate) fn evolve(&mut self, event: &TicketEvent) {
        match event {
            // Opening is handled by `from_event`
            TicketEvent::Applied(_) => {},
            TicketEvent::MessageRecorded { message } => {
                self.messages.push(message.clone());
                self.status = TicketStatus::InProcess;
            },
            TicketEvent::Finished { message, score } => {
                self.messages.push(message.clone());
                self.status = TicketStatus::Closed;
                self.score = *score;
                self.closed_at = Some(message.sent_at);
            },
        }
    }

    fn open(applied: TicketApplied) -> Self {
        Self {
            id: applied.ticket_id,
            consultation: applied.consultation,
            staff: applied.staff,
            status: TicketStatus::Initialized,
            messages: Vec::new(),
            score: TicketScore::default(),
            opened_at: applied.applied_at,
            closed_at: None,
        }
    }

    fn ensure_open(&self, policy: &TicketPolicy) -> Result<(), TicketError> {
        if policy.closed_is_terminal && self.status.is_closed() {
            return Err(TicketError::TicketClosed(self.id.clone()));
        }
        Ok(())
    }

    fn compose(
        &self,
        ticket_id: TicketId,
        source: MessageSource,
        content: String,
        env: &TicketEnvironment,
    ) -> Message {
        Message {
            ticket_id,
            account: self.consultation.account.clone(),
            staff_name: self.staff.staff_name.clone(),
            source,
            content,
            sent_at: env.clock.now(),
        }
    }

    // ========== Accessors ==========

    /// Ticket identifier
    #[must_use]
    pub const fn id(&self) -> &TicketId {
        &self.id
    }

    /// The embedded consultation
    #[must_use]
    pub const fn consultation(&self) -> &Consultation {
        &self.consultation
    }

    /// Assigned staff member
    #[must_use]
    pub const fn staff(&self) -> &StaffProfile {
        &self.staff
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> TicketStatus {
        self.status
    }

    /// All messages in conversation order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent message, if any
    #[must_use]
    pub fn latest_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Satisfaction score; zero until finished
    #[must_use]
    pub const fn score(&self) -> TicketScore {
        self.score
    }

    /// When the ticket was opened
    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// When the ticket was last finished
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }
}
