//! Reducer hosting one ticket.
//!
//! Commands are validated by the aggregate. Accepted commands are recorded as
//! [`TicketEvent`]s in `TicketState::events` and applied to the ticket.
//! Rejected commands become [`TicketAction::CommandRejected`], which leaves
//! the ticket untouched and sets `last_error`.
//!
//! Replayed events pass the same checks as the commands that produce them.

use crate::aggregate::{Ticket, TicketEvent};
use crate::environment::TicketEnvironment;
use crate::error::TicketError;
use crate::types::{ApplyTicketCommand, FinishTicketCommand, ProcessTicketCommand};
use customer_service_core::{SmallVec, effect::Effect, reducer::Reducer};
use customer_service_macros::Action;
use serde::{Deserialize, Serialize};

/// Actions for the ticket reducer
#[derive(Action, Clone, Debug, Serialize, Deserialize)]
pub enum TicketAction {
    // ========== Commands ==========
    /// Customer opens the ticket
    #[command]
    ApplyTicket(ApplyTicketCommand),

    /// Customer or staff sends a message
    #[command]
    ProcessTicket(ProcessTicketCommand),

    /// Customer closes the ticket with a score
    #[command]
    FinishTicket(FinishTicketCommand),

    // ========== Events ==========
    /// A previously recorded fact, replayed
    #[event(name = "ticket.recorded")]
    Recorded(TicketEvent),

    /// A command was rejected
    #[event(name = "ticket.command_rejected")]
    CommandRejected {
        /// Error message
        error: String,
    },
}

/// State of the ticket reducer
#[derive(Clone, Debug, Default, Serialize)]
pub struct TicketState {
    /// The ticket, once applied
    pub ticket: Option<Ticket>,
    /// Every accepted event, in order
    pub events: Vec<TicketEvent>,
    /// Last rejection (if any)
    pub last_error: Option<String>,
}

impl TicketState {
    /// Creates an empty state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticket: None,
            events: Vec::new(),
            last_error: None,
        }
    }

    /// Number of messages on the ticket, zero before apply
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.ticket.as_ref().map_or(0, |ticket| ticket.messages().len())
    }
}

/// Reducer for the ticket aggregate
#[derive(Clone, Debug, Default)]
pub struct TicketReducer;

impl TicketReducer {
    /// Creates a new `TicketReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn decide(
        state: &TicketState,
        action: TicketAction,
        env: &TicketEnvironment,
    ) -> Result<Option<TicketEvent>, TicketError> {
        match action {
            TicketAction::ApplyTicket(command) => match &state.ticket {
                Some(ticket) => Err(TicketError::AlreadyApplied(ticket.id().clone())),
                None => Ok(Some(TicketEvent::Applied(Ticket::decide_apply(command, env)))),
            },
            TicketAction::ProcessTicket(command) => {
                let Some(ticket) = &state.ticket else {
                    return Err(TicketError::NotApplied(command.ticket_id));
                };
                ticket.decide_process(command, env)
            },
            TicketAction::FinishTicket(command) => {
                let Some(ticket) = &state.ticket else {
                    return Err(TicketError::NotApplied(command.ticket_id));
                };
                ticket.decide_finish(command, env).map(Some)
            },
            TicketAction::Recorded(event) => match &state.ticket {
                Some(ticket) => {
                    ticket.validate_event(&event, &env.policy)?;
                    Ok(Some(event))
                },
                None if matches!(event, TicketEvent::Applied(_)) => Ok(Some(event)),
                None => Err(TicketError::NotApplied(event.ticket_id().clone())),
            },
            // Applied directly by `reduce`
            TicketAction::CommandRejected { .. } => Ok(None),
        }
    }

    /// Applies an event action to state
    fn apply_event(state: &mut TicketState, action: TicketAction) {
        match action {
            TicketAction::Recorded(event) => {
                match state.ticket.as_mut() {
                    Some(ticket) => ticket.evolve(&event),
                    None => state.ticket = Ticket::from_event(&event),
                }
                state.events.push(event);
                state.last_error = None;
            },
            TicketAction::CommandRejected { error } => {
                state.last_error = Some(error);
            },
            // Commands are not applied to state
            TicketAction::ApplyTicket(_)
            | TicketAction::ProcessTicket(_)
            | TicketAction::FinishTicket(_) => {},
        }
    }
}

impl Reducer for TicketReducer {
    type State = TicketState;
    type Action = TicketAction;
    type Environment = TicketEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if matches!(action, TicketAction::CommandRejected { .. }) {
            Self::apply_event(state, action);
            return SmallVec::new();
        }

        let kind = if action.is_command() { "command" } else { "event" };

        match Self::decide(state, action, env) {
            Ok(Some(event)) => {
                tracing::debug!(event_type = event.event_type(), kind, "Ticket event recorded");
                Self::apply_event(state, TicketAction::Recorded(event));
            },
            Ok(None) => {
                tracing::debug!(kind, "Ticket action ignored");
            },
            Err(error) => {
                tracing::warn!(%error, kind, "Ticket action rejected");
                Self::apply_event(
                    state,
                    TicketAction::CommandRejected {
                        error: error.to_string(),
                    },
                );
            },
        }

        SmallVec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TicketPolicy;
    use crate::types::{
        AccountId, Message, MessageSource, OrderId, StaffProfile, TicketId, TicketStatus,
    };
    use customer_service_testing::{ReducerTest, SequentialIdGenerator, assertions, test_clock};
    use std::sync::Arc;

    fn env() -> TicketEnvironment {
        TicketEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(SequentialIdGenerator::new()),
            TicketPolicy::default(),
        )
    }

    fn apply() -> TicketAction {
        TicketAction::ApplyTicket(ApplyTicketCommand {
            ticket_id: TicketId::new("T1"),
            account: AccountId::new("A1"),
            order: OrderId::new("O1"),
            inquiry: "help".to_string(),
            staff: StaffProfile::new("S1", "Sam"),
        })
    }

    fn process(ticket_id: &str) -> TicketAction {
        TicketAction::ProcessTicket(ProcessTicketCommand {
            ticket_id: TicketId::new(ticket_id),
            source: MessageSource::Customer,
            message: "still need help".to_string(),
        })
    }

    fn finish(ticket_id: &str, score: u32) -> TicketAction {
        TicketAction::FinishTicket(FinishTicketCommand {
            ticket_id: TicketId::new(ticket_id),
            message: "thanks".to_string(),
            score,
        })
    }

    /// A staff message event addressed to `ticket_id`
    fn recorded_message(ticket_id: &str) -> TicketAction {
        use customer_service_core::environment::Clock;

        TicketAction::Recorded(TicketEvent::MessageRecorded {
            message: Message {
                ticket_id: TicketId::new(ticket_id),
                account: AccountId::new("A1"),
                staff_name: "Sam".to_string(),
                source: MessageSource::Staff,
                content: "late reply".to_string(),
                sent_at: test_clock().now(),
            },
        })
    }

    #[test]
    fn test_apply_ticket() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(TicketState::new())
            .when_action(apply())
            .then_state(|state| {
                let ticket = state.ticket.as_ref().unwrap();
                assert_eq!(ticket.status(), TicketStatus::Initialized);
                assert_eq!(state.events.len(), 1);
                assert_eq!(state.events[0].event_type(), "ticket.applied.v1");
                assert!(state.last_error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_apply_twice_is_rejected() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(TicketState::new())
            .when_actions([apply(), apply()])
            .then_state(|state| {
                assert_eq!(state.events.len(), 1);
                assert!(state.last_error.as_ref().unwrap().contains("already been applied"));
            })
            .run();
    }

    #[test]
    fn test_process_before_apply_is_rejected() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(TicketState::new())
            .when_action(process("T1"))
            .then_state(|state| {
                assert!(state.ticket.is_none());
                assert!(state.events.is_empty());
                assert!(state.last_error.as_ref().unwrap().contains("has not been applied"));
            })
            .run();
    }

    #[test]
    fn test_rejection_then_success_clears_error() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(TicketState::new())
            .when_actions([apply(), process("WRONG"), process("T1")])
            .then_state(|state| {
                assert_eq!(state.message_count(), 1);
                assert!(state.last_error.is_none());
            })
            .run();
    }

    #[test]
    fn test_recorded_events_replay() {
        let mut source = TicketState::new();
        let reducer = TicketReducer::new();
        let env = env();
        reducer.reduce(&mut source, apply(), &env);
        reducer.reduce(&mut source, process("T1"), &env);

        let replayed: Vec<_> = source.events.iter().cloned().map(TicketAction::Recorded).collect();
        let expected = source.ticket.clone();

        ReducerTest::new(TicketReducer::new())
            .with_env(env)
            .given_state(TicketState::new())
            .when_actions(replayed)
            .then_state(move |state| {
                assert_eq!(state.ticket, expected);
                assert_eq!(state.events.len(), 2);
            })
            .run();
    }

    #[test]
    fn test_replay_out_of_order_is_rejected() {
        let mut source = TicketState::new();
        let reducer = TicketReducer::new();
        let env = env();
        reducer.reduce(&mut source, apply(), &env);
        reducer.reduce(&mut source, process("T1"), &env);
        let message_event = source.events[1].clone();

        ReducerTest::new(TicketReducer::new())
            .with_env(env)
            .given_state(TicketState::new())
            .when_action(TicketAction::Recorded(message_event))
            .then_state(|state| {
                assert!(state.ticket.is_none());
                assert!(state.events.is_empty());
                assert!(state.last_error.as_ref().unwrap().contains("T1"));
            })
            .run();
    }

    #[test]
    fn test_recorded_message_for_another_ticket_is_rejected() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(TicketState::new())
            .when_actions([apply(), recorded_message("OTHER")])
            .then_state(|state| {
                let ticket = state.ticket.as_ref().unwrap();
                assert_eq!(ticket.status(), TicketStatus::Initialized);
                assert!(ticket.messages().is_empty());
                assert_eq!(state.events.len(), 1);
                assert!(state.last_error.as_ref().unwrap().contains("OTHER"));
            })
            .run();
    }

    #[test]
    fn test_recorded_message_cannot_reopen_closed_ticket() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(TicketState::new())
            .when_actions([apply(), finish("T1", 5), recorded_message("T1")])
            .then_state(|state| {
                let ticket = state.ticket.as_ref().unwrap();
                assert_eq!(ticket.status(), TicketStatus::Closed);
                assert_eq!(ticket.messages().len(), 1);
                assert_eq!(ticket.score().value(), 5);
                assert_eq!(state.events.len(), 2);
                assert!(state.last_error.as_ref().unwrap().contains("closed"));
            })
            .run();
    }

    #[test]
    fn test_foreign_message_on_closed_ticket_is_rejected() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(TicketState::new())
            .when_actions([apply(), finish("T1", 5), recorded_message("OTHER")])
            .then_state(|state| {
                let ticket = state.ticket.as_ref().unwrap();
                assert_eq!(ticket.status(), TicketStatus::Closed);
                assert_eq!(ticket.latest_message().unwrap().ticket_id.as_str(), "T1");
                assert!(state.last_error.is_some());
            })
            .run();
    }

    #[test]
    fn test_recorded_message_reopens_when_permissive() {
        let env = TicketEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(SequentialIdGenerator::new()),
            TicketPolicy::permissive(),
        );

        ReducerTest::new(TicketReducer::new())
            .with_env(env)
            .given_state(TicketState::new())
            .when_actions([apply(), finish("T1", 5), recorded_message("T1")])
            .then_state(|state| {
                let ticket = state.ticket.as_ref().unwrap();
                assert_eq!(ticket.status(), TicketStatus::InProcess);
                assert_eq!(ticket.messages().len(), 2);
                assert!(state.last_error.is_none());
            })
            .run();
    }

    #[test]
    fn test_command_rejected_event_sets_error() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(TicketState::new())
            .when_action(TicketAction::CommandRejected {
                error: "boom".to_string(),
            })
            .then_state(|state| assert_eq!(state.last_error.as_deref(), Some("boom")))
            .run();
    }

    #[test]
    fn test_action_classification() {
        assert!(apply().is_command());
        let rejected = TicketAction::CommandRejected {
            error: String::new(),
        };
        assert!(rejected.is_event());
        assert_eq!(rejected.event_type(), "ticket.command_rejected.v1");
    }
}
