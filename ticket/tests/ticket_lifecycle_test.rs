//! End-to-end ticket lifecycle through the store.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use customer_service_runtime::Store;
use customer_service_testing::{SequentialIdGenerator, test_clock};
use std::sync::Arc;
use ticket_service::{
    ApplyTicketCommand, FinishTicketCommand, Message, MessageSource, ProcessTicketCommand,
    StaffProfile, TicketAction, TicketEnvironment, TicketEvent, TicketId, TicketPolicy,
    TicketReducer, TicketState, TicketStatus,
};

type TicketStore = Store<TicketState, TicketAction, TicketEnvironment, TicketReducer>;

fn store(policy: TicketPolicy) -> TicketStore {
    let env = TicketEnvironment::new(
        Arc::new(test_clock()),
        Arc::new(SequentialIdGenerator::new()),
        policy,
    );
    Store::new(TicketState::new(), TicketReducer::new(), env)
}

fn apply() -> TicketAction {
    TicketAction::ApplyTicket(ApplyTicketCommand {
        ticket_id: "T1".into(),
        account: "A1".into(),
        order: "O1".into(),
        inquiry: "help".to_string(),
        staff: StaffProfile::new("S1", "Sam"),
    })
}

fn process(ticket_id: &str, message: &str) -> TicketAction {
    TicketAction::ProcessTicket(ProcessTicketCommand {
        ticket_id: ticket_id.into(),
        source: MessageSource::Customer,
        message: message.to_string(),
    })
}

fn finish(ticket_id: &str, message: &str, score: u32) -> TicketAction {
    TicketAction::FinishTicket(FinishTicketCommand {
        ticket_id: ticket_id.into(),
        message: message.to_string(),
        score,
    })
}

/// (status, message count, score)
async fn snapshot(store: &TicketStore) -> (TicketStatus, usize, u32) {
    store
        .state(|s| {
            let ticket = s.ticket.as_ref().expect("ticket applied");
            (ticket.status(), ticket.messages().len(), ticket.score().value())
        })
        .await
}

async fn run_scenario(policy: TicketPolicy) -> TicketStore {
    let store = store(policy);

    store.send(apply()).await.unwrap();
    assert_eq!(snapshot(&store).await, (TicketStatus::Initialized, 0, 0));

    store.send(process("T1", "still need help")).await.unwrap();
    assert_eq!(snapshot(&store).await, (TicketStatus::InProcess, 1, 0));

    store.send(process("WRONG", "misrouted")).await.unwrap();
    assert_eq!(snapshot(&store).await, (TicketStatus::InProcess, 1, 0));

    store.send(finish("T1", "thanks, resolved", 5)).await.unwrap();
    assert_eq!(snapshot(&store).await, (TicketStatus::Closed, 2, 5));

    store
}

#[tokio::test]
async fn test_lifecycle_with_strict_policy() {
    let store = run_scenario(TicketPolicy::strict()).await;

    let (latest, events) = store
        .state(|s| {
            let ticket = s.ticket.as_ref().unwrap();
            (ticket.latest_message().cloned().unwrap(), s.events.len())
        })
        .await;
    assert_eq!(latest.source, MessageSource::Customer);
    assert_eq!(latest.content, "thanks, resolved");
    assert_eq!(latest.ticket_id, TicketId::new("T1"));
    assert_eq!(events, 3);
}

#[tokio::test]
async fn test_lifecycle_with_permissive_policy() {
    let store = run_scenario(TicketPolicy::permissive()).await;

    // The misrouted message was dropped without an error
    assert!(store.state(|s| s.last_error.is_none()).await);
}

#[tokio::test]
async fn test_strict_policy_reports_mismatch() {
    let store = store(TicketPolicy::strict());
    store.send(apply()).await.unwrap();
    store.send(process("WRONG", "misrouted")).await.unwrap();

    let error = store.state(|s| s.last_error.clone()).await.unwrap();
    assert!(error.contains("WRONG"));
    assert!(error.contains("T1"));
}

#[tokio::test]
async fn test_closed_ticket_rejects_further_messages() {
    let store = store(TicketPolicy::strict());
    store.send(apply()).await.unwrap();
    store.send(finish("T1", "bye", 3)).await.unwrap();

    store.send(process("T1", "one more thing")).await.unwrap();
    store.send(finish("T1", "changed my mind", 1)).await.unwrap();

    assert_eq!(snapshot(&store).await, (TicketStatus::Closed, 1, 3));
    let error = store.state(|s| s.last_error.clone()).await.unwrap();
    assert!(error.contains("closed"));
}

#[tokio::test]
async fn test_replayed_foreign_message_cannot_reopen_closed_ticket() {
    let store = store(TicketPolicy::strict());
    store.send(apply()).await.unwrap();
    store.send(finish("T1", "bye", 5)).await.unwrap();

    let sent_at = store
        .state(|s| s.ticket.as_ref().unwrap().latest_message().unwrap().sent_at)
        .await;
    let foreign = TicketEvent::MessageRecorded {
        message: Message {
            ticket_id: "OTHER".into(),
            account: "A1".into(),
            staff_name: "Sam".to_string(),
            source: MessageSource::Staff,
            content: "wrong ticket".to_string(),
            sent_at,
        },
    };
    store.send(TicketAction::Recorded(foreign)).await.unwrap();

    assert_eq!(snapshot(&store).await, (TicketStatus::Closed, 1, 5));
    let (latest, error) = store
        .state(|s| {
            let ticket = s.ticket.as_ref().unwrap();
            (ticket.latest_message().unwrap().ticket_id.clone(), s.last_error.clone())
        })
        .await;
    assert_eq!(latest, TicketId::new("T1"));
    assert!(error.unwrap().contains("OTHER"));
}

#[tokio::test]
async fn test_repeated_finish_is_last_write_wins_when_permissive() {
    let store = store(TicketPolicy::permissive());
    store.send(apply()).await.unwrap();
    store.send(finish("T1", "meh", 2)).await.unwrap();
    store.send(finish("T1", "actually great", 5)).await.unwrap();

    assert_eq!(snapshot(&store).await, (TicketStatus::Closed, 2, 5));
}

#[tokio::test]
async fn test_concurrent_messages_are_all_recorded() {
    let store = store(TicketPolicy::strict());
    store.send(apply()).await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.send(process("T1", &format!("message {i}"))).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(snapshot(&store).await, (TicketStatus::InProcess, 16, 0));
}

#[tokio::test]
async fn test_ticket_serializes_for_snapshots() {
    let store = run_scenario(TicketPolicy::strict()).await;

    let json = store
        .state(|s| serde_json::to_value(s.ticket.as_ref().unwrap()).unwrap())
        .await;
    assert_eq!(json["status"], "CLOSED");
    assert_eq!(json["score"], 5);
    assert_eq!(json["messages"][1]["source"], "CUSTOMER");
    assert_eq!(json["consultation"]["id"], "Consultation00000000-0000-0000-0000-000000000001");
}
