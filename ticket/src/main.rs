//! Ticket lifecycle demo.
//!
//! Opens a ticket, exchanges messages, sends one message to the wrong ticket,
//! and closes it with a score. Set `TICKET_IDENTITY_MISMATCH=ignore` and
//! `TICKET_CLOSED_IS_TERMINAL=false` to run with the permissive policy.

use anyhow::Context;
use customer_service_runtime::Store;
use ticket_service::{
    ApplyTicketCommand, Config, FinishTicketCommand, MessageSource, ProcessTicketCommand,
    StaffProfile, TicketAction, TicketEnvironment, TicketId, TicketReducer, TicketState,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ticket_service={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(policy = ?config.policy, "Starting ticket demo");

    let env = TicketEnvironment::production(config.policy);
    let store = Store::new(TicketState::new(), TicketReducer::new(), env);
    let ticket_id = TicketId::new("T1");

    let actions = [
        TicketAction::ApplyTicket(ApplyTicketCommand {
            ticket_id: ticket_id.clone(),
            account: "A1".into(),
            order: "O1".into(),
            inquiry: "help".to_string(),
            staff: StaffProfile::new("S1", "Sam"),
        }),
        TicketAction::ProcessTicket(ProcessTicketCommand {
            ticket_id: ticket_id.clone(),
            source: MessageSource::Customer,
            message: "still need help".to_string(),
        }),
        TicketAction::ProcessTicket(ProcessTicketCommand {
            ticket_id: "WRONG".into(),
            source: MessageSource::Staff,
            message: "this belongs elsewhere".to_string(),
        }),
        TicketAction::FinishTicket(FinishTicketCommand {
            ticket_id,
            message: "thanks, resolved".to_string(),
            score: 5,
        }),
    ];

    for action in actions {
        store.send(action).await?;
        let (status, messages, error) = store
            .state(|s| {
                (
                    s.ticket.as_ref().map(|t| t.status().to_string()),
                    s.message_count(),
                    s.last_error.clone(),
                )
            })
            .await;
        info!(?status, messages, ?error, "Action processed");
    }

    let snapshot = store
        .state(|s| serde_json::to_string_pretty(&s.ticket))
        .await
        .context("failed to serialize ticket")?;
    println!("{snapshot}");

    Ok(())
}
