use std::sync::Arc;

use chrono::{DateTime, Utc};
use tawad_core::dispatch::ActionDispatcher;
use tawad_core::models::{MeetupPoint, MeetupProposal};

use crate::commands::common::{open_conversation, signed_in_context};
use crate::commands::conversation::print_summary;
use crate::error::CliError;

pub async fn run_propose(
    profile: Option<&str>,
    conversation: &str,
    at: &str,
    location: &str,
    lat: f64,
    lng: f64,
) -> Result<(), CliError> {
    let scheduled_meetup_at = parse_rfc3339(at)?;

    let (context, auth) = signed_in_context(profile).await?;
    let (session, _watcher) = open_conversation(&context, conversation).await?;

    let transaction_id = session
        .view()
        .await
        .and_then(|view| view.transaction)
        .map(|transaction| transaction.id)
        .ok_or(CliError::NoTransaction)?;

    let proposal = MeetupProposal {
        scheduled_meetup_at,
        meetup_location: location.to_string(),
        meetup_coordinates: MeetupPoint {
            lat,
            lng,
            address: location.to_string(),
        },
    };

    let dispatcher = ActionDispatcher::new(Arc::new(context.api.clone()), session.clone());
    dispatcher.propose_meetup(&transaction_id, &proposal).await?;

    println!("Meetup proposal sent");
    if let Some(view) = session.view().await {
        print_summary(&view, &auth.user.id);
    }
    Ok(())
}

pub async fn run_accept(profile: Option<&str>, conversation: &str) -> Result<(), CliError> {
    let (context, auth) = signed_in_context(profile).await?;
    let (session, _watcher) = open_conversation(&context, conversation).await?;

    let transaction_id = session
        .view()
        .await
        .and_then(|view| view.transaction)
        .map(|transaction| transaction.id)
        .ok_or(CliError::NoTransaction)?;

    let dispatcher = ActionDispatcher::new(Arc::new(context.api.clone()), session.clone());
    dispatcher.accept_meetup(&transaction_id).await?;

    println!("Meetup accepted");
    if let Some(view) = session.view().await {
        print_summary(&view, &auth.user.id);
    }
    Ok(())
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| CliError::InvalidDateTime(raw.to_string()))
}
