use tawad_core::api::OutgoingMessage;
use tawad_core::models::{ConversationView, UserId};
use tawad_core::negotiation::project_actions;
use tracing::debug;

use crate::commands::common::{parse_conversation_id, signed_in_context};
use crate::error::CliError;

pub async fn run_show(
    profile: Option<&str>,
    conversation: &str,
    json: bool,
) -> Result<(), CliError> {
    let (context, session) = signed_in_context(profile).await?;
    let conversation_id = parse_conversation_id(conversation)?;

    let view = context.api.get_conversation(&conversation_id).await?;

    // Opening a conversation marks its messages as read, best-effort
    if let Err(error) = context.api.mark_messages_read(&conversation_id).await {
        debug!("mark-as-read failed: {error}");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print_summary(&view, &session.user.id);
    Ok(())
}

pub async fn run_send(
    profile: Option<&str>,
    conversation: &str,
    message: &str,
) -> Result<(), CliError> {
    let (context, _session) = signed_in_context(profile).await?;
    let conversation_id = parse_conversation_id(conversation)?;

    let sent = context
        .api
        .send_message(&OutgoingMessage::text(conversation_id, message))
        .await?;
    println!("Sent message {}", sent.id);
    Ok(())
}

/// Print offer/transaction state and the viewer's action set
pub fn print_summary(view: &ConversationView, viewer: &UserId) {
    if let Some(peer) = &view.opposite_user {
        let badge = if peer.identity_verified {
            " [verified]"
        } else {
            ""
        };
        println!("Conversation with {}{badge}", peer.display_name);
    }

    if let Some(product) = &view.product {
        println!("Product: {} (listed at {})", product.title, product.price);
    }

    match &view.offer {
        Some(offer) => println!("Offer: {} ({:?})", offer.amount, offer.status),
        None => println!("Offer: none"),
    }

    if let Some(transaction) = &view.transaction {
        println!(
            "Transaction: {:?}, meetup {:?}",
            transaction.status, transaction.meetup_status
        );
        if let Some((at, location)) = transaction.meetup_details() {
            println!("Meetup: {} at {location}", at.to_rfc3339());
        }
    }

    let actions = project_actions(view.offer.as_ref(), view.transaction.as_ref(), viewer);
    if actions.is_empty() {
        println!("Available actions: none");
    } else {
        let labels: Vec<&str> = actions.iter().map(|action| action.label()).collect();
        println!("Available actions: {}", labels.join(", "));
    }
}
