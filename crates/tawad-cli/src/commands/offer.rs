use std::sync::Arc;

use tawad_core::dispatch::ActionDispatcher;

use crate::commands::common::{open_conversation, signed_in_context};
use crate::commands::conversation::print_summary;
use crate::error::CliError;

pub async fn run_accept(profile: Option<&str>, conversation: &str) -> Result<(), CliError> {
    let (context, auth) = signed_in_context(profile).await?;
    let (session, _watcher) = open_conversation(&context, conversation).await?;

    let offer_id = session
        .view()
        .await
        .and_then(|view| view.offer)
        .map(|offer| offer.id)
        .ok_or(CliError::NoOffer)?;

    let dispatcher = ActionDispatcher::new(Arc::new(context.api.clone()), session.clone());
    dispatcher.accept_offer(&offer_id).await?;

    println!("Offer accepted");
    if let Some(view) = session.view().await {
        print_summary(&view, &auth.user.id);
    }
    Ok(())
}

pub async fn run_reject(profile: Option<&str>, conversation: &str) -> Result<(), CliError> {
    let (context, auth) = signed_in_context(profile).await?;
    let (session, _watcher) = open_conversation(&context, conversation).await?;

    let offer_id = session
        .view()
        .await
        .and_then(|view| view.offer)
        .map(|offer| offer.id)
        .ok_or(CliError::NoOffer)?;

    let dispatcher = ActionDispatcher::new(Arc::new(context.api.clone()), session.clone());
    dispatcher.reject_offer(&offer_id).await?;

    println!("Offer declined");
    if let Some(view) = session.view().await {
        print_summary(&view, &auth.user.id);
    }
    Ok(())
}

pub async fn run_update(
    profile: Option<&str>,
    conversation: &str,
    amount: &str,
) -> Result<(), CliError> {
    let (context, auth) = signed_in_context(profile).await?;
    let (session, _watcher) = open_conversation(&context, conversation).await?;

    let offer_id = session
        .view()
        .await
        .and_then(|view| view.offer)
        .map(|offer| offer.id)
        .ok_or(CliError::NoOffer)?;

    let dispatcher = ActionDispatcher::new(Arc::new(context.api.clone()), session.clone());
    dispatcher.update_offer(&offer_id, amount).await?;

    println!("Offer updated to {amount}");
    if let Some(view) = session.view().await {
        print_summary(&view, &auth.user.id);
    }
    Ok(())
}
