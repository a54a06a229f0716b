use std::time::Duration;

use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::sleep;

use tawad_core::events::{EventHub, EventStream};
use tawad_core::session::ChatSession;

use crate::commands::common::{parse_conversation_id, signed_in_context};
use crate::commands::conversation::print_summary;
use crate::error::CliError;

/// Delay between an event arriving and reprinting, so the watcher's
/// refetch has usually landed
const REPRINT_DELAY: Duration = Duration::from_millis(300);

pub async fn run_watch(profile: Option<&str>, conversation: &str) -> Result<(), CliError> {
    let (context, auth) = signed_in_context(profile).await?;
    let conversation_id = parse_conversation_id(conversation)?;

    let hub = EventHub::new();
    let _stream = EventStream::connect(&context.config, auth.user.id, hub.clone())?;
    let mut events = hub.subscribe();

    let (session, _watcher) =
        ChatSession::open(context.api.clone(), &hub, conversation_id).await?;

    if let Some(view) = session.view().await {
        print_summary(&view, &auth.user.id);
    }
    println!("Watching conversation {conversation_id}; Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(event) if *event.conversation_id() == conversation_id => {
                    sleep(REPRINT_DELAY).await;
                    println!();
                    println!("-- {}", event.name());
                    if let Some(view) = session.view().await {
                        print_summary(&view, &auth.user.id);
                    }
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    }

    println!("Stopped watching");
    Ok(())
}
