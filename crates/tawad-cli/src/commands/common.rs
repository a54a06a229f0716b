//! Shared plumbing for command implementations.

use std::sync::Arc;

use tawad_core::api::{ApiClient, AuthSession};
use tawad_core::events::EventHub;
use tawad_core::models::ConversationId;
use tawad_core::session::ChatSession;
use tawad_core::sync::ConversationWatcher;
use tawad_core::ClientConfig;

use crate::error::CliError;
use crate::profiles::CliProfilesConfig;
use crate::session_store::SessionStore;

pub struct CliContext {
    pub profile_name: String,
    pub config: ClientConfig,
    pub api: ApiClient,
}

/// Resolve the profile, build the client config (profile first, env
/// fallback), and construct an API client.
pub fn build_context(profile: Option<&str>) -> Result<CliContext, CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = profiles.resolve_profile_name(profile);
    let profile = profiles.profile(&profile_name).cloned().unwrap_or_default();

    let config = match profile.api_base_url() {
        Some(base_url) => {
            ClientConfig::new(base_url, profile.events_url(), profile.api_key())?
        }
        None => ClientConfig::from_env().map_err(|_| CliError::NotConfigured)?,
    };

    let api = ApiClient::new(&config)?;
    Ok(CliContext {
        profile_name,
        config,
        api,
    })
}

/// Like [`build_context`], but also restores the stored session and
/// installs its bearer token on the client.
pub async fn signed_in_context(
    profile: Option<&str>,
) -> Result<(CliContext, AuthSession), CliError> {
    let context = build_context(profile)?;
    let session = SessionStore::new(&context.profile_name)
        .load()?
        .ok_or(CliError::NotSignedIn)?;
    context
        .api
        .set_access_token(Some(session.token.clone()))
        .await;
    Ok((context, session))
}

pub fn parse_conversation_id(raw: &str) -> Result<ConversationId, CliError> {
    raw.parse()
        .map_err(|_| CliError::InvalidConversationId(raw.to_string()))
}

/// Open a conversation session on an ephemeral hub. One-shot commands do
/// not connect the event feed; the watcher only serves the dispatcher's
/// post-mutation refresh.
pub async fn open_conversation(
    context: &CliContext,
    raw_id: &str,
) -> Result<(Arc<ChatSession>, ConversationWatcher), CliError> {
    let conversation_id = parse_conversation_id(raw_id)?;
    let hub = EventHub::new();
    let (session, watcher) =
        ChatSession::open(context.api.clone(), &hub, conversation_id).await?;
    Ok((session, watcher))
}
