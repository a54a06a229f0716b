//! Tawad CLI - marketplace negotiation from the command line
//!
//! Sign in, inspect a conversation's offer and meetup state, dispatch
//! negotiation actions, or watch a conversation live.

mod cli;
mod commands;
mod error;
mod profiles;
mod session_store;

use clap::Parser;

use crate::cli::{
    AuthCommands, Cli, Commands, ConfigCommands, ConversationCommands, MeetupCommands,
    OfferCommands,
};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tawad=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Init {
                api_base_url,
                events_url,
                api_key,
                no_activate,
            } => commands::config::run_init(
                profile,
                api_base_url,
                events_url,
                api_key,
                no_activate,
            ),
            ConfigCommands::Show => commands::config::run_show(profile),
        },
        Commands::Auth { command } => match command {
            AuthCommands::Login { email, password } => {
                commands::auth::run_login(profile, &email, &password).await
            }
            AuthCommands::Status => commands::auth::run_status(profile).await,
            AuthCommands::Logout => commands::auth::run_logout(profile),
        },
        Commands::Conversation { command } => match command {
            ConversationCommands::Show { conversation, json } => {
                commands::conversation::run_show(profile, &conversation, json).await
            }
            ConversationCommands::Send {
                conversation,
                message,
            } => commands::conversation::run_send(profile, &conversation, &message).await,
        },
        Commands::Offer { command } => match command {
            OfferCommands::Accept { conversation } => {
                commands::offer::run_accept(profile, &conversation).await
            }
            OfferCommands::Reject { conversation } => {
                commands::offer::run_reject(profile, &conversation).await
            }
            OfferCommands::Update {
                conversation,
                amount,
            } => commands::offer::run_update(profile, &conversation, &amount).await,
        },
        Commands::Meetup { command } => match command {
            MeetupCommands::Propose {
                conversation,
                at,
                location,
                lat,
                lng,
            } => {
                commands::meetup::run_propose(profile, &conversation, &at, &location, lat, lng)
                    .await
            }
            MeetupCommands::Accept { conversation } => {
                commands::meetup::run_accept(profile, &conversation).await
            }
        },
        Commands::Watch { conversation } => {
            commands::watch::run_watch(profile, &conversation).await
        }
        Commands::Completions { shell, output } => {
            commands::completions::run_completions(shell, output.as_deref())
        }
    }
}
