use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tawad")]
#[command(about = "Negotiate marketplace offers and meetups from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name for endpoint configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Authenticate against the marketplace API
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Inspect a conversation
    Conversation {
        #[command(subcommand)]
        command: ConversationCommands,
    },
    /// Act on a conversation's offer
    Offer {
        #[command(subcommand)]
        command: OfferCommands,
    },
    /// Act on a conversation's meetup
    Meetup {
        #[command(subcommand)]
        command: MeetupCommands,
    },
    /// Watch a conversation and live-refresh on push events
    Watch {
        /// Conversation ID
        conversation: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update a profile
    Init {
        /// REST base URL, e.g. https://api.example.com/api/v1
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Event feed base URL (defaults to the API base URL)
        #[arg(long, value_name = "URL")]
        events_url: Option<String>,
        /// App API key
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
        /// Keep the current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for the profile
    Status,
    /// Sign out and clear the stored session
    Logout,
}

#[derive(Subcommand)]
pub enum ConversationCommands {
    /// Print a conversation's negotiation state and available actions
    Show {
        /// Conversation ID
        conversation: String,
        /// Output the raw composite view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send a text message
    Send {
        /// Conversation ID
        conversation: String,
        /// Message text
        message: String,
    },
}

#[derive(Subcommand)]
pub enum OfferCommands {
    /// Accept the pending offer (seller)
    Accept {
        /// Conversation ID
        #[arg(long, value_name = "ID")]
        conversation: String,
    },
    /// Decline the pending offer (seller)
    Reject {
        /// Conversation ID
        #[arg(long, value_name = "ID")]
        conversation: String,
    },
    /// Revise the pending offer amount (buyer)
    Update {
        /// Conversation ID
        #[arg(long, value_name = "ID")]
        conversation: String,
        /// New decimal amount, e.g. 1500.00
        #[arg(long, value_name = "AMOUNT")]
        amount: String,
    },
}

#[derive(Subcommand)]
pub enum MeetupCommands {
    /// Propose (or replace) the meetup time and place
    Propose {
        /// Conversation ID
        #[arg(long, value_name = "ID")]
        conversation: String,
        /// Meetup time, RFC 3339 (e.g. 2025-06-01T10:00:00Z)
        #[arg(long, value_name = "WHEN")]
        at: String,
        /// Meetup location address
        #[arg(long, value_name = "ADDRESS")]
        location: String,
        /// Latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
    /// Accept the other party's proposed meetup
    Accept {
        /// Conversation ID
        #[arg(long, value_name = "ID")]
        conversation: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
