use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flashdeck")]
#[command(about = "Study flashcard decks from the command line", long_about = None)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to $FLASHDECK_HOME, then the OS data dir)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Signed-in user id; anonymous when omitted
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Email of the signed-in user
    #[arg(long, global = true, requires = "user")]
    pub email: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List decks
    #[command(alias = "ls")]
    Decks {
        /// Only decks you created
        #[arg(long, conflicts_with = "liked")]
        mine: bool,

        /// Only decks you liked
        #[arg(long)]
        liked: bool,

        /// Keep decks whose title contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Create or delete decks
    Deck {
        #[command(subcommand)]
        action: DeckCommand,
    },

    /// Add, edit or delete cards
    Card {
        #[command(subcommand)]
        action: CardCommand,
    },

    /// Like a deck, or unlike it if already liked
    Like { deck: String },

    /// Show a card of a deck
    Study {
        deck: String,

        /// Advance this many cards before showing
        #[arg(short, long, default_value_t = 0)]
        next: usize,

        /// Show the answer side
        #[arg(short, long)]
        flip: bool,
    },

    /// Set your display name
    Profile { name: String },

    /// Show your totals
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum DeckCommand {
    /// Create an empty deck
    #[command(alias = "n")]
    New { title: String },

    /// Delete a deck and all its cards
    #[command(alias = "delete")]
    Rm { deck: String },
}

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Add a card to a deck
    Add {
        deck: String,
        question: String,
        answer: String,
    },

    /// Replace a card's question and answer
    #[command(alias = "e")]
    Edit {
        deck: String,
        card: String,
        question: String,
        answer: String,
    },

    /// Delete a card
    #[command(alias = "delete")]
    Rm { deck: String, card: String },
}
