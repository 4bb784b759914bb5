use chrono::Utc;
use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use env_logger::Env;
use flashdeck::api::FlashdeckApi;
use flashdeck::commands::{CmdMessage, MessageLevel};
use flashdeck::config::FlashdeckConfig;
use flashdeck::error::{FlashdeckError, Result};
use flashdeck::model::{AuthUser, CardId, DeckId, EnrichedDeckView};
use flashdeck::source::fs::FileSource;
use flashdeck::study::StudyView;
use flashdeck::subscriptions::FilterMode;
use std::path::PathBuf;
use unicode_width::UnicodeWidthStr;

mod args;
use args::{CardCommand, Cli, Commands, DeckCommand};

const HOME_ENV: &str = "FLASHDECK_HOME";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let mut api = init_api(&cli)?;

    match cli.command {
        Some(Commands::Decks {
            mine,
            liked,
            search,
        }) => handle_decks(&mut api, mine, liked, search),
        Some(Commands::Deck { action }) => match action {
            DeckCommand::New { title } => print_result(api.create_deck(&title)),
            DeckCommand::Rm { deck } => print_result(api.delete_deck(&DeckId::new(deck))),
        },
        Some(Commands::Card { action }) => match action {
            CardCommand::Add {
                deck,
                question,
                answer,
            } => print_result(api.create_flashcard(&DeckId::new(deck), &question, &answer)),
            CardCommand::Edit {
                deck,
                card,
                question,
                answer,
            } => print_result(api.update_flashcard(
                &DeckId::new(deck),
                &CardId::new(card),
                &question,
                &answer,
            )),
            CardCommand::Rm { deck, card } => {
                print_result(api.delete_flashcard(&DeckId::new(deck), &CardId::new(card)))
            }
        },
        Some(Commands::Like { deck }) => print_result(api.toggle_like(&DeckId::new(deck))),
        Some(Commands::Study { deck, next, flip }) => handle_study(&mut api, deck, next, flip),
        Some(Commands::Profile { name }) => print_result(api.set_display_name(&name)),
        Some(Commands::Stats) => handle_stats(&api),
        None => handle_decks(&mut api, false, false, None),
    }
}

fn init_api(cli: &Cli) -> Result<FlashdeckApi<FileSource>> {
    let home = resolve_home(cli)?;
    let config = FlashdeckConfig::load(&home).unwrap_or_default();
    let source = FileSource::open(home.join(&config.data_file))?;
    let user = cli
        .user
        .as_ref()
        .map(|id| AuthUser::new(id.as_str(), cli.email.clone()));
    Ok(FlashdeckApi::new(source, config, user))
}

fn resolve_home(cli: &Cli) -> Result<PathBuf> {
    if let Some(home) = &cli.home {
        return Ok(home.clone());
    }
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "flashdeck", "flashdeck")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| FlashdeckError::Api("Could not determine data directory".into()))
}

fn handle_decks(
    api: &mut FlashdeckApi<FileSource>,
    mine: bool,
    liked: bool,
    search: Option<String>,
) -> Result<()> {
    let mode = if mine {
        FilterMode::Mine
    } else if liked {
        FilterMode::Liked
    } else {
        api.context().config().default_filter
    };
    api.open_listing(mode)?;
    if let Some(query) = search {
        api.set_search_query(&query)?;
    }
    api.process_events();
    print_decks(&api.visible_decks());
    print_messages(&api.take_notifications());
    Ok(())
}

fn handle_study(
    api: &mut FlashdeckApi<FileSource>,
    deck: String,
    next: usize,
    flip: bool,
) -> Result<()> {
    api.open_study(&DeckId::new(deck));
    api.process_events();
    for _ in 0..next {
        api.advance()?;
    }
    if flip {
        api.flip()?;
    }
    if let Some(view) = api.study_view() {
        print_study(&view);
    }
    print_messages(&api.take_notifications());
    Ok(())
}

fn handle_stats(api: &FlashdeckApi<FileSource>) -> Result<()> {
    let result = api.stats()?;
    if let Some(stats) = result.stats {
        println!("{}  decks created", format!("{:>6}", stats.created_decks).bold());
        println!("{}  cards in total", format!("{:>6}", stats.total_cards).bold());
        println!("{}  decks liked", format!("{:>6}", stats.liked_decks).bold());
    }
    print_messages(&result.messages);
    Ok(())
}

fn print_result(result: Result<flashdeck::commands::CmdResult>) -> Result<()> {
    let result = result?;
    print_messages(&result.messages);
    Ok(())
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

fn print_study(view: &StudyView) {
    if let Some(failure) = &view.failed {
        println!("{}", format!("Cards unavailable: {}", failure).red());
        return;
    }
    if view.total == 0 {
        println!("This deck has no cards yet.");
        return;
    }
    let label = if view.flipped { "Answer" } else { "Question" };
    let card = view.card_id.as_ref().map(CardId::to_string).unwrap_or_default();
    println!(
        "{} {}",
        format!("{}/{}", view.position, view.total).yellow(),
        card.dimmed()
    );
    println!("{}", label.bold());
    println!("{}", view.face_text().unwrap_or_default());
}

const LINE_WIDTH: usize = 100;
const ID_WIDTH: usize = 34;
const TIME_WIDTH: usize = 14;
const LIKE_MARKER: &str = "♥";

fn print_decks(decks: &[EnrichedDeckView]) {
    if decks.is_empty() {
        println!("No decks found.");
        return;
    }

    for view in decks {
        let id = format!("{:<width$}", view.deck.id.as_str(), width = ID_WIDTH);
        let marker = if view.is_liked {
            format!("{} ", LIKE_MARKER)
        } else {
            "  ".to_string()
        };
        let details = format!(" {} · {} cards", view.creator_name, view.deck.card_count);
        let time_ago = view
            .deck
            .created_at
            .map(format_time_ago)
            .unwrap_or_else(|| " ".repeat(TIME_WIDTH));

        let fixed_width = ID_WIDTH + marker.width() + details.width() + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let title = truncate_to_width(view.title(), available);
        let padding = available.saturating_sub(title.width());

        let title_colored = if view.is_owner {
            title.bold()
        } else {
            title.normal()
        };

        println!(
            "{}{}{}{}{}{}",
            id.dimmed(),
            marker.red(),
            title_colored,
            details.dimmed(),
            " ".repeat(padding),
            time_ago.dimmed()
        );
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }
    result
}

fn format_time_ago(timestamp: chrono::DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
