//! # Flashdeck Architecture
//!
//! Flashdeck is the engine behind a flashcard study app whose screens are thin
//! views over a remote document store. It is a **UI-agnostic library** with a
//! CLI client, not the other way round.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, prints results, owns exit codes        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Entry point for every action                             │
//! │  - Routes store events to the screen models                 │
//! └─────────────────────────────────────────────────────────────┘
//!              │                                  │
//!              ▼                                  ▼
//! ┌──────────────────────────────┐  ┌──────────────────────────────┐
//! │  Screen models               │  │  Command Layer (commands/)   │
//! │  listing: subscriptions →    │  │  - Writes, incl. the card    │
//! │    aggregate → search        │  │    counter protocol          │
//! │  study: card state machine   │  │                              │
//! └──────────────────────────────┘  └──────────────────────────────┘
//!              │                                  │
//!              ▼                                  ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Source Layer (source/)                                     │
//! │  - RemoteSource trait: live queries + point writes          │
//! │  - FileSource (CLI), InMemorySource (testing)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flows up: the store pushes full snapshots, the subscription manager
//! types them, the aggregator enriches them, search filters them. Writes flow
//! down through the commands and come back up as new snapshots. No write ever
//! edits a screen model directly.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never writes to stdout/stderr and never exits
//! the process. Diagnostics go through the `log` facade; the binary decides
//! where they end up.
//!
//! ## Testing Strategy
//!
//! 1. **Pure parts** (`aggregate`, `search`, `study::StudyState`): direct unit tests.
//! 2. **Commands** (`commands/*.rs`): unit tests against `InMemorySource`, with
//!    fault injection for the partial-failure paths.
//! 3. **Screen models and API**: event-pumping tests over `InMemorySource`.
//! 4. **CLI**: `assert_cmd` tests over a temporary data directory.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Write-side actions
//! - [`subscriptions`]: Live query lifecycle for the listing
//! - [`aggregate`]: Enriched deck views
//! - [`search`]: Title search
//! - [`listing`]: Deck listing screen model
//! - [`study`]: Study session state machine
//! - [`source`]: Store abstraction and implementations
//! - [`model`]: Records, ids and document paths
//! - [`config`]: Configuration management
//! - [`context`]: Shared handles
//! - [`error`]: Error types

pub mod aggregate;
pub mod api;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod listing;
pub mod model;
pub mod search;
pub mod source;
pub mod study;
pub mod subscriptions;
