mod common;

use flashdeck::error::FlashdeckError;
use flashdeck::model::{paths, CardId, DeckId};
use flashdeck::source::memory::fixtures::SourceFixture;
use flashdeck::source::{Fields, RemoteSource};
use flashdeck::subscriptions::FilterMode;

#[test]
fn create_then_delete_restores_count() {
    let api = common::api(SourceFixture::new().with_deck("d1", "Spanish", "u1", 1));
    let deck = DeckId::new("d1");

    let created = api.create_flashcard(&deck, "Hola", "Hello").unwrap();
    assert_eq!(common::card_count(api.context().source(), "d1"), 2);

    api.delete_flashcard(&deck, &created.affected_cards[0])
        .unwrap();
    assert_eq!(common::card_count(api.context().source(), "d1"), 1);
}

#[test]
fn cascade_with_failing_second_child_keeps_deck() {
    let api = common::api(SourceFixture::new().with_deck("d1", "Spanish", "u1", 2));
    let deck = DeckId::new("d1");
    let source = api.context().source();
    source.fail_writes_to(paths::flashcard(&deck, &CardId::new("d1-c2")));

    let result = api.delete_deck(&deck);

    match result {
        Err(FlashdeckError::CascadeDelete { failed, deleted, .. }) => {
            assert_eq!((failed, deleted), (1, 1));
        }
        other => panic!("expected a cascade failure, got {:?}", other),
    }
    assert!(source.contains(&paths::deck(&deck)));
    assert!(!source.contains(&paths::flashcard(&deck, &CardId::new("d1-c1"))));
    assert!(source.contains(&paths::flashcard(&deck, &CardId::new("d1-c2"))));
    // The counter is not touched by the cascade.
    assert_eq!(common::card_count(source, "d1"), 2);
}

#[test]
fn retried_cascade_finishes_the_job() {
    let mut api = common::api(SourceFixture::new().with_deck("d1", "Spanish", "u1", 2));
    let deck = DeckId::new("d1");
    api.context().source().set_simulate_write_error(true);
    assert!(api.delete_deck(&deck).is_err());
    api.context().source().set_simulate_write_error(false);

    api.open_listing(FilterMode::All).unwrap();
    api.process_events();
    assert_eq!(api.visible_decks().len(), 1);

    api.delete_deck(&deck).unwrap();
    api.process_events();
    assert!(api.visible_decks().is_empty());
    assert!(api
        .context()
        .source()
        .documents(&paths::flashcards(&deck))
        .is_empty());
}

#[test]
fn failed_increment_leaves_counter_behind_true_count() {
    let mut api = common::api(SourceFixture::new().with_deck("d1", "Spanish", "u1", 1));
    let deck = DeckId::new("d1");
    api.context().source().fail_writes_to(paths::deck(&deck));

    assert!(matches!(
        api.create_flashcard(&deck, "Q", "A"),
        Err(FlashdeckError::Write(_))
    ));

    api.open_study(&deck);
    api.process_events();
    assert_eq!(api.study_view().unwrap().total, 2);
    assert_eq!(common::card_count(api.context().source(), "d1"), 1);
}

#[test]
fn decrement_below_zero_is_accepted() {
    let api = common::api(SourceFixture::new().with_deck("d1", "Spanish", "u1", 0));
    let deck = DeckId::new("d1");
    api.delete_flashcard(&deck, &CardId::new("already-gone"))
        .unwrap();
    assert_eq!(common::card_count(api.context().source(), "d1"), -1);
}

#[test]
fn failed_card_delete_is_reported_without_counter_change() {
    let api = common::api(SourceFixture::new().with_deck("d1", "Spanish", "u1", 1));
    let deck = DeckId::new("d1");
    let card = CardId::new("d1-c1");
    api.context()
        .source()
        .fail_writes_to(paths::flashcard(&deck, &card));

    assert!(api.delete_flashcard(&deck, &card).is_err());
    assert_eq!(common::card_count(api.context().source(), "d1"), 1);
    assert!(api
        .context()
        .source()
        .contains(&paths::flashcard(&deck, &card)));
}

#[test]
fn deleting_deck_removes_it_from_likers_listing() {
    let mut api = common::api(
        SourceFixture::new()
            .with_deck("d1", "Spanish", "u2", 1)
            .with_like("u1", "d1"),
    );
    api.open_listing(FilterMode::Liked).unwrap();
    api.process_events();
    assert_eq!(api.visible_decks().len(), 1);

    api.delete_deck(&DeckId::new("d1")).unwrap();
    api.process_events();
    assert!(api.visible_decks().is_empty());
}

#[test]
fn float_counter_keeps_deck_listed_and_counts_on() {
    let mut api = common::api(SourceFixture::new().with_deck("d1", "Spanish", "u1", 2));
    let deck = DeckId::new("d1");
    let mut fields = Fields::new();
    fields.insert("cardCount".into(), serde_json::json!(2.0));
    api.context()
        .source()
        .update(&paths::deck(&deck), fields)
        .unwrap();

    api.open_listing(FilterMode::All).unwrap();
    api.process_events();
    assert_eq!(api.visible_decks().len(), 1);
    assert_eq!(api.visible_decks()[0].deck.card_count, 2);

    api.create_flashcard(&deck, "Perro", "Dog").unwrap();
    api.process_events();
    assert_eq!(api.visible_decks()[0].deck.card_count, 3);
    assert_eq!(common::card_count(api.context().source(), "d1"), 3);
}
