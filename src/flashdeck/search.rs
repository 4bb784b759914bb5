use crate::model::EnrichedDeckView;

/// Case-insensitive substring match of `query` against `title`.
///
/// The query is matched as typed: surrounding whitespace is part of it.
pub fn title_matches(title: &str, query: &str) -> bool {
    title.to_lowercase().contains(&query.to_lowercase())
}

/// Filter the listing by title. A blank query keeps everything; otherwise
/// only titles containing the query survive, in their original order.
pub fn apply_search(query: &str, views: &[EnrichedDeckView]) -> Vec<EnrichedDeckView> {
    if query.trim().is_empty() {
        return views.to_vec();
    }
    views
        .iter()
        .filter(|view| title_matches(view.title(), query))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Deck, DeckId, UserId};

    fn views(titles: &[&str]) -> Vec<EnrichedDeckView> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| EnrichedDeckView {
                deck: Deck {
                    id: DeckId::new(format!("d{}", i)),
                    title: title.to_string(),
                    card_count: 0,
                    owner_id: UserId::new("u1"),
                    owner_email: String::new(),
                    created_at: None,
                },
                creator_name: "Unknown".to_string(),
                is_liked: false,
                is_owner: false,
            })
            .collect()
    }

    fn titles(views: &[EnrichedDeckView]) -> Vec<&str> {
        views.iter().map(|v| v.title()).collect()
    }

    #[test]
    fn finds_substring_in_original_order() {
        let all = views(&["Cats 101", "Dog Facts", "Category Theory"]);
        let found = apply_search("cat", &all);
        assert_eq!(titles(&found), vec!["Cats 101", "Category Theory"]);
    }

    #[test]
    fn blank_query_is_identity() {
        let all = views(&["Cats 101", "Dog Facts"]);
        assert_eq!(apply_search("", &all), all);
        assert_eq!(apply_search("   ", &all), all);
    }

    #[test]
    fn search_is_idempotent() {
        let all = views(&["Cats 101", "Dog Facts", "Category Theory", "CATALAN"]);
        let once = apply_search("CaT", &all);
        assert_eq!(apply_search("CaT", &once), once);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn query_whitespace_is_significant() {
        let all = views(&["Cats 101", "Pop Cats"]);
        assert_eq!(titles(&apply_search(" cats", &all)), vec!["Pop Cats"]);
    }

    #[test]
    fn no_match_yields_empty_list() {
        let all = views(&["Cats 101"]);
        assert!(apply_search("zebra", &all).is_empty());
    }
}
