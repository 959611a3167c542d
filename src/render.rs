//! Plain-text rendering of components and error notices for the terminal.

use crate::locale::Strings;
use crate::responder::{CardView, Component, DeckView, SpreadView};
use crate::store::{ErrorRecord, Severity};

/// Render a component as a short block of text.
pub fn component(component: &Component, strings: &Strings) -> String {
    match component {
        Component::TarotCard(view) => card_line(view),
        Component::TarotSpread(view) => spread(view),
        Component::TarotDeck(view) => deck(view, strings),
    }
}

fn card_line(view: &CardView) -> String {
    if view.is_revealed {
        format!("🂠 {} ({})", view.card.card_name, view.card.orientation.as_str())
    } else {
        "🂠 [face down]".to_string()
    }
}

fn spread(view: &SpreadView) -> String {
    let header = format!("✨ {} spread", view.spread_type.as_str());
    let cards = view.cards.iter().enumerate().map(|(i, card)| {
        format!(
            "  {:>2}. {} ({})",
            i + 1,
            card.card_name,
            card.orientation.as_str()
        )
    });
    std::iter::once(header)
        .chain(cards)
        .collect::<Vec<_>>()
        .join("\n")
}

fn deck(view: &DeckView, strings: &Strings) -> String {
    format!(
        "🃏 {} [{} × {}]",
        strings.interactive_deck,
        view.mode.as_str(),
        view.count
    )
}

/// Render an error notice with its suggestions and technical details.
pub fn notice(record: &ErrorRecord, strings: &Strings) -> String {
    let profile = record.profile();
    let mut lines = vec![
        format!("{} {}", profile.icon, profile.title),
        record.message.clone(),
    ];

    if let Some(note) = profile.note {
        lines.push(note.to_string());
    }
    if profile.show_cooldown
        && let Some(secs) = record.metadata.get("retryAfter").and_then(|v| v.as_u64())
    {
        lines.push(format!("{} {}s", strings.cooldown, secs));
    }
    if !profile.suggestions.is_empty() {
        lines.push(strings.suggestions.to_string());
        lines.extend(profile.suggestions.iter().map(|s| format!("  • {}", s)));
    }
    if profile.retryable {
        lines.push(strings.retry_hint.to_string());
    }

    lines.push(format!("── {} ──", strings.technical_details));
    lines.push(format!("{} {}", strings.error_code, record.kind.as_str()));
    if let Some(detail) = record.metadata.get("detail").and_then(|v| v.as_str()) {
        lines.push(detail.to_string());
    }
    if let Some(code) = record.metadata.get("code").and_then(|v| v.as_str()) {
        lines.push(format!("code: {}", code));
    }
    lines.push(format!("{} {}", strings.timestamp, record.timestamp.to_rfc3339()));
    lines.join("\n")
}

/// One line per recorded error, most recent first.
pub fn error_history<'a>(records: impl Iterator<Item = &'a ErrorRecord>) -> String {
    let lines: Vec<String> = records
        .map(|r| {
            let marker = match r.severity {
                Severity::Error => "✖",
                Severity::Warning => "⚠",
            };
            format!(
                "{} {} {}: {}",
                marker,
                r.timestamp.format("%H:%M:%S"),
                r.kind.as_str(),
                r.message
            )
        })
        .collect();
    if lines.is_empty() {
        "No errors recorded.".to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::*;
    use crate::deck::{DrawnCard, Orientation, SpreadKind};
    use crate::locale::Locale;
    use crate::responder::DeckMode;
    use crate::store::{ErrorKind, ErrorStore};

    fn drawn(name: &str, orientation: Orientation) -> DrawnCard {
        DrawnCard {
            card_name: name.to_string(),
            orientation,
            arcana: None,
            suit: None,
            rank: None,
        }
    }

    #[test]
    fn renders_card_and_spread() {
        let strings = Locale::En.strings();
        let card = Component::card(drawn("The Moon", Orientation::Reversed));
        assert_eq!(component(&card, strings), "🂠 The Moon (reversed)");

        let spread = Component::spread(
            SpreadKind::ThreeCard,
            vec![
                drawn("The Fool", Orientation::Upright),
                drawn("Death", Orientation::Reversed),
                drawn("Ace of Cups", Orientation::Upright),
            ],
        );
        let text = component(&spread, strings);
        assert!(text.starts_with("✨ three-card spread"));
        assert!(text.contains(" 2. Death (reversed)"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn renders_deck_with_localized_prompt() {
        let deck = Component::deck(DeckMode::Multiple, 3);
        let text = component(&deck, Locale::En.strings());
        assert!(text.contains(Locale::En.strings().interactive_deck));
        assert!(text.contains("multiple × 3"));
    }

    #[test]
    fn rate_limit_notice_shows_cooldown() {
        let mut store = ErrorStore::new();
        let mut metadata = Map::new();
        metadata.insert("retryAfter".into(), json!(60));
        let record = store
            .show_error(ErrorKind::RateLimit, None, metadata)
            .clone();

        let text = notice(&record, Locale::En.strings());
        assert!(text.contains("60s"));
        assert!(text.contains("RATE_LIMIT"));
        assert!(text.contains(Locale::En.strings().technical_details));
    }

    #[test]
    fn notice_includes_detail_and_code() {
        let mut store = ErrorStore::new();
        let mut metadata = Map::new();
        metadata.insert("detail".into(), json!("connection reset"));
        metadata.insert("code".into(), json!("NETWORK_ERROR"));
        let record = store
            .show_error(ErrorKind::NetworkError, None, metadata)
            .clone();

        let text = notice(&record, Locale::En.strings());
        assert!(text.contains("connection reset"));
        assert!(text.contains("code: NETWORK_ERROR"));
    }

    #[test]
    fn notice_lists_suggestions_one_per_line() {
        let mut store = ErrorStore::new();
        let record = store
            .show_error(ErrorKind::NetworkError, None, Map::new())
            .clone();
        let strings = Locale::En.strings();

        let text = notice(&record, strings);
        let lines: Vec<&str> = text.lines().collect();
        let profile = record.profile();
        assert_eq!(lines[0], format!("{} {}", profile.icon, profile.title));
        assert_eq!(lines[1], record.message);
        let bullets = lines.iter().filter(|l| l.starts_with("  • ")).count();
        assert_eq!(bullets, profile.suggestions.len());
        assert!(lines.last().unwrap().starts_with(strings.timestamp));
    }

    #[test]
    fn history_lists_most_recent_first() {
        let mut store = ErrorStore::new();
        assert_eq!(error_history(store.recent_errors()), "No errors recorded.");

        store.show_error(ErrorKind::LlmTimeout, None, Map::new());
        store.show_error(ErrorKind::RateLimit, None, Map::new());
        let text = error_history(store.recent_errors());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("RATE_LIMIT"));
        assert!(lines[1].contains("LLM_TIMEOUT"));
    }
}
