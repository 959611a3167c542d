//! Deck data model — cards, suits, ranks, and the two fixed decks.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Which half of the tarot a card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arcana {
    Major,
    Minor,
}

/// Minor arcana suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Cups,
    Pentacles,
    Wands,
    Swords,
}

impl Suit {
    /// All suits in deck order.
    pub const ALL: [Suit; 4] = [Suit::Cups, Suit::Pentacles, Suit::Wands, Suit::Swords];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cups => "Cups",
            Self::Pentacles => "Pentacles",
            Self::Wands => "Wands",
            Self::Swords => "Swords",
        }
    }
}

impl std::fmt::Display for Suit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minor arcana rank. Serialized the way card names spell it ("Ace", "2", ... "King").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Ace,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    Page,
    Knight,
    Queen,
    King,
}

impl Rank {
    /// All ranks in deck order (14 per suit).
    pub const ALL: [Rank; 14] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Page,
        Rank::Knight,
        Rank::Queen,
        Rank::King,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ace => "Ace",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Page => "Page",
            Self::Knight => "Knight",
            Self::Queen => "Queen",
            Self::King => "King",
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The 22 major arcana, in traditional order.
pub const MAJOR_ARCANA_NAMES: [&str; 22] = [
    "The Fool",
    "The Magician",
    "The High Priestess",
    "The Empress",
    "The Emperor",
    "The Hierophant",
    "The Lovers",
    "The Chariot",
    "Strength",
    "The Hermit",
    "Wheel of Fortune",
    "Justice",
    "The Hanged Man",
    "Death",
    "Temperance",
    "The Devil",
    "The Tower",
    "The Star",
    "The Moon",
    "The Sun",
    "Judgement",
    "The World",
];

/// A single tarot card. Immutable once the decks are built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Card {
    pub name: String,
    pub arcana: Arcana,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suit: Option<Suit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,
}

impl Card {
    fn major(name: &str) -> Self {
        Self {
            name: name.to_string(),
            arcana: Arcana::Major,
            suit: None,
            rank: None,
        }
    }

    fn minor(suit: Suit, rank: Rank) -> Self {
        Self {
            name: format!("{} of {}", rank, suit),
            arcana: Arcana::Minor,
            suit: Some(suit),
            rank: Some(rank),
        }
    }

    /// Kebab-case key used to look up card art ("The Fool" → "the-fool").
    pub fn image_key(&self) -> String {
        let mut key = String::with_capacity(self.name.len());
        for word in self.name.split_whitespace() {
            if !key.is_empty() {
                key.push('-');
            }
            key.extend(
                word.chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase()),
            );
        }
        key
    }
}

static MAJOR_ARCANA: LazyLock<Vec<Card>> =
    LazyLock::new(|| MAJOR_ARCANA_NAMES.iter().map(|n| Card::major(n)).collect());

static MINOR_ARCANA: LazyLock<Vec<Card>> = LazyLock::new(|| {
    Suit::ALL
        .iter()
        .flat_map(|suit| Rank::ALL.iter().map(move |rank| Card::minor(*suit, *rank)))
        .collect()
});

static FULL_DECK: LazyLock<Vec<Card>> = LazyLock::new(|| {
    MAJOR_ARCANA
        .iter()
        .chain(MINOR_ARCANA.iter())
        .cloned()
        .collect()
});

/// The 22-card major arcana deck.
pub fn major_arcana() -> &'static [Card] {
    &MAJOR_ARCANA
}

/// The 56 suited minor arcana cards.
pub fn minor_arcana() -> &'static [Card] {
    &MINOR_ARCANA
}

/// The full 78-card deck, majors first.
pub fn full_deck() -> &'static [Card] {
    &FULL_DECK
}

/// Find a card in the full deck by exact name.
pub fn find_card(name: &str) -> Option<&'static Card> {
    full_deck().iter().find(|c| c.name == name)
}

/// Which fixed deck a draw uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckType {
    #[default]
    Full,
    Major,
}

impl DeckType {
    pub fn cards(&self) -> &'static [Card] {
        match self {
            Self::Full => full_deck(),
            Self::Major => major_arcana(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Major => "major",
        }
    }
}

impl std::str::FromStr for DeckType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "major" => Ok(Self::Major),
            _ => Err(format!("Unknown deck type: {}", s)),
        }
    }
}
