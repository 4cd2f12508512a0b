use serde::{Deserialize, Serialize};

/// Label language for color names, stats text and table headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    German,
}

/// Colors a stimulus can be drawn in or a participant can choose.
///
/// `Black` doubles as the "nothing chosen yet" value of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Black,
    White,
    Red,
    Green,
    Blue,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Black,
        Color::White,
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
    ];

    /// The four colors a participant answers with.
    pub const RESPONSES: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Color::Black, Locale::English) => "black",
            (Color::Black, Locale::German) => "schwarz",
            (Color::White, Locale::English) => "white",
            (Color::White, Locale::German) => "weiß",
            (Color::Red, Locale::English) => "red",
            (Color::Red, Locale::German) => "rot",
            (Color::Green, Locale::English) => "green",
            (Color::Green, Locale::German) => "grün",
            (Color::Blue, Locale::English) => "blue",
            (Color::Blue, Locale::German) => "blau",
            (Color::Yellow, Locale::English) => "yellow",
            (Color::Yellow, Locale::German) => "gelb",
        }
    }

    /// Color-name token for the display surface.
    ///
    /// Pure yellow is unreadable on a light background, so it is drawn as gold.
    pub fn display_token(self) -> &'static str {
        match self {
            Color::Yellow => "gold",
            other => other.label(Locale::English),
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            Color::Black => [0, 0, 0],
            Color::White => [255, 255, 255],
            Color::Red => [255, 0, 0],
            Color::Green => [0, 128, 0],
            Color::Blue => [0, 0, 255],
            Color::Yellow => [255, 215, 0],
        }
    }

    /// Parses a label of either locale, ignoring case.
    pub fn from_label(label: &str) -> Option<Color> {
        let needle = label.trim().to_lowercase();
        Color::ALL.into_iter().find(|c| {
            c.label(Locale::English) == needle || c.label(Locale::German) == needle
        })
    }
}
