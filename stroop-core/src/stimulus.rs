use crate::color::Color;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How a stimulus is put on screen, and the condition group it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StimulusMode {
    /// Neutral colored block, no word.
    ColoredQuad,
    /// Word names its own display color.
    TextMatched,
    /// Word names a different color than it is drawn in.
    TextConflicted,
    /// Word unrelated to any color.
    TextUnreferenced,
}

impl StimulusMode {
    /// Catalog order of the condition groups.
    pub const ALL: [StimulusMode; 4] = [
        StimulusMode::ColoredQuad,
        StimulusMode::TextMatched,
        StimulusMode::TextConflicted,
        StimulusMode::TextUnreferenced,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            StimulusMode::ColoredQuad => "Quads",
            StimulusMode::TextMatched => "TextMatch",
            StimulusMode::TextConflicted => "TextConflict",
            StimulusMode::TextUnreferenced => "TextUnref",
        }
    }

    pub fn from_tag(tag: &str) -> Option<StimulusMode> {
        StimulusMode::ALL.into_iter().find(|m| m.tag() == tag)
    }

    pub fn is_text(self) -> bool {
        !matches!(self, StimulusMode::ColoredQuad)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stimulus {
    pub mode: StimulusMode,
    pub text: &'static str,
    pub color: Color,
}

impl Stimulus {
    const fn new(mode: StimulusMode, text: &'static str, color: Color) -> Self {
        Self { mode, text, color }
    }
}

/// Fixed list of stimuli, partitioned into contiguous condition groups.
#[derive(Debug, Clone)]
pub struct Catalog {
    stimuli: Vec<Stimulus>,
}

const COLOR_WORDS: [(&str, Color); 4] = [
    ("Rot", Color::Red),
    ("Grün", Color::Green),
    ("Blau", Color::Blue),
    ("Gelb", Color::Yellow),
];

const NONSENSE_WORDS: [&str; 5] = [
    "Schurrmurr",
    "Plempe",
    "Glanzgefunkel",
    "putzwunderlich",
    "überselig",
];

lazy_static! {
    static ref STANDARD: Catalog = Catalog::standard();
}

/// The process-wide standard catalog.
pub fn catalog() -> &'static Catalog {
    &STANDARD
}

impl Catalog {
    /// The 40-stimulus German catalog: 4 quads, 4 matched, 12 conflicted, 20 unreferenced.
    pub fn standard() -> Self {
        use StimulusMode::*;
        let mut stimuli = Vec::with_capacity(40);

        for (word, color) in COLOR_WORDS {
            stimuli.push(Stimulus::new(ColoredQuad, word, color));
        }
        for (word, color) in COLOR_WORDS {
            stimuli.push(Stimulus::new(TextMatched, word, color));
        }
        for (_, color) in COLOR_WORDS {
            for (word, named) in COLOR_WORDS {
                if named != color {
                    stimuli.push(Stimulus::new(TextConflicted, word, color));
                }
            }
        }
        for word in NONSENSE_WORDS {
            for (_, color) in COLOR_WORDS {
                stimuli.push(Stimulus::new(TextUnreferenced, word, color));
            }
        }

        Self { stimuli }
    }

    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stimulus> {
        self.stimuli.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stimulus> {
        self.stimuli.iter()
    }

    /// Index range of one condition group. Empty if the catalog has no such stimuli.
    pub fn group_range(&self, mode: StimulusMode) -> Range<usize> {
        let start = self.stimuli.iter().position(|s| s.mode == mode);
        match start {
            Some(start) => {
                let len = self.stimuli[start..]
                    .iter()
                    .take_while(|s| s.mode == mode)
                    .count();
                start..start + len
            }
            None => 0..0,
        }
    }

    /// Ranges of all four condition groups in catalog order.
    pub fn group_ranges(&self) -> [Range<usize>; 4] {
        StimulusMode::ALL.map(|mode| self.group_range(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_groups_are_contiguous() {
        let ranges = catalog().group_ranges();
        assert_eq!(ranges, [0..4, 4..8, 8..20, 20..40]);
        assert_eq!(catalog().len(), 40);
    }

    #[test]
    fn conflicted_words_never_name_their_color() {
        for s in catalog().iter().filter(|s| s.mode == StimulusMode::TextConflicted) {
            let named = COLOR_WORDS.iter().find(|(w, _)| *w == s.text).map(|(_, c)| *c);
            assert_ne!(named, Some(s.color), "{:?}", s);
        }
    }

    #[test]
    fn matched_words_name_their_color() {
        let matched = catalog().group_range(StimulusMode::TextMatched);
        for idx in matched {
            let s = catalog().get(idx).unwrap();
            assert!(COLOR_WORDS.contains(&(s.text, s.color)));
        }
    }

    #[test]
    fn mode_tags_round_trip() {
        for mode in StimulusMode::ALL {
            assert_eq!(StimulusMode::from_tag(mode.tag()), Some(mode));
        }
        assert_eq!(StimulusMode::from_tag("Circles"), None);
    }
}
