use crate::color::{Color, Locale};
use crate::stimulus::{Stimulus, StimulusMode};
use serde::{Deserialize, Serialize};

/// Joins the fields of one serialized trial.
pub const FIELD_SEPARATOR: char = '&';

/// Outcome of one presented stimulus within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Index into the catalog.
    pub stimulus: usize,
    /// A response was captured before the run ended.
    pub valid: bool,
    pub chosen: Color,
    pub latency_ms: Option<u64>,
    /// Set by evaluation; meaningless before it.
    pub correct: bool,
}

impl TrialRecord {
    pub fn new(stimulus: usize) -> Self {
        Self {
            stimulus,
            valid: false,
            chosen: Color::Black,
            latency_ms: None,
            correct: false,
        }
    }

    /// Field list in record order, optionally led by the validity label.
    pub fn to_fields(&self, stimulus: &Stimulus, include_valid: bool, locale: Locale) -> Vec<String> {
        let mut fields = Vec::with_capacity(7);
        if include_valid {
            let label = match (locale, self.valid) {
                (Locale::English, true) => "valid",
                (Locale::English, false) => "invalid",
                (Locale::German, true) => "gültig",
                (Locale::German, false) => "ungültig",
            };
            fields.push(label.to_string());
        }
        fields.push(stimulus.mode.tag().to_string());
        fields.push(stimulus.text.to_string());
        fields.push(stimulus.color.label(locale).to_string());
        fields.push(self.chosen.label(locale).to_string());
        fields.push(if self.correct { "1" } else { "0" }.to_string());
        fields.push(format_latency(self.latency_ms));
        fields
    }

    pub fn to_record_string(&self, stimulus: &Stimulus, locale: Locale) -> String {
        let sep = FIELD_SEPARATOR.to_string();
        self.to_fields(stimulus, false, locale).join(&sep)
    }
}

/// Milliseconds as seconds with three decimals; unset is `-0.001`.
pub fn format_latency(latency_ms: Option<u64>) -> String {
    match latency_ms {
        Some(ms) => format!("{:.3}", ms as f64 / 1000.0),
        None => format!("{:.3}", -1.0 / 1000.0),
    }
}

/// One trial string split back into its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialFields {
    pub mode: String,
    pub text: String,
    pub color: String,
    pub chosen: String,
    pub correct: String,
    pub latency: String,
}

impl TrialFields {
    /// Splits a trial string. Returns `None` unless it has exactly six fields.
    pub fn parse(serialized: &str) -> Option<Self> {
        let parts: Vec<&str> = serialized.split(FIELD_SEPARATOR).collect();
        let [mode, text, color, chosen, correct, latency] = parts.as_slice() else {
            return None;
        };
        Some(Self {
            mode: mode.to_string(),
            text: text.to_string(),
            color: color.to_string(),
            chosen: chosen.to_string(),
            correct: correct.to_string(),
            latency: latency.to_string(),
        })
    }

    pub fn mode(&self) -> Option<StimulusMode> {
        StimulusMode::from_tag(&self.mode)
    }

    pub fn is_correct(&self) -> bool {
        self.correct == "1"
    }

    pub fn latency_secs(&self) -> Option<f64> {
        self.latency.parse().ok()
    }
}
