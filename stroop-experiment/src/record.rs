use chrono::{DateTime, Local};
use stroop_core::{FIELD_SEPARATOR, Locale, TrialFields};
use stroop_store::ResultsMap;

/// Key prefix of stored runs.
pub const RECORD_PREFIX: &str = "StroopResults_";

/// Run timestamp layout, e.g. `2022.04.01-14::03::59`.
pub const TIMESTAMP_FORMAT: &str = "%Y.%m.%d-%H::%M::%S";

/// Key of the `n`th stored run, counting from 1.
pub fn record_key(n: usize) -> String {
    format!("{RECORD_PREFIX}{n}")
}

pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn timestamp_now() -> String {
    format_timestamp(Local::now())
}

/// One stored run: when it started and its answered trials.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionRecord {
    /// Absent in files written before runs were timestamped.
    pub timestamp: Option<String>,
    /// Serialized trials, see [`stroop_core::TrialRecord::to_record_string`].
    pub trials: Vec<String>,
}

impl SessionRecord {
    pub fn new(timestamp: String, trials: Vec<String>) -> Self {
        Self {
            timestamp: Some(timestamp),
            trials,
        }
    }

    /// Timestamp first, then one entry per trial.
    pub fn to_values(&self) -> Vec<String> {
        let mut values = Vec::with_capacity(self.trials.len() + 1);
        if let Some(ts) = &self.timestamp {
            values.push(ts.clone());
        }
        values.extend(self.trials.iter().cloned());
        values
    }

    /// Inverse of [`to_values`](Self::to_values). A first entry without `:` is
    /// a trial of a legacy file, not a timestamp.
    pub fn from_values(values: &[String]) -> Self {
        match values.split_first() {
            Some((first, rest)) if first.contains(':') => Self {
                timestamp: Some(first.clone()),
                trials: rest.to_vec(),
            },
            _ => Self {
                timestamp: None,
                trials: values.to_vec(),
            },
        }
    }

    pub fn trial_fields(&self) -> impl Iterator<Item = Option<TrialFields>> + '_ {
        self.trials.iter().map(|t| TrialFields::parse(t))
    }
}

/// Column headers of the trial table.
pub fn default_headers(locale: Locale) -> Vec<String> {
    let headers: [&str; 6] = match locale {
        Locale::German => [
            "Modus",
            "Text",
            "Farbe",
            "Gewählte Farbe",
            "Korrekt",
            "Entscheidungszeit (s)",
        ],
        Locale::English => [
            "Mode",
            "Text",
            "Color",
            "Chosen color",
            "Correct",
            "Decision time (s)",
        ],
    };
    headers.iter().map(|h| h.to_string()).collect()
}

/// Rows for every stored run, each trial prefixed with participant and timestamp.
///
/// `locale` picks the prefix column labels; trial fields are copied as stored.
pub fn all_runs_rows(
    results: &ResultsMap,
    dataset_count: usize,
    participant: &str,
    headers: &[String],
    locale: Locale,
) -> Vec<Vec<String>> {
    let mut head = match locale {
        Locale::German => vec!["Versuchsperson".to_string(), "Zeitstempel".to_string()],
        Locale::English => vec!["Participant".to_string(), "Time Stamp".to_string()],
    };
    head.extend(headers.iter().cloned());

    let mut rows = vec![head];
    for n in 1..=dataset_count {
        let Some(values) = results.get(&record_key(n)) else {
            continue;
        };
        let record = SessionRecord::from_values(values);
        let ts = record.timestamp.clone().unwrap_or_default();
        for trial in &record.trials {
            let mut row = vec![participant.to_string(), ts.clone()];
            row.extend(trial.split(FIELD_SEPARATOR).map(str::to_string));
            rows.push(row);
        }
    }
    rows
}
