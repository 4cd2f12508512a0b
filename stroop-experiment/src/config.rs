use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use stroop_core::Locale;

/// How the run's stimulus order is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexPolicy {
    /// Sub-counts per condition group as equal as possible, then shuffled.
    #[default]
    EquallyDistributed,
    /// Uniform draws over the whole catalog.
    FullyRandom,
}

/// Which valid trials feed the latency statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalPolicy {
    #[default]
    AllTrials,
    CorrectOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub participant: String,
    pub experiment: String,
    pub data_file: PathBuf,
    pub trials: usize,
    pub index_policy: IndexPolicy,
    pub eval_policy: EvalPolicy,
    pub fixation_ms: u64,
    /// Locale of stored records and exports.
    pub record_locale: Locale,
    /// Locale of on-screen stats and table headers.
    pub display_locale: Locale,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            participant: "default".to_string(),
            experiment: "stroop".to_string(),
            data_file: PathBuf::from("default.stroop"),
            trials: 12,
            index_policy: IndexPolicy::EquallyDistributed,
            eval_policy: EvalPolicy::AllTrials,
            fixation_ms: 1000,
            record_locale: Locale::German,
            display_locale: Locale::German,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::ZeroTrials);
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
