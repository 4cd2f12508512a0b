use crate::config::EvalPolicy;
use crate::error::SessionError;
use stroop_core::{Catalog, Locale, TrialRecord};

/// Decision-time summary in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub mean_ms: f64,
    /// Population standard deviation.
    pub stdev_ms: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    /// Trials in the (possibly truncated) run.
    pub total: usize,
    pub valid: usize,
    pub correct: usize,
    pub wrong: usize,
    /// `None` when no trial qualifies under the active policy.
    pub latency: Option<LatencyStats>,
}

impl Stats {
    pub fn mean_ms(&self) -> Option<f64> {
        self.latency.map(|l| l.mean_ms)
    }

    pub fn stdev_ms(&self) -> Option<f64> {
        self.latency.map(|l| l.stdev_ms)
    }

    /// Human-readable summary, one line per figure.
    pub fn lines(&self, locale: Locale) -> Vec<String> {
        let secs = |v: Option<f64>| match v {
            Some(ms) => format!("{:.3}(s)", ms / 1000.0),
            None => "n/a".to_string(),
        };
        match locale {
            Locale::German => vec![
                format!("#Durchgeführte Trials: {}", self.total),
                format!("#Korrekt: {}", self.correct),
                format!("#Falsch: {}", self.wrong),
                format!("Mittelwert: {}", secs(self.mean_ms())),
                format!("Standardabweichung: {}", secs(self.stdev_ms())),
            ],
            Locale::English => vec![
                format!("#executed trials: {}", self.total),
                format!("#correct: {}", self.correct),
                format!("#wrong: {}", self.wrong),
                format!("mean: {}", secs(self.mean_ms())),
                format!("standard deviation: {}", secs(self.stdev_ms())),
            ],
        }
    }
}

/// Mean and population standard deviation, or `None` for no samples.
pub fn latency_stats(samples: &[f64]) -> Option<LatencyStats> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some(LatencyStats {
        mean_ms: mean,
        stdev_ms: var.sqrt(),
        samples: samples.len(),
    })
}

/// Scores every valid trial and summarizes the run.
///
/// Correct and wrong counts cover all valid trials. Under
/// [`EvalPolicy::CorrectOnly`] only correct trials feed the latency figures.
pub fn evaluate(
    trials: &mut [TrialRecord],
    catalog: &Catalog,
    policy: EvalPolicy,
) -> Result<Stats, SessionError> {
    let mut valid = 0;
    let mut correct = 0;
    let mut wrong = 0;
    let mut samples = Vec::new();

    for trial in trials.iter_mut() {
        if !trial.valid {
            continue;
        }
        valid += 1;

        let stimulus = catalog
            .get(trial.stimulus)
            .ok_or(SessionError::UnknownStimulus(trial.stimulus))?;
        trial.correct = stimulus.color == trial.chosen;
        if trial.correct {
            correct += 1;
        } else {
            wrong += 1;
        }

        if policy == EvalPolicy::AllTrials || trial.correct {
            if let Some(ms) = trial.latency_ms {
                samples.push(ms as f64);
            }
        }
    }

    if correct + wrong != valid {
        return Err(SessionError::CountMismatch {
            correct,
            wrong,
            valid,
        });
    }

    Ok(Stats {
        total: trials.len(),
        valid,
        correct,
        wrong,
        latency: latency_stats(&samples),
    })
}
