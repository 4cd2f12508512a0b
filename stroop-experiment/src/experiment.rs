use crate::error::{ConfigError, SessionError};
use crate::evaluate::Stats;
use crate::record;
use crate::state::{SessionEvent, SessionState, StroopSession};
use rand::Rng;
use std::time::Duration;
use stroop_core::{Color, Locale};
use stroop_store::ResultsMap;
use stroop_timing::Timer;

/// Control surface shared by every experiment type.
///
/// Transition methods return `Ok(true)` when they changed something,
/// `Ok(false)` for a legal no-op, and `Err` only for broken invariants.
pub trait Experiment {
    /// Lower-case type name, also the data file extension.
    fn kind(&self) -> &'static str;
    fn global_index(&self) -> usize;
    fn state(&self) -> SessionState;

    fn participant(&self) -> &str;
    fn set_participant(&mut self, id: &str);
    fn set_experiment_name(&mut self, name: &str);
    fn set_num_trials(&mut self, n: usize) -> Result<(), ConfigError>;

    fn start(&mut self) -> Result<bool, SessionError>;
    fn pause(&mut self) -> Result<bool, SessionError>;
    fn toggle_pause(&mut self) -> Result<bool, SessionError> {
        if self.state() == SessionState::Paused {
            self.start()
        } else {
            self.pause()
        }
    }
    fn stop(&mut self) -> Result<bool, SessionError>;

    /// Advances time-driven transitions. Call regularly while running.
    fn update(&mut self) -> Result<bool, SessionError>;
    fn respond(&mut self, color: Color) -> Result<bool, SessionError>;
    fn next_deadline(&self) -> Option<Duration>;
    fn drain_events(&mut self) -> Vec<SessionEvent>;

    fn data_to_save(&self) -> &ResultsMap;
    fn set_loaded_data(&mut self, data: ResultsMap);
    fn dataset_count(&self) -> usize;
    fn last_stats(&self) -> Option<Stats>;

    fn export_last_run(&self, headers: &[String], include_stats: bool) -> Vec<Vec<String>>;
    fn export_all_runs(&self, headers: &[String]) -> Vec<Vec<String>>;
}

impl<T, R> Experiment for StroopSession<T, R>
where
    T: Timer,
    R: Rng,
{
    fn kind(&self) -> &'static str {
        "stroop"
    }

    fn global_index(&self) -> usize {
        self.global_index
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn participant(&self) -> &str {
        &self.config.participant
    }

    fn set_participant(&mut self, id: &str) {
        self.config.participant = id.to_string();
    }

    fn set_experiment_name(&mut self, name: &str) {
        self.config.experiment = name.to_string();
    }

    fn set_num_trials(&mut self, n: usize) -> Result<(), ConfigError> {
        self.set_trials(n)
    }

    fn start(&mut self) -> Result<bool, SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Stopped => self.begin_run()?,
            SessionState::Paused => self.resume(),
            SessionState::Running => return Ok(false),
        }
        self.request_next_trial()?;
        Ok(true)
    }

    fn pause(&mut self) -> Result<bool, SessionError> {
        if self.state != SessionState::Running {
            return Ok(false);
        }
        self.halt();
        Ok(true)
    }

    fn stop(&mut self) -> Result<bool, SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Stopped => Ok(false),
            SessionState::Running | SessionState::Paused => {
                self.finalize()?;
                Ok(true)
            }
        }
    }

    fn update(&mut self) -> Result<bool, SessionError> {
        self.poll_deadline()
    }

    fn respond(&mut self, color: Color) -> Result<bool, SessionError> {
        self.record_response(color)
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.time_to_stimulus()
    }

    fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn data_to_save(&self) -> &ResultsMap {
        &self.results
    }

    fn set_loaded_data(&mut self, data: ResultsMap) {
        self.dataset_count = data.len();
        self.results = data;
    }

    fn dataset_count(&self) -> usize {
        self.dataset_count
    }

    fn last_stats(&self) -> Option<Stats> {
        self.last_stats
    }

    fn export_last_run(&self, headers: &[String], include_stats: bool) -> Vec<Vec<String>> {
        let display = self.config.display_locale;
        let mut rows = Vec::new();
        if include_stats {
            rows.push(vec!["Stroop Experiment:".to_string(), self.timestamp.clone()]);
            let valid_label = match display {
                Locale::German => "#Gültige Trials: ",
                Locale::English => "#Valid trials: ",
            };
            let mut stats = vec![format!("{valid_label}{}", self.trials.len())];
            if let Some(s) = &self.last_stats {
                stats.extend(s.lines(display));
            }
            rows.push(stats);
            rows.push(vec![String::new()]);
        }
        rows.push(headers.to_vec());
        // Trial values stay in the record locale, matching the stored file.
        rows.extend(self.current_run_table(self.config.record_locale));
        rows
    }

    fn export_all_runs(&self, headers: &[String]) -> Vec<Vec<String>> {
        record::all_runs_rows(
            &self.results,
            self.dataset_count,
            &self.config.participant,
            headers,
            self.config.display_locale,
        )
    }
}
