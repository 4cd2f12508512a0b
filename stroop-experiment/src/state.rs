use crate::config::{EvalPolicy, IndexPolicy, RunConfig};
use crate::error::{ConfigError, SessionError};
use crate::evaluate::{Stats, evaluate};
use crate::record::{self, SessionRecord};
use crate::sequencer::generate_indices;
use rand::Rng;
use std::time::Duration;
use stroop_core::{Catalog, Color, Locale, Stimulus, StimulusMode, TrialRecord, catalog};
use stroop_store::ResultsMap;
use stroop_timing::Timer;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Requests and notifications for the presentation surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RunStarted(usize),
    FixationPoint,
    ColoredQuad(Color),
    ColoredWriting { text: &'static str, color: Color },
    StatsComputed(Stats),
    RunStopped(usize),
}

/// Where the current trial is within its fixation → stimulus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrialPhase {
    /// Fixation marker up; stimulus due at `until` (timer ns).
    Fixation { until: u64 },
    /// Stimulus on screen since `shown`; waiting for a response.
    Stimulus { shown: u64 },
}

/// One participant's Stroop runs, driven by explicit calls and a polled clock.
///
/// Nothing here blocks: the fixation delay is a deadline checked in
/// [`update`](crate::Experiment::update), and responses arrive through
/// [`respond`](crate::Experiment::respond). Outgoing requests queue up until
/// [`drain_events`](crate::Experiment::drain_events).
pub struct StroopSession<T, R>
where
    T: Timer,
    R: Rng,
{
    pub global_index: usize,
    pub config: RunConfig,
    pub(crate) catalog: &'static Catalog,
    pub(crate) timer: T,
    pub(crate) rng: R,
    pub(crate) state: SessionState,
    phase: Option<TrialPhase>,
    pub(crate) trials: Vec<TrialRecord>,
    pub(crate) progress: usize,
    pub(crate) timestamp: String,
    pub(crate) last_stats: Option<Stats>,
    pub(crate) results: ResultsMap,
    pub(crate) dataset_count: usize,
    pub(crate) outbox: Vec<SessionEvent>,
}

impl<T, R> StroopSession<T, R>
where
    T: Timer,
    R: Rng,
{
    pub fn new(global_index: usize, config: RunConfig, timer: T, rng: R) -> Self {
        Self {
            global_index,
            config,
            catalog: catalog(),
            timer,
            rng,
            state: SessionState::Idle,
            phase: None,
            trials: Vec::new(),
            progress: 0,
            timestamp: String::new(),
            last_stats: None,
            results: ResultsMap::new(),
            dataset_count: 0,
            outbox: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Running | SessionState::Paused)
    }

    pub fn set_trials(&mut self, n: usize) -> Result<(), ConfigError> {
        if self.is_active() {
            return Err(ConfigError::RunActive);
        }
        if n == 0 {
            return Err(ConfigError::ZeroTrials);
        }
        self.config.trials = n;
        Ok(())
    }

    pub fn set_index_policy(&mut self, policy: IndexPolicy) -> Result<(), ConfigError> {
        if self.is_active() {
            return Err(ConfigError::RunActive);
        }
        self.config.index_policy = policy;
        Ok(())
    }

    /// Takes effect at the next evaluation, even mid-run.
    pub fn set_eval_policy(&mut self, policy: EvalPolicy) {
        self.config.eval_policy = policy;
    }

    /// Trials of the current or last run.
    pub fn trials(&self) -> &[TrialRecord] {
        &self.trials
    }

    /// Answered count and planned count of the current or last run.
    pub fn progress(&self) -> (usize, usize) {
        (self.progress, self.trials.len())
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The stimulus currently awaiting a response.
    pub fn current_stimulus(&self) -> Option<&Stimulus> {
        match self.phase {
            Some(TrialPhase::Stimulus { .. }) => self.stimulus_at(self.progress).ok(),
            _ => None,
        }
    }

    pub fn showing_fixation(&self) -> bool {
        matches!(self.phase, Some(TrialPhase::Fixation { .. }))
    }

    fn stimulus_at(&self, slot: usize) -> Result<&'static Stimulus, SessionError> {
        let trial = self.trials.get(slot).ok_or(SessionError::ProgressOutOfRange {
            progress: slot,
            len: self.trials.len(),
        })?;
        let catalog: &'static Catalog = self.catalog;
        catalog
            .get(trial.stimulus)
            .ok_or(SessionError::UnknownStimulus(trial.stimulus))
    }

    pub(crate) fn begin_run(&mut self) -> Result<(), SessionError> {
        self.config.validate()?;
        self.progress = 0;
        self.phase = None;
        self.last_stats = None;
        self.trials = generate_indices(
            self.catalog,
            self.config.trials,
            self.config.index_policy,
            &mut self.rng,
        )
        .into_iter()
        .map(TrialRecord::new)
        .collect();
        self.timestamp = record::timestamp_now();
        self.state = SessionState::Running;

        info!(
            run = self.global_index,
            participant = %self.config.participant,
            trials = self.trials.len(),
            policy = ?self.config.index_policy,
            "run started"
        );
        self.outbox.push(SessionEvent::RunStarted(self.global_index));
        Ok(())
    }

    pub(crate) fn resume(&mut self) {
        self.state = SessionState::Running;
        info!(run = self.global_index, progress = self.progress, "run resumed");
    }

    /// Shows fixation for the current slot, or finalizes when all are done.
    pub(crate) fn request_next_trial(&mut self) -> Result<(), SessionError> {
        if self.progress >= self.trials.len() {
            self.finalize()?;
            return Ok(());
        }
        let until = self
            .timer
            .after(self.timer.now(), Duration::from_millis(self.config.fixation_ms));
        self.phase = Some(TrialPhase::Fixation { until });
        self.outbox.push(SessionEvent::FixationPoint);
        Ok(())
    }

    /// Fires the scheduled stimulus once its fixation deadline has passed.
    pub(crate) fn poll_deadline(&mut self) -> Result<bool, SessionError> {
        if self.state != SessionState::Running {
            return Ok(false);
        }
        let Some(TrialPhase::Fixation { until }) = self.phase else {
            return Ok(false);
        };
        let now = self.timer.now();
        if now < until {
            return Ok(false);
        }

        let stimulus = self.stimulus_at(self.progress).inspect_err(|e| {
            error!(run = self.global_index, error = %e, "cannot present trial");
        })?;
        let event = match stimulus.mode {
            StimulusMode::ColoredQuad => SessionEvent::ColoredQuad(stimulus.color),
            _ => SessionEvent::ColoredWriting {
                text: stimulus.text,
                color: stimulus.color,
            },
        };
        debug!(
            slot = self.progress,
            mode = stimulus.mode.tag(),
            text = stimulus.text,
            color = stimulus.color.label(self.config.record_locale),
            "stimulus presented"
        );
        self.outbox.push(event);
        self.phase = Some(TrialPhase::Stimulus { shown: self.timer.now() });
        Ok(true)
    }

    /// Time left until the scheduled stimulus, if one is scheduled.
    pub fn time_to_stimulus(&self) -> Option<Duration> {
        match self.phase {
            Some(TrialPhase::Fixation { until }) if self.state == SessionState::Running => {
                Some(Duration::from_nanos(until.saturating_sub(self.timer.now())))
            }
            _ => None,
        }
    }

    pub(crate) fn record_response(&mut self, color: Color) -> Result<bool, SessionError> {
        if self.state != SessionState::Running || !Color::RESPONSES.contains(&color) {
            return Ok(false);
        }
        let Some(TrialPhase::Stimulus { shown }) = self.phase else {
            debug!(slot = self.progress, "response outside stimulus window ignored");
            return Ok(false);
        };

        let latency_ms = self.timer.elapsed(shown).as_millis() as u64;
        let len = self.trials.len();
        let slot = self.progress;
        let trial = self
            .trials
            .get_mut(slot)
            .ok_or(SessionError::ProgressOutOfRange { progress: slot, len })?;
        trial.chosen = color;
        trial.valid = true;
        trial.latency_ms = Some(latency_ms);
        debug!(slot, chosen = ?color, latency_ms, "response recorded");

        self.progress += 1;
        self.phase = None;
        self.request_next_trial()?;
        Ok(true)
    }

    pub(crate) fn halt(&mut self) {
        self.state = SessionState::Paused;
        self.phase = None;
        info!(run = self.global_index, progress = self.progress, "run paused");
    }

    /// Truncates an aborted run, scores it and stores its record.
    pub(crate) fn finalize(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Stopped;
        self.phase = None;

        self.truncate_unanswered()?;

        let stats = evaluate(&mut self.trials, self.catalog, self.config.eval_policy)
            .inspect_err(|e| error!(run = self.global_index, error = %e, "evaluation failed"))?;
        info!(
            run = self.global_index,
            total = stats.total,
            correct = stats.correct,
            wrong = stats.wrong,
            mean_ms = ?stats.mean_ms(),
            stdev_ms = ?stats.stdev_ms(),
            "run evaluated"
        );
        self.last_stats = Some(stats);
        self.outbox.push(SessionEvent::StatsComputed(stats));

        // The run is over even if its record cannot be stored.
        let stored = self.store_record();

        info!(run = self.global_index, datasets = self.dataset_count, "run stopped");
        self.outbox.push(SessionEvent::RunStopped(self.global_index));
        stored
    }

    /// Drops every slot from the current one on; only answered trials remain.
    fn truncate_unanswered(&mut self) -> Result<(), SessionError> {
        let len = self.trials.len();
        if self.progress > len {
            error!(progress = self.progress, len, "progress beyond planned trials");
            return Err(SessionError::ProgressOutOfRange {
                progress: self.progress,
                len,
            });
        }
        if self.progress < len {
            warn!(
                run = self.global_index,
                answered = self.progress,
                planned = len,
                "run aborted, unanswered trials dropped"
            );
            self.trials.truncate(self.progress);
        }
        Ok(())
    }

    fn store_record(&mut self) -> Result<(), SessionError> {
        if self.trials.is_empty() {
            debug!(run = self.global_index, "nothing answered, no record stored");
            return Ok(());
        }
        let key = record::record_key(self.dataset_count + 1);
        if self.results.len() != self.dataset_count || self.results.contains_key(&key) {
            error!(
                records = self.results.len(),
                counter = self.dataset_count,
                %key,
                "stored records out of step with dataset counter, run not stored"
            );
            return Err(SessionError::RecordCountMismatch {
                records: self.results.len(),
                counter: self.dataset_count,
            });
        }

        let locale = self.config.record_locale;
        let mut serialized = Vec::with_capacity(self.trials.len());
        for (slot, trial) in self.trials.iter().enumerate() {
            if !trial.valid {
                continue;
            }
            let stimulus = self.stimulus_at(slot)?;
            serialized.push(trial.to_record_string(stimulus, locale));
        }

        let record = SessionRecord::new(self.timestamp.clone(), serialized);
        self.results.insert(key, record.to_values());
        self.dataset_count += 1;
        Ok(())
    }

    /// Valid trials of the last run as table rows.
    pub fn current_run_table(&self, locale: Locale) -> Vec<Vec<String>> {
        self.trials
            .iter()
            .enumerate()
            .filter(|(_, t)| t.valid)
            .filter_map(|(slot, t)| {
                self.stimulus_at(slot)
                    .ok()
                    .map(|s| t.to_fields(s, false, locale))
            })
            .collect()
    }
}

