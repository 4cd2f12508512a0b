use crate::error::{ConfigError, ExperimenterError};
use crate::experiment::Experiment;
use crate::state::SessionEvent;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stroop_store::{ResultsMap, SessionStore};
use tracing::{info, warn};

/// Identity encoded in a `<participant>.<experiment>` data file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantFile {
    pub participant: String,
    pub experiment: String,
    pub path: PathBuf,
}

/// Splits a data file location into participant, experiment type and full path.
///
/// A bare file name is placed in `data_dir`.
pub fn parse_file_name(location: &Path, data_dir: &Path) -> Result<ParticipantFile, ConfigError> {
    let malformed = || ConfigError::MalformedFileName(location.to_path_buf());
    let file_name = location
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(malformed)?;

    let parts: Vec<&str> = file_name.split('.').collect();
    let [participant, experiment] = parts.as_slice() else {
        return Err(malformed());
    };
    if participant.is_empty() || experiment.is_empty() {
        return Err(malformed());
    }

    let has_dir = location
        .parent()
        .is_some_and(|p| !p.as_os_str().is_empty());
    let path = if has_dir {
        location.to_path_buf()
    } else {
        data_dir.join(file_name)
    };

    Ok(ParticipantFile {
        participant: participant.to_string(),
        experiment: experiment.to_lowercase().replace(' ', ""),
        path,
    })
}

/// Owns the experiments and connects them to the session store.
pub struct Experimenter<'s> {
    store: &'s dyn SessionStore,
    data_dir: PathBuf,
    experiments: BTreeMap<String, Box<dyn Experiment>>,
    loaded: Option<ParticipantFile>,
}

impl<'s> Experimenter<'s> {
    pub fn new(store: &'s dyn SessionStore, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            data_dir: data_dir.into(),
            experiments: BTreeMap::new(),
            loaded: None,
        }
    }

    /// Registers an experiment under its lower-case type name.
    pub fn register(&mut self, experiment: Box<dyn Experiment>) {
        let name = experiment.kind().to_lowercase();
        self.experiments.insert(name, experiment);
    }

    pub fn experiment(&self, name: &str) -> Option<&dyn Experiment> {
        self.experiments.get(name).map(|e| e.as_ref())
    }

    pub fn experiment_mut(&mut self, name: &str) -> Option<&mut (dyn Experiment + 'static)> {
        self.experiments.get_mut(name).map(|e| e.as_mut())
    }

    pub fn last_loaded(&self) -> Option<&ParticipantFile> {
        self.loaded.as_ref()
    }

    /// The experiment of the last loaded file.
    pub fn active(&mut self) -> Result<&mut (dyn Experiment + 'static), ExperimenterError> {
        let name = self
            .loaded
            .as_ref()
            .map(|f| f.experiment.clone())
            .ok_or(ExperimenterError::NothingLoaded)?;
        self.experiment_mut(&name)
            .ok_or(ExperimenterError::Config(ConfigError::UnsupportedExperiment(name)))
    }

    /// Activates the experiment named by `location` and loads its stored runs.
    /// A missing file is created empty.
    pub fn load_experiment(&mut self, location: &Path) -> Result<usize, ExperimenterError> {
        let file = parse_file_name(location, &self.data_dir)?;
        let store = self.store;
        let experiment = self
            .experiments
            .get_mut(&file.experiment)
            .ok_or_else(|| ConfigError::UnsupportedExperiment(file.experiment.clone()))?;

        experiment.set_experiment_name(&file.experiment);
        experiment.set_participant(&file.participant);

        if store.exists(&file.path) {
            let data = store.load(&file.path)?;
            experiment.set_loaded_data(data);
        } else {
            store.save(&file.path, &ResultsMap::new())?;
            experiment.set_loaded_data(ResultsMap::new());
            info!(path = %file.path.display(), "created data file");
        }

        let index = experiment.global_index();
        info!(
            participant = %file.participant,
            experiment = %file.experiment,
            datasets = experiment.dataset_count(),
            "experiment loaded"
        );
        self.loaded = Some(file);
        Ok(index)
    }

    pub fn save_experiment(&self, path: &Path, name: &str) -> Result<(), ExperimenterError> {
        let experiment = self
            .experiment(name)
            .ok_or_else(|| ConfigError::UnsupportedExperiment(name.to_string()))?;
        self.store.save(path, experiment.data_to_save())?;
        Ok(())
    }

    /// Drains the active experiment's events, saving to the loaded file when a run stops.
    pub fn drain_events(&mut self) -> Result<Vec<SessionEvent>, ExperimenterError> {
        let events = self.active()?.drain_events();
        if events
            .iter()
            .any(|e| matches!(e, SessionEvent::RunStopped(_)))
        {
            self.save_loaded()?;
        }
        Ok(events)
    }

    fn save_loaded(&self) -> Result<(), ExperimenterError> {
        let file = self.loaded.as_ref().ok_or(ExperimenterError::NothingLoaded)?;
        self.save_experiment(&file.path, &file.experiment)
    }

    /// Applies a trial count to every experiment. Stops at the first one that refuses.
    pub fn set_num_trials(&mut self, n: usize) -> Result<(), ConfigError> {
        for experiment in self.experiments.values_mut() {
            experiment.set_num_trials(n)?;
        }
        Ok(())
    }

    pub fn export_csv(&self, path: &Path, rows: &[Vec<String>]) -> Result<(), ExperimenterError> {
        self.store.write_rows(path, rows).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "export failed");
        })?;
        Ok(())
    }

    pub fn export_last_run(
        &mut self,
        path: &Path,
        headers: &[String],
        include_stats: bool,
    ) -> Result<(), ExperimenterError> {
        let rows = self.active()?.export_last_run(headers, include_stats);
        self.export_csv(path, &rows)
    }

    pub fn export_all_runs(&mut self, path: &Path, headers: &[String]) -> Result<(), ExperimenterError> {
        let rows = self.active()?.export_all_runs(headers);
        self.export_csv(path, &rows)
    }
}
