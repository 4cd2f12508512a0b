use std::path::PathBuf;
use stroop_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("file name {0:?} is not of the form <participant>.<experiment>")]
    MalformedFileName(PathBuf),
    #[error("experiment type {0:?} is not supported")]
    UnsupportedExperiment(String),
    #[error("trial count must be at least 1")]
    ZeroTrials,
    #[error("settings cannot change while a run is active")]
    RunActive,
}

/// Broken internal bookkeeping. Never caused by participant input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("progress {progress} is past the {len} planned trials")]
    ProgressOutOfRange { progress: usize, len: usize },
    #[error("catalog has no stimulus at index {0}")]
    UnknownStimulus(usize),
    #[error("{correct} correct + {wrong} wrong does not match {valid} valid trials")]
    CountMismatch {
        correct: usize,
        wrong: usize,
        valid: usize,
    },
    #[error("{records} stored records but dataset counter is {counter}")]
    RecordCountMismatch { records: usize, counter: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ExperimenterError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no experiment loaded")]
    NothingLoaded,
}
