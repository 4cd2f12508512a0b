pub mod config;
pub mod error;
pub mod evaluate;
pub mod experiment;
pub mod experimenter;
pub mod record;
pub mod sequencer;
pub mod state;

pub use config::{EvalPolicy, IndexPolicy, RunConfig};
pub use error::{ConfigError, ExperimenterError, SessionError};
pub use evaluate::{LatencyStats, Stats, evaluate};
pub use experiment::Experiment;
pub use experimenter::{Experimenter, ParticipantFile, parse_file_name};
pub use record::SessionRecord;
pub use sequencer::generate_indices;
pub use state::{SessionEvent, SessionState, StroopSession};
