pub mod color;
pub mod stimulus;
pub mod trial;

pub use color::{Color, Locale};
pub use stimulus::{Catalog, Stimulus, StimulusMode, catalog};
pub use trial::{FIELD_SEPARATOR, TrialFields, TrialRecord};
