pub mod csv;
pub mod store;

pub use store::{JsonFileStore, MemoryStore, ResultsMap, SessionStore, StoreError};
