pub mod config;
pub mod error;
pub mod service;
pub mod store;

pub use config::{EngineConfig, NewAssessmentText};
pub use error::{ConfigError, EngineError, StoreError};
pub use service::{AssessmentService, Submission};
pub use store::{AssessmentStore, FileStore, MemoryStore};
