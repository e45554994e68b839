pub mod app_config;
pub mod config;
pub mod locations;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use locations::{
    truncate_chars, CandidateRecord, ImportAttempt, ImportOutcome, PersistedLocation,
    ValidatedLocation, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_UPLOAD_BYTES, LATITUDE_RANGE,
    LONGITUDE_RANGE, MAX_ERROR_MESSAGE_LEN, MAX_FILENAME_LEN, MAX_NAME_LEN,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
