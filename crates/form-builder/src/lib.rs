#![allow(missing_docs)]

pub mod cli;
pub mod config;
pub mod session;

pub use config::{BuilderConfig, CONFIG_FILE_NAME, ConfigError, ConfigOverrides};
pub use session::{
    ADD_FAILED, ADD_SUCCEEDED, BuilderOutcome, BuilderSession, Notice, REMOVE_FAILED, SAVE_FAILED,
    SUBMIT_SUCCEEDED, SessionError,
};
