// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepGateError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A query, admission or permit call named a unit that was never
    /// registered. Callers must register before anything else.
    #[error("Unit not registered: {0}")]
    UnknownUnit(String),

    #[error("Dependency cycle detected: {0}")]
    DependencyCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Missing required label: {0}")]
    MissingLabel(String),

    #[error("Script error on line {line}: {message}")]
    ScriptError { line: usize, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DepGateError>;
