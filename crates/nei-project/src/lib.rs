//! nei-project: run-definition files and validation.

pub mod convert;
pub mod migrate;
pub mod schema;
pub mod validate;

pub use convert::{rate_source, to_config};
pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, resolve_element, validate_run};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Configuration error: {0}")]
    Config(#[from] nei_sim::SimError),

    #[error("Rate source error: {0}")]
    Rates(#[from] nei_atomic::AtomicError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<RunDef> {
    let content = std::fs::read_to_string(path)?;
    let mut run: RunDef = serde_yaml::from_str(&content)?;
    run = migrate_to_latest(run)?;
    validate_run(&run)?;
    Ok(run)
}

pub fn save_yaml(path: &std::path::Path, run: &RunDef) -> ProjectResult<()> {
    validate_run(run)?;
    let content = serde_yaml::to_string(run)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<RunDef> {
    let content = std::fs::read_to_string(path)?;
    let mut run: RunDef = serde_json::from_str(&content)?;
    run = migrate_to_latest(run)?;
    validate_run(&run)?;
    Ok(run)
}

pub fn save_json(path: &std::path::Path, run: &RunDef) -> ProjectResult<()> {
    validate_run(run)?;
    let content = serde_json::to_string_pretty(run)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &std::path::Path) -> ProjectResult<RunDef> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path),
        _ => load_yaml(path),
    }
}
