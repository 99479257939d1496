//! Error type for the command-line front end.

/// Wraps errors from the engine crates behind one printable type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Run file error: {0}")]
    Project(String),

    #[error("Rate data error: {0}")]
    Rates(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Invalid argument: {0}")]
    Argument(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<nei_project::ProjectError> for AppError {
    fn from(err: nei_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<nei_atomic::AtomicError> for AppError {
    fn from(err: nei_atomic::AtomicError) -> Self {
        AppError::Rates(err.to_string())
    }
}

impl From<nei_tables::TableError> for AppError {
    fn from(err: nei_tables::TableError) -> Self {
        AppError::Rates(err.to_string())
    }
}

impl From<nei_sim::SimError> for AppError {
    fn from(err: nei_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Output(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Output(err.to_string())
    }
}
