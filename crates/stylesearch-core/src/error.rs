use thiserror::Error;

/// Core error taxonomy.
///
/// Row- and region-scoped failures are absorbed into statistics or empty
/// result lists by the callers; only configuration problems and invalid
/// caller input surface through this type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
