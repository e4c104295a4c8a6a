use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("Query has not been prepared")]
    NotPrepared,

    #[error("Schema has no field tagged '{feature}'")]
    MissingFeature { feature: String },

    #[error("Document not found: {grid}/{key}")]
    NotFound { grid: String, key: String },

    #[error("Primary key '{key}' matched {count} documents in {grid}")]
    AmbiguousKey {
        grid: String,
        key: String,
        count: usize,
    },

    #[error("Duplicate primary key: {grid}/{key}")]
    DuplicateKey { grid: String, key: String },

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;
