use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid connection url: {0}")]
    Url(#[from] url::ParseError),
}

/// A store connection could not be opened.
///
/// Cloneable so a single failed open can be handed to every caller that was
/// waiting on the same pool entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to open store connection {fingerprint}: {reason}")]
pub struct ConnectionError {
    pub fingerprint: String,
    pub reason: String,
}

impl ConnectionError {
    pub fn new(fingerprint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("entity {entity} has no identifier field declared")]
    MissingIdentifier { entity: String },

    #[error("{entity} document has no value in identifier field {field}")]
    MissingIdentifierValue { entity: String, field: String },

    #[error("failed to resolve relation {entity}.{field}: {source}")]
    RelationResolution {
        entity: String,
        field: String,
        #[source]
        source: Box<Error>,
    },

    #[error("unknown entity: {entity}")]
    UnknownEntity { entity: String },

    #[error("store error: {0}")]
    Store(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a failed batched fetch for `entity.field`.
    pub fn relation(entity: impl Into<String>, field: impl Into<String>, source: Error) -> Self {
        Error::RelationResolution {
            entity: entity.into(),
            field: field.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
