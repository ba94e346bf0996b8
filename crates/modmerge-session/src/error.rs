use thiserror::Error;

use modmerge_types::{Guid, SerializeError};

#[derive(Debug, Error)]
pub enum SessionError {
    /// The injected serializer failed for a component.
    #[error("failed to serialize component {name:?} ({guid})")]
    Serialize {
        guid: Guid,
        name: String,
        #[source]
        source: SerializeError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid session config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot render session config: {0}")]
    Render(#[from] toml::ser::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
