use thiserror::Error;

/// Errors that can occur while loading or resolving authenticator configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown authenticator: {0}")]
    UnknownAuthenticator(String),

    #[error("authenticator '{0}' is already registered")]
    DuplicateAuthenticator(String),

    #[error("invalid config for authenticator '{authenticator}': {source}")]
    InvalidConfig {
        authenticator: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}
