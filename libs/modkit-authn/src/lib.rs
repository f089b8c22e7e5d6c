#![warn(warnings)]

// Core modules
pub mod authenticator;
pub mod errors;
pub mod registry;
pub mod session;

// Collaborators of the strategies
pub mod config;
pub mod config_error;
pub mod forward;
pub mod json_path;
pub mod token;

pub mod strategies;

// Core exports
pub use authenticator::{Authenticator, ResolveConfig};
pub use errors::{AuthnError, ForbiddenError};
pub use registry::AuthenticatorRegistry;
pub use session::AuthenticationSession;

// Collaborator exports
pub use config::{
    AuthenticatorSection, ConfigProvider, GatewayConfig, authenticator_config,
    authenticator_is_enabled,
};
pub use config_error::ConfigError;
pub use forward::{ForwardError, ForwarderConfig, HttpForwarder, SessionStoreForwarder};
pub use json_path::{JsonPath, JsonPathBuilder};
pub use token::{TokenLocation, bearer_token_from_request};

pub use strategies::{SimpleBearerAuthenticator, SimpleBearerConfig};
