//! Built-in authentication strategies.

pub mod simple_bearer;

pub use simple_bearer::{SimpleBearerAuthenticator, SimpleBearerConfig};
