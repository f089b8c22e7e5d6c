use crate::{authenticator::Authenticator, config_error::ConfigError};
use std::{collections::HashMap, sync::Arc};

/// Registry of available authenticators, keyed by [`Authenticator::id`]
#[derive(Default)]
pub struct AuthenticatorRegistry {
    authenticators: HashMap<String, Arc<dyn Authenticator>>,
}

impl AuthenticatorRegistry {
    /// Register an authenticator under its own id
    ///
    /// # Errors
    /// Returns `ConfigError::DuplicateAuthenticator` if the id is taken.
    pub fn register(&mut self, authenticator: Arc<dyn Authenticator>) -> Result<(), ConfigError> {
        let id = authenticator.id().to_owned();
        if self.authenticators.contains_key(&id) {
            return Err(ConfigError::DuplicateAuthenticator(id));
        }
        tracing::debug!(authenticator = %id, "authenticator registered");
        self.authenticators.insert(id, authenticator);
        Ok(())
    }

    /// Get an authenticator by id
    ///
    /// # Errors
    /// Returns `ConfigError::UnknownAuthenticator` if nothing is registered under `id`.
    pub fn get(&self, id: &str) -> Result<&Arc<dyn Authenticator>, ConfigError> {
        self.authenticators
            .get(id)
            .ok_or_else(|| ConfigError::UnknownAuthenticator(id.to_owned()))
    }

    /// Registered ids, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.authenticators.keys().cloned().collect();
        ids.sort();
        ids
    }
}
