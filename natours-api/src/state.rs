//! Shared application state

use std::sync::Arc;

use crate::auth::password::PasswordHasher;
use crate::auth::tokens::TokenService;
use crate::config::Config;
use crate::email::Mailer;
use crate::error::Result;
use crate::payments::CheckoutGateway;
use crate::store::MemoryStore;

/// Everything a handler needs, cloned cheaply per request
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,
    /// The document store behind every resource
    pub store: Arc<MemoryStore>,
    /// JWT issuance and verification
    pub tokens: TokenService,
    /// Password hashing policy
    pub hasher: PasswordHasher,
    /// Outbound email
    pub mailer: Arc<Mailer>,
    /// Checkout session creation
    pub gateway: CheckoutGateway,
}

impl AppState {
    /// Build the state graph from configuration
    pub fn new(config: Config) -> Result<Self> {
        let tokens = TokenService::new(&config.auth);
        let hasher = PasswordHasher::new(config.auth.password_min_length);
        let mailer = Mailer::from_config(config.email.as_ref())?;
        let gateway = CheckoutGateway::new(&config.payments, &config.service.public_url);

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(MemoryStore::new()),
            tokens,
            hasher,
            mailer: Arc::new(mailer),
            gateway,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_default_config() {
        let state = AppState::new(Config::default()).unwrap();
        assert_eq!(state.config.service.port, 3000);
        // No SMTP configured: emails are logged, not sent
        assert!(matches!(*state.mailer, Mailer::Log));
    }
}
