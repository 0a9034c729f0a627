//! Credential providers
//!
//! The client only needs an `Authorization` header value. Where the token
//! comes from is up to the caller; storing it is out of scope here.

use secrecy::{ExposeSecret, SecretString};

/// Environment variable read by [`EnvToken::default`]
pub const TOKEN_ENV_VAR: &str = "ANS_TOKEN";

/// Supplies the API token, if one is configured
pub trait CredentialProvider {
    /// The raw token, `None` when not configured
    fn token(&self) -> Option<SecretString>;

    /// `Authorization` header value for the configured token.
    ///
    /// Blank tokens count as missing.
    fn authorization(&self) -> Option<SecretString> {
        let token = self.token()?;
        let token = token.expose_secret().trim();
        if token.is_empty() {
            return None;
        }
        Some(SecretString::from(format!("Token token={token}")))
    }
}

/// A token supplied directly by the caller
pub struct StaticToken(SecretString);

impl StaticToken {
    /// Wrap a token
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self) -> Option<SecretString> {
        Some(SecretString::from(self.0.expose_secret().to_string()))
    }
}

/// Reads the token from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    /// Read from a custom variable
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(TOKEN_ENV_VAR)
    }
}

impl CredentialProvider for EnvToken {
    fn token(&self) -> Option<SecretString> {
        std::env::var(&self.var).ok().map(SecretString::from)
    }
}

/// No token at all; every network operation fails with a missing credential
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl CredentialProvider for NoToken {
    fn token(&self) -> Option<SecretString> {
        None
    }
}
