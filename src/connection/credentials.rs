//! Connection parameters and credential providers
//!
//! Credentials are resolved once, before a session provider is built. Nothing
//! in this crate prompts for input.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ConnectionError;

/// Default environment variable holding the user name
pub const DEFAULT_USER_VAR: &str = "ETL_DB_USER";
/// Default environment variable holding the password
pub const DEFAULT_PASSWORD_VAR: &str = "ETL_DB_PASSWORD";

/// A user name and password
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Source of credentials
pub trait CredentialProvider {
    /// Resolve credentials, failing when any part is unavailable
    fn credentials(&self) -> Result<Credentials, ConnectionError>;
}

/// Credentials known up front
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self(Credentials::new(user, password))
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials, ConnectionError> {
        Ok(self.0.clone())
    }
}

/// Credentials read from environment variables
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    user_var: String,
    password_var: String,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self {
            user_var: DEFAULT_USER_VAR.to_string(),
            password_var: DEFAULT_PASSWORD_VAR.to_string(),
        }
    }
}

impl EnvCredentials {
    /// Read from custom variable names
    pub fn new(user_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Self {
            user_var: user_var.into(),
            password_var: password_var.into(),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<Credentials, ConnectionError> {
        let read = |var: &str| {
            std::env::var(var)
                .map_err(|_| ConnectionError::MissingCredentials(format!("{} is not set", var)))
        };
        Ok(Credentials::new(read(&self.user_var)?, read(&self.password_var)?))
    }
}

/// Where and how to reach a database server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    /// Let the server redirect the session to a less loaded node
    pub connection_load_balance: bool,
    /// Fallback `host:port` nodes tried when the primary host is down
    pub backup_server_nodes: Vec<String>,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5433,
            database: "db".to_string(),
            connection_load_balance: false,
            backup_server_nodes: Vec::new(),
        }
    }
}

impl ConnectionParams {
    /// Attach credentials from a provider
    pub fn resolve(
        self,
        provider: &dyn CredentialProvider,
    ) -> Result<ConnectionSettings, ConnectionError> {
        Ok(ConnectionSettings {
            params: self,
            credentials: provider.credentials()?,
        })
    }
}

/// Connection parameters with resolved credentials, ready for a driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub params: ConnectionParams,
    pub credentials: Credentials,
}

impl ConnectionSettings {
    /// Flatten into driver options, in a stable order
    pub fn to_options(&self) -> Vec<(String, String)> {
        let mut options = vec![
            ("host".to_string(), self.params.host.clone()),
            ("port".to_string(), self.params.port.to_string()),
            ("database".to_string(), self.params.database.clone()),
            ("user".to_string(), self.credentials.user.clone()),
            ("password".to_string(), self.credentials.password.clone()),
        ];
        if self.params.connection_load_balance {
            options.push(("connection_load_balance".to_string(), "true".to_string()));
        }
        if !self.params.backup_server_nodes.is_empty() {
            options.push((
                "backup_server_node".to_string(),
                self.params.backup_server_nodes.join(","),
            ));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ConnectionParams::default();
        assert_eq!(params.host, "localhost");
        assert_eq!(params.port, 5433);
        assert_eq!(params.database, "db");
    }

    #[test]
    fn test_resolve_static() {
        let settings = ConnectionParams {
            connection_load_balance: true,
            backup_server_nodes: vec!["h2:5433".to_string(), "h3:5433".to_string()],
            ..Default::default()
        }
        .resolve(&StaticCredentials::new("etl", "secret"))
        .unwrap();
        let options = settings.to_options();
        assert!(options.contains(&("user".to_string(), "etl".to_string())));
        assert!(options.contains(&("backup_server_node".to_string(), "h2:5433,h3:5433".to_string())));
        assert!(!format!("{:?}", settings).contains("secret"));
    }

    #[test]
    fn test_env_credentials_missing() {
        let provider = EnvCredentials::new(
            "DATA_SOURCE_SDK_TEST_NO_SUCH_USER",
            "DATA_SOURCE_SDK_TEST_NO_SUCH_PASSWORD",
        );
        assert!(matches!(
            provider.credentials(),
            Err(ConnectionError::MissingCredentials(_))
        ));
    }
}
