//! Connection parameter resolution and validation.
//!
//! This module builds connection parameters with validation. Any parameter not
//! set explicitly on the builder falls back to its environment variable, then
//! to its documented default. The username and password defaults are sentinel
//! placeholders that never pass validation, so credentials must always come
//! from the caller or the environment.

use crate::error::ConnectionError;
use std::env;
use std::fmt;

/// Environment variable consulted for the server host.
pub const ENV_HOST: &str = "LAKEFLIGHT_HOST";
/// Environment variable consulted for the server port.
pub const ENV_PORT: &str = "LAKEFLIGHT_PORT";
/// Environment variable consulted for the account username.
pub const ENV_USERNAME: &str = "LAKEFLIGHT_USERNAME";
/// Environment variable consulted for the account password.
pub const ENV_PASSWORD: &str = "LAKEFLIGHT_PASSWORD";

/// Default host when neither the builder nor the environment provides one.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default Flight port when neither the builder nor the environment provides one.
pub const DEFAULT_PORT: u16 = 32010;

// Sentinel credential defaults. Validation rejects them, so credentials must
// always come from the caller or the environment.
const USERNAME_PLACEHOLDER: &str = "<username>";
const PASSWORD_PLACEHOLDER: &str = "<password>";

/// Transport scheme used to reach the Flight endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportScheme {
    /// Plain gRPC over TCP
    #[default]
    GrpcTcp,
    /// gRPC over TLS
    GrpcTls,
}

impl TransportScheme {
    /// The HTTP scheme used when building the tonic endpoint URI.
    pub(crate) fn http_scheme(&self) -> &'static str {
        match self {
            TransportScheme::GrpcTcp => "http",
            TransportScheme::GrpcTls => "https",
        }
    }
}

impl fmt::Display for TransportScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportScheme::GrpcTcp => write!(f, "grpc+tcp"),
            TransportScheme::GrpcTls => write!(f, "grpc+tls"),
        }
    }
}

/// Connection parameters for establishing a Flight session.
#[derive(Clone)]
pub struct ConnectionParams {
    /// Server host address
    pub host: String,

    /// Server Flight port (default: 32010)
    pub port: u16,

    /// Username for the handshake
    pub username: String,

    /// Password for the handshake (never logged)
    password: String,

    /// Transport scheme (default: grpc+tcp)
    pub scheme: TransportScheme,
}

impl ConnectionParams {
    /// Handshake password. Crate-private so call sites cannot log it.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Create a new ConnectionBuilder.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// The endpoint URI handed to the gRPC channel, e.g. `http://127.0.0.1:32010`.
    pub fn endpoint_uri(&self) -> String {
        format!("{}://{}:{}", self.scheme.http_scheme(), self.host, self.port)
    }
}

// Manual impls keep the password out of formatted output
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConnectionParams {{ host: {}, port: {}, username: {}, scheme: {} }}",
            self.host, self.port, self.username, self.scheme
        )
    }
}

/// Builder resolving and validating connection parameters.
#[derive(Debug, Clone, Default)]
pub struct ConnectionBuilder {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    scheme: Option<TransportScheme>,
}

impl ConnectionBuilder {
    /// Create a new ConnectionBuilder with no explicit values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server host.
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Set the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username.
    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Set the transport scheme.
    pub fn scheme(mut self, scheme: TransportScheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Build the ConnectionParams, resolving unset values from the
    /// environment and validating the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidConfiguration`] naming the offending
    /// parameter when a value is empty, a credential is still the sentinel
    /// placeholder, or the port is zero or unparsable.
    pub fn build(self) -> Result<ConnectionParams, ConnectionError> {
        let host = self
            .host
            .unwrap_or_else(|| env::var(ENV_HOST).unwrap_or_else(|_| DEFAULT_HOST.to_string()));

        let port = match self.port {
            Some(port) => port,
            None => match env::var(ENV_PORT) {
                Ok(value) => value
                    .parse::<u16>()
                    .map_err(|_| ConnectionError::InvalidConfiguration {
                        parameter: "port".to_string(),
                        message: format!("Port must be a number between 1 and 65535, got '{value}'"),
                    })?,
                Err(_) => DEFAULT_PORT,
            },
        };

        let username = self.username.unwrap_or_else(|| {
            env::var(ENV_USERNAME).unwrap_or_else(|_| USERNAME_PLACEHOLDER.to_string())
        });

        let password = self.password.unwrap_or_else(|| {
            env::var(ENV_PASSWORD).unwrap_or_else(|_| PASSWORD_PLACEHOLDER.to_string())
        });

        if host.is_empty() {
            return Err(ConnectionError::InvalidConfiguration {
                parameter: "host".to_string(),
                message: "A valid server host IP or FQDN is required".to_string(),
            });
        }

        if port == 0 {
            return Err(ConnectionError::InvalidConfiguration {
                parameter: "port".to_string(),
                message: "Port must be greater than 0".to_string(),
            });
        }

        if username.is_empty() || username == USERNAME_PLACEHOLDER {
            return Err(ConnectionError::InvalidConfiguration {
                parameter: "username".to_string(),
                message: "A valid server account username is required".to_string(),
            });
        }

        if password.is_empty() || password == PASSWORD_PLACEHOLDER {
            return Err(ConnectionError::InvalidConfiguration {
                parameter: "password".to_string(),
                message: "A valid server account password is required".to_string(),
            });
        }

        Ok(ConnectionParams {
            host,
            port,
            username,
            password,
            scheme: self.scheme.unwrap_or_default(),
        })
    }
}
