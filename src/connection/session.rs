//! Session lifecycle for Flight connections.
//!
//! This module drives the request lifecycle: connect, authenticate, resolve
//! ticket, stream data. State transitions are explicit and invalid call
//! sequences fail loudly instead of reconnecting behind the caller's back.

use crate::connection::auth::{CapturedCredential, WorkloadRouting};
use crate::connection::params::{ConnectionBuilder, ConnectionParams};
use crate::error::{ConnectionError, LakeflightError, QueryError, TransportError};
use crate::query::results::ResultTable;
use crate::transport::grpc::GrpcFlightTransport;
use crate::transport::protocol::{FlightTransport, RetrievalTicket};
use std::fmt;
use tracing::{debug, info};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No channel established yet
    Unconnected,

    /// Channel established, handshake not yet performed
    Connected,

    /// Handshake complete, session credential captured
    Authenticated,
}

impl SessionState {
    /// Check if a channel has been established.
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected | SessionState::Authenticated)
    }

    /// Check if the session can resolve tickets and stream results.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }
}

/// A client session against one Flight server.
///
/// Every lifecycle operation takes `&mut self`; a session serves one caller
/// at a time. Create one session per logical connection when concurrency is
/// needed. Dropping the session releases the channel, there is no close
/// protocol.
///
/// # Example
///
/// ```no_run
/// use lakeflight::{ConnectionParams, Session};
///
/// # async fn example() -> Result<(), lakeflight::LakeflightError> {
/// let params = ConnectionParams::builder()
///     .host("127.0.0.1")
///     .port(32010)
///     .username("analyst")
///     .password("secret")
///     .build()?;
///
/// let mut session = Session::new(params);
/// let table = session
///     .query("SELECT * FROM samples.employees LIMIT 5", None, None)
///     .await?;
/// println!("fetched {} rows", table.num_rows());
/// # Ok(())
/// # }
/// ```
pub struct Session<T: FlightTransport = GrpcFlightTransport> {
    params: ConnectionParams,
    transport: T,
    state: SessionState,
    credential: Option<CapturedCredential>,
}

impl Session {
    /// Create a session from connection parameters.
    ///
    /// No I/O happens here; the channel is established by [`Session::connect`]
    /// or lazily by [`Session::query`].
    pub fn new(params: ConnectionParams) -> Self {
        Self::with_transport(params, GrpcFlightTransport::new())
    }
}

impl<T: FlightTransport> Session<T> {
    /// Create a session over a specific transport implementation.
    pub fn with_transport(params: ConnectionParams, transport: T) -> Self {
        Self {
            params,
            transport,
            state: SessionState::Unconnected,
            credential: None,
        }
    }

    /// Connection parameters this session was built with.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Credential captured by the most recent handshake.
    pub fn captured_credential(&self) -> Option<&CapturedCredential> {
        self.credential.as_ref()
    }

    /// Establish the channel to the server.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidSessionState`] if already connected,
    /// [`ConnectionError::ConnectionUnavailable`] if the server cannot be
    /// reached, or [`ConnectionError::InvalidConfiguration`] if no valid
    /// endpoint URI can be built from the parameters.
    pub async fn connect(&mut self) -> Result<(), LakeflightError> {
        if self.state != SessionState::Unconnected {
            return Err(
                ConnectionError::InvalidSessionState("Already connected".to_string()).into(),
            );
        }

        match self.transport.connect(&self.params).await {
            Ok(()) => {
                self.state = SessionState::Connected;
                Ok(())
            }
            Err(TransportError::InvalidEndpoint { uri, message }) => {
                Err(ConnectionError::InvalidConfiguration {
                    parameter: "host".to_string(),
                    message: format!("Cannot build endpoint URI '{uri}': {message}"),
                }
                .into())
            }
            Err(err) => Err(ConnectionError::ConnectionUnavailable {
                host: self.params.host.clone(),
                port: self.params.port,
                message: err.to_string(),
            }
            .into()),
        }
    }

    /// Perform the authentication handshake.
    ///
    /// May be called again on an authenticated session; the new credential
    /// overwrites the previous one.
    ///
    /// # Arguments
    ///
    /// * `routing` - Optional workload routing hints, forwarded as
    ///   `routing-tag`/`routing-queue` headers
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidSessionState`] when not connected,
    /// [`ConnectionError::ConnectionUnavailable`] when the server is gone,
    /// [`ConnectionError::AuthenticationRejected`] when the credentials are
    /// refused, and [`ConnectionError::AuthorizationHeaderMissing`] when the
    /// handshake response carries no credential. Any other transport fault
    /// propagates unclassified.
    pub async fn authenticate(
        &mut self,
        routing: Option<&WorkloadRouting>,
    ) -> Result<(), LakeflightError> {
        if self.state == SessionState::Unconnected {
            return Err(ConnectionError::InvalidSessionState(
                "Must connect before authenticating".to_string(),
            )
            .into());
        }

        let handshake = self
            .transport
            .handshake(&self.params.username, self.params.password(), routing.cloned())
            .await;

        let credential = match handshake {
            Ok(credential) => credential,
            Err(err) => return Err(self.classify_handshake_error(err)),
        };

        self.credential = Some(credential);
        self.state = SessionState::Authenticated;
        info!("Authenticated as user '{}'", self.params.username);
        Ok(())
    }

    fn classify_handshake_error(&self, err: TransportError) -> LakeflightError {
        match err {
            TransportError::Unavailable(message) => ConnectionError::ConnectionUnavailable {
                host: self.params.host.clone(),
                port: self.params.port,
                message,
            }
            .into(),
            TransportError::Unauthenticated(message) => {
                ConnectionError::AuthenticationRejected(message).into()
            }
            TransportError::MissingAuthorizationHeader => {
                ConnectionError::AuthorizationHeaderMissing.into()
            }
            TransportError::InvalidMetadata { name, message } => {
                ConnectionError::InvalidConfiguration {
                    parameter: name,
                    message,
                }
                .into()
            }
            other => LakeflightError::Transport(other),
        }
    }

    /// Resolve a SQL statement into a retrieval ticket.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidSessionState`] when not
    /// authenticated, or [`QueryError::TicketResolutionFailed`] wrapping the
    /// underlying cause for any resolution failure.
    pub async fn resolve_ticket(&mut self, sql: &str) -> Result<RetrievalTicket, LakeflightError> {
        if self.state != SessionState::Authenticated {
            return Err(ConnectionError::InvalidSessionState(
                "Must authenticate before resolving a ticket".to_string(),
            )
            .into());
        }

        let ticket = self
            .transport
            .resolve_ticket(sql)
            .await
            .map_err(|e| QueryError::TicketResolutionFailed(e.to_string()))?;
        Ok(ticket)
    }

    /// Execute a query and collect its result set.
    ///
    /// Drives whichever lifecycle steps have not happened yet: an unconnected
    /// session connects and authenticates first, a connected one
    /// authenticates, an authenticated one goes straight to resolution.
    /// Repeated calls reuse the authenticated session.
    ///
    /// # Arguments
    ///
    /// * `sql` - SQL statement to execute
    /// * `ts_column` - Optional temporal column to render as formatted text
    /// * `ts_format` - strftime pattern for the rendered column; required
    ///   when `ts_column` is given
    ///
    /// # Errors
    ///
    /// Connection and authentication errors as for [`Session::connect`] and
    /// [`Session::authenticate`]; [`QueryError::TicketResolutionFailed`] or
    /// [`QueryError::DataRetrievalFailed`] for the retrieval steps; and
    /// `ConvertError` variants for temporal rendering.
    pub async fn query(
        &mut self,
        sql: &str,
        ts_column: Option<&str>,
        ts_format: Option<&str>,
    ) -> Result<ResultTable, LakeflightError> {
        match self.state {
            SessionState::Unconnected => {
                self.connect().await?;
                self.authenticate(None).await?;
            }
            SessionState::Connected => self.authenticate(None).await?,
            SessionState::Authenticated => {}
        }

        info!("Executing query: {}", sql);
        let ticket = self.resolve_ticket(sql).await?;

        let batches = self
            .transport
            .fetch_stream(&ticket)
            .await
            .map_err(|e| QueryError::DataRetrievalFailed(e.to_string()))?;

        let mut table = ResultTable::new(batches);
        debug!("Query returned {} rows", table.num_rows());

        if let Some(column) = ts_column {
            table.format_temporal(column, ts_format)?;
        }

        Ok(table)
    }
}

impl<T: FlightTransport> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("authenticated", &self.credential.is_some())
            .finish()
    }
}

/// Options for the one-shot [`run_query`] helper.
///
/// Unset connection fields fall back to the environment variables documented
/// on [`ConnectionBuilder`], then to the built-in defaults.
#[derive(Clone, Default)]
pub struct RunQueryOptions {
    /// Server host override
    pub host: Option<String>,
    /// Server port override
    pub port: Option<u16>,
    /// Username override
    pub username: Option<String>,
    /// Password override
    pub password: Option<String>,
    /// Temporal column to render as text
    pub temporal_column: Option<String>,
    /// strftime pattern for the rendered column
    pub temporal_format: Option<String>,
}

impl fmt::Debug for RunQueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunQueryOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("temporal_column", &self.temporal_column)
            .field("temporal_format", &self.temporal_format)
            .finish()
    }
}

/// Execute one query on a throwaway session.
///
/// Builds connection parameters from the options, connects, authenticates,
/// runs the statement, and returns the collected table. Equivalent to
/// driving a fresh [`Session`] by hand.
///
/// # Example
///
/// ```no_run
/// use lakeflight::{run_query, RunQueryOptions};
///
/// # async fn example() -> Result<(), lakeflight::LakeflightError> {
/// let table = run_query(
///     "SELECT * FROM samples.employees LIMIT 5",
///     RunQueryOptions {
///         host: Some("127.0.0.1".to_string()),
///         username: Some("analyst".to_string()),
///         password: Some("secret".to_string()),
///         ..Default::default()
///     },
/// )
/// .await?;
/// assert_eq!(table.num_rows(), 5);
/// # Ok(())
/// # }
/// ```
pub async fn run_query(
    sql: &str,
    options: RunQueryOptions,
) -> Result<ResultTable, LakeflightError> {
    let mut builder = ConnectionBuilder::new();
    if let Some(host) = &options.host {
        builder = builder.host(host);
    }
    if let Some(port) = options.port {
        builder = builder.port(port);
    }
    if let Some(username) = &options.username {
        builder = builder.username(username);
    }
    if let Some(password) = &options.password {
        builder = builder.password(password);
    }
    let params = builder.build()?;

    let mut session = Session::new(params);
    session
        .query(
            sql,
            options.temporal_column.as_deref(),
            options.temporal_format.as_deref(),
        )
        .await
}
