//! Error types for lakeflight.
//!
//! One sub-enum per functional area, joined under a transparent top-level
//! enum so callers can match on whichever level they care about.

use thiserror::Error;

/// Any error the client can surface.
#[derive(Error, Debug)]
pub enum LakeflightError {
    /// Connection and authentication errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Query submission and retrieval errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Result post-processing errors
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Transport protocol errors
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors related to establishing and authenticating a session.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Invalid connection parameters
    #[error("Invalid connection parameter '{parameter}': {message}")]
    InvalidConfiguration { parameter: String, message: String },

    /// Server could not be reached
    #[error("Server connection to {host}:{port} failed: {message}")]
    ConnectionUnavailable {
        host: String,
        port: u16,
        message: String,
    },

    /// Server rejected the supplied credentials
    #[error("Failed to authenticate user account: {0}")]
    AuthenticationRejected(String),

    /// Handshake response carried no authorization header
    #[error("Did not receive an authorization header back from the server")]
    AuthorizationHeaderMissing,

    /// Operation called in the wrong session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}

/// Errors related to submitting a query and retrieving its results.
#[derive(Error, Debug)]
pub enum QueryError {
    /// GetFlightInfo failed to resolve a retrieval ticket
    #[error("Failed to resolve retrieval ticket: {0}")]
    TicketResolutionFailed(String),

    /// DoGet stream failed after a ticket was obtained
    #[error("Failed to read query results: {0}")]
    DataRetrievalFailed(String),
}

/// Errors related to temporal column rendering.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Named column does not exist in the result table
    #[error("'{column}' is not a valid column name; result columns are: {}", .available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },

    /// Named column is not a date or timestamp column
    #[error("Column '{column}' has invalid type {observed}; expected a date or timestamp column")]
    InvalidColumnType { column: String, observed: String },

    /// A temporal column was named without a format pattern
    #[error("A format pattern is required to render temporal column '{column}' as text")]
    MissingFormat { column: String },

    /// Format pattern could not be parsed or rendered
    #[error("Invalid temporal format pattern '{format}'")]
    InvalidFormat { format: String },

    /// Arrow error
    #[error("Arrow error: {0}")]
    ArrowError(String),
}

/// Errors related to the Flight transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Endpoint URI could not be constructed from the connection parameters
    #[error("Invalid endpoint URI '{uri}': {message}")]
    InvalidEndpoint { uri: String, message: String },

    /// Server unreachable
    #[error("Server unavailable: {0}")]
    Unavailable(String),

    /// Server rejected the call as unauthenticated
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Handshake response metadata lacked the authorization header
    #[error("No authorization header in handshake response")]
    MissingAuthorizationHeader,

    /// Header value could not be encoded as gRPC metadata
    #[error("Invalid metadata value for '{name}': {message}")]
    InvalidMetadata { name: String, message: String },

    /// Invalid response from server
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    /// Uncategorized gRPC status
    #[error("gRPC error ({code}): {message}")]
    Grpc { code: String, message: String },

    /// Flight data could not be decoded into record batches
    #[error("Failed to decode flight data: {0}")]
    Decode(String),

    /// Operation attempted before connect
    #[error("Not connected")]
    NotConnected,
}

// Classification of gRPC, Flight, and Arrow faults
impl From<tonic::Status> for TransportError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::Unavailable => TransportError::Unavailable(status.message().to_string()),
            tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => {
                TransportError::Unauthenticated(status.message().to_string())
            }
            code => TransportError::Grpc {
                code: format!("{code:?}"),
                message: status.message().to_string(),
            },
        }
    }
}

impl From<tonic::transport::Error> for TransportError {
    fn from(err: tonic::transport::Error) -> Self {
        TransportError::Unavailable(err.to_string())
    }
}

impl From<arrow_flight::error::FlightError> for TransportError {
    fn from(err: arrow_flight::error::FlightError) -> Self {
        match err {
            arrow_flight::error::FlightError::Tonic(status) => TransportError::from(status),
            other => TransportError::Decode(other.to_string()),
        }
    }
}

impl From<arrow::error::ArrowError> for TransportError {
    fn from(err: arrow::error::ArrowError) -> Self {
        TransportError::Decode(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for ConvertError {
    fn from(err: arrow::error::ArrowError) -> Self {
        ConvertError::ArrowError(err.to_string())
    }
}
