//! Transport abstraction trait.
//!
//! This module defines the `FlightTransport` trait that abstracts the
//! underlying Flight RPC mechanism. The gRPC implementation lives in
//! `transport::grpc`; tests substitute mock implementations.

use crate::connection::auth::{CapturedCredential, WorkloadRouting};
use crate::connection::params::ConnectionParams;
use crate::error::TransportError;
use arrow::record_batch::RecordBatch;
use arrow_flight::Ticket;
use async_trait::async_trait;

/// Opaque retrieval ticket resolved for one SQL statement.
///
/// Tickets are not reusable across statements; a ticket is consumed by the
/// stream that fetches its result set.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalTicket {
    ticket: Ticket,
}

impl RetrievalTicket {
    pub(crate) fn new(ticket: Ticket) -> Self {
        Self { ticket }
    }

    /// Raw ticket bytes as issued by the server.
    pub fn as_bytes(&self) -> &[u8] {
        self.ticket.ticket.as_ref()
    }

    pub(crate) fn inner(&self) -> &Ticket {
        &self.ticket
    }
}

/// Transport trait for Flight communication.
///
/// This trait abstracts the wire protocol behind the session lifecycle,
/// allowing different implementations (gRPC in production, mocks in tests).
#[async_trait]
pub trait FlightTransport: Send + Sync {
    /// Connect to the Flight server.
    ///
    /// Builds the channel and registers the credential interceptor.
    /// Connection establishment is eager.
    ///
    /// # Arguments
    ///
    /// * `params` - Connection parameters
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the endpoint URI is invalid or the server
    /// cannot be reached.
    async fn connect(&mut self, params: &ConnectionParams) -> Result<(), TransportError>;

    /// Perform the authentication handshake.
    ///
    /// Sends Basic credentials (plus optional workload routing headers) and
    /// captures the `authorization` header from the response.
    ///
    /// # Arguments
    ///
    /// * `username` - Account username
    /// * `password` - Account password
    /// * `routing` - Optional workload routing hints
    ///
    /// # Returns
    ///
    /// The captured credential on success. Implementations also store it for
    /// injection into subsequent calls.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the server is unreachable, rejects the
    /// credentials, or omits the authorization header from its response.
    async fn handshake(
        &mut self,
        username: &str,
        password: &str,
        routing: Option<WorkloadRouting>,
    ) -> Result<CapturedCredential, TransportError>;

    /// Resolve a SQL statement into a retrieval ticket.
    ///
    /// # Arguments
    ///
    /// * `sql` - SQL statement to resolve
    ///
    /// # Returns
    ///
    /// The ticket of the first endpoint described by the server.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if resolution fails or the server response
    /// contains no usable endpoint.
    async fn resolve_ticket(&mut self, sql: &str) -> Result<RetrievalTicket, TransportError>;

    /// Stream the result set for a ticket and collect it into record batches.
    ///
    /// # Arguments
    ///
    /// * `ticket` - Retrieval ticket from `resolve_ticket`
    ///
    /// # Returns
    ///
    /// All record batches of the result set, in stream order.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the stream fails or the data cannot be
    /// decoded.
    async fn fetch_stream(
        &mut self,
        ticket: &RetrievalTicket,
    ) -> Result<Vec<RecordBatch>, TransportError>;

    /// Check whether a channel has been established.
    fn is_connected(&self) -> bool;
}
