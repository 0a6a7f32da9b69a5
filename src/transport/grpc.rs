//! gRPC Flight transport implementation.
//!
//! Implements `FlightTransport` over tonic using the Arrow Flight service
//! definition. The channel is wrapped with the credential interceptor, so
//! every call issued after the handshake carries the captured session token.

use crate::connection::auth::{
    capture_credential, AuthInterceptor, CapturedCredential, CredentialSlot, WorkloadRouting,
};
use crate::connection::params::ConnectionParams;
use crate::error::TransportError;
use crate::transport::protocol::{FlightTransport, RetrievalTicket};
use arrow::record_batch::RecordBatch;
use arrow_flight::decode::FlightRecordBatchStream;
use arrow_flight::error::FlightError;
use arrow_flight::flight_service_client::FlightServiceClient;
use arrow_flight::{FlightDescriptor, HandshakeRequest};
use async_trait::async_trait;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use futures::{stream, TryStreamExt};
use tonic::metadata::AsciiMetadataValue;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

type InterceptedClient = FlightServiceClient<InterceptedService<Channel, AuthInterceptor>>;

/// Flight transport over a tonic gRPC channel.
pub struct GrpcFlightTransport {
    client: Option<InterceptedClient>,
    slot: CredentialSlot,
}

impl GrpcFlightTransport {
    /// Create a transport with no channel and an empty credential slot.
    pub fn new() -> Self {
        Self {
            client: None,
            slot: CredentialSlot::new(),
        }
    }

    fn client_mut(&mut self) -> Result<&mut InterceptedClient, TransportError> {
        self.client.as_mut().ok_or(TransportError::NotConnected)
    }
}

impl Default for GrpcFlightTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlightTransport for GrpcFlightTransport {
    async fn connect(&mut self, params: &ConnectionParams) -> Result<(), TransportError> {
        let uri = params.endpoint_uri();
        info!("Connecting to Flight server at {}", uri);

        let endpoint =
            Endpoint::from_shared(uri.clone()).map_err(|e| TransportError::InvalidEndpoint {
                uri,
                message: e.to_string(),
            })?;
        let channel = endpoint.connect().await?;

        let interceptor = AuthInterceptor::new(self.slot.clone());
        self.client = Some(FlightServiceClient::with_interceptor(channel, interceptor));
        Ok(())
    }

    async fn handshake(
        &mut self,
        username: &str,
        password: &str,
        routing: Option<WorkloadRouting>,
    ) -> Result<CapturedCredential, TransportError> {
        let basic = BASE64_STANDARD.encode(format!("{username}:{password}"));
        let value: AsciiMetadataValue = format!("Basic {basic}").parse().map_err(|e| {
            TransportError::InvalidMetadata {
                name: "authorization".to_string(),
                message: format!("{e}"),
            }
        })?;

        let mut request = tonic::Request::new(stream::once(async {
            HandshakeRequest {
                protocol_version: 0,
                payload: Default::default(),
            }
        }));
        request.metadata_mut().insert(CapturedCredential::KEY, value);
        if let Some(routing) = routing {
            routing.apply(request.metadata_mut())?;
        }

        debug!("Performing handshake as user '{}'", username);
        let client = self.client_mut()?;
        let response = client.handshake(request).await?;

        let credential = capture_credential(response.metadata())
            .ok_or(TransportError::MissingAuthorizationHeader)?;
        self.slot.store(credential.clone());
        info!("Handshake complete, session credential captured");
        Ok(credential)
    }

    async fn resolve_ticket(&mut self, sql: &str) -> Result<RetrievalTicket, TransportError> {
        debug!("Resolving retrieval ticket for statement");
        let descriptor = FlightDescriptor::new_cmd(sql.to_string());
        let client = self.client_mut()?;
        let info = client.get_flight_info(descriptor).await?.into_inner();

        let endpoint = info.endpoint.into_iter().next().ok_or_else(|| {
            TransportError::InvalidResponse("Flight info contains no endpoints".to_string())
        })?;
        let ticket = endpoint.ticket.ok_or_else(|| {
            TransportError::InvalidResponse("Flight endpoint contains no ticket".to_string())
        })?;
        Ok(RetrievalTicket::new(ticket))
    }

    async fn fetch_stream(
        &mut self,
        ticket: &RetrievalTicket,
    ) -> Result<Vec<RecordBatch>, TransportError> {
        let client = self.client_mut()?;
        let response = client.do_get(ticket.inner().clone()).await?;

        let stream = response
            .into_inner()
            .map_err(|status| FlightError::Tonic(status));
        let batches: Vec<RecordBatch> = FlightRecordBatchStream::new_from_flight_data(stream)
            .try_collect()
            .await?;

        info!("Collected {} record batches", batches.len());
        Ok(batches)
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }
}
