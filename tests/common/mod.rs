//! Common test utilities for lakeflight integration tests.
//!
//! Integration tests run against an in-process Flight fixture server bound
//! to an ephemeral localhost port. No external service is required; each
//! test spawns its own server, and the server task ends with the test
//! process.
//!
//! # Fixture Data
//!
//! The server exposes one table, `employees`, with five rows:
//!
//! | Column         | Arrow type             | Nullable |
//! |----------------|------------------------|----------|
//! | `id`           | Int64                  | no       |
//! | `name`         | Utf8                   | no       |
//! | `phone_number` | Utf8                   | yes      |
//! | `hire_date`    | Date32                 | yes      |
//! | `last_login`   | Timestamp(Microsecond) | yes      |
//!
//! # Authentication
//!
//! The handshake accepts exactly [`TEST_USERNAME`] / [`TEST_PASSWORD`] as
//! Basic credentials and returns a fresh `Bearer fixture-token-N` in the
//! response `authorization` header. Every data call must present a token
//! issued by a previous handshake. [`FixtureOptions`] can put the server
//! into a mode that completes handshakes without returning the header.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arrow::array::{Array, Date32Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Date32Type, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use arrow_flight::encode::FlightDataEncoderBuilder;
use arrow_flight::flight_service_server::{FlightService, FlightServiceServer};
use arrow_flight::{
    Action, ActionType, Criteria, Empty, FlightData, FlightDescriptor, FlightEndpoint, FlightInfo,
    HandshakeRequest, HandshakeResponse, PollInfo, PutResult, SchemaResult, Ticket,
};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use lakeflight::{ConnectionBuilder, ConnectionParams};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::metadata::MetadataMap;
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};

// ============================================================================
// Fixture Credentials and Constants
// ============================================================================

/// Username accepted by the fixture server handshake.
pub const TEST_USERNAME: &str = "test_username";

/// Password accepted by the fixture server handshake.
pub const TEST_PASSWORD: &str = "test_password123";

/// Ticket payload handed out for the employees table.
pub const EMPLOYEES_TICKET: &str = "employees-scan";

/// Prefix of every bearer token issued by the fixture handshake.
pub const TOKEN_PREFIX: &str = "Bearer fixture-token-";

// ============================================================================
// Fixture Data
// ============================================================================

/// Arrow schema of the `employees` fixture table.
pub fn employee_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("phone_number", DataType::Utf8, true),
        Field::new("hire_date", DataType::Date32, true),
        Field::new(
            "last_login",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        ),
    ])
}

/// The five-row `employees` fixture batch.
pub fn employee_batch() -> RecordBatch {
    RecordBatch::try_new(
        Arc::new(employee_schema()),
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])),
            Arc::new(StringArray::from(vec![
                "Alice Archer",
                "Basil Okoye",
                "Carla Mendes",
                "Dmitri Sokolov",
                "Eun-ji Park",
            ])),
            Arc::new(StringArray::from(vec![
                Some("555-0100"),
                Some("555-0101"),
                None,
                Some("555-0103"),
                Some("555-0104"),
            ])),
            Arc::new(Date32Array::from(vec![
                Some(date32(2015, 3, 2)),
                Some(date32(2018, 11, 20)),
                Some(date32(2020, 1, 6)),
                None,
                Some(date32(2023, 7, 31)),
            ])),
            Arc::new(TimestampMicrosecondArray::from(vec![
                Some(micros(2024, 1, 5, 9, 30, 0)),
                None,
                Some(micros(2024, 2, 29, 23, 59, 59)),
                Some(micros(2024, 3, 1, 0, 0, 0)),
                Some(micros(2024, 4, 18, 12, 15, 42)),
            ])),
        ],
    )
    .expect("fixture batch is well formed")
}

fn date32(year: i32, month: u32, day: u32) -> i32 {
    Date32Type::from_naive_date(NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

fn micros(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, min, sec)
        .unwrap()
        .and_utc()
        .timestamp_micros()
}

// ============================================================================
// Fixture Flight Service
// ============================================================================

/// Routing headers observed on one handshake call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingCapture {
    pub tag: Option<String>,
    pub queue: Option<String>,
}

/// Counters and captures shared between a fixture server and its test.
#[derive(Default)]
struct FixtureState {
    handshake_count: AtomicUsize,
    routing_log: Mutex<Vec<RoutingCapture>>,
}

/// In-process Flight service backing the integration tests.
struct FixtureFlight {
    state: Arc<FixtureState>,
    omit_authorization_header: bool,
    empty_flight_info: bool,
}

fn header_value(metadata: &MetadataMap, name: &str) -> Option<String> {
    metadata
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn decode_basic(metadata: &MetadataMap) -> Result<(String, String), Status> {
    let value = header_value(metadata, "authorization")
        .ok_or_else(|| Status::unauthenticated("No authorization header"))?;
    let encoded = value
        .strip_prefix("Basic ")
        .ok_or_else(|| Status::unauthenticated("Expected Basic authorization"))?;
    let decoded = BASE64_STANDARD
        .decode(encoded)
        .map_err(|_| Status::unauthenticated("Credentials are not valid base64"))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| Status::unauthenticated("Credentials are not valid utf8"))?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| Status::unauthenticated("Malformed Basic credentials"))?;
    Ok((username.to_string(), password.to_string()))
}

fn check_bearer(metadata: &MetadataMap) -> Result<(), Status> {
    let value = header_value(metadata, "authorization")
        .ok_or_else(|| Status::unauthenticated("No authorization header"))?;
    if !value.starts_with(TOKEN_PREFIX) {
        return Err(Status::unauthenticated("Expected a fixture bearer token"));
    }
    Ok(())
}

#[tonic::async_trait]
impl FlightService for FixtureFlight {
    type HandshakeStream = BoxStream<'static, Result<HandshakeResponse, Status>>;
    type ListFlightsStream = BoxStream<'static, Result<FlightInfo, Status>>;
    type DoGetStream = BoxStream<'static, Result<FlightData, Status>>;
    type DoPutStream = BoxStream<'static, Result<PutResult, Status>>;
    type DoActionStream = BoxStream<'static, Result<arrow_flight::Result, Status>>;
    type ListActionsStream = BoxStream<'static, Result<ActionType, Status>>;
    type DoExchangeStream = BoxStream<'static, Result<FlightData, Status>>;

    /// Validate Basic credentials and issue a fresh bearer token.
    async fn handshake(
        &self,
        request: Request<Streaming<HandshakeRequest>>,
    ) -> Result<Response<Self::HandshakeStream>, Status> {
        let count = self.state.handshake_count.fetch_add(1, Ordering::SeqCst) + 1;

        let metadata = request.metadata();
        self.state.routing_log.lock().push(RoutingCapture {
            tag: header_value(metadata, "routing-tag"),
            queue: header_value(metadata, "routing-queue"),
        });

        let (username, password) = decode_basic(metadata)?;
        if username != TEST_USERNAME || password != TEST_PASSWORD {
            return Err(Status::unauthenticated("Invalid username or password"));
        }

        let reply = HandshakeResponse {
            protocol_version: 0,
            payload: Default::default(),
        };
        let stream = stream::once(async { Ok(reply) }).boxed();

        let mut response = Response::new(stream);
        if !self.omit_authorization_header {
            let token = format!("{TOKEN_PREFIX}{count}");
            response
                .metadata_mut()
                .insert("authorization", token.parse().expect("token is ascii"));
        }
        Ok(response)
    }

    /// Resolve a query against the employees table into a ticket.
    async fn get_flight_info(
        &self,
        request: Request<FlightDescriptor>,
    ) -> Result<Response<FlightInfo>, Status> {
        check_bearer(request.metadata())?;

        let descriptor = request.into_inner();
        let sql = String::from_utf8_lossy(&descriptor.cmd).to_string();
        if !sql.contains("employees") {
            return Err(Status::not_found(format!("Table not found: {}", sql)));
        }

        let info = FlightInfo::new()
            .with_descriptor(descriptor)
            .try_with_schema(&employee_schema())
            .map_err(|e| Status::internal(e.to_string()))?;
        if self.empty_flight_info {
            return Ok(Response::new(info));
        }

        let info =
            info.with_endpoint(FlightEndpoint::new().with_ticket(Ticket::new(EMPLOYEES_TICKET)));
        Ok(Response::new(info))
    }

    /// Stream the employees batch for a known ticket.
    async fn do_get(
        &self,
        request: Request<Ticket>,
    ) -> Result<Response<Self::DoGetStream>, Status> {
        check_bearer(request.metadata())?;

        let ticket = request.into_inner();
        if ticket.ticket.as_ref() != EMPLOYEES_TICKET.as_bytes() {
            return Err(Status::not_found("Unknown ticket"));
        }

        let batch = employee_batch();
        let stream = FlightDataEncoderBuilder::new()
            .with_schema(batch.schema())
            .build(stream::iter(vec![Ok(batch)]))
            .map_err(|e| Status::internal(e.to_string()));

        Ok(Response::new(stream.boxed()))
    }

    async fn list_flights(
        &self,
        _request: Request<Criteria>,
    ) -> Result<Response<Self::ListFlightsStream>, Status> {
        Err(Status::unimplemented("list_flights is not supported"))
    }

    async fn poll_flight_info(
        &self,
        _request: Request<FlightDescriptor>,
    ) -> Result<Response<PollInfo>, Status> {
        Err(Status::unimplemented("poll_flight_info is not supported"))
    }

    async fn get_schema(
        &self,
        _request: Request<FlightDescriptor>,
    ) -> Result<Response<SchemaResult>, Status> {
        Err(Status::unimplemented("get_schema is not supported"))
    }

    async fn do_put(
        &self,
        _request: Request<Streaming<FlightData>>,
    ) -> Result<Response<Self::DoPutStream>, Status> {
        Err(Status::unimplemented("do_put is not supported"))
    }

    async fn do_action(
        &self,
        _request: Request<Action>,
    ) -> Result<Response<Self::DoActionStream>, Status> {
        Err(Status::unimplemented("do_action is not supported"))
    }

    async fn list_actions(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<Self::ListActionsStream>, Status> {
        Err(Status::unimplemented("list_actions is not supported"))
    }

    async fn do_exchange(
        &self,
        _request: Request<Streaming<FlightData>>,
    ) -> Result<Response<Self::DoExchangeStream>, Status> {
        Err(Status::unimplemented("do_exchange is not supported"))
    }
}

// ============================================================================
// Fixture Server Lifecycle
// ============================================================================

/// Options controlling fixture server behavior.
#[derive(Debug, Clone, Default)]
pub struct FixtureOptions {
    /// Complete handshakes without returning an `authorization` header.
    pub omit_authorization_header: bool,
    /// Answer `GetFlightInfo` with a flight info carrying no endpoints.
    pub empty_flight_info: bool,
}

/// Handle to a running fixture server.
pub struct FixtureServer {
    /// Host the server is bound to.
    pub host: String,
    /// Ephemeral port the server is bound to.
    pub port: u16,
    state: Arc<FixtureState>,
}

impl FixtureServer {
    /// Number of handshake calls the server has observed.
    pub fn handshake_count(&self) -> usize {
        self.state.handshake_count.load(Ordering::SeqCst)
    }

    /// Routing headers observed on each handshake, in call order.
    pub fn routing_log(&self) -> Vec<RoutingCapture> {
        self.state.routing_log.lock().clone()
    }

    /// Connection parameters pointing at this server with valid credentials.
    pub fn params(&self) -> ConnectionParams {
        ConnectionBuilder::new()
            .host(&self.host)
            .port(self.port)
            .username(TEST_USERNAME)
            .password(TEST_PASSWORD)
            .build()
            .expect("fixture parameters are valid")
    }
}

/// Spawn a fixture server with default behavior on an ephemeral port.
pub async fn spawn_fixture() -> FixtureServer {
    spawn_fixture_with(FixtureOptions::default()).await
}

/// Spawn a fixture server with explicit options on an ephemeral port.
///
/// The listener is bound before this function returns, so clients can
/// connect immediately even if the accept loop has not been polled yet.
pub async fn spawn_fixture_with(options: FixtureOptions) -> FixtureServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture listener");
    let addr = listener.local_addr().expect("fixture listener address");

    let state = Arc::new(FixtureState::default());
    let service = FixtureFlight {
        state: Arc::clone(&state),
        omit_authorization_header: options.omit_authorization_header,
        empty_flight_info: options.empty_flight_info,
    };

    tokio::spawn(async move {
        Server::builder()
            .add_service(FlightServiceServer::new(service))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
    });

    FixtureServer {
        host: addr.ip().to_string(),
        port: addr.port(),
        state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_batch_shape() {
        let batch = employee_batch();
        assert_eq!(batch.num_rows(), 5);
        assert_eq!(batch.num_columns(), 5);
        assert_eq!(batch.schema().field(3).data_type(), &DataType::Date32);
        assert_eq!(batch.column(2).null_count(), 1);
    }

    #[test]
    fn test_decode_basic_roundtrip() {
        let mut metadata = MetadataMap::new();
        let basic = BASE64_STANDARD.encode(format!("{}:{}", TEST_USERNAME, TEST_PASSWORD));
        metadata.insert("authorization", format!("Basic {}", basic).parse().unwrap());

        let (username, password) = decode_basic(&metadata).unwrap();
        assert_eq!(username, TEST_USERNAME);
        assert_eq!(password, TEST_PASSWORD);
    }

    #[test]
    fn test_check_bearer_rejects_basic_credentials() {
        let mut metadata = MetadataMap::new();
        metadata.insert("authorization", "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(check_bearer(&metadata).is_err());

        metadata.insert(
            "authorization",
            "Bearer fixture-token-1".parse().unwrap(),
        );
        assert!(check_bearer(&metadata).is_ok());
    }
}
