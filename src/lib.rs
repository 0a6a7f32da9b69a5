//! # lakeflight
//!
//! Arrow Flight client for analytic query engines: session authentication,
//! retrieval ticket resolution, and record batch streaming.
//!
//! The client drives the Flight RPC lifecycle end to end. A handshake
//! exchanges username and password for a session credential, which an
//! interceptor then attaches to every call on the channel. `GetFlightInfo`
//! resolves a SQL statement into a retrieval ticket, and `DoGet` streams the
//! result set as Arrow record batches collected into a [`ResultTable`].
//!
//! ## Example
//!
//! ```no_run
//! # use lakeflight::*;
//! # async fn example() -> Result<(), LakeflightError> {
//! // Unset fields fall back to LAKEFLIGHT_* environment variables
//! let params = ConnectionParams::builder()
//!     .host("127.0.0.1")
//!     .username("analyst")
//!     .password("secret")
//!     .build()?;
//!
//! // Connect, authenticate, and query in one call
//! let mut session = Session::new(params);
//! let table = session
//!     .query(
//!         "SELECT * FROM samples.employees",
//!         Some("hire_date"),
//!         Some("%Y-%m-%d"),
//!     )
//!     .await?;
//!
//! for batch in table.batches() {
//!     println!("Rows: {}", batch.num_rows());
//! }
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod connection;
pub mod error;
pub mod query;
pub mod transport;

// Re-export public API
pub use connection::{
    run_query, AuthInterceptor, CapturedCredential, ConnectionBuilder, ConnectionParams,
    CredentialSlot, RunQueryOptions, Session, SessionState, TransportScheme, WorkloadRouting,
};
pub use error::{ConnectionError, ConvertError, LakeflightError, QueryError, TransportError};
pub use query::ResultTable;
pub use transport::{FlightTransport, GrpcFlightTransport, RetrievalTicket};
