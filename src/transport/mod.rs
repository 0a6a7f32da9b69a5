//! Transport layer for Flight server communication.
//!
//! This module provides the transport abstraction and its gRPC
//! implementation for speaking the Flight RPC lifecycle.
//!
//! # Architecture
//!
//! The transport layer is organized into:
//! - `protocol` - Transport trait and retrieval ticket type
//! - `grpc` - Flight-over-gRPC transport implementation
//!
//! # Example
//!
//! ```no_run
//! use lakeflight::connection::ConnectionBuilder;
//! use lakeflight::transport::{FlightTransport, GrpcFlightTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut transport = GrpcFlightTransport::new();
//!
//! // Connect
//! let params = ConnectionBuilder::new()
//!     .host("127.0.0.1")
//!     .username("analyst")
//!     .password("secret")
//!     .build()?;
//! transport.connect(&params).await?;
//!
//! // Authenticate and retrieve
//! let credential = transport.handshake("analyst", "secret", None).await?;
//! println!("captured {} credential bytes", credential.as_bytes().len());
//!
//! let ticket = transport.resolve_ticket("SELECT * FROM my_table").await?;
//! let batches = transport.fetch_stream(&ticket).await?;
//! println!("collected {} batches", batches.len());
//! # Ok(())
//! # }
//! ```

pub mod grpc;
pub mod protocol;

// Re-export commonly used types
pub use grpc::GrpcFlightTransport;
pub use protocol::{FlightTransport, RetrievalTicket};
