//! Connection management for Flight server sessions.
//!
//! This module provides connection parameter resolution, handshake
//! authentication, and session lifecycle management.
//!
//! # Example
//!
//! ```no_run
//! # use lakeflight::connection::{ConnectionBuilder, Session};
//! # async fn example() -> Result<(), lakeflight::LakeflightError> {
//! // Explicit values win over environment variables and defaults
//! let params = ConnectionBuilder::new()
//!     .host("127.0.0.1")
//!     .port(32010)
//!     .username("analyst")
//!     .password("secret")
//!     .build()?;
//!
//! let mut session = Session::new(params);
//! session.connect().await?;
//! session.authenticate(None).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod params;
pub mod session;

pub use auth::{AuthInterceptor, CapturedCredential, CredentialSlot, WorkloadRouting};
pub use params::{ConnectionBuilder, ConnectionParams, TransportScheme};
pub use session::{run_query, RunQueryOptions, Session, SessionState};
