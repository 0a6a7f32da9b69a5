//! Credential capture and injection for Flight sessions.
//!
//! The server returns a session token in the `authorization` header of the
//! handshake response. This module captures that header into a shared slot
//! and attaches it to every subsequent call through a gRPC interceptor.

use crate::error::TransportError;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tonic::metadata::{AsciiMetadataValue, MetadataMap};
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Metadata key carrying the routing tag during the handshake.
pub const ROUTING_TAG_HEADER: &str = "routing-tag";
/// Metadata key carrying the routing queue during the handshake.
pub const ROUTING_QUEUE_HEADER: &str = "routing-queue";

/// The `authorization` header value captured from a handshake response,
/// typically `Bearer <token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedCredential {
    value: AsciiMetadataValue,
}

impl CapturedCredential {
    /// Metadata key the credential was captured under and is re-attached as.
    pub const KEY: &'static str = "authorization";

    pub(crate) fn new(value: AsciiMetadataValue) -> Self {
        Self { value }
    }

    /// Raw header value bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }

    pub(crate) fn metadata_value(&self) -> &AsciiMetadataValue {
        &self.value
    }
}

// Prevent the session token from being displayed in debug output
impl fmt::Debug for CapturedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedCredential")
            .field("key", &Self::KEY)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Shared slot holding the most recently captured credential.
///
/// The slot starts empty. Each handshake overwrites it, last write wins.
/// Clones share the same underlying storage, so interceptors created before
/// authentication observe credentials stored later.
#[derive(Debug, Clone, Default)]
pub struct CredentialSlot {
    inner: Arc<RwLock<Option<CapturedCredential>>>,
}

impl CredentialSlot {
    /// Create a new, empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored credential.
    pub fn store(&self, credential: CapturedCredential) {
        *self.inner.write() = Some(credential);
    }

    /// Clone out the current credential, if any.
    pub fn get(&self) -> Option<CapturedCredential> {
        self.inner.read().clone()
    }

    /// Whether no credential has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_none()
    }
}

/// Interceptor attaching the captured credential to outgoing requests.
///
/// Injection never fails and never blocks: an empty slot leaves the request
/// untouched, and a request that already carries an `authorization` header
/// (the handshake's own Basic header) is passed through unchanged.
#[derive(Debug, Clone)]
pub struct AuthInterceptor {
    slot: CredentialSlot,
}

impl AuthInterceptor {
    pub(crate) fn new(slot: CredentialSlot) -> Self {
        Self { slot }
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if request.metadata().get(CapturedCredential::KEY).is_none() {
            if let Some(credential) = self.slot.get() {
                request
                    .metadata_mut()
                    .insert(CapturedCredential::KEY, credential.metadata_value().clone());
            }
        }
        Ok(request)
    }
}

/// Scan response metadata for the `authorization` header.
///
/// tonic lowercases metadata keys on receipt, so the lookup is
/// case-insensitive with respect to what the server sent. Only the first
/// value is taken when the header is repeated.
pub(crate) fn capture_credential(metadata: &MetadataMap) -> Option<CapturedCredential> {
    metadata
        .get(CapturedCredential::KEY)
        .cloned()
        .map(CapturedCredential::new)
}

/// Workload routing hints forwarded with the handshake.
///
/// The server expects the tag and queue together; representing them as one
/// struct makes a partial pair unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadRouting {
    /// Routing tag identifying the workload
    pub tag: String,
    /// Execution queue the workload should land on
    pub queue: String,
}

impl WorkloadRouting {
    /// Create routing hints from a tag and queue pair.
    pub fn new(tag: &str, queue: &str) -> Self {
        Self {
            tag: tag.to_string(),
            queue: queue.to_string(),
        }
    }

    /// Attach both routing headers to outgoing request metadata.
    pub(crate) fn apply(&self, metadata: &mut MetadataMap) -> Result<(), TransportError> {
        let tag = self.tag.parse::<AsciiMetadataValue>().map_err(|e| {
            TransportError::InvalidMetadata {
                name: "routing_tag".to_string(),
                message: e.to_string(),
            }
        })?;
        let queue = self.queue.parse::<AsciiMetadataValue>().map_err(|e| {
            TransportError::InvalidMetadata {
                name: "routing_queue".to_string(),
                message: e.to_string(),
            }
        })?;

        metadata.insert(ROUTING_TAG_HEADER, tag);
        metadata.insert(ROUTING_QUEUE_HEADER, queue);
        Ok(())
    }
}
