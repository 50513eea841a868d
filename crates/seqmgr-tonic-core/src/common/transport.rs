//! gRPC implementation of [`SeqTransport`].
//!
//! The allocators in [`seqmgr`] are synchronous, so [`GrpcTransport`] drives
//! each unary call to completion on a Tokio runtime handle. Call it from a
//! plain thread or from inside `tokio::task::spawn_blocking`, never from an
//! async task: blocking a runtime worker on itself panics. The runtime must be
//! multi-threaded so its workers keep the connection moving while the caller
//! blocks.

use crate::{
    Error,
    error::status_to_seq_error,
    proto::{SeqQueryRequest, SeqQueryResponse, seq_manager_client::SeqManagerClient},
};
use core::time::Duration;
use seqmgr::{Range, SeqOp, SeqTransport};
use tokio::runtime::Handle;
use tonic::transport::{Channel, Endpoint};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A blocking [`SeqTransport`] over a tonic channel.
#[derive(Clone, Debug)]
pub struct GrpcTransport {
    client: SeqManagerClient<Channel>,
    runtime: Handle,
}

impl GrpcTransport {
    /// Wraps an established channel. Calls are driven on `runtime`.
    pub fn new(channel: Channel, runtime: Handle) -> Self {
        Self {
            client: SeqManagerClient::new(channel),
            runtime,
        }
    }

    /// Connects to `url` and drives later calls on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for a malformed URL and
    /// [`seqmgr::Error::Unreachable`] if the peer cannot be reached.
    pub async fn connect(url: impl Into<String>) -> Result<Self, Error> {
        let channel = endpoint(url)?.connect().await.map_err(|e| {
            Error::Seq(seqmgr::Error::Unreachable {
                reason: e.to_string(),
            })
        })?;
        Ok(Self::new(channel, Handle::current()))
    }

    /// Like [`connect`](Self::connect), but defers dialing to the first call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for a malformed URL.
    pub fn connect_lazy(url: impl Into<String>, runtime: Handle) -> Result<Self, Error> {
        let endpoint = endpoint(url)?;
        let channel = {
            let _guard = runtime.enter();
            endpoint.connect_lazy()
        };
        Ok(Self::new(channel, runtime))
    }
}

fn endpoint(url: impl Into<String>) -> Result<Endpoint, Error> {
    let url = url.into();
    let endpoint = Endpoint::from_shared(url.clone()).map_err(|e| Error::InvalidRequest {
        reason: format!("bad url {url}: {e}"),
    })?;
    Ok(endpoint
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT))
}

impl SeqTransport for GrpcTransport {
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    fn query(&self, op: SeqOp) -> seqmgr::Result<Range> {
        let mut client = self.client.clone();
        let request = SeqQueryRequest {
            opcode: op.opcode(),
        };
        let response = self
            .runtime
            .block_on(client.query(request))
            .map_err(|status| {
                #[cfg(feature = "tracing")]
                tracing::warn!(code = ?status.code(), message = status.message(), "query failed");
                status_to_seq_error(&status)
            })?;
        range_from_response(&response.into_inner())
    }
}

/// Converts a wire reply into a [`Range`].
///
/// # Errors
///
/// A reply with `start > end` is a [`seqmgr::Error::Protocol`] violation.
pub fn range_from_response(response: &SeqQueryResponse) -> seqmgr::Result<Range> {
    Range::try_new(response.start, response.end).map_err(|_| seqmgr::Error::Protocol {
        reason: format!(
            "malformed reply [{:#x}-{:#x})",
            response.start, response.end
        ),
    })
}

impl From<Range> for SeqQueryResponse {
    fn from(range: Range) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}
