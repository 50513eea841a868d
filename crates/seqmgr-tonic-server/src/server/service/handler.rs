//! gRPC service implementation for sequence range leasing.
//!
//! [`SeqService`] exposes a [`Server`] allocator through the `SeqManager`
//! service. The allocator is synchronous and may block on disk (every grant
//! is persisted) or on its own upstream controller, so each request runs on
//! Tokio's blocking pool rather than on a runtime worker.

use crate::server::{
    config::{RoleConfig, ServerConfig},
    telemetry::{
        increment_request_errors, increment_requests, increment_sequences_granted,
        record_grant_duration,
    },
};
use anyhow::Context;
use seqmgr_tonic_core::{
    Error,
    proto::{SeqQueryRequest, SeqQueryResponse, seq_manager_server::SeqManager},
    seqmgr::{FileStore, MemoryStore, Role, SeqStatus},
    transport::GrpcTransport,
    types::{Server, Store, Upstream},
};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// The `SeqManager` gRPC service.
///
/// Cloning is cheap; clones serve from the same allocator.
#[derive(Clone)]
pub struct SeqService {
    server: Arc<Server>,
}

impl SeqService {
    pub fn new(server: Server) -> Self {
        Self {
            server: Arc::new(server),
        }
    }

    /// Opens the configured store and brings the allocator up.
    ///
    /// A regular server dials its controller on first use. On a first run
    /// that happens here, to lease the initial super-range. A server with
    /// saved state comes up even while its controller is down.
    pub async fn start(config: &ServerConfig) -> anyhow::Result<Self> {
        let store: Store = match &config.state_path {
            Some(path) => Box::new(FileStore::new(path)),
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!("STATE_PATH is unset; grants will not survive a restart");
                Box::new(MemoryStore::new())
            }
        };

        let role: Role<Upstream> = match &config.role {
            RoleConfig::Controller => Role::Controller,
            RoleConfig::Regular { controller_url } => {
                let transport = GrpcTransport::connect_lazy(
                    controller_url.clone(),
                    tokio::runtime::Handle::current(),
                )
                .with_context(|| format!("bad controller url {controller_url}"))?;
                Role::Regular(Box::new(transport))
            }
        };

        let seq = config.seq.clone();
        let server = tokio::task::spawn_blocking(move || Server::new(role, store, seq))
            .await?
            .context("can't initialize sequence server")?;
        Ok(Self::new(server))
    }

    /// Whether the allocator can still grant.
    pub fn status(&self) -> Result<SeqStatus, Error> {
        Ok(self.server.status()?)
    }

    /// Stops serving grants and saves the final state.
    ///
    /// Requests arriving afterwards are answered with `UNAVAILABLE`.
    pub async fn shutdown(&self) -> Result<(), Error> {
        let server = Arc::clone(&self.server);
        tokio::task::spawn_blocking(move || server.finalize())
            .await
            .map_err(|e| Error::TaskError {
                context: e.to_string(),
            })??;
        Ok(())
    }

    async fn grant(&self, opcode: u32) -> Result<SeqQueryResponse, Error> {
        let server = Arc::clone(&self.server);
        let range = tokio::task::spawn_blocking(move || server.handle(opcode))
            .await
            .map_err(|e| Error::TaskError {
                context: e.to_string(),
            })??;
        Ok(range.into())
    }
}

#[tonic::async_trait]
impl SeqManager for SeqService {
    /// Serves one `ALLOC_SUPER` or `ALLOC_META` request.
    ///
    /// If `metrics` is enabled, emits telemetry for:
    /// - request rate
    /// - sequences granted
    /// - grant duration
    /// - errors, by status code
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(opcode = req.get_ref().opcode)))]
    async fn query(
        &self,
        req: Request<SeqQueryRequest>,
    ) -> Result<Response<SeqQueryResponse>, Status> {
        let start = std::time::Instant::now();
        let opcode = req.into_inner().opcode;
        increment_requests();

        match self.grant(opcode).await {
            Ok(reply) => {
                increment_sequences_granted(reply.end - reply.start, opcode);
                record_grant_duration(start.elapsed().as_secs_f64() * 1000.0);
                Ok(Response::new(reply))
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                match &e {
                    Error::Seq(seqmgr_tonic_core::seqmgr::Error::OutOfSpace) => {
                        tracing::error!("sequence space exhausted");
                    }
                    _ => tracing::warn!(error = %e, "grant failed"),
                }
                let status = Status::from(e);
                increment_request_errors(status.code());
                Err(status)
            }
        }
    }
}
