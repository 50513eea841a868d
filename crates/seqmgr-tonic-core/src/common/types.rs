//! # Shared Types and Constants
//!
//! Type aliases that pin the generic allocators of [`seqmgr`] to the
//! concrete store and transport choices used by the gRPC service, so the
//! server and client binaries agree on one set of types.
//!
//! - [`Store`] - Any persistence adapter, chosen at runtime
//! - [`Upstream`] - The channel a regular server leases super-ranges over
//! - [`Server`] - The allocator behind the gRPC service
//! - [`Client`] - A client minting FIDs against a remote server

use crate::transport::GrpcTransport;
use seqmgr::{ClientSeq, SeqStore, SeqTransport, ServerSeq};

/// Persistence adapter selected at startup (file or memory).
pub type Store = Box<dyn SeqStore>;

/// Upstream transport of a server. Unused by the controller.
pub type Upstream = Box<dyn SeqTransport>;

/// The allocator served over gRPC.
pub type Server = ServerSeq<Store, Upstream>;

/// A FID client talking to a remote server.
pub type Client = ClientSeq<GrpcTransport>;

/// The number of bytes in a serialized [`seqmgr::Fid`].
pub const FID_SIZE: usize = seqmgr::FID_SIZE;

/// Default listen address of the service.
pub const DEFAULT_ADDR: &str = "127.0.0.1:50051";
