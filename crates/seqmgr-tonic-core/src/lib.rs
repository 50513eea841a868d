#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Public re-export so downstream crates can access `seqmgr` via
// `seqmgr_tonic_core::seqmgr`
pub use seqmgr;

/// Generated protobuf messages and gRPC client/server stubs.
pub mod proto {
    tonic::include_proto!("seqmgr");

    /// Encoded file descriptor set, for gRPC reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("seqmgr_descriptor");
}
