//! Server-side components of the `seqmgr-server` binary.
//!
//! ## Submodules
//!
//! - [`config`] - CLI/environment configuration and its validation.
//! - [`service`] - the gRPC `SeqManager` service.
//! - [`telemetry`] - console logging and optional OpenTelemetry export.

pub mod config;
pub mod service;
pub mod telemetry;
