//! gRPC service implementation.
//!
//! ## Structure
//!
//! - [`handler`] - the `SeqManager` service (`SeqService`), which runs each
//!   request against the allocator on the blocking pool.

pub mod handler;
