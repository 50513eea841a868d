#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod client;
mod config;
mod error;
mod fid;
mod mutex;
mod range;
mod server;
mod store;
mod transport;

pub use crate::client::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::fid::*;
pub use crate::range::*;
pub use crate::server::*;
pub use crate::store::*;
pub use crate::transport::*;
