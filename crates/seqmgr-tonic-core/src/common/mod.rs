pub mod error;
pub mod transport;
pub mod types;

pub use error::*;
