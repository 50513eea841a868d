mod role;
mod seq;

pub use role::*;
pub use seq::*;
