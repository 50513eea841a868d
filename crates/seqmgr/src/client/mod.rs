mod seq;
mod upstream;
#[cfg(test)]
mod tests;

pub use seq::*;
pub use upstream::*;
