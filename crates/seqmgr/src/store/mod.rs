#[cfg(feature = "file-store")]
mod file;
mod interface;
mod memory;

#[cfg_attr(docsrs, doc(cfg(feature = "file-store")))]
#[cfg(feature = "file-store")]
pub use file::*;
pub use interface::*;
pub use memory::*;
