#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Range, Result,
    transport::{SeqOp, SeqTransport, check_grant},
};

/// A regular server's view of the controller.
///
/// Stateless apart from the transport: the leased super-range is owned and
/// persisted by the [`ServerSeq`] using this client, which also serializes
/// every call under its own lock.
///
/// [`ServerSeq`]: crate::ServerSeq
#[derive(Clone, Debug)]
pub struct SuperClient<T> {
    transport: T,
}

impl<T> SuperClient<T>
where
    T: SeqTransport,
{
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Leases a new super-range from the controller.
    ///
    /// # Errors
    ///
    /// [`OutOfSpace`](crate::Error::OutOfSpace) once the controller's window
    /// is used up, transport errors as reported by `T`, and
    /// [`Protocol`](crate::Error::Protocol) or
    /// [`InvalidRange`](crate::Error::InvalidRange) for a malformed grant.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn alloc_super(&self) -> Result<Range> {
        let range = self
            .transport
            .query(SeqOp::AllocSuper)
            .and_then(check_grant)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(range = %range, "allocated super-sequence");

        Ok(range)
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }
}
