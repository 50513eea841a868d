use alloc::sync::Arc;

use crate::{Error, Range, Result};

/// Opcode requesting a super-range from the controller.
pub const SEQ_ALLOC_SUPER: u32 = 1;

/// Opcode requesting a meta-range from a server.
pub const SEQ_ALLOC_META: u32 = 2;

/// A sequence-manager request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SeqOp {
    /// Regular server → controller: lease a super-range.
    AllocSuper = SEQ_ALLOC_SUPER,
    /// Client → server: lease a meta-range.
    AllocMeta = SEQ_ALLOC_META,
}

impl SeqOp {
    /// The wire opcode.
    pub const fn opcode(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for SeqOp {
    type Error = Error;

    fn try_from(opcode: u32) -> Result<Self> {
        match opcode {
            SEQ_ALLOC_SUPER => Ok(Self::AllocSuper),
            SEQ_ALLOC_META => Ok(Self::AllocMeta),
            other => Err(Error::protocol(format!("unknown opcode {other}"))),
        }
    }
}

/// Request/response channel from a client (or regular server) to the node
/// that grants its ranges.
///
/// Implementations block until the peer replies or the request fails. A
/// transport-level failure should surface as [`Error::Unreachable`]; errors
/// reported by the peer keep their kind.
///
/// A [`ServerSeq`](crate::ServerSeq) is itself a transport, which is how a
/// client talks to a server living in the same process.
pub trait SeqTransport: Send + Sync {
    /// Sends `op` and returns the granted range.
    ///
    /// # Errors
    ///
    /// Returns the peer's error, or [`Error::Unreachable`] if the peer could
    /// not be asked.
    fn query(&self, op: SeqOp) -> Result<Range>;
}

impl<T: SeqTransport + ?Sized> SeqTransport for &T {
    fn query(&self, op: SeqOp) -> Result<Range> {
        (**self).query(op)
    }
}

impl<T: SeqTransport + ?Sized> SeqTransport for Box<T> {
    fn query(&self, op: SeqOp) -> Result<Range> {
        (**self).query(op)
    }
}

impl<T: SeqTransport + ?Sized> SeqTransport for Arc<T> {
    fn query(&self, op: SeqOp) -> Result<Range> {
        (**self).query(op)
    }
}

/// A transport with nobody on the other end.
///
/// Used as the upstream type of a controller, which never asks anyone for
/// ranges.
#[derive(Clone, Copy, Debug, Default)]
pub struct Detached;

impl SeqTransport for Detached {
    fn query(&self, _op: SeqOp) -> Result<Range> {
        Err(Error::Unreachable {
            reason: "no upstream configured".to_string(),
        })
    }
}

/// Checks a range received from a peer before it is adopted.
///
/// An insane range is [`Error::InvalidRange`]. An empty one, or one that
/// starts at sequence 0 (never a sane sequence), violates the protocol.
pub(crate) fn check_grant(range: Range) -> Result<Range> {
    range.check()?;
    if range.is_exhausted() {
        return Err(Error::protocol(format!("empty grant {range}")));
    }
    if range.start == 0 {
        return Err(Error::protocol(format!("grant {range} starts at sequence 0")));
    }
    Ok(range)
}
