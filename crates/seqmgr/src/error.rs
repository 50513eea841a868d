use core::fmt;

use crate::store::StoreError;

/// A result type defaulting to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `seqmgr` can emit.
///
/// Errors returned from a live allocation call never leave a half-carved
/// range behind: the allocator state is either advanced and the grant is
/// returned, or left untouched and the error is returned.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// A range with `start > end` was observed. This is a corruption or
    /// programming error and should never occur under correct operation.
    InvalidRange {
        /// Offending start.
        start: u64,
        /// Offending end.
        end: u64,
    },

    /// The controller window is exhausted. No further super-ranges can be
    /// granted from this space.
    OutOfSpace,

    /// The server or controller could not be reached.
    Unreachable {
        /// Transport-level description of the failure.
        reason: String,
    },

    /// The peer sent or requested something the protocol does not allow,
    /// such as an unknown opcode or `ALLOC_SUPER` sent to a regular server.
    Protocol {
        /// What was violated.
        reason: String,
    },

    /// Loading or saving the persisted watermark failed.
    Persistence(StoreError),

    /// The allocator was finalized and no longer grants ranges.
    Shutdown,

    /// A [`SeqConfig`](crate::SeqConfig) failed validation.
    InvalidConfig {
        /// Which constraint was violated.
        reason: String,
    },

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    LockPoisoned,
}

impl Error {
    pub(crate) fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidRange { start, end } => {
                write!(fmt, "invalid range [{start:#x}-{end:#x})")
            }
            Self::OutOfSpace => fmt.write_str("sequence space is exhausted"),
            Self::Unreachable { reason } => write!(fmt, "peer unreachable: {reason}"),
            Self::Protocol { reason } => write!(fmt, "protocol error: {reason}"),
            Self::Persistence(e) => write!(fmt, "persistence failure: {e}"),
            Self::Shutdown => fmt.write_str("allocator is finalized"),
            Self::InvalidConfig { reason } => write!(fmt, "invalid config: {reason}"),
            #[cfg(not(feature = "parking-lot"))]
            Self::LockPoisoned => fmt.write_str("lock poisoned"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Persistence(err)
    }
}

#[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
#[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
#[cfg(not(feature = "parking-lot"))]
// Convert all poisoned lock errors to a simplified `LockPoisoned`
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
