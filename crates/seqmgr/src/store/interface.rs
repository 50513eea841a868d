use core::fmt;

use crate::Range;

/// The durable part of a server allocator: its two watermarks.
///
/// - `meta` is the window meta-ranges are carved from.
/// - `super_range` is the controller window on the controller, and the unspent
///   super-range leased from the controller on a regular server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeqState {
    pub meta: Range,
    pub super_range: Range,
}

/// Errors produced by a [`SeqStore`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StoreError {
    /// Nothing has been saved yet. Treated as a first run.
    NoData,
    /// The backing store failed.
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
    /// Something was saved but it could not be decoded.
    Corrupt { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoData => fmt.write_str("no persisted state"),
            Self::Io { kind, message } => write!(fmt, "I/O error ({kind}): {message}"),
            Self::Corrupt { reason } => write!(fmt, "corrupt state: {reason}"),
        }
    }
}

impl core::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Load/save access to a server allocator's persisted [`SeqState`].
///
/// Each store has exactly one writer, the server allocator that owns it, and
/// every `save` is issued while that allocator holds its lock.
pub trait SeqStore: Send + Sync {
    /// Returns the last saved state, or [`StoreError::NoData`] if nothing has
    /// been saved yet.
    ///
    /// # Errors
    ///
    /// Any error other than `NoData` aborts server initialization.
    fn load(&self) -> Result<SeqState, StoreError>;

    /// Durably records `state`, replacing whatever was saved before.
    ///
    /// # Errors
    ///
    /// Returns an error if the state could not be made durable.
    fn save(&self, state: &SeqState) -> Result<(), StoreError>;
}

impl<S: SeqStore + ?Sized> SeqStore for Box<S> {
    fn load(&self) -> Result<SeqState, StoreError> {
        (**self).load()
    }

    fn save(&self, state: &SeqState) -> Result<(), StoreError> {
        (**self).save(state)
    }
}

impl<S: SeqStore + ?Sized> SeqStore for alloc::sync::Arc<S> {
    fn load(&self) -> Result<SeqState, StoreError> {
        (**self).load()
    }

    fn save(&self, state: &SeqState) -> Result<(), StoreError> {
        (**self).save(state)
    }
}
