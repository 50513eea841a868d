use crate::{Error, Range, Result};

/// First sequence of the global space. Sequences below it are reserved.
pub const SEQ_SPACE_START: u64 = 0x400;

/// Exclusive end of the global space.
pub const SEQ_SPACE_LIMIT: u64 = u64::MAX;

/// Sequences per meta-range granted by a server to a client.
pub const SEQ_META_CHUNK: u64 = 0x4000;

/// Sequences per super-range granted by the controller to a server.
pub const SEQ_SUPER_CHUNK: u64 = SEQ_META_CHUNK * SEQ_META_CHUNK;

/// Object ids available per sequence.
pub const SEQ_WIDTH: u32 = 0x4000;

/// First object id minted in a fresh sequence.
pub const FID_INIT_OID: u32 = 1;

/// What to do when saving the watermark fails after a range has already been
/// carved in memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Durability {
    /// Log the failure and honor the grant. A crash before the next
    /// successful save may re-issue the same range after restart.
    #[default]
    BestEffort,
    /// Roll the carve back and fail the call with
    /// [`Error::Persistence`]. Anything fetched from the controller during
    /// the failed call is forfeited.
    Strict,
}

/// Tunables shared by clients and servers.
///
/// Every node in one deployment must agree on `width` and `init_oid`; the
/// chunk sizes and space bounds only matter to the nodes that carve them.
///
/// # Example
/// ```
/// use seqmgr::{Durability, SeqConfig};
///
/// let config = SeqConfig::default()
///     .with_meta_chunk(16)
///     .with_width(100)
///     .with_durability(Durability::Strict);
///
/// assert!(config.validate().is_ok());
/// assert!(SeqConfig::default().with_meta_chunk(0).validate().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeqConfig {
    pub space_start: u64,
    pub space_limit: u64,
    pub super_chunk: u64,
    pub meta_chunk: u64,
    pub width: u32,
    pub init_oid: u32,
    pub durability: Durability,
}

impl Default for SeqConfig {
    fn default() -> Self {
        Self {
            space_start: SEQ_SPACE_START,
            space_limit: SEQ_SPACE_LIMIT,
            super_chunk: SEQ_SUPER_CHUNK,
            meta_chunk: SEQ_META_CHUNK,
            width: SEQ_WIDTH,
            init_oid: FID_INIT_OID,
            durability: Durability::default(),
        }
    }
}

impl SeqConfig {
    /// Sets the controller's space to `[start, limit)`.
    #[must_use]
    pub const fn with_space(mut self, start: u64, limit: u64) -> Self {
        self.space_start = start;
        self.space_limit = limit;
        self
    }

    /// Sets the number of sequences per super-range grant.
    #[must_use]
    pub const fn with_super_chunk(mut self, chunk: u64) -> Self {
        self.super_chunk = chunk;
        self
    }

    /// Sets the number of sequences per meta-range grant.
    #[must_use]
    pub const fn with_meta_chunk(mut self, chunk: u64) -> Self {
        self.meta_chunk = chunk;
        self
    }

    /// Sets the number of object ids per sequence.
    #[must_use]
    pub const fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Sets the first object id minted in each sequence.
    #[must_use]
    pub const fn with_init_oid(mut self, init_oid: u32) -> Self {
        self.init_oid = init_oid;
        self
    }

    /// Sets how a failed save after a grant is handled.
    #[must_use]
    pub const fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    /// The whole space the controller starts out owning.
    pub const fn space(&self) -> Range {
        Range::new(self.space_start, self.space_limit)
    }

    /// Checks the config for values that would make allocation impossible
    /// or mint insane identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first violated
    /// constraint.
    pub fn validate(&self) -> Result<()> {
        if self.space_start == 0 {
            return Err(Error::invalid_config("space_start must be non-zero"));
        }
        if self.space_start > self.space_limit {
            return Err(Error::invalid_config(format!(
                "space_start ({:#x}) exceeds space_limit ({:#x})",
                self.space_start, self.space_limit
            )));
        }
        if self.meta_chunk == 0 {
            return Err(Error::invalid_config("meta_chunk must be non-zero"));
        }
        if self.super_chunk == 0 {
            return Err(Error::invalid_config("super_chunk must be non-zero"));
        }
        if self.init_oid >= self.width {
            return Err(Error::invalid_config(format!(
                "init_oid ({}) must be below width ({})",
                self.init_oid, self.width
            )));
        }
        Ok(())
    }
}
