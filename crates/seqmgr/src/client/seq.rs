#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Fid, Range, Result, SeqConfig,
    mutex::{Guarded, guarded, lock},
    transport::{SeqOp, SeqTransport, check_grant},
};

struct ClientState {
    range: Range,
    fid: Fid,
}

/// A client-side sequence manager that mints [`Fid`]s.
///
/// The client holds one meta-range leased from its server and the identifier
/// it will hand out next. Minting only touches local state; the server is
/// contacted only when every sequence in the meta-range is used up.
///
/// All state sits behind one lock, and a refill (a blocking call to the
/// server) happens while holding it, so concurrent callers simply wait for
/// the refill to finish. Nothing is persisted: a restarted client leases a
/// fresh meta-range.
///
/// ## See Also
/// - [`ServerSeq`], which grants the meta-ranges
/// - [`SuperClient`], the server-to-controller counterpart
///
/// [`ServerSeq`]: crate::ServerSeq
pub struct ClientSeq<T>
where
    T: SeqTransport,
{
    state: Guarded<ClientState>,
    transport: T,
    width: u32,
    init_oid: u32,
}

impl<T> ClientSeq<T>
where
    T: SeqTransport,
{
    /// Creates a client and leases its first sequence.
    ///
    /// The first sequence is allocated eagerly so the very first
    /// [`alloc_fid`](Self::alloc_fid) is served locally.
    ///
    /// # Errors
    ///
    /// Fails if `config` is invalid, or if the first meta-range can't be
    /// obtained. The client is unusable without one, so nothing is returned.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use seqmgr::{ClientSeq, MemoryStore, SeqConfig, ServerSeq};
    ///
    /// let config = SeqConfig::default().with_meta_chunk(4).with_width(3);
    /// let server = Arc::new(ServerSeq::controller(MemoryStore::new(), config.clone()).unwrap());
    /// let client = ClientSeq::new(Arc::clone(&server), &config).unwrap();
    ///
    /// let a = client.alloc_fid().unwrap();
    /// let b = client.alloc_fid().unwrap();
    /// let c = client.alloc_fid().unwrap();
    ///
    /// assert_eq!((a.seq, a.oid), (0x400, 1));
    /// assert_eq!((b.seq, b.oid), (0x400, 2));
    /// assert_eq!((c.seq, c.oid), (0x401, 1));
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn new(transport: T, config: &SeqConfig) -> Result<Self> {
        config.validate()?;

        let mut state = ClientState {
            range: Range::EMPTY,
            fid: Fid::ZERO,
        };
        // An empty range looks exactly like an exhausted one, so this leases
        // the first meta-range.
        let seq = Self::next_seq(&transport, &mut state.range)?;
        state.fid = Fid::new(seq, config.init_oid, 0);
        debug_assert!(state.fid.is_sane(config.init_oid, config.width));

        #[cfg(feature = "tracing")]
        tracing::debug!(fid = %state.fid, range = %state.range, "client sequence manager initialized");

        Ok(Self {
            state: guarded(state),
            transport,
            width: config.width,
            init_oid: config.init_oid,
        })
    }

    /// Mints the next identifier.
    ///
    /// Returns the current identifier and bumps its oid. Once the oid reaches
    /// the configured width a new sequence is allocated and minting restarts
    /// at the initial oid with version `0`.
    ///
    /// # Errors
    ///
    /// Returns whatever the refill returned: [`OutOfSpace`], [`Unreachable`],
    /// [`Protocol`], or [`InvalidRange`] for a corrupt grant. On error no
    /// identifier is consumed.
    ///
    /// [`OutOfSpace`]: crate::Error::OutOfSpace
    /// [`Unreachable`]: crate::Error::Unreachable
    /// [`Protocol`]: crate::Error::Protocol
    /// [`InvalidRange`]: crate::Error::InvalidRange
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn alloc_fid(&self) -> Result<Fid> {
        let mut state = lock(&self.state)?;

        if state.fid.oid >= self.width {
            let seq = Self::next_seq(&self.transport, &mut state.range)?;
            state.fid = Fid::new(seq, self.init_oid, 0);
        }

        let fid = state.fid;
        state.fid.oid += 1;
        debug_assert!(fid.is_sane(self.init_oid, self.width));
        Ok(fid)
    }

    /// Allocates one sequence from the local meta-range, leasing a new
    /// meta-range from the server when the local one is used up.
    ///
    /// This doesn't affect the identifier [`alloc_fid`](Self::alloc_fid)
    /// mints next; the returned sequence belongs to the caller.
    ///
    /// # Errors
    ///
    /// See [`alloc_fid`](Self::alloc_fid).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn alloc_seq(&self) -> Result<u64> {
        let mut state = lock(&self.state)?;
        Self::next_seq(&self.transport, &mut state.range)
    }

    /// The identifier the next [`alloc_fid`](Self::alloc_fid) will return,
    /// unless it triggers a new sequence.
    pub fn current(&self) -> Result<Fid> {
        Ok(lock(&self.state)?.fid)
    }

    /// The unused part of the local meta-range.
    pub fn range(&self) -> Result<Range> {
        Ok(lock(&self.state)?.range)
    }

    fn next_seq(transport: &T, range: &mut Range) -> Result<u64> {
        range.check()?;
        if let Some(seq) = range.pop() {
            return Ok(seq);
        }

        let mut granted = transport
            .query(SeqOp::AllocMeta)
            .and_then(check_grant)
            .inspect_err(|_e| {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %_e, "can't allocate new meta-sequence");
            })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(range = %granted, "allocated meta-sequence");

        // Non-empty, checked above.
        let seq = granted.start;
        granted.start += 1;
        *range = granted;
        Ok(seq)
    }
}
