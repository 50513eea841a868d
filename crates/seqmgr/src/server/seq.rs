#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Durability, Error, Range, Result, SeqConfig,
    client::SuperClient,
    mutex::{Guarded, guarded, lock},
    server::{Role, SeqStatus},
    store::{SeqState, SeqStore, StoreError},
    transport::{Detached, SeqOp, SeqTransport},
};

struct ServerState {
    seq: SeqState,
    finalized: bool,
}

/// A server-side sequence manager.
///
/// Grants meta-ranges to clients out of its meta window, refilling that
/// window from the controller when it runs dry. The controller refills from
/// its own window, which it also carves super-ranges out of for regular
/// servers.
///
/// Every grant runs as one critical section: carve, save the new watermarks
/// through `S`, release. Any upstream call made to refill the window happens
/// inside the same section, so concurrent requests are strictly linearized.
///
/// ## See Also
/// - [`ClientSeq`], which consumes meta-ranges
/// - [`Durability`], which decides what a failed save does to a grant
///
/// [`ClientSeq`]: crate::ClientSeq
pub struct ServerSeq<S, T = Detached>
where
    S: SeqStore,
    T: SeqTransport,
{
    state: Guarded<ServerState>,
    role: Role<SuperClient<T>>,
    store: S,
    config: SeqConfig,
}

impl<S> ServerSeq<S, Detached>
where
    S: SeqStore,
{
    /// Creates the controller. Shorthand for
    /// `ServerSeq::new(Role::Controller, store, config)`.
    ///
    /// # Errors
    ///
    /// See [`ServerSeq::new`].
    pub fn controller(store: S, config: SeqConfig) -> Result<Self> {
        Self::new(Role::Controller, store, config)
    }
}

impl<S, T> ServerSeq<S, T>
where
    S: SeqStore,
    T: SeqTransport,
{
    /// Creates a server allocator, restoring its watermarks from `store`.
    ///
    /// On a first run (`store` reports [`StoreError::NoData`]) the controller
    /// takes the whole configured space as its window and a regular server
    /// leases one super-range from the controller. Either way the meta window
    /// starts empty, and the seeded state is saved before returning.
    ///
    /// # Errors
    ///
    /// Fails on an invalid `config`, a load error other than `NoData`, a
    /// persisted range that isn't sane, a failed first lease, or a failed
    /// first save. The server is unusable in all of these cases.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(controller = role.is_controller())))]
    pub fn new(role: Role<T>, store: S, config: SeqConfig) -> Result<Self> {
        config.validate()?;
        let role = role.map(SuperClient::new);

        let seq = match store.load() {
            Ok(seq) => {
                seq.meta.check()?;
                seq.super_range.check()?;
                #[cfg(feature = "tracing")]
                tracing::info!(meta = %seq.meta, super_range = %seq.super_range, "restored sequence state");
                seq
            }
            Err(StoreError::NoData) => {
                let super_range = match &role {
                    Role::Controller => config.space(),
                    Role::Regular(upstream) => upstream.alloc_super().inspect_err(|_e| {
                        #[cfg(feature = "tracing")]
                        tracing::error!(error = %_e, "can't allocate initial super-sequence");
                    })?,
                };
                let seq = SeqState {
                    meta: Range::EMPTY,
                    super_range,
                };
                store.save(&seq).inspect_err(|_e| {
                    #[cfg(feature = "tracing")]
                    tracing::error!(error = %_e, "can't write sequence state");
                })?;
                #[cfg(feature = "tracing")]
                tracing::info!(super_range = %seq.super_range, "initialized sequence state");
                seq
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %e, "can't read sequence state");
                return Err(e.into());
            }
        };

        Ok(Self {
            state: guarded(ServerState {
                seq,
                finalized: false,
            }),
            role,
            store,
            config,
        })
    }

    /// Serves a raw request as received from the transport.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] for an unknown opcode; otherwise see
    /// [`ServerSeq::handle_op`].
    pub fn handle(&self, opcode: u32) -> Result<Range> {
        self.handle_op(SeqOp::try_from(opcode)?)
    }

    /// Serves one request: carves the grant, saves the new watermarks, and
    /// returns the grant.
    ///
    /// If the carve fails nothing changes. If the save fails, the outcome
    /// depends on [`SeqConfig::durability`]: with
    /// [`Durability::BestEffort`] the failure is logged and the grant stands;
    /// with [`Durability::Strict`] the carve is rolled back and the call
    /// fails.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] for `AllocSuper` on a regular server
    /// - [`Error::OutOfSpace`] once the controller window is exhausted
    /// - [`Error::Unreachable`] (or the controller's error) when a regular
    ///   server can't refill its window
    /// - [`Error::InvalidRange`] if a window is found corrupt
    /// - [`Error::Persistence`] on a failed save under strict durability
    /// - [`Error::Shutdown`] after [`ServerSeq::finalize`]
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn handle_op(&self, op: SeqOp) -> Result<Range> {
        let mut state = lock(&self.state)?;
        if state.finalized {
            return Err(Error::Shutdown);
        }

        let before = state.seq;
        let carved = match op {
            SeqOp::AllocSuper if self.role.is_controller() => self.carve_super(&mut state.seq),
            SeqOp::AllocSuper => Err(Error::protocol(
                "super-sequence requested from a regular server",
            )),
            SeqOp::AllocMeta => self.carve_meta(&mut state.seq),
        };
        let range = match carved {
            Ok(range) => range,
            Err(e) => {
                state.seq = before;
                return Err(e);
            }
        };

        if let Err(e) = self.store.save(&state.seq) {
            match self.config.durability {
                Durability::BestEffort => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(error = %e, range = %range, "can't save state, grant stands");
                }
                Durability::Strict => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(error = %e, range = %range, "can't save state, grant rolled back");
                    state.seq = before;
                    return Err(e.into());
                }
            }
        }

        Ok(range)
    }

    /// Grants a meta-range. Equivalent to `handle_op(SeqOp::AllocMeta)`.
    ///
    /// # Errors
    ///
    /// See [`ServerSeq::handle_op`].
    pub fn alloc_meta(&self) -> Result<Range> {
        self.handle_op(SeqOp::AllocMeta)
    }

    /// Grants a super-range. Equivalent to `handle_op(SeqOp::AllocSuper)`.
    ///
    /// # Errors
    ///
    /// See [`ServerSeq::handle_op`].
    pub fn alloc_super(&self) -> Result<Range> {
        self.handle_op(SeqOp::AllocSuper)
    }

    /// Stops granting and saves the watermarks one last time.
    ///
    /// Later requests fail with [`Error::Shutdown`]. Calling this twice is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns the save error, if any. The server is finalized regardless.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn finalize(&self) -> Result<()> {
        let mut state = lock(&self.state)?;
        if state.finalized {
            return Ok(());
        }
        state.finalized = true;

        self.store.save(&state.seq).map_err(|e| {
            #[cfg(feature = "tracing")]
            tracing::error!(error = %e, "can't save sequence state");
            Error::from(e)
        })?;

        #[cfg(feature = "tracing")]
        tracing::info!(meta = %state.seq.meta, super_range = %state.seq.super_range, "server sequence manager finalized");
        Ok(())
    }

    /// A snapshot of the current watermarks.
    pub fn state(&self) -> Result<SeqState> {
        Ok(lock(&self.state)?.seq)
    }

    pub fn status(&self) -> Result<SeqStatus> {
        let state = lock(&self.state)?;
        Ok(if state.finalized {
            SeqStatus::Finalized
        } else if self.role.is_controller() && state.seq.super_range.is_exhausted() {
            SeqStatus::Exhausted
        } else {
            SeqStatus::Active
        })
    }

    pub const fn role(&self) -> &Role<SuperClient<T>> {
        &self.role
    }

    pub const fn config(&self) -> &SeqConfig {
        &self.config
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    fn carve_super(&self, seq: &mut SeqState) -> Result<Range> {
        let window = &mut seq.super_range;
        window.check()?;

        if window.is_exhausted() {
            #[cfg(feature = "tracing")]
            tracing::error!("super-sequence is exhausted");
            return Err(Error::OutOfSpace);
        }

        let range = if window.width() < self.config.super_chunk {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                remaining = window.width(),
                "super-sequence is going to exhaust soon, granting the remainder"
            );
            window.take()
        } else {
            window.carve(self.config.super_chunk)
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(range = %range, "allocated super-sequence");
        Ok(range)
    }

    fn carve_meta(&self, seq: &mut SeqState) -> Result<Range> {
        seq.meta.check()?;

        if seq.meta.is_exhausted() {
            seq.meta = match &self.role {
                Role::Controller => self.carve_super(seq)?,
                // Spend the leased super-range before asking for another.
                Role::Regular(_) if !seq.super_range.is_exhausted() => seq.super_range.take(),
                Role::Regular(upstream) => upstream.alloc_super().inspect_err(|_e| {
                    #[cfg(feature = "tracing")]
                    tracing::error!(error = %_e, "can't allocate new super-sequence");
                })?,
            };
            debug_assert!(!seq.meta.is_exhausted());
        }

        let range = seq.meta.carve(self.config.meta_chunk);

        #[cfg(feature = "tracing")]
        tracing::debug!(range = %range, "allocated meta-sequence");
        Ok(range)
    }
}

impl<S, T> SeqTransport for ServerSeq<S, T>
where
    S: SeqStore,
    T: SeqTransport,
{
    fn query(&self, op: SeqOp) -> Result<Range> {
        self.handle_op(op)
    }
}
