/// Which part a server allocator plays in the hierarchy.
///
/// Exactly one server in a deployment is the controller. The role is fixed
/// when the server is created; nothing here elects or fails over a
/// controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role<T> {
    /// Owns the whole sequence space and grants super-ranges from it.
    Controller,
    /// Leases super-ranges from the controller through `T`.
    Regular(T),
}

impl<T> Role<T> {
    pub const fn is_controller(&self) -> bool {
        matches!(self, Self::Controller)
    }

    /// The upstream of a regular server, `None` for the controller.
    pub const fn upstream(&self) -> Option<&T> {
        match self {
            Self::Controller => None,
            Self::Regular(upstream) => Some(upstream),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Role<U> {
        match self {
            Self::Controller => Role::Controller,
            Self::Regular(upstream) => Role::Regular(f(upstream)),
        }
    }
}

/// Lifecycle of a server allocator as seen from the outside.
///
/// `Exhausted` only applies to a controller whose window is used up. It stops
/// super-grants, but meta-grants continue from whatever was already carved
/// into the meta window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeqStatus {
    Active,
    Exhausted,
    Finalized,
}
