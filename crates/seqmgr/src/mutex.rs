#[cfg(feature = "parking-lot")]
pub use parking_lot::{Mutex, MutexGuard};
#[cfg(not(feature = "parking-lot"))]
pub use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::Result;

/// Lock-guarded allocator state, optionally padded to a cache line so two
/// allocators living side by side don't false-share.
#[cfg(feature = "cache-padded")]
pub(crate) type Guarded<T> = crossbeam_utils::CachePadded<Mutex<T>>;
#[cfg(not(feature = "cache-padded"))]
pub(crate) type Guarded<T> = Mutex<T>;

pub(crate) fn guarded<T>(value: T) -> Guarded<T> {
    #[cfg(feature = "cache-padded")]
    {
        crossbeam_utils::CachePadded::new(Mutex::new(value))
    }
    #[cfg(not(feature = "cache-padded"))]
    {
        Mutex::new(value)
    }
}

/// Acquires `mutex`, mapping poisoning to [`Error::LockPoisoned`] when the
/// std mutex is in use.
///
/// [`Error::LockPoisoned`]: crate::Error
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    #[cfg(feature = "parking-lot")]
    {
        Ok(mutex.lock())
    }
    #[cfg(not(feature = "parking-lot"))]
    {
        Ok(mutex.lock()?)
    }
}

/// Acquires `mutex`, recovering the data from a poisoned std mutex.
///
/// For plain values that stay consistent even if a holder panicked.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    #[cfg(feature = "parking-lot")]
    {
        mutex.lock()
    }
    #[cfg(not(feature = "parking-lot"))]
    {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
