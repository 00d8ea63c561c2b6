//! Error types for the cachelab library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by cache construction and by
//!   [`CoreCache::get`](crate::traits::CoreCache::get). Generic over the
//!   loader's own error type so a failed load reaches the caller unchanged.
//! - [`InvariantError`]: Returned by `check_invariants` when an internal
//!   structure disagrees with itself.
//!
//! ## Example Usage
//!
//! ```
//! use cachelab::error::CacheError;
//! use cachelab::policy::lru::LruCache;
//!
//! let err = LruCache::<u64, String>::try_new(0).unwrap_err();
//! assert!(matches!(err, CacheError::InvalidCapacity(0)));
//! assert!(err.to_string().contains("capacity"));
//! ```

use std::convert::Infallible;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Failure of a single cache operation.
///
/// `E` is the error type of the [`Loader`](crate::loader::Loader) in use. It
/// defaults to [`Infallible`] for operations that never call a loader, such
/// as construction.
#[derive(Debug, thiserror::Error)]
pub enum CacheError<E = Infallible> {
    /// Capacity was zero at construction.
    #[error("cache capacity must be greater than zero (got {0})")]
    InvalidCapacity(usize),

    /// The loader failed. Nothing was inserted or evicted for this request.
    #[error("loader failed: {0}")]
    Loader(#[source] E),

    /// An eviction found nothing to remove. Unreachable while the policy's
    /// invariants hold.
    #[error("eviction attempted on empty structure `{0}`")]
    EmptyEvictionTarget(&'static str),
}

impl<E> CacheError<E> {
    /// Converts the loader error with `f`, leaving other variants untouched.
    pub fn map_loader<F, E2>(self, f: F) -> CacheError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            CacheError::InvalidCapacity(c) => CacheError::InvalidCapacity(c),
            CacheError::Loader(e) => CacheError::Loader(f(e)),
            CacheError::EmptyEvictionTarget(s) => CacheError::EmptyEvictionTarget(s),
        }
    }

    /// Returns the loader error, if this is a loader failure.
    pub fn into_loader_error(self) -> Option<E> {
        match self {
            CacheError::Loader(e) => Some(e),
            _ => None,
        }
    }
}

impl CacheError {
    /// Widens a construction error so it can be returned from code that
    /// also propagates loader failures of type `E`.
    pub fn widen<E>(self) -> CacheError<E> {
        match self {
            CacheError::InvalidCapacity(c) => CacheError::InvalidCapacity(c),
            CacheError::Loader(never) => match never {},
            CacheError::EmptyEvictionTarget(s) => CacheError::EmptyEvictionTarget(s),
        }
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` on the policy types. Carries a
/// human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn invalid_capacity_mentions_capacity() {
        let err: CacheError = CacheError::InvalidCapacity(0);
        assert_eq!(
            err.to_string(),
            "cache capacity must be greater than zero (got 0)"
        );
    }

    #[test]
    fn loader_error_is_exposed_as_source() {
        let err: CacheError<io::Error> =
            CacheError::Loader(io::Error::new(io::ErrorKind::NotFound, "texto_7.txt"));
        assert!(err.to_string().contains("texto_7.txt"));
        let source = err.source().expect("loader error is the source");
        assert_eq!(source.to_string(), "texto_7.txt");
    }

    #[test]
    fn map_loader_only_touches_loader_variant() {
        let err: CacheError<&str> = CacheError::Loader("boom");
        let mapped = err.map_loader(|s| s.len());
        assert!(matches!(mapped, CacheError::Loader(4)));

        let err: CacheError<&str> = CacheError::EmptyEvictionTarget("t1");
        let mapped = err.map_loader(|s| s.len());
        assert!(matches!(mapped, CacheError::EmptyEvictionTarget("t1")));
    }

    #[test]
    fn widen_keeps_capacity() {
        let err: CacheError<io::Error> = CacheError::InvalidCapacity(0).widen();
        assert!(matches!(err, CacheError::InvalidCapacity(0)));
        assert!(err.into_loader_error().is_none());
    }

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("bucket 3 is empty but still indexed");
        assert_eq!(err.to_string(), "bucket 3 is empty but still indexed");
        assert_eq!(err.message(), "bucket 3 is empty but still indexed");
    }

    #[test]
    fn invariant_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvariantError>();
    }
}
