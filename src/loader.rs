//! The slow side of a read-through cache.
//!
//! A loader maps a key to its content and reports how long that took. Caches
//! call it on every miss and never retry or swallow its errors.
//!
//! Two shapes are accepted:
//!
//! - Any closure `FnOnce(&K) -> Result<(V, Duration), E>` can be passed
//!   directly to [`CoreCache::get`](crate::traits::CoreCache::get).
//! - Stateful loaders implement [`Loader`]; [`Loader::as_fn`] adapts them to
//!   the closure shape.
//!
//! ```
//! use std::convert::Infallible;
//! use cachelab::loader::{Loader, Timed};
//! use cachelab::policy::fifo::FifoCache;
//! use cachelab::traits::CoreCache;
//!
//! let mut loader = Timed::new(|id: &u64| Ok::<_, Infallible>(format!("item {id}")));
//! let mut cache: FifoCache<u64, String> = FifoCache::try_new(2).unwrap();
//!
//! let first = cache.get(7, loader.as_fn()).unwrap();
//! assert!(!first.hit);
//! assert_eq!(first.value, "item 7");
//! assert!(cache.get(7, loader.as_fn()).unwrap().hit);
//! ```

use std::time::{Duration, Instant};

/// Source of content for keys that are not cached.
pub trait Loader<K, V> {
    type Error;

    /// Loads the content for `key`, returning it with the time spent loading.
    fn load(&mut self, key: &K) -> Result<(V, Duration), Self::Error>;

    /// Borrows this loader as a one-shot closure for
    /// [`CoreCache::get`](crate::traits::CoreCache::get).
    fn as_fn(&mut self) -> impl FnOnce(&K) -> Result<(V, Duration), Self::Error> + '_
    where
        Self: Sized,
    {
        move |key: &K| self.load(key)
    }
}

/// Wraps a plain `FnMut(&K) -> Result<V, E>` and measures each call.
#[derive(Debug, Clone)]
pub struct Timed<F> {
    inner: F,
}

impl<F> Timed<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<K, V, E, F> Loader<K, V> for Timed<F>
where
    F: FnMut(&K) -> Result<V, E>,
{
    type Error = E;

    fn load(&mut self, key: &K) -> Result<(V, Duration), E> {
        let start = Instant::now();
        let value = (self.inner)(key)?;
        Ok((value, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_forwards_value_and_error() {
        let mut loader = Timed::new(|k: &u32| if *k == 0 { Err("zero") } else { Ok(k * 2) });
        let (value, _elapsed) = Loader::<u32, u32>::load(&mut loader, &21).unwrap();
        assert_eq!(value, 42);
        assert_eq!(Loader::<u32, u32>::load(&mut loader, &0).unwrap_err(), "zero");
    }

    #[test]
    fn as_fn_borrows_loader_state() {
        struct Counting {
            calls: usize,
        }
        impl Loader<u32, u32> for Counting {
            type Error = ();
            fn load(&mut self, key: &u32) -> Result<(u32, Duration), ()> {
                self.calls += 1;
                Ok((*key, Duration::ZERO))
            }
        }

        let mut loader = Counting { calls: 0 };
        let f = loader.as_fn();
        assert_eq!(f(&5).unwrap().0, 5);
        let f = loader.as_fn();
        assert_eq!(f(&6).unwrap().0, 6);
        assert_eq!(loader.calls, 2);
    }
}
