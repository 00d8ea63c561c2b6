pub use crate::builder::{Cache, CacheBuilder, CachePolicy};
pub use crate::ds::{GhostList, KeyList};
pub use crate::error::{CacheError, InvariantError};
pub use crate::loader::{Loader, Timed};
pub use crate::metrics::CacheMetricsSnapshot;
pub use crate::policy::{ArcCache, FifoCache, LfuCache, LruCache};
pub use crate::traits::{CoreCache, Lookup};
