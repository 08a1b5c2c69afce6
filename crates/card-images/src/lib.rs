//! Card image acquisition: tiered on-disk cache, DPI scaling and border
//! gamma correction.

mod cache;
mod fetch;
pub mod paths;
pub mod process;
mod types;

pub use cache::{CacheStats, ImageCache, ImageCacheBuilder, unique_sides};
pub use fetch::{HttpFetcher, ImageFetcher};
pub use paths::CachePaths;
pub use types::*;
