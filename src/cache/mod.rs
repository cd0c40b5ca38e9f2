// Cache module for local filesystem caching.
// Stores fetched Slack datasets so repeated runs skip the network.

pub mod paths;
pub mod store;

pub use paths::{DEFAULT_CACHE_DIR, user_cache_dir};
pub use store::KeyedCache;
