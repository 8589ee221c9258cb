pub mod lru;
pub mod object_store_fs;

pub use lru::{cache_key, CacheDecision, CacheEntry, ContentCache, ContentSource};
pub use object_store_fs::FilesystemObjectStore;
