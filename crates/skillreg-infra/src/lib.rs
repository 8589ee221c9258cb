//! Concrete adapters for the ports declared in `skillreg-core`: SQLite
//! repositories, the filesystem object store and LRU content cache, the
//! GitHub-backed source-host client, and the durable job queue.

pub mod cache;
pub mod config;
pub mod crypto;
pub mod queue;
pub mod source_host;
pub mod sqlite;

pub use cache::{cache_key, CacheDecision, CacheEntry, ContentCache, ContentSource, FilesystemObjectStore};
pub use queue::SqliteQueue;
pub use source_host::GitHubSourceHostClient;
pub use sqlite::{
    account::SqliteUserAccountRepository, auth::SqliteAuthRepository, author::SqliteAuthorRepository,
    category::SqliteCategoryRepository, favorite::SqliteFavoriteRepository, kv::SqliteKvStore,
    permission::SqlitePermissionRepository, skill::SqliteSkillRepository, DatabasePool,
};
