//! Application state: every concrete adapter wired up once at startup and
//! shared behind `Arc` across the HTTP server and the worker jobs.

use std::path::PathBuf;

use skillreg_infra::sqlite::{
    SqliteAuthRepository, SqliteAuthorRepository, SqliteCategoryRepository,
    SqliteFavoriteRepository, SqlitePermissionRepository, SqliteSkillRepository,
    SqliteUserAccountRepository,
};
use skillreg_infra::{ContentCache, DatabasePool, FilesystemObjectStore, GitHubSourceHostClient, SqliteKvStore, SqliteQueue};
use skillreg_types::config::GlobalConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Queue payload for the indexing worker (C5): one repo coordinate to
/// check, plus the triggering event id so it can be re-marked processed
/// on redelivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexJob {
    pub owner: String,
    pub repo: String,
    pub event_id: Option<String>,
}

/// Queue payload for the classification worker (C6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyJob {
    pub skill_id: Uuid,
}

pub type SkillStore = SqliteSkillRepository;
pub type AuthorStore = SqliteAuthorRepository;
pub type CategoryStore = SqliteCategoryRepository;
pub type FavoriteStore = SqliteFavoriteRepository;
pub type PermissionStore = SqlitePermissionRepository;
pub type AuthStore = SqliteAuthRepository;
pub type AccountStore = SqliteUserAccountRepository;

#[derive(Clone)]
pub struct AppState {
    pub skills: std::sync::Arc<SkillStore>,
    pub authors: std::sync::Arc<AuthorStore>,
    pub categories: std::sync::Arc<CategoryStore>,
    pub favorites: std::sync::Arc<FavoriteStore>,
    pub permissions: std::sync::Arc<PermissionStore>,
    pub auth: std::sync::Arc<AuthStore>,
    pub accounts: std::sync::Arc<AccountStore>,
    pub kv: std::sync::Arc<SqliteKvStore>,
    pub objects: std::sync::Arc<FilesystemObjectStore>,
    pub cache: std::sync::Arc<ContentCache>,
    pub host: std::sync::Arc<GitHubSourceHostClient>,
    pub index_queue: std::sync::Arc<SqliteQueue<IndexJob>>,
    pub classify_queue: std::sync::Arc<SqliteQueue<ClassifyJob>>,
    pub config: std::sync::Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Resolves the data directory, opens the database (running
    /// migrations), and wires every adapter against it.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = skillreg_infra::config::default_data_dir();
        Self::init_at(data_dir).await
    }

    /// Same as [`Self::init`] but against an explicit data directory,
    /// so tests can point it at a throwaway temp dir instead of the
    /// platform default.
    pub async fn init_at(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = skillreg_infra::config::load_global_config(&data_dir).await;

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("skillreg.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let skills = SqliteSkillRepository::new(db_pool.clone());
        let authors = SqliteAuthorRepository::new(db_pool.clone());
        // The only async/fallible repository constructor: it preloads and
        // caches the predefined category table at construction time.
        let categories = SqliteCategoryRepository::new(db_pool.clone()).await?;
        let favorites = SqliteFavoriteRepository::new(db_pool.clone());
        let permissions = SqlitePermissionRepository::new(db_pool.clone());
        let auth = SqliteAuthRepository::new(db_pool.clone());
        let accounts = SqliteUserAccountRepository::new(db_pool.clone());
        let kv = SqliteKvStore::new(db_pool.clone());

        let objects_dir = data_dir.join("objects");
        tokio::fs::create_dir_all(&objects_dir).await?;
        let objects = FilesystemObjectStore::new(objects_dir);

        let cache = ContentCache::new(config.cache_max_items, config.cache_prune_fraction);
        let host = GitHubSourceHostClient::new(&config);

        let index_queue: SqliteQueue<IndexJob> = SqliteQueue::new(db_pool.clone(), "index");
        let classify_queue: SqliteQueue<ClassifyJob> = SqliteQueue::new(db_pool.clone(), "classify");

        Ok(Self {
            skills: std::sync::Arc::new(skills),
            authors: std::sync::Arc::new(authors),
            categories: std::sync::Arc::new(categories),
            favorites: std::sync::Arc::new(favorites),
            permissions: std::sync::Arc::new(permissions),
            auth: std::sync::Arc::new(auth),
            accounts: std::sync::Arc::new(accounts),
            kv: std::sync::Arc::new(kv),
            objects: std::sync::Arc::new(objects),
            cache: std::sync::Arc::new(cache),
            host: std::sync::Arc::new(host),
            index_queue: std::sync::Arc::new(index_queue),
            classify_queue: std::sync::Arc::new(classify_queue),
            config: std::sync::Arc::new(config),
            data_dir,
            db_pool,
        })
    }
}
