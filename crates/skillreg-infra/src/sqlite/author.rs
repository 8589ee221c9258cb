//! SQLite-backed `AuthorRepository` (§4.5 step 5).

use chrono::{DateTime, Utc};
use skillreg_core::repository::author::AuthorRepository;
use skillreg_types::author::{Author, AuthorType};
use skillreg_types::error::ApiError;
use sqlx::Row;

use super::pool::DatabasePool;

pub struct SqliteAuthorRepository {
    pool: DatabasePool,
}

impl SqliteAuthorRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn author_type_to_str(t: AuthorType) -> &'static str {
    match t {
        AuthorType::User => "user",
        AuthorType::Organization => "organization",
    }
}

fn author_type_from_str(s: &str) -> Result<AuthorType, ApiError> {
    match s {
        "user" => Ok(AuthorType::User),
        "organization" => Ok(AuthorType::Organization),
        other => Err(ApiError::Internal(format!("unknown author_type: {other}"))),
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Internal(format!("invalid datetime in authors: {e}")))
}

fn row_to_author(row: &sqlx::sqlite::SqliteRow) -> Result<Author, ApiError> {
    let author_type: String = row.try_get("author_type").map_err(|e| ApiError::Internal(e.to_string()))?;
    let created_at: String = row.try_get("created_at").map_err(|e| ApiError::Internal(e.to_string()))?;
    let updated_at: String = row.try_get("updated_at").map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Author {
        username: row.try_get("username").map_err(|e| ApiError::Internal(e.to_string()))?,
        github_id: row.try_get("github_id").map_err(|e| ApiError::Internal(e.to_string()))?,
        display_name: row.try_get("display_name").map_err(|e| ApiError::Internal(e.to_string()))?,
        avatar_url: row.try_get("avatar_url").map_err(|e| ApiError::Internal(e.to_string()))?,
        bio: row.try_get("bio").map_err(|e| ApiError::Internal(e.to_string()))?,
        author_type: author_type_from_str(&author_type)?,
        skills_count: row.try_get("skills_count").map_err(|e| ApiError::Internal(e.to_string()))?,
        total_stars: row.try_get("total_stars").map_err(|e| ApiError::Internal(e.to_string()))?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

impl AuthorRepository for SqliteAuthorRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Author>, ApiError> {
        let row = sqlx::query("SELECT * FROM authors WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        row.as_ref().map(row_to_author).transpose()
    }

    async fn upsert(&self, author: &Author, increment_skills_count: bool) -> Result<(), ApiError> {
        if increment_skills_count {
            sqlx::query(
                "INSERT INTO authors (username, github_id, display_name, avatar_url, bio, author_type,
                    skills_count, total_stars, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
                 ON CONFLICT (username) DO UPDATE SET
                    github_id = excluded.github_id,
                    display_name = excluded.display_name,
                    avatar_url = excluded.avatar_url,
                    bio = excluded.bio,
                    total_stars = excluded.total_stars,
                    skills_count = authors.skills_count + 1,
                    updated_at = excluded.updated_at",
            )
        } else {
            sqlx::query(
                "INSERT INTO authors (username, github_id, display_name, avatar_url, bio, author_type,
                    skills_count, total_stars, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
                 ON CONFLICT (username) DO UPDATE SET
                    github_id = excluded.github_id,
                    display_name = excluded.display_name,
                    avatar_url = excluded.avatar_url,
                    bio = excluded.bio,
                    total_stars = excluded.total_stars,
                    updated_at = excluded.updated_at",
            )
        }
        .bind(&author.username)
        .bind(author.github_id)
        .bind(&author.display_name)
        .bind(&author.avatar_url)
        .bind(&author.bio)
        .bind(author_type_to_str(author.author_type))
        .bind(author.total_stars)
        .bind(author.created_at.to_rfc3339())
        .bind(author.updated_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_author(username: &str) -> Author {
        let now = Utc::now();
        Author {
            username: username.into(),
            github_id: Some(42),
            display_name: Some("Acme".into()),
            avatar_url: None,
            bio: None,
            author_type: AuthorType::User,
            skills_count: 0,
            total_stars: 10,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn first_insert_increments_skills_count() {
        let repo = SqliteAuthorRepository::new(test_pool().await);
        repo.upsert(&make_author("acme"), true).await.unwrap();
        let found = repo.find_by_username("acme").await.unwrap().unwrap();
        assert_eq!(found.skills_count, 1);
    }

    #[tokio::test]
    async fn second_insert_with_increment_adds_to_existing_count() {
        let repo = SqliteAuthorRepository::new(test_pool().await);
        repo.upsert(&make_author("acme"), true).await.unwrap();
        repo.upsert(&make_author("acme"), true).await.unwrap();
        let found = repo.find_by_username("acme").await.unwrap().unwrap();
        assert_eq!(found.skills_count, 2);
    }

    #[tokio::test]
    async fn update_without_increment_preserves_count() {
        let repo = SqliteAuthorRepository::new(test_pool().await);
        repo.upsert(&make_author("acme"), true).await.unwrap();
        repo.upsert(&make_author("acme"), false).await.unwrap();
        let found = repo.find_by_username("acme").await.unwrap().unwrap();
        assert_eq!(found.skills_count, 1);
    }

    #[tokio::test]
    async fn missing_author_returns_none() {
        let repo = SqliteAuthorRepository::new(test_pool().await);
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }
}
