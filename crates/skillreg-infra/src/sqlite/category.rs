//! SQLite-backed `CategoryRepository` (§4.6, §4.10).
//!
//! `predefined()` must be synchronous, so the predefined rows are loaded
//! once at construction time and cached in memory.

use skillreg_core::repository::category::CategoryRepository;
use skillreg_types::category::{Category, CategoryKind, CategoryWithCount};
use skillreg_types::error::ApiError;
use sqlx::Row;

use super::pool::DatabasePool;

fn category_kind_to_str(k: CategoryKind) -> &'static str {
    match k {
        CategoryKind::Predefined => "predefined",
        CategoryKind::AiSuggested => "ai_suggested",
    }
}

fn category_kind_from_str(s: &str) -> Result<CategoryKind, ApiError> {
    match s {
        "predefined" => Ok(CategoryKind::Predefined),
        "ai_suggested" => Ok(CategoryKind::AiSuggested),
        other => Err(ApiError::Internal(format!("unknown category kind: {other}"))),
    }
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category, ApiError> {
    let kind: String = row.try_get("kind").map_err(|e| ApiError::Internal(e.to_string()))?;
    let keywords: String = row.try_get("keywords").map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Category {
        slug: row.try_get("slug").map_err(|e| ApiError::Internal(e.to_string()))?,
        name: row.try_get("name").map_err(|e| ApiError::Internal(e.to_string()))?,
        description: row.try_get("description").map_err(|e| ApiError::Internal(e.to_string()))?,
        keywords: serde_json::from_str(&keywords).map_err(|e| ApiError::Internal(e.to_string()))?,
        kind: category_kind_from_str(&kind)?,
    })
}

pub struct SqliteCategoryRepository {
    pool: DatabasePool,
    predefined: Vec<Category>,
}

impl SqliteCategoryRepository {
    /// Loads and caches the predefined category table once.
    pub async fn new(pool: DatabasePool) -> Result<Self, ApiError> {
        let rows = sqlx::query("SELECT * FROM categories WHERE kind = 'predefined' ORDER BY slug")
            .fetch_all(&pool.reader)
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        let mut predefined = Vec::with_capacity(rows.len());
        for row in &rows {
            predefined.push(row_to_category(row)?);
        }

        Ok(Self { pool, predefined })
    }
}

impl CategoryRepository for SqliteCategoryRepository {
    fn predefined(&self) -> &[Category] {
        &self.predefined
    }

    async fn insert_ai_suggested_if_absent(&self, category: &Category) -> Result<(), ApiError> {
        let keywords = serde_json::to_string(&category.keywords).map_err(|e| ApiError::Internal(e.to_string()))?;
        sqlx::query(
            "INSERT INTO categories (slug, name, description, keywords, kind) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(&category.slug)
        .bind(&category.name)
        .bind(&category.description)
        .bind(keywords)
        .bind(category_kind_to_str(category.kind))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;

        Ok(())
    }

    async fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>, ApiError> {
        let rows = sqlx::query(
            "SELECT c.*, (SELECT COUNT(*) FROM skill_categories sc WHERE sc.category_slug = c.slug) AS skill_count
             FROM categories c
             WHERE c.kind = 'predefined' OR (SELECT COUNT(*) FROM skill_categories sc WHERE sc.category_slug = c.slug) > 0
             ORDER BY c.kind, c.slug",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| ApiError::Transient(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let count: i64 = row.try_get("skill_count").map_err(|e| ApiError::Internal(e.to_string()))?;
            out.push(CategoryWithCount { category: row_to_category(row)?, count });
        }
        Ok(out)
    }
}
