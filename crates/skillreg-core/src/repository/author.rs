use std::future::Future;

use skillreg_types::author::Author;
use skillreg_types::error::ApiError;

pub trait AuthorRepository: Send + Sync {
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Author>, ApiError>> + Send;

    /// Upserts the author, incrementing `skillsCount` only when
    /// `increment_skills_count` is set (first insert of a given slug,
    /// §4.5 step 5).
    fn upsert(
        &self,
        author: &Author,
        increment_skills_count: bool,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}
