use std::future::Future;

use skillreg_types::category::{Category, CategoryWithCount};
use skillreg_types::error::ApiError;

pub trait CategoryRepository: Send + Sync {
    /// The fixed, build-time predefined category table.
    fn predefined(&self) -> &[Category];

    /// Inserts an ai-suggested category if no category with this slug
    /// exists yet (§4.6 step 2, "insert-if-absent").
    fn insert_ai_suggested_if_absent(
        &self,
        category: &Category,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Static predefined categories plus non-empty ai-suggested categories
    /// with counts (§4.10 `GET /categories`).
    fn list_with_counts(&self) -> impl Future<Output = Result<Vec<CategoryWithCount>, ApiError>> + Send;
}
