//! `GET /categories` (§6, §4.10).

use axum::extract::State;
use axum::Json;
use skillreg_core::repository::category::CategoryRepository;

use crate::http::error::AppError;
use crate::http::response::CategoriesResponse;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<CategoriesResponse>, AppError> {
    let categories = state.categories.list_with_counts().await?;
    Ok(Json(CategoriesResponse { categories }))
}
