use std::collections::HashSet;

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::preferences::SearchPreferences;
use crate::state::AppState;

/// GET /api/search-preferences
pub async fn get_preferences_handler(
    State(state): State<AppState>,
) -> Result<Json<SearchPreferences>, AppError> {
    Ok(Json(state.storage.get_search_preferences().await?))
}

/// PUT /api/search-preferences
/// Replaces the saved criteria used by the scheduled search.
pub async fn put_preferences_handler(
    State(state): State<AppState>,
    Json(mut prefs): Json<SearchPreferences>,
) -> Result<Json<SearchPreferences>, AppError> {
    prefs.keywords = prefs.keywords.trim().to_string();
    prefs.location = prefs.location.trim().to_string();
    let mut seen = HashSet::new();
    prefs.sources.retain(|source| seen.insert(*source));
    prefs.validate().map_err(AppError::Validation)?;
    Ok(Json(state.storage.put_search_preferences(prefs).await?))
}
