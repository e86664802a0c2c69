use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    schema::RecipeSummary,
};

use super::recipes::get_recipe_summary;

/// Adds the recipe to the user's favorites and returns its summary card.
pub async fn add_favorite(
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, ApiError> {
    let summary = get_recipe_summary(recipe_id, pool).await?;
    if summary.is_none() {
        return Err(ApiError::NotFound(format!(
            "No recipe exists with id {recipe_id}"
        )));
    }
    let summary = summary.unwrap();

    let status = sqlx::query(
        "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if status.rows_affected() <= 0 {
        return Err(ApiError::Conflict(
            "Recipe is already in favorites".to_string(),
        ));
    }

    Ok(summary)
}

/// Removes the favorite mark and returns the summary of the recipe it
/// pointed at.
pub async fn remove_favorite(
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, ApiError> {
    let summary = get_recipe_summary(recipe_id, pool).await?;
    if summary.is_none() {
        return Err(ApiError::NotFound(format!(
            "No recipe exists with id {recipe_id}"
        )));
    }
    let summary = summary.unwrap();

    let status = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if status.rows_affected() <= 0 {
        return Err(ApiError::NotFound("Recipe is not in favorites".to_string()));
    }

    Ok(summary)
}

pub async fn is_favorite(
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT recipe_id FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .fetch_optional(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row.is_some())
}
