use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    schema::RecipeSummary,
};

use super::recipes::get_recipe_summary;

/// Puts the recipe into the user's shopping cart and returns its summary
/// card. The cart holds each recipe at most once, repeated adds conflict.
pub async fn add_to_cart(
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
        "INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if status.rows_affected() <= 0 {
        return Err(ApiError::Conflict(
            "Recipe is already in shopping cart".to_string(),
        ));
    }

    Ok(summary)
}

pub async fn remove_from_cart(
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

    let status = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if status.rows_affected() <= 0 {
        return Err(ApiError::NotFound(
            "Recipe is not in shopping cart".to_string(),
        ));
    }

    Ok(summary)
}

pub async fn is_in_cart(
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT recipe_id FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .fetch_optional(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row.is_some())
}
