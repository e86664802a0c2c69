use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    constants::SUBSCRIPTION_RECIPE_PREVIEW,
    error::{ApiError, QueryError},
    schema::{FollowedAuthor, RecipeSummary, User, Uuid},
};

use super::users::get_user_by_id;

/// Subscribes the user to an author's recipes. Self-subscription is
/// rejected before any state is inspected.
pub async fn subscribe(
    user_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<FollowedAuthor, ApiError> {
    if user_id == author_id {
        return Err(ApiError::Validation(
            "You cannot subscribe to yourself".to_string(),
        ));
    }

    let author = get_user_by_id(pool, author_id).await?;
    if author.is_none() {
        return Err(ApiError::NotFound(format!(
            "No user exists with id {author_id}"
        )));
    }
    let author = author.unwrap();

    let status = sqlx::query(
        "INSERT INTO subscriptions (user_id, following_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if status.rows_affected() <= 0 {
        return Err(ApiError::Conflict(format!(
            "Already subscribed to user {author_id}"
        )));
    }

    compose_followed_author(author, true, SUBSCRIPTION_RECIPE_PREVIEW, pool).await
}

/// Drops the subscription. The returned entry carries `is_subscribed:
/// false` so the caller can echo the final state.
pub async fn unsubscribe(
    user_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<FollowedAuthor, ApiError> {
    if user_id == author_id {
        return Err(ApiError::Validation(
            "You cannot subscribe to yourself".to_string(),
        ));
    }

    let author = get_user_by_id(pool, author_id).await?;
    if author.is_none() {
        return Err(ApiError::NotFound(format!(
            "No user exists with id {author_id}"
        )));
    }
    let author = author.unwrap();

    let status = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND following_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if status.rows_affected() <= 0 {
        return Err(ApiError::NotFound(format!(
            "Not subscribed to user {author_id}"
        )));
    }

    compose_followed_author(author, false, SUBSCRIPTION_RECIPE_PREVIEW, pool).await
}

pub async fn is_subscribed(
    user_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT following_id FROM subscriptions WHERE user_id = $1 AND following_id = $2",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row.is_some())
}

/// Lists every author the user follows, ordered by username. Each entry
/// carries the author's newest recipes, capped at `recipes_limit`.
pub async fn list_following(
    user_id: i32,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<FollowedAuthor>, ApiError> {
    let authors: Vec<User> = sqlx::query_as(
        "
        SELECT u.*
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.following_id
        WHERE s.user_id = $1
        ORDER BY u.username
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if authors.is_empty() {
        return Ok(vec![]);
    }

    let limit = recipes_limit.unwrap_or(SUBSCRIPTION_RECIPE_PREVIEW);
    let author_ids: Vec<Uuid> = authors.iter().map(|author| author.id).collect();

    let counts: Vec<(i32, i64)> = sqlx::query_as(
        "SELECT author_id, COUNT(*) FROM recipes WHERE author_id = ANY($1) GROUP BY author_id",
    )
    .bind(&author_ids)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;
    let counts: HashMap<Uuid, i64> = counts.into_iter().collect();

    let mut list = Vec::with_capacity(authors.len());
    for author in authors {
        let recipes = author_recipe_previews(author.id, limit, pool).await?;
        let recipes_count = counts.get(&author.id).copied().unwrap_or(0);

        list.push(FollowedAuthor {
            id: author.id,
            username: author.username,
            email: author.email,
            first_name: author.first_name,
            last_name: author.last_name,
            is_subscribed: true,
            recipes,
            recipes_count,
        });
    }

    Ok(list)
}

async fn compose_followed_author(
    author: User,
    is_subscribed: bool,
    recipes_limit: i64,
    pool: &Pool<Postgres>,
) -> Result<FollowedAuthor, ApiError> {
    let recipes = author_recipe_previews(author.id, recipes_limit, pool).await?;

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author.id)
        .fetch_one(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(FollowedAuthor {
        id: author.id,
        username: author.username,
        email: author.email,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed,
        recipes,
        recipes_count: count.0,
    })
}

async fn author_recipe_previews(
    author_id: i32,
    limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeSummary>, ApiError> {
    let list: Vec<RecipeSummary> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY created DESC, id DESC
        LIMIT $2
    ",
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}
