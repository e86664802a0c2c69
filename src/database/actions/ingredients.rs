use crate::{
    error::{ApiError, QueryError},
    schema::{Ingredient, IngredientView, Unit},
};

use sqlx::{Pool, Postgres};

pub async fn create_unit(name: &str, pool: &Pool<Postgres>) -> Result<Unit, ApiError> {
    if name.trim().is_empty() || name.len() > 200 {
        return Err(ApiError::Validation(
            "Unit name must be 1 to 200 characters".to_string(),
        ));
    }

    let unit: Unit = sqlx::query_as("INSERT INTO units (name) VALUES ($1) RETURNING *")
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(unit)
}

pub async fn get_unit(id: i32, pool: &Pool<Postgres>) -> Result<Option<Unit>, ApiError> {
    let unit: Option<Unit> = sqlx::query_as("SELECT * FROM units WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(unit)
}

/// Case-insensitive name lookup, used by import flows to reuse units.
pub async fn find_unit(name: &str, pool: &Pool<Postgres>) -> Result<Option<Unit>, ApiError> {
    let unit: Option<Unit> = sqlx::query_as("SELECT * FROM units WHERE LOWER(name) = LOWER($1)")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(unit)
}

pub async fn list_units(pool: &Pool<Postgres>) -> Result<Vec<Unit>, ApiError> {
    let list: Vec<Unit> = sqlx::query_as("SELECT * FROM units ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

/// Ingredient names are deliberately not unique: the same name may exist
/// with different units.
pub async fn create_ingredient(
    name: &str,
    unit_id: i32,
    pool: &Pool<Postgres>,
) -> Result<IngredientView, ApiError> {
    if name.trim().is_empty() || name.len() > 200 {
        return Err(ApiError::Validation(
            "Ingredient name must be 1 to 200 characters".to_string(),
        ));
    }

    let unit = get_unit(unit_id, pool).await?;
    if unit.is_none() {
        return Err(ApiError::Validation(format!(
            "Unit {unit_id} does not exist"
        )));
    }
    let unit = unit.unwrap();

    let ingredient: Ingredient = sqlx::query_as(
        "INSERT INTO ingredients (name, unit_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(unit_id)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(IngredientView {
        id: ingredient.id,
        name: ingredient.name,
        measurement_unit: Some(unit.name),
    })
}

pub async fn get_ingredient(
    id: i32,
    pool: &Pool<Postgres>,
) -> Result<Option<IngredientView>, ApiError> {
    let row: Option<IngredientView> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, u.name AS measurement_unit
        FROM ingredients i
        LEFT JOIN units u ON u.id = i.unit_id
        WHERE i.id = $1
    ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<IngredientView>, ApiError> {
    let list: Vec<IngredientView> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, u.name AS measurement_unit
        FROM ingredients i
        LEFT JOIN units u ON u.id = i.unit_id
        ORDER BY i.name, i.id
    ",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn search_ingredients(
    prefix: &str,
    pool: &Pool<Postgres>,
) -> Result<Vec<IngredientView>, ApiError> {
    let pattern = format!("{prefix}%");

    let list: Vec<IngredientView> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, u.name AS measurement_unit
        FROM ingredients i
        LEFT JOIN units u ON u.id = i.unit_id
        WHERE i.name ILIKE $1
        ORDER BY i.name, i.id
    ",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}
