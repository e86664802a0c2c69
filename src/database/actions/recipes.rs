use std::collections::{HashMap, HashSet};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    authentication::permissions::ActionType,
    error::{ApiError, QueryError},
    media::{EncodedImage, MediaStore},
    payload::{IngredientAmount, Patch, RecipeFilter, RecipePatch, RecipePayload},
    schema::{
        IngredientLine, Recipe, RecipeIngredientRow, RecipeSummary, RecipeTagRow, RecipeView, Tag,
        User, UserProfile, Uuid,
    },
};

use crate::jwt::SessionData;

/// Writes the recipe row and all its associations in one transaction and
/// returns the composed view, with the author as the viewer. A stored
/// image is removed again if the write fails.
pub async fn create_recipe(
    payload: RecipePayload,
    author_id: i32,
    media: &MediaStore,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    payload.validate()?;

    let image = match payload.image.as_deref() {
        Some(uri) => Some(EncodedImage::try_from(uri)?),
        None => None,
    };
    let image_path = match &image {
        Some(image) => Some(media.store_recipe_image(image).await?),
        None => None,
    };

    match write_recipe(&payload, author_id, image_path.as_deref(), pool).await {
        Ok(recipe_id) => read_recipe(recipe_id, Some(author_id), pool).await,
        Err(e) => {
            if let Some(path) = &image_path {
                if let Err(re) = media.remove(path).await {
                    log::error!("Failed to remove orphaned image {path}: {re}");
                }
            }
            Err(e)
        }
    }
}

async fn write_recipe(
    payload: &RecipePayload,
    author_id: i32,
    image_path: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<i32, ApiError> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    check_tag_references(&payload.tags, &mut tr).await?;
    let ingredient_ids: Vec<Uuid> = payload.ingredients.iter().map(|line| line.id).collect();
    check_ingredient_references(&ingredient_ids, &mut tr).await?;

    let recipe: (i32,) = sqlx::query_as(
        "
        INSERT INTO recipes (name, text, image, cooking_time, author_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(&payload.name)
    .bind(&payload.text)
    .bind(image_path)
    .bind(payload.cooking_time)
    .bind(author_id)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let recipe_id = recipe.0;

    link_tags(recipe_id, &payload.tags, &mut tr).await?;
    upsert_ingredient_lines(recipe_id, &payload.ingredients, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(recipe_id)
}

/// Applies a partial update. Association sets are replaced wholesale as a
/// diff: removed links are deleted, added or changed lines upserted,
/// retained links never touched.
/// ATTENTION: does not check for authorship by itself, resolve the recipe
/// through [`get_recipe_mut`] first.
pub async fn update_recipe(
    id: i32,
    patch: RecipePatch,
    viewer: i32,
    media: &MediaStore,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    patch.validate()?;

    let recipe = get_recipe(id, pool).await?;
    let recipe = match recipe {
        Some(recipe) => recipe,
        None => return Err(ApiError::NotFound(format!("No recipe exists with id {id}"))),
    };

    let mut stored_image: Option<String> = None;
    let image_column: Patch<Option<String>> = match &patch.image {
        Patch::Keep => Patch::Keep,
        Patch::Set(None) => Patch::Set(None),
        Patch::Set(Some(uri)) => {
            let image = EncodedImage::try_from(uri.as_str())?;
            let path = media.store_recipe_image(&image).await?;
            stored_image = Some(path.clone());
            Patch::Set(Some(path))
        }
    };

    match apply_recipe_patch(id, &patch, &image_column, pool).await {
        Ok(()) => {
            // the old file is dead once the column points elsewhere
            if !image_column.is_keep() {
                if let Some(old) = &recipe.image {
                    if let Err(e) = media.remove(old).await {
                        log::error!("Failed to remove replaced image {old}: {e}");
                    }
                }
            }
            read_recipe(id, Some(viewer), pool).await
        }
        Err(e) => {
            if let Some(path) = &stored_image {
                if let Err(re) = media.remove(path).await {
                    log::error!("Failed to remove orphaned image {path}: {re}");
                }
            }
            Err(e)
        }
    }
}

async fn apply_recipe_patch(
    id: i32,
    patch: &RecipePatch,
    image_column: &Patch<Option<String>>,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    if let Patch::Set(tags) = &patch.tags {
        check_tag_references(tags, &mut tr).await?;
    }
    if let Patch::Set(lines) = &patch.ingredients {
        let ids: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
        check_ingredient_references(&ids, &mut tr).await?;
    }

    let scalar_change = !(patch.name.is_keep()
        && patch.text.is_keep()
        && patch.cooking_time.is_keep()
        && image_column.is_keep());

    if scalar_change {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE recipes SET ");
        let mut fields = query_builder.separated(", ");

        if let Patch::Set(name) = &patch.name {
            fields.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Patch::Set(text) = &patch.text {
            fields.push("text = ").push_bind_unseparated(text.clone());
        }
        if let Patch::Set(minutes) = &patch.cooking_time {
            fields
                .push("cooking_time = ")
                .push_bind_unseparated(*minutes);
        }
        if let Patch::Set(image) = image_column {
            fields.push("image = ").push_bind_unseparated(image.clone());
        }

        query_builder.push(" WHERE id = ").push_bind(id);

        query_builder
            .build()
            .execute(&mut *tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    if let Patch::Set(tags) = &patch.tags {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1 AND NOT (tag_id = ANY($2))")
            .bind(id)
            .bind(tags)
            .execute(&mut *tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;

        link_tags(id, tags, &mut tr).await?;
    }

    if let Patch::Set(lines) = &patch.ingredients {
        let ids: Vec<Uuid> = lines.iter().map(|line| line.id).collect();

        sqlx::query(
            "DELETE FROM recipe_ingredients WHERE recipe_id = $1 AND NOT (ingredient_id = ANY($2))",
        )
        .bind(id)
        .bind(&ids)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

        upsert_ingredient_lines(id, lines, &mut tr).await?;
    }

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(())
}

async fn check_tag_references(
    tags: &[Uuid],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    let rows: Vec<(i32,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(tags)
        .fetch_all(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let existing: HashSet<Uuid> = rows.into_iter().map(|row| row.0).collect();
    for id in tags {
        if !existing.contains(id) {
            return Err(ApiError::Validation(format!("Tag {id} does not exist")));
        }
    }

    Ok(())
}

async fn check_ingredient_references(
    ids: &[Uuid],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    let rows: Vec<(i32,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let existing: HashSet<Uuid> = rows.into_iter().map(|row| row.0).collect();
    for id in ids {
        if !existing.contains(id) {
            return Err(ApiError::Validation(format!(
                "Ingredient {id} does not exist"
            )));
        }
    }

    Ok(())
}

async fn link_tags(
    recipe_id: i32,
    tags: &[Uuid],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    if tags.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

    query_builder.push_values(tags.iter().take(65535 / 2), |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });
    query_builder.push(" ON CONFLICT DO NOTHING");

    query_builder
        .build()
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

async fn upsert_ingredient_lines(
    recipe_id: i32,
    lines: &[IngredientAmount],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    if lines.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(lines.iter().take(65535 / 3), |mut b, line| {
        b.push_bind(recipe_id)
            .push_bind(line.id)
            .push_bind(line.amount);
    });
    query_builder
        .push(" ON CONFLICT (recipe_id, ingredient_id) DO UPDATE SET amount = EXCLUDED.amount");

    query_builder
        .build()
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn get_recipe(id: i32, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_recipe_summary(
    id: i32,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeSummary>, ApiError> {
    let row: Option<RecipeSummary> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Resolves a recipe for mutation: missing recipe is NotFound, a foreign
/// recipe is Unauthorized unless the session may manage all recipes.
pub async fn get_recipe_mut(
    id: i32,
    session: SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(ApiError::Unauthorized(
                        "Only the author can modify this recipe".to_string(),
                    ))
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(ApiError::NotFound(format!("No recipe exists with id {id}"))),
    }
}

pub async fn read_recipe(
    id: i32,
    viewer: Option<i32>,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    let recipe = match recipe {
        Some(recipe) => recipe,
        None => return Err(ApiError::NotFound(format!("No recipe exists with id {id}"))),
    };

    let views = compose_views(vec![recipe], viewer, pool).await?;
    views
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("View composition returned nothing".to_string()))
}

pub async fn list_recipes(
    filter: RecipeFilter,
    viewer: Option<i32>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeView>, ApiError> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.* FROM recipes r WHERE true");

    if let Some(author) = filter.author {
        query_builder.push(" AND r.author_id = ").push_bind(author);
    }
    // conjunctive: one EXISTS per requested slug
    for slug in &filter.tag_slugs {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ")
            .push_bind(slug.clone())
            .push(")");
    }
    if let Some(user_id) = filter.favorited_by {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(user_id) = filter.in_cart_of {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM shopping_cart sc WHERE sc.recipe_id = r.id AND sc.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    query_builder.push(" ORDER BY r.name, r.id");

    let recipes: Vec<Recipe> = query_builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    compose_views(recipes, viewer, pool).await
}

/// ATTENTION: does not check for authorship by itself, resolve the recipe
/// through [`get_recipe_mut`] first.
pub async fn delete_recipe(
    id: i32,
    media: &MediaStore,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let recipe = get_recipe(id, pool).await?;
    if recipe.is_none() {
        return Err(ApiError::NotFound(format!("No recipe exists with id {id}")));
    }
    let recipe = recipe.unwrap();

    // link rows go with the recipe via ON DELETE CASCADE
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if let Some(image) = &recipe.image {
        if let Err(e) = media.remove(image).await {
            log::error!("Failed to remove image {image} of deleted recipe {id}: {e}");
        }
    }

    Ok(())
}

pub async fn list_recipe_tags(recipe_id: i32, pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.slug
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn list_recipe_ingredients(
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredientRow>, ApiError> {
    let list: Vec<RecipeIngredientRow> = sqlx::query_as(
        "
        SELECT ri.recipe_id AS recipe_id, ri.ingredient_id AS ingredient_id, ri.amount AS amount,
            i.name AS name, u.name AS measurement_unit
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        LEFT JOIN units u ON u.id = i.unit_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name, ri.ingredient_id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

async fn compose_views(
    recipes: Vec<Recipe>,
    viewer: Option<i32>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeView>, ApiError> {
    if recipes.is_empty() {
        return Ok(vec![]);
    }

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|recipe| recipe.id).collect();
    let author_ids: Vec<Uuid> = recipes
        .iter()
        .map(|recipe| recipe.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let tag_rows: Vec<RecipeTagRow> = sqlx::query_as(
        "
        SELECT rt.recipe_id AS recipe_id, t.id AS id, t.name AS name, t.color AS color, t.slug AS slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.slug
    ",
    )
    .bind(&recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let ingredient_rows: Vec<RecipeIngredientRow> = sqlx::query_as(
        "
        SELECT ri.recipe_id AS recipe_id, ri.ingredient_id AS ingredient_id, ri.amount AS amount,
            i.name AS name, u.name AS measurement_unit
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        LEFT JOIN units u ON u.id = i.unit_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY i.name, ri.ingredient_id
    ",
    )
    .bind(&recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let authors: Vec<User> = sqlx::query_as("SELECT * FROM users WHERE id = ANY($1)")
        .bind(&author_ids)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let (favorited, in_cart, followed) = match viewer {
        Some(viewer_id) => (
            fetch_id_set(
                "SELECT recipe_id FROM favorites WHERE user_id = $1 AND recipe_id = ANY($2)",
                viewer_id,
                &recipe_ids,
                pool,
            )
            .await?,
            fetch_id_set(
                "SELECT recipe_id FROM shopping_cart WHERE user_id = $1 AND recipe_id = ANY($2)",
                viewer_id,
                &recipe_ids,
                pool,
            )
            .await?,
            fetch_id_set(
                "SELECT following_id FROM subscriptions WHERE user_id = $1 AND following_id = ANY($2)",
                viewer_id,
                &author_ids,
                pool,
            )
            .await?,
        ),
        None => (HashSet::new(), HashSet::new(), HashSet::new()),
    };

    let mut tags_by_recipe: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    tag_rows
        .into_iter()
        .for_each(|row| match tags_by_recipe.get_mut(&row.recipe_id) {
            Some(v) => v.push(row.into()),
            None => {
                tags_by_recipe.insert(row.recipe_id, vec![row.into()]);
            }
        });

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<IngredientLine>> = HashMap::new();
    ingredient_rows
        .into_iter()
        .for_each(|row| match ingredients_by_recipe.get_mut(&row.recipe_id) {
            Some(v) => v.push(row.into()),
            None => {
                ingredients_by_recipe.insert(row.recipe_id, vec![row.into()]);
            }
        });

    let authors_by_id: HashMap<Uuid, User> =
        authors.into_iter().map(|user| (user.id, user)).collect();

    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let author = match authors_by_id.get(&recipe.author_id) {
            Some(author) => author.clone(),
            None => {
                return Err(ApiError::Database(format!(
                    "Recipe {} has no author row",
                    recipe.id
                )))
            }
        };
        let author = UserProfile::from_user(author, followed.contains(&recipe.author_id));

        views.push(RecipeView {
            id: recipe.id,
            tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
            author,
            ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
            is_favorited: favorited.contains(&recipe.id),
            is_in_shopping_cart: in_cart.contains(&recipe.id),
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        });
    }

    Ok(views)
}

async fn fetch_id_set(
    sql: &str,
    user_id: i32,
    ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<HashSet<Uuid>, ApiError> {
    let rows: Vec<(i32,)> = sqlx::query_as(sql)
        .bind(user_id)
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}
