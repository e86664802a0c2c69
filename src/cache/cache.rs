use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};

use crate::{
    actions::{list_ingredients, list_tags},
    error::{ApiError, CacheError},
    schema::{IngredientView, Tag},
};

// Caching - keys

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub enum CatalogKey {
    Tags,
    Ingredients,
}

impl CatalogKey {
    pub fn key(&self) -> &'static str {
        match self {
            CatalogKey::Tags => "catalog-tags",
            CatalogKey::Ingredients => "catalog-ingredients",
        }
    }
}

// Caching - wrappers

/// Catalog lists are stored as one serialized blob per key, not as redis
/// collections, so a read is a single GET.
#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct CachedTags(pub Vec<Tag>);

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct CachedIngredients(pub Vec<IngredientView>);

/// Tag catalog with read-through caching. An entry that fails to decode
/// is deleted and the list is refetched from the database.
pub async fn list_tags_cached(
    cache: &mut MultiplexedConnection,
    pool: &Pool<Postgres>,
) -> Result<Vec<Tag>, ApiError> {
    let key = CatalogKey::Tags.key();

    let cached: Option<CachedTags> = match get_cache_value(key, cache).await {
        Ok(value) => value,
        Err(e) => {
            log::error!("> Failed to decode cached value. Deleting {key}: {e}");
            if let Err(e) = delete_cache_value(key, cache).await {
                log::error!("> Failed to delete cached value! {e}");
            }
            None
        }
    };

    if let Some(CachedTags(list)) = cached {
        log::trace!("> Found {key}");
        return Ok(list);
    }

    log::trace!("> Fetching {key}");
    let list = list_tags(pool).await?;

    // a failed write only costs the next reader a database roundtrip
    if let Err(e) = set_cache_value(key, CachedTags(list.clone()), cache).await {
        log::error!("{e:?}");
    }

    Ok(list)
}

/// Ingredient catalog with read-through caching, same contract as
/// [`list_tags_cached`].
pub async fn list_ingredients_cached(
    cache: &mut MultiplexedConnection,
    pool: &Pool<Postgres>,
) -> Result<Vec<IngredientView>, ApiError> {
    let key = CatalogKey::Ingredients.key();

    let cached: Option<CachedIngredients> = match get_cache_value(key, cache).await {
        Ok(value) => value,
        Err(e) => {
            log::error!("> Failed to decode cached value. Deleting {key}: {e}");
            if let Err(e) = delete_cache_value(key, cache).await {
                log::error!("> Failed to delete cached value! {e}");
            }
            None
        }
    };

    if let Some(CachedIngredients(list)) = cached {
        log::trace!("> Found {key}");
        return Ok(list);
    }

    log::trace!("> Fetching {key}");
    let list = list_ingredients(pool).await?;

    if let Err(e) = set_cache_value(key, CachedIngredients(list.clone()), cache).await {
        log::error!("{e:?}");
    }

    Ok(list)
}

/// Drops both catalog entries. Runs after any tag, unit or ingredient
/// mutation so readers never see a stale catalog.
pub async fn invalidate_catalogs(cache: &mut MultiplexedConnection) -> Result<(), ApiError> {
    delete_cache_value(CatalogKey::Tags.key(), cache).await?;
    delete_cache_value(CatalogKey::Ingredients.key(), cache).await?;

    Ok(())
}

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), ApiError> {
    let _: () = cache
        .set(key, value)
        .await
        .map_err(|e| CacheError::from(e).into())?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), ApiError> {
    let _: () = cache
        .del(key)
        .await
        .map_err(|e| CacheError::from(e).into())?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, ApiError> {
    let value: Option<V> = cache
        .get(key)
        .await
        .map_err(|e| CacheError::from(e).into())?;

    Ok(value)
}
