// Not every test binary uses every helper.
#![allow(dead_code)]

use rand::{distributions::Alphanumeric, Rng};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use foodgram_sdk::{
    actions::{create_ingredient, create_tag, create_unit, register_user},
    payload::{IngredientAmount, NewUser, RecipePayload, TagPayload},
    schema::{IngredientView, Tag, UserProfile},
    MediaStore,
};

/// Connects to the database named by DATABASE_URL and brings it up to
/// date. Tests that use this are `#[ignore]`d so the default `cargo
/// test` run stays self-contained.
pub async fn pool() -> Pool<Postgres> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("failed to connect to the test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to apply migrations");

    pool
}

pub fn media() -> MediaStore {
    MediaStore::new(std::env::temp_dir().join("foodgram-test-media"))
}

/// Random lowercase suffix so fixtures never trip unique constraints
/// across test runs sharing one database.
pub fn suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

pub async fn fixture_user(pool: &Pool<Postgres>) -> UserProfile {
    let s = suffix();
    register_user(
        NewUser {
            username: format!("chef_{s}"),
            email: format!("chef_{s}@example.com"),
            first_name: "Test".to_string(),
            last_name: "Chef".to_string(),
            password: "kitchen-secret".to_string(),
        },
        pool,
    )
    .await
    .expect("user fixture")
}

pub async fn fixture_tag(pool: &Pool<Postgres>) -> Tag {
    let s = suffix();
    create_tag(
        TagPayload {
            name: format!("tag {s}"),
            color: "#49B64E".to_string(),
            slug: format!("tag-{s}"),
        },
        pool,
    )
    .await
    .expect("tag fixture")
}

pub async fn fixture_ingredient(name: &str, unit: &str, pool: &Pool<Postgres>) -> IngredientView {
    let unit = create_unit(unit, pool).await.expect("unit fixture");
    create_ingredient(name, unit.id, pool)
        .await
        .expect("ingredient fixture")
}

pub fn recipe_payload(
    name: &str,
    tags: Vec<i32>,
    ingredients: Vec<IngredientAmount>,
) -> RecipePayload {
    RecipePayload {
        name: name.to_string(),
        text: "Mix everything and serve.".to_string(),
        cooking_time: 15,
        image: None,
        tags,
        ingredients,
    }
}
