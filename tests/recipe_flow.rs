mod common;

use std::collections::HashSet;

use foodgram_sdk::{
    actions::{
        create_recipe, delete_recipe, get_recipe, get_recipe_mut, list_recipe_ingredients,
        list_recipe_tags, list_recipes, read_recipe, update_recipe,
    },
    error::ApiError,
    jwt::SessionData,
    payload::{IngredientAmount, Patch, RecipeFilter, RecipePatch},
    schema::{UserProfile, UserRole},
};

use common::{fixture_ingredient, fixture_tag, fixture_user, media, pool, recipe_payload};

fn session_for(profile: &UserProfile) -> SessionData {
    SessionData {
        user_id: profile.id,
        username: profile.username.clone(),
        role: UserRole::User,
        is_admin: false,
    }
}

fn admin_session(profile: &UserProfile) -> SessionData {
    SessionData {
        user_id: profile.id,
        username: profile.username.clone(),
        role: UserRole::Admin,
        is_admin: true,
    }
}

#[tokio::test]
#[ignore]
async fn created_recipe_reads_back_with_all_parts() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;

    let breakfast = fixture_tag(&pool).await;
    let vegan = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;
    let milk = fixture_ingredient("milk", "ml", &pool).await;

    let payload = recipe_payload(
        "Pancakes",
        vec![breakfast.id, vegan.id],
        vec![
            IngredientAmount {
                id: flour.id,
                amount: 200,
            },
            IngredientAmount {
                id: milk.id,
                amount: 300,
            },
        ],
    );

    let view = create_recipe(payload, author.id, &media, &pool)
        .await
        .expect("create");

    assert_eq!(view.name, "Pancakes");
    assert_eq!(view.author.id, author.id);
    assert!(!view.is_favorited);
    assert!(!view.is_in_shopping_cart);

    let tag_ids: HashSet<i32> = view.tags.iter().map(|tag| tag.id).collect();
    assert_eq!(tag_ids, HashSet::from([breakfast.id, vegan.id]));

    let amounts: HashSet<(i32, i32)> = view
        .ingredients
        .iter()
        .map(|line| (line.id, line.amount))
        .collect();
    assert_eq!(amounts, HashSet::from([(flour.id, 200), (milk.id, 300)]));

    let reread = read_recipe(view.id, None, &pool).await.expect("read");
    assert_eq!(reread.name, view.name);
    assert_eq!(reread.tags.len(), 2);
    assert_eq!(reread.ingredients.len(), 2);
}

#[tokio::test]
#[ignore]
async fn rejected_payload_leaves_nothing_behind() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;

    let tag = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;

    // same ingredient twice
    let payload = recipe_payload(
        "Broken",
        vec![tag.id],
        vec![
            IngredientAmount {
                id: flour.id,
                amount: 100,
            },
            IngredientAmount {
                id: flour.id,
                amount: 200,
            },
        ],
    );
    let err = create_recipe(payload, author.id, &media, &pool)
        .await
        .expect_err("duplicate ingredient must be rejected");
    assert!(matches!(err, ApiError::Validation(_)));

    // dangling tag reference
    let payload = recipe_payload(
        "Broken",
        vec![tag.id, 0],
        vec![IngredientAmount {
            id: flour.id,
            amount: 100,
        }],
    );
    let err = create_recipe(payload, author.id, &media, &pool)
        .await
        .expect_err("dangling tag must be rejected");
    assert!(matches!(err, ApiError::Validation(_)));

    let filter = RecipeFilter {
        author: Some(author.id),
        ..Default::default()
    };
    let listed = list_recipes(filter, None, &pool).await.expect("list");
    assert!(listed.is_empty());
}

#[tokio::test]
#[ignore]
async fn name_only_patch_preserves_associations() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;

    let tag = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;

    let view = create_recipe(
        recipe_payload(
            "Bread",
            vec![tag.id],
            vec![IngredientAmount {
                id: flour.id,
                amount: 500,
            }],
        ),
        author.id,
        &media,
        &pool,
    )
    .await
    .expect("create");

    let patch = RecipePatch {
        name: Patch::Set("Sourdough".to_string()),
        ..Default::default()
    };
    let updated = update_recipe(view.id, patch, author.id, &media, &pool)
        .await
        .expect("update");

    assert_eq!(updated.name, "Sourdough");

    let tags = list_recipe_tags(view.id, &pool).await.expect("tags");
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].id, tag.id);

    let lines = list_recipe_ingredients(view.id, &pool)
        .await
        .expect("ingredients");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].ingredient_id, flour.id);
    assert_eq!(lines[0].amount, 500);
}

#[tokio::test]
#[ignore]
async fn association_patch_replaces_the_whole_set() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;

    let kept = fixture_tag(&pool).await;
    let dropped = fixture_tag(&pool).await;
    let added = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;
    let sugar = fixture_ingredient("sugar", "g", &pool).await;

    let view = create_recipe(
        recipe_payload(
            "Cake",
            vec![kept.id, dropped.id],
            vec![IngredientAmount {
                id: flour.id,
                amount: 300,
            }],
        ),
        author.id,
        &media,
        &pool,
    )
    .await
    .expect("create");

    let patch = RecipePatch {
        tags: Patch::Set(vec![kept.id, added.id]),
        ingredients: Patch::Set(vec![
            IngredientAmount {
                id: flour.id,
                amount: 250,
            },
            IngredientAmount {
                id: sugar.id,
                amount: 100,
            },
        ]),
        ..Default::default()
    };
    let updated = update_recipe(view.id, patch, author.id, &media, &pool)
        .await
        .expect("update");

    let tag_ids: HashSet<i32> = updated.tags.iter().map(|tag| tag.id).collect();
    assert_eq!(tag_ids, HashSet::from([kept.id, added.id]));

    let amounts: HashSet<(i32, i32)> = updated
        .ingredients
        .iter()
        .map(|line| (line.id, line.amount))
        .collect();
    assert_eq!(amounts, HashSet::from([(flour.id, 250), (sugar.id, 100)]));
}

#[tokio::test]
#[ignore]
async fn only_the_author_or_an_admin_may_modify() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;
    let other = fixture_user(&pool).await;

    let tag = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;

    let view = create_recipe(
        recipe_payload(
            "Pasta",
            vec![tag.id],
            vec![IngredientAmount {
                id: flour.id,
                amount: 400,
            }],
        ),
        author.id,
        &media,
        &pool,
    )
    .await
    .expect("create");

    let err = get_recipe_mut(view.id, session_for(&other), &pool)
        .await
        .expect_err("foreign session must be rejected");
    assert!(matches!(err, ApiError::Unauthorized(_)));

    get_recipe_mut(view.id, session_for(&author), &pool)
        .await
        .expect("author may modify");
    get_recipe_mut(view.id, admin_session(&other), &pool)
        .await
        .expect("admin may modify");
}

#[tokio::test]
#[ignore]
async fn tag_filter_requires_every_slug() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;

    let first = fixture_tag(&pool).await;
    let second = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;

    let _single = create_recipe(
        recipe_payload(
            "Only first",
            vec![first.id],
            vec![IngredientAmount {
                id: flour.id,
                amount: 100,
            }],
        ),
        author.id,
        &media,
        &pool,
    )
    .await
    .expect("create");

    let both = create_recipe(
        recipe_payload(
            "Both tags",
            vec![first.id, second.id],
            vec![IngredientAmount {
                id: flour.id,
                amount: 100,
            }],
        ),
        author.id,
        &media,
        &pool,
    )
    .await
    .expect("create");

    let filter = RecipeFilter {
        author: Some(author.id),
        tag_slugs: vec![first.slug.clone(), second.slug.clone()],
        ..Default::default()
    };
    let listed = list_recipes(filter, None, &pool).await.expect("list");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, both.id);
}

#[tokio::test]
#[ignore]
async fn deleting_a_recipe_clears_its_associations() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;

    let tag = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;

    let view = create_recipe(
        recipe_payload(
            "Short lived",
            vec![tag.id],
            vec![IngredientAmount {
                id: flour.id,
                amount: 100,
            }],
        ),
        author.id,
        &media,
        &pool,
    )
    .await
    .expect("create");

    delete_recipe(view.id, &media, &pool).await.expect("delete");

    assert!(get_recipe(view.id, &pool).await.expect("get").is_none());

    let err = read_recipe(view.id, None, &pool)
        .await
        .expect_err("reading a deleted recipe must fail");
    assert!(matches!(err, ApiError::NotFound(_)));

    let lines = list_recipe_ingredients(view.id, &pool)
        .await
        .expect("ingredients");
    assert!(lines.is_empty());
}
