mod common;

use foodgram_sdk::{
    actions::{
        add_favorite, add_to_cart, create_recipe, get_user_profile, is_favorite, is_in_cart,
        is_subscribed, list_following, list_recipes, read_recipe, remove_favorite,
        remove_from_cart, subscribe, unsubscribe,
    },
    error::ApiError,
    payload::{IngredientAmount, RecipeFilter},
};

use common::{fixture_ingredient, fixture_tag, fixture_user, media, pool, recipe_payload};

#[tokio::test]
#[ignore]
async fn favorite_marks_show_only_for_their_owner() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;
    let fan = fixture_user(&pool).await;

    let tag = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;

    let view = create_recipe(
        recipe_payload(
            "Waffles",
            vec![tag.id],
            vec![IngredientAmount {
                id: flour.id,
                amount: 150,
            }],
        ),
        author.id,
        &media,
        &pool,
    )
    .await
    .expect("create");

    let summary = add_favorite(fan.id, view.id, &pool).await.expect("add");
    assert_eq!(summary.id, view.id);
    assert!(is_favorite(fan.id, view.id, &pool).await.expect("check"));

    let as_fan = read_recipe(view.id, Some(fan.id), &pool).await.expect("read");
    assert!(as_fan.is_favorited);

    let as_author = read_recipe(view.id, Some(author.id), &pool)
        .await
        .expect("read");
    assert!(!as_author.is_favorited);

    let anonymous = read_recipe(view.id, None, &pool).await.expect("read");
    assert!(!anonymous.is_favorited);
    assert!(!anonymous.author.is_subscribed);
}

#[tokio::test]
#[ignore]
async fn favorites_are_exclusive_per_pair() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;
    let fan = fixture_user(&pool).await;

    let tag = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;

    let view = create_recipe(
        recipe_payload(
            "Scones",
            vec![tag.id],
            vec![IngredientAmount {
                id: flour.id,
                amount: 150,
            }],
        ),
        author.id,
        &media,
        &pool,
    )
    .await
    .expect("create");

    add_favorite(fan.id, view.id, &pool).await.expect("add");

    let err = add_favorite(fan.id, view.id, &pool)
        .await
        .expect_err("second add must conflict");
    assert!(matches!(err, ApiError::Conflict(_)));

    remove_favorite(fan.id, view.id, &pool).await.expect("remove");

    let err = remove_favorite(fan.id, view.id, &pool)
        .await
        .expect_err("second removal must be missing");
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = add_favorite(fan.id, 0, &pool)
        .await
        .expect_err("marking a missing recipe must fail");
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
#[ignore]
async fn cart_follows_the_same_pair_semantics() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;
    let shopper = fixture_user(&pool).await;

    let tag = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;

    let view = create_recipe(
        recipe_payload(
            "Pierogi",
            vec![tag.id],
            vec![IngredientAmount {
                id: flour.id,
                amount: 250,
            }],
        ),
        author.id,
        &media,
        &pool,
    )
    .await
    .expect("create");

    add_to_cart(shopper.id, view.id, &pool).await.expect("add");
    assert!(is_in_cart(shopper.id, view.id, &pool).await.expect("check"));

    let err = add_to_cart(shopper.id, view.id, &pool)
        .await
        .expect_err("second add must conflict");
    assert!(matches!(err, ApiError::Conflict(_)));

    let as_shopper = read_recipe(view.id, Some(shopper.id), &pool)
        .await
        .expect("read");
    assert!(as_shopper.is_in_shopping_cart);

    remove_from_cart(shopper.id, view.id, &pool)
        .await
        .expect("remove");
    assert!(!is_in_cart(shopper.id, view.id, &pool).await.expect("check"));
}

#[tokio::test]
#[ignore]
async fn favorited_filter_lists_only_marked_recipes() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;
    let fan = fixture_user(&pool).await;

    let tag = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;

    let marked = create_recipe(
        recipe_payload(
            "Marked",
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

    let _unmarked = create_recipe(
        recipe_payload(
            "Unmarked",
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

    add_favorite(fan.id, marked.id, &pool).await.expect("add");

    let filter = RecipeFilter {
        author: Some(author.id),
        favorited_by: Some(fan.id),
        ..Default::default()
    };
    let listed = list_recipes(filter, Some(fan.id), &pool).await.expect("list");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, marked.id);
    assert!(listed[0].is_favorited);
}

#[tokio::test]
#[ignore]
async fn self_subscription_is_rejected_before_anything_else() {
    let pool = pool().await;
    let user = fixture_user(&pool).await;

    let err = subscribe(user.id, user.id, &pool)
        .await
        .expect_err("self subscription must fail");
    assert!(matches!(err, ApiError::Validation(_)));

    let err = unsubscribe(user.id, user.id, &pool)
        .await
        .expect_err("self unsubscription must fail");
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
#[ignore]
async fn subscription_listing_carries_recipe_previews() {
    let pool = pool().await;
    let media = media();
    let author = fixture_user(&pool).await;
    let follower = fixture_user(&pool).await;

    let tag = fixture_tag(&pool).await;
    let flour = fixture_ingredient("flour", "g", &pool).await;

    let mut last_id = 0;
    for n in 0..4 {
        let view = create_recipe(
            recipe_payload(
                &format!("Dish {n}"),
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
        last_id = view.id;
    }

    let entry = subscribe(follower.id, author.id, &pool)
        .await
        .expect("subscribe");
    assert!(entry.is_subscribed);
    assert_eq!(entry.recipes_count, 4);
    assert_eq!(entry.recipes.len(), 3);

    let err = subscribe(follower.id, author.id, &pool)
        .await
        .expect_err("second subscription must conflict");
    assert!(matches!(err, ApiError::Conflict(_)));

    let following = list_following(follower.id, None, &pool)
        .await
        .expect("list");
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].id, author.id);
    // newest first
    assert_eq!(following[0].recipes[0].id, last_id);

    let capped = list_following(follower.id, Some(1), &pool)
        .await
        .expect("list");
    assert_eq!(capped[0].recipes.len(), 1);
}

#[tokio::test]
#[ignore]
async fn unsubscribing_reports_the_final_state() {
    let pool = pool().await;
    let author = fixture_user(&pool).await;
    let follower = fixture_user(&pool).await;

    subscribe(follower.id, author.id, &pool)
        .await
        .expect("subscribe");
    assert!(is_subscribed(follower.id, author.id, &pool)
        .await
        .expect("check"));

    let profile = get_user_profile(author.id, Some(follower.id), &pool)
        .await
        .expect("profile");
    assert!(profile.is_subscribed);

    let entry = unsubscribe(follower.id, author.id, &pool)
        .await
        .expect("unsubscribe");
    assert!(!entry.is_subscribed);

    let err = unsubscribe(follower.id, author.id, &pool)
        .await
        .expect_err("second unsubscription must be missing");
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = subscribe(follower.id, 0, &pool)
        .await
        .expect_err("subscribing to a missing user must fail");
    assert!(matches!(err, ApiError::NotFound(_)));
}
