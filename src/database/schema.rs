use serde::{Deserialize, Serialize};

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Unit {
    pub id: Uuid,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub unit_id: Option<Uuid>,
}

/// Catalog row with the unit name joined in; `measurement_unit` is None
/// once the referenced unit has been deleted.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct IngredientView {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: Option<String>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Tag row with the owning recipe joined in, for batch view composition.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeTagRow {
    pub recipe_id: Uuid,
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<RecipeTagRow> for Tag {
    fn from(row: RecipeTagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            color: row.color,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub author_id: Uuid,
}

/// One ingredient line of a recipe with display fields joined in.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredientRow {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub amount: i32,
    pub name: String,
    pub measurement_unit: Option<String>,
}

/// Raw shopping-cart line before reduction: the display identity of an
/// ingredient plus the amount one recipe asks for.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: Option<String>,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListEntry {
    pub name: String,
    pub measurement_unit: Option<String>,
    pub total: i64,
}

/// The rendered export the caller streams back as a named attachment.
/// The whole report lives in this struct; nothing temporary survives the
/// request.
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingListFile {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserProfile {
    pub fn from_user(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientLine {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: Option<String>,
    pub amount: i32,
}

impl From<RecipeIngredientRow> for IngredientLine {
    fn from(row: RecipeIngredientRow) -> Self {
        Self {
            id: row.ingredient_id,
            name: row.name,
            measurement_unit: row.measurement_unit,
            amount: row.amount,
        }
    }
}

/// Full recipe representation: the recipe row composed with its tag set,
/// ingredient lines, author profile and the viewer-relative flags.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserProfile,
    pub ingredients: Vec<IngredientLine>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

/// One entry of a subscription listing: the followed author plus a recipe
/// preview. In a listing `is_subscribed` is true by premise; after an
/// unsubscribe the returned entry carries false.
#[derive(Debug, Clone, Serialize)]
pub struct FollowedAuthor {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}
