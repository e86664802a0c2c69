pub const SHOPPING_LIST_HEADER: &str = "Shopping list:";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";

/// Usernames that can never be registered; they collide with routes
/// of the consuming API ("/users/me").
pub const RESERVED_USERNAMES: &[&str] = &["me"];

/// Recipes attached to each author entry in a subscription listing
/// when the caller gives no limit.
pub const SUBSCRIPTION_RECIPE_PREVIEW: i64 = 3;

pub const RECIPE_IMAGE_DIR: &str = "recipes/images";

pub const SESSION_COOKIE: &str = "session";

pub const USER_ROLES: &[(&str, &str)] = &[
    ("user", "Regular user"),
    ("admin", "Administrator"),
];
