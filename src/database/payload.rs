use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::RESERVED_USERNAMES;

use super::error::ApiError;
use super::schema::Uuid;

static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static TAG_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+\w\s]+$").unwrap());
static COLOR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());
static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-\w]+$").unwrap());

/// Field marker separating "leave as is" from "set to this value".
/// An absent JSON field deserializes to `Keep`, a present one to `Set`,
/// so `Set(None)` on an optional field is an explicit clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Keep,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    pub fn set_value(&self) -> Option<&T> {
        match self {
            Self::Keep => None,
            Self::Set(value) => Some(value),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Self::Set)
    }
}

/// One ingredient line of an incoming recipe payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipePayload {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipePayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_recipe_name(&self.name)?;
        validate_recipe_text(&self.text)?;
        validate_cooking_time(self.cooking_time)?;
        validate_tag_set(&self.tags)?;
        validate_ingredient_set(&self.ingredients)?;
        Ok(())
    }
}

/// Partial recipe update. Every field is a [`Patch`]; associations are
/// replaced wholesale when set, never merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePatch {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub text: Patch<String>,
    #[serde(default)]
    pub cooking_time: Patch<i32>,
    #[serde(default)]
    pub image: Patch<Option<String>>,
    #[serde(default)]
    pub tags: Patch<Vec<Uuid>>,
    #[serde(default)]
    pub ingredients: Patch<Vec<IngredientAmount>>,
}

impl RecipePatch {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Patch::Set(name) = &self.name {
            validate_recipe_name(name)?;
        }
        if let Patch::Set(text) = &self.text {
            validate_recipe_text(text)?;
        }
        if let Patch::Set(minutes) = &self.cooking_time {
            validate_cooking_time(*minutes)?;
        }
        if let Patch::Set(tags) = &self.tags {
            validate_tag_set(tags)?;
        }
        if let Patch::Set(lines) = &self.ingredients {
            validate_ingredient_set(lines)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.is_empty() || self.username.len() > 150 {
            return Err(ApiError::Validation(
                "Username must be 1 to 150 characters".to_string(),
            ));
        }
        if !USERNAME_PATTERN.is_match(&self.username) {
            return Err(ApiError::Validation(
                "Username may only contain letters, digits and .@+-".to_string(),
            ));
        }
        if RESERVED_USERNAMES
            .iter()
            .any(|r| r.eq_ignore_ascii_case(&self.username))
        {
            return Err(ApiError::Validation(format!(
                "Username {} is reserved",
                self.username
            )));
        }
        if self.email.is_empty() || self.email.len() > 254 || !EMAIL_PATTERN.is_match(&self.email)
        {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
        if self.first_name.trim().is_empty() || self.first_name.len() > 150 {
            return Err(ApiError::Validation(
                "First name must be 1 to 150 characters".to_string(),
            ));
        }
        if self.last_name.trim().is_empty() || self.last_name.len() > 150 {
            return Err(ApiError::Validation(
                "Last name must be 1 to 150 characters".to_string(),
            ));
        }
        if self.password.len() < 8 || self.password.len() > 150 {
            return Err(ApiError::Validation(
                "Password must be 8 to 150 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagPayload {
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl TagPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() || self.name.len() > 200 || !TAG_NAME_PATTERN.is_match(&self.name)
        {
            return Err(ApiError::Validation(format!(
                "Invalid tag name: {}",
                self.name
            )));
        }
        if !COLOR_PATTERN.is_match(&self.color) {
            return Err(ApiError::Validation(format!(
                "Invalid color value: {}",
                self.color
            )));
        }
        if self.slug.is_empty() || self.slug.len() > 200 || !SLUG_PATTERN.is_match(&self.slug) {
            return Err(ApiError::Validation(format!("Invalid slug: {}", self.slug)));
        }
        Ok(())
    }
}

/// Listing filters. Tag slugs are conjunctive: a recipe must carry every
/// listed slug to match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    #[serde(default)]
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<Uuid>,
    pub in_cart_of: Option<Uuid>,
}

fn validate_recipe_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Recipe name cannot be empty".to_string(),
        ));
    }
    if name.len() > 200 {
        return Err(ApiError::Validation(
            "Recipe name is limited to 200 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_recipe_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::Validation(
            "Recipe text cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_cooking_time(minutes: i32) -> Result<(), ApiError> {
    if minutes < 1 {
        return Err(ApiError::Validation(
            "Cooking time must be at least 1 minute".to_string(),
        ));
    }
    Ok(())
}

fn validate_tag_set(tags: &[Uuid]) -> Result<(), ApiError> {
    if tags.is_empty() {
        return Err(ApiError::Validation(
            "At least one tag is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for id in tags {
        if !seen.insert(id) {
            return Err(ApiError::Validation(format!("Duplicate tag in payload: {id}")));
        }
    }
    Ok(())
}

fn validate_ingredient_set(lines: &[IngredientAmount]) -> Result<(), ApiError> {
    if lines.is_empty() {
        return Err(ApiError::Validation(
            "At least one ingredient is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for line in lines {
        if line.amount < 1 {
            return Err(ApiError::Validation(format!(
                "Amount for ingredient {} must be at least 1",
                line.id
            )));
        }
        if !seen.insert(line.id) {
            return Err(ApiError::Validation(format!(
                "Duplicate ingredient in payload: {}",
                line.id
            )));
        }
    }
    Ok(())
}
