use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::generate_jwt_session,
    },
    error::{ApiError, QueryError},
    payload::NewUser,
    schema::{User, UserProfile},
};

use sqlx::{Pool, Postgres};

use super::subscriptions::is_subscribed;

pub async fn get_user(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(
    pool: &Pool<Postgres>,
    user_id: i32,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Creates a user from a validated payload; the password is stored as an
/// argon2 hash.
pub async fn register_user(user: NewUser, pool: &Pool<Postgres>) -> Result<UserProfile, ApiError> {
    user.validate()?;

    if get_user(pool, &user.username).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Username {} is already taken",
            user.username
        )));
    }
    if get_user_by_email(pool, &user.email).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Email {} is already registered",
            user.email
        )));
    }

    let password_hash = hash_password(&user.password)
        .map_err(|_| ApiError::Internal("Failed to hash password".to_string()))?;

    // The unique constraints still backstop a concurrent registration;
    // the 23505 classifier turns that race into a Conflict as well.
    let row: User = sqlx::query_as(
        "
        INSERT INTO users (username, email, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *;
    ",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(password_hash)
    .fetch_one(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(UserProfile::from_user(row, false))
}

pub async fn login_user(
    email: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = get_user_by_email(pool, email).await?;
    if user.is_none() {
        return Err(ApiError::invalid_credentials());
    }

    let user = user.unwrap();
    let authenticated = verify_password(password, &user.password)
        .map_err(|_| ApiError::Internal("Failed to verify password".to_string()))?;
    if !authenticated {
        return Err(ApiError::invalid_credentials());
    }

    let session = generate_jwt_session(&user);

    Ok(session)
}

pub async fn set_password(
    user_id: i32,
    current_password: &str,
    new_password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let user = get_user_by_id(pool, user_id).await?;
    let user = match user {
        Some(user) => user,
        None => return Err(ApiError::NotFound(format!("No user exists with id {user_id}"))),
    };

    let authenticated = verify_password(current_password, &user.password)
        .map_err(|_| ApiError::Internal("Failed to verify password".to_string()))?;
    if !authenticated {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    if new_password.len() < 8 || new_password.len() > 150 {
        return Err(ApiError::Validation(
            "Password must be 8 to 150 characters".to_string(),
        ));
    }

    let password_hash = hash_password(new_password)
        .map_err(|_| ApiError::Internal("Failed to hash password".to_string()))?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// Profile with the viewer-relative subscription flag. Anonymous viewers
/// and self-views read false.
pub async fn get_user_profile(
    id: i32,
    viewer: Option<i32>,
    pool: &Pool<Postgres>,
) -> Result<UserProfile, ApiError> {
    let user = get_user_by_id(pool, id).await?;
    let user = match user {
        Some(user) => user,
        None => return Err(ApiError::NotFound(format!("No user exists with id {id}"))),
    };

    let subscribed = match viewer {
        Some(viewer_id) if viewer_id != id => is_subscribed(viewer_id, id, pool).await?,
        _ => false,
    };

    Ok(UserProfile::from_user(user, subscribed))
}
