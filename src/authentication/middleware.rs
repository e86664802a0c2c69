use std::convert::Infallible;

use warp::{reject::Rejection, Filter};

use crate::constants::SESSION_COOKIE;

use super::jwt::{verify_jwt_session, SessionData};

/// Requires a valid session cookie; rejects with `ApiError::Unauthorized`
/// otherwise.
pub fn with_session() -> impl Filter<Extract = (SessionData,), Error = Rejection> + Copy {
    warp::cookie::<String>(SESSION_COOKIE).and_then(|session: String| async move {
        match verify_jwt_session(&session) {
            Ok(data) => Ok(data.into()),
            Err(e) => Err(Rejection::from(e)),
        }
    })
}

/// Extracts the session when the cookie is present and valid, `None` for
/// anonymous callers. Never rejects.
pub fn with_possible_session(
) -> impl Filter<Extract = (Option<SessionData>,), Error = Infallible> + Copy {
    warp::cookie::optional::<String>(SESSION_COOKIE).map(|session: Option<String>| {
        session
            .and_then(|token| verify_jwt_session(&token).ok())
            .map(Into::into)
    })
}
