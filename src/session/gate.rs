use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::{error, warn};

use crate::session::keys::SessionKeys;
use crate::state::AppState;
use crate::users::repo_types::User;

/// Why a request carries no usable identity.
#[derive(Debug)]
pub enum Rejection {
    /// No session cookie, or one that failed verification.
    NoSession,
    /// A valid session bound to a user that no longer exists.
    StaleSession,
    /// The credential store could not be reached.
    Backend(anyhow::Error),
}

/// The per-request authorization chokepoint: resolve the session, then the
/// user behind it. Transport concerns (redirects, cookies) are the
/// caller's job.
pub async fn resolve_current_user(state: &AppState, jar: &CookieJar) -> Result<User, Rejection> {
    let keys = SessionKeys::from_ref(state);
    let Some(user_id) = keys.resolve(jar) else {
        return Err(Rejection::NoSession);
    };
    match User::find_by_id(&state.db, user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(Rejection::StaleSession),
        Err(e) => Err(Rejection::Backend(e.into())),
    }
}

/// Extracts the authenticated user for protected handlers. Rejections
/// become responses here: unauthenticated requests are redirected to the
/// login page, stale sessions are additionally cleared.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        match resolve_current_user(state, &jar).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(Rejection::NoSession) => Err(Redirect::to("/login").into_response()),
            Err(Rejection::StaleSession) => {
                warn!("session bound to a missing user; clearing");
                let keys = SessionKeys::from_ref(state);
                let jar = jar.add(keys.removal_cookie());
                Err((jar, Redirect::to("/login")).into_response())
            }
            Err(Rejection::Backend(e)) => {
                error!(error = %e, "current-user lookup failed");
                Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response())
            }
        }
    }
}
