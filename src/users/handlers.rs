use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{error, info, instrument};

use crate::render::View;
use crate::session::{CurrentUser, SessionKeys};
use crate::state::AppState;
use crate::users::dto::{AvatarUpload, LoginForm, ProfileForm, PublicUser, RegisterForm};
use crate::users::repo_types::User;
use crate::users::services::{self, ServiceError};

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home_page))
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
        .route("/edit", get(edit_page).post(update_profile))
        .route("/users", get(list_users))
        .route("/account/delete", post(delete_account))
}

pub fn avatar_routes(max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/avatar", get(avatar_page).post(upload_avatar))
        .layer(DefaultBodyLimit::max(max_bytes))
}

/// The HTMX redirect contract: an empty 204 plus an HX-Location header
/// the client navigates to.
fn hx_redirect(to: &'static str) -> (StatusCode, HeaderMap) {
    let mut headers = HeaderMap::new();
    headers.insert("hx-location", HeaderValue::from_static(to));
    (StatusCode::NO_CONTENT, headers)
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".into())
}

fn render_page(
    state: &AppState,
    template: &str,
    view: View<'_>,
) -> Result<Html<String>, (StatusCode, String)> {
    state
        .templates
        .render(template, view)
        .map(Html)
        .map_err(internal)
}

fn render_errors(state: &AppState, messages: &[String]) -> Result<Response, (StatusCode, String)> {
    Ok(render_page(state, "auth_errors", View::Errors(messages))?.into_response())
}

// --- pages ---

#[instrument(skip(state, user))]
async fn home_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, (StatusCode, String)> {
    render_page(&state, "home", View::User(&user))
}

async fn register_page(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, String)> {
    render_page(&state, "register", View::Empty)
}

async fn login_page(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, String)> {
    render_page(&state, "login", View::Empty)
}

async fn edit_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, (StatusCode, String)> {
    render_page(&state, "edit_profile", View::User(&user))
}

async fn avatar_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, (StatusCode, String)> {
    render_page(&state, "upload_avatar", View::User(&user))
}

// --- actions ---

#[instrument(skip(state, form))]
async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, (StatusCode, String)> {
    match services::register(&state, form).await {
        Ok(_) => Ok(hx_redirect("/login").into_response()),
        Err(ServiceError::Validation(messages)) => render_errors(&state, &messages),
        Err(ServiceError::Internal(e)) => Err(internal(e)),
    }
}

#[instrument(skip(state, jar, form))]
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, (StatusCode, String)> {
    match services::login(&state, form).await {
        Ok(user) => {
            let keys = SessionKeys::from_ref(&state);
            let cookie = keys.issue(user.id).map_err(internal)?;
            Ok((jar.add(cookie), hx_redirect("/")).into_response())
        }
        Err(ServiceError::Validation(messages)) => render_errors(&state, &messages),
        Err(ServiceError::Internal(e)) => Err(internal(e)),
    }
}

#[instrument(skip(state, jar))]
async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let keys = SessionKeys::from_ref(&state);
    (jar.add(keys.removal_cookie()), hx_redirect("/login")).into_response()
}

#[instrument(skip(state, user, form))]
async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, (StatusCode, String)> {
    match services::update_profile(&state, &user, form).await {
        Ok(()) => Ok(hx_redirect("/").into_response()),
        Err(ServiceError::Validation(messages)) => render_errors(&state, &messages),
        Err(ServiceError::Internal(e)) => Err(internal(e)),
    }
}

#[instrument(skip(state, user, multipart))]
async fn upload_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        upload = Some(AvatarUpload { file_name, bytes });
        break;
    }
    let Some(upload) = upload else {
        return render_errors(&state, &["No file submitted".to_string()]);
    };

    match services::update_avatar(&state, &user, upload).await {
        Ok(()) => Ok(hx_redirect("/").into_response()),
        Err(ServiceError::Validation(messages)) => render_errors(&state, &messages),
        Err(ServiceError::Internal(e)) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
async fn list_users(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<PublicUser>>, (StatusCode, String)> {
    let users = User::list_all(&state.db).await.map_err(internal)?;
    let listing = users
        .into_iter()
        .map(|u| PublicUser {
            id: u.id,
            name: u.name,
            category: u.category,
        })
        .collect();
    Ok(Json(listing))
}

#[instrument(skip(state, jar, user))]
async fn delete_account(
    State(state): State<AppState>,
    jar: CookieJar,
    CurrentUser(user): CurrentUser,
) -> Result<Response, (StatusCode, String)> {
    User::delete(&state.db, user.id).await.map_err(internal)?;
    info!(user_id = %user.id, "account deleted");
    let keys = SessionKeys::from_ref(&state);
    Ok((jar.add(keys.removal_cookie()), hx_redirect("/register")).into_response())
}
