use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use time::macros::{date, format_description};
use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;
use crate::users::dto::{AvatarUpload, LoginForm, ProfileForm, RegisterForm};
use crate::users::password::{hash_password, verify_password};
use crate::users::repo::StoreError;
use crate::users::repo_types::{User, UserDraft};

/// Shared by the unknown-email and wrong-password paths; login must never
/// reveal which of the two was wrong.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub const DEFAULT_BIO: &str = "Bio goes here";
pub const DEFAULT_DATE_OF_BIRTH: Date = date!(2001 - 01 - 01);

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed")]
    Validation(Vec<String>),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    fn message(msg: &str) -> Self {
        Self::Validation(vec![msg.to_string()])
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Collects every violation; never stops at the first.
fn validate_registration(form: &RegisterForm) -> Vec<String> {
    let mut messages = Vec::new();
    if form.name.trim().is_empty() {
        messages.push("Name is required".to_string());
    }
    if form.email.is_empty() {
        messages.push("Email is required".to_string());
    } else if !is_valid_email(&form.email) {
        messages.push("Invalid email address".to_string());
    }
    if form.password.is_empty() {
        messages.push("Password is required".to_string());
    }
    messages
}

pub async fn register(state: &AppState, mut form: RegisterForm) -> Result<User, ServiceError> {
    form.email = form.email.trim().to_lowercase();

    let messages = validate_registration(&form);
    if !messages.is_empty() {
        return Err(ServiceError::Validation(messages));
    }

    let password_hash =
        hash_password(&form.password).map_err(|e| ServiceError::Internal(e.into()))?;

    let draft = UserDraft {
        email: form.email,
        password_hash,
        name: form.name.trim().to_string(),
        category: form.category,
        date_of_birth: DEFAULT_DATE_OF_BIRTH,
        bio: DEFAULT_BIO.to_string(),
        avatar: String::new(),
    };

    match User::create(&state.db, draft).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            Ok(user)
        }
        Err(StoreError::DuplicateEmail) => {
            Err(ServiceError::message("Email is already registered"))
        }
        Err(e) => Err(ServiceError::Internal(e.into())),
    }
}

/// Verifies credentials and returns the user; the handler layer turns this
/// into a session cookie.
pub async fn login(state: &AppState, mut form: LoginForm) -> Result<User, ServiceError> {
    form.email = form.email.trim().to_lowercase();

    let mut messages = Vec::new();
    if form.email.is_empty() {
        messages.push("Email is required".to_string());
    }
    if form.password.is_empty() {
        messages.push("Password is required".to_string());
    }
    if !messages.is_empty() {
        return Err(ServiceError::Validation(messages));
    }

    let user = match User::find_by_email(&state.db, &form.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(email = %form.email, "login with unknown email");
            return Err(ServiceError::message(INVALID_CREDENTIALS));
        }
        Err(e) => return Err(ServiceError::Internal(e.into())),
    };

    let ok = verify_password(&form.password, &user.password_hash)
        .map_err(|e| ServiceError::Internal(e.into()))?;
    if !ok {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ServiceError::message(INVALID_CREDENTIALS));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

pub fn parse_birth_date(input: &str) -> Result<Date, time::error::Parse> {
    Date::parse(input, format_description!("[year]-[month]-[day]"))
}

/// Applies a profile edit to `current_user` only; the id always comes from
/// the session, never from the request.
pub async fn update_profile(
    state: &AppState,
    current_user: &User,
    form: ProfileForm,
) -> Result<(), ServiceError> {
    let mut messages = Vec::new();
    if form.name.trim().is_empty() {
        messages.push("Name is required".to_string());
    }
    let parsed = if form.dob.is_empty() {
        messages.push("Date of Birth is required".to_string());
        None
    } else {
        parse_birth_date(&form.dob)
            .map_err(|_| messages.push("Invalid date format".to_string()))
            .ok()
    };
    let Some(dob) = parsed.filter(|_| messages.is_empty()) else {
        return Err(ServiceError::Validation(messages));
    };

    User::update_profile(
        &state.db,
        current_user.id,
        form.name.trim(),
        current_user.category,
        dob,
        &form.bio,
    )
    .await
    .map_err(|e| ServiceError::Internal(e.into()))?;

    info!(user_id = %current_user.id, "profile updated");
    Ok(())
}

/// Fresh name per upload so concurrent writes never collide; the client
/// name contributes only its extension.
pub fn unique_avatar_name(original: &str) -> String {
    let id = Uuid::new_v4();
    match Path::new(original).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{id}.{ext}"),
        _ => id.to_string(),
    }
}

pub async fn update_avatar(
    state: &AppState,
    current_user: &User,
    upload: AvatarUpload,
) -> Result<(), ServiceError> {
    if upload.bytes.is_empty() {
        return Err(ServiceError::message("No file submitted"));
    }
    if upload.bytes.len() > state.config.uploads.max_bytes {
        return Err(ServiceError::message("Avatar file is too large"));
    }

    let name = unique_avatar_name(&upload.file_name);
    state
        .storage
        .write(&name, upload.bytes)
        .await
        .map_err(ServiceError::Internal)?;
    User::update_avatar(&state.db, current_user.id, &name)
        .await
        .map_err(|e| ServiceError::Internal(e.into()))?;

    // Best-effort cleanup of the replaced file; failure only logs.
    if !current_user.avatar.is_empty() && current_user.avatar != name {
        if let Err(e) = state.storage.delete(&current_user.avatar).await {
            warn!(error = %e, avatar = %current_user.avatar, "failed to delete old avatar");
        }
    }

    info!(user_id = %current_user.id, avatar = %name, "avatar updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registration_reports_every_field() {
        let form = RegisterForm {
            name: String::new(),
            email: String::new(),
            password: String::new(),
            category: 0,
        };
        let messages = validate_registration(&form);
        assert_eq!(
            messages,
            vec![
                "Name is required".to_string(),
                "Email is required".to_string(),
                "Password is required".to_string(),
            ]
        );
    }

    #[test]
    fn malformed_email_is_reported_alongside_other_violations() {
        let form = RegisterForm {
            name: String::new(),
            email: "not-an-email".into(),
            password: "hunter22".into(),
            category: 0,
        };
        let messages = validate_registration(&form);
        assert_eq!(
            messages,
            vec![
                "Name is required".to_string(),
                "Invalid email address".to_string(),
            ]
        );
    }

    #[test]
    fn valid_registration_has_no_messages() {
        let form = RegisterForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "s3cret".into(),
            category: 1,
        };
        assert!(validate_registration(&form).is_empty());
    }

    #[test]
    fn birth_date_parses_in_fixed_format() {
        assert_eq!(parse_birth_date("2001-01-01").unwrap(), DEFAULT_DATE_OF_BIRTH);
        assert_eq!(
            parse_birth_date("1990-06-15").unwrap(),
            date!(1990 - 06 - 15)
        );
    }

    #[test]
    fn unparseable_birth_date_is_an_error_not_a_crash() {
        assert!(parse_birth_date("not-a-date").is_err());
        assert!(parse_birth_date("2001-13-40").is_err());
        assert!(parse_birth_date("01/01/2001").is_err());
    }

    #[test]
    fn avatar_names_preserve_extension_and_never_repeat() {
        let a = unique_avatar_name("me.png");
        let b = unique_avatar_name("me.png");
        assert!(a.ends_with(".png"));
        assert!(b.ends_with(".png"));
        assert_ne!(a, b);
    }

    #[test]
    fn avatar_name_ignores_client_directory_components() {
        let name = unique_avatar_name("../../etc/passwd.jpg");
        assert!(name.ends_with(".jpg"));
        assert!(!name.contains('/'));
    }

    #[test]
    fn avatar_name_without_extension_is_bare_uuid() {
        let name = unique_avatar_name("avatar");
        assert!(Uuid::parse_str(&name).is_ok());
    }
}
