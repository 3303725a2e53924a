use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration form fields. Missing fields decode as empty so the
/// validator can report them all at once.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub category: i32,
}

/// Login form fields.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Profile edit form; date of birth arrives as `YYYY-MM-DD` text.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub dob: String,
}

/// An avatar upload decoded from the multipart body.
#[derive(Debug)]
pub struct AvatarUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Public part of a user exposed by the directory listing.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub category: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serializes_without_credentials() {
        let entry = PublicUser {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            category: 1,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("Ada"));
        assert!(json.contains("id"));
        assert!(!json.contains("password"));
    }
}
