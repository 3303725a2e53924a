use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::session::claims::SessionClaims;
use crate::state::AppState;

/// Signs and verifies the session cookie. Built once per request from the
/// process-wide secret held in config.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    cookie_name: String,
    ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            cookie_name,
            ttl_hours,
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            cookie_name,
            ttl: Duration::hours(ttl_hours),
        }
    }
}

impl SessionKeys {
    /// Issue a signed session bound to `user_id`, packaged as an HTTP-only
    /// cookie expiring with the token.
    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<Cookie<'static>> {
        let now = OffsetDateTime::now_utc();
        let claims = SessionClaims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: (now + self.ttl).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session issued");
        Ok(Cookie::build((self.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(self.ttl)
            .build())
    }

    /// Pure read of the inbound cookie. Missing, tampered, expired, or
    /// mis-shaped tokens all resolve to absent.
    pub fn resolve(&self, jar: &CookieJar) -> Option<Uuid> {
        let token = jar.get(&self.cookie_name)?.value();
        decode::<SessionClaims>(token, &self.decoding, &Validation::default())
            .ok()
            .map(|data| data.claims.sub)
    }

    /// A cookie that forces immediate client-side deletion of the session.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.cookie_name.clone(), ""))
            .path("/")
            .http_only(true)
            .build();
        cookie.make_removal();
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(ttl_hours: i64) -> SessionKeys {
        SessionKeys {
            encoding: EncodingKey::from_secret(b"test-secret"),
            decoding: DecodingKey::from_secret(b"test-secret"),
            cookie_name: "logged-in-user".into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    #[test]
    fn issue_and_resolve_roundtrip() {
        let keys = make_keys(3);
        let user_id = Uuid::new_v4();
        let cookie = keys.issue(user_id).expect("issue session");

        assert_eq!(cookie.name(), "logged-in-user");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::hours(3)));

        let jar = CookieJar::new().add(cookie);
        assert_eq!(keys.resolve(&jar), Some(user_id));
    }

    #[test]
    fn missing_cookie_resolves_to_absent() {
        let keys = make_keys(3);
        assert_eq!(keys.resolve(&CookieJar::new()), None);
    }

    #[test]
    fn tampered_token_resolves_to_absent() {
        let keys = make_keys(3);
        let cookie = keys.issue(Uuid::new_v4()).expect("issue session");

        let mut token = cookie.value().to_string();
        let flipped = if token.ends_with('A') { "B" } else { "A" };
        token.truncate(token.len() - 1);
        token.push_str(flipped);

        let jar = CookieJar::new().add(Cookie::new("logged-in-user", token));
        assert_eq!(keys.resolve(&jar), None);
    }

    #[test]
    fn expired_token_resolves_to_absent() {
        let keys = make_keys(-2);
        let cookie = keys.issue(Uuid::new_v4()).expect("issue session");
        let jar = CookieJar::new().add(cookie);
        assert_eq!(keys.resolve(&jar), None);
    }

    #[test]
    fn garbage_token_fails_closed() {
        let keys = make_keys(3);
        let jar = CookieJar::new().add(Cookie::new("logged-in-user", "not-a-token"));
        assert_eq!(keys.resolve(&jar), None);
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let keys = make_keys(3);
        let cookie = keys.removal_cookie();
        assert_eq!(cookie.name(), "logged-in-user");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn keys_from_state_verify_their_own_tokens() {
        let state = AppState::fake();
        let keys = SessionKeys::from_ref(&state);
        let user_id = Uuid::new_v4();
        let cookie = keys.issue(user_id).expect("issue session");
        let jar = CookieJar::new().add(cookie);
        assert_eq!(keys.resolve(&jar), Some(user_id));
    }
}
