use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signed session payload. Deserialization is the validation: any shape
/// mismatch fails closed and the session is treated as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,  // user ID the session is bound to
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}
