use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload asserting a user's identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,        // user ID
    pub username: String, // display name at issuance
    pub email: String,    // login email at issuance
    pub iat: i64,         // issued at (unix timestamp)
    pub exp: i64,         // expires at (unix timestamp)
    pub iss: String,      // issuer
    pub aud: String,      // audience
}

impl Claims {
    /// A token is expired once `now` reaches `exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
