use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::actor::Actor;

/// Mints an HS256 bearer token in the shape the authentication collaborator issues.
pub fn issue_token(secret: &str, actor: &Actor, ttl: Duration) -> Result<String> {
    let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
    let claims = Claims {
        sub: actor.id.to_string(),
        exp,
        role: Some(actor.role.as_str().to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}
