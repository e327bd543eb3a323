use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::actor::{Actor, Role};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    fn actor(&self) -> Option<Actor> {
        let id: Uuid = self.sub.parse().ok()?;
        let role: Role = self.role.as_deref()?.parse().ok()?;
        Some(Actor::new(role, id))
    }
}

fn unauthorized(error: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": error }))).into_response()
}

/// Validates the bearer token and makes the caller available to handlers as
/// `Extension<Actor>`.
pub async fn require_actor(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let claims = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => data.claims,
        Err(_) => return unauthorized("invalid_token"),
    };
    let Some(actor) = claims.actor() else {
        return unauthorized("invalid_claims");
    };

    tracing::debug!(actor = %actor, "authenticated");
    req.extensions_mut().insert(actor);
    req.extensions_mut().insert(claims);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_map_to_actor() {
        let id = Uuid::new_v4();
        let claims = Claims {
            sub: id.to_string(),
            exp: 0,
            role: Some("Faculty".to_string()),
        };
        assert_eq!(claims.actor(), Some(Actor::faculty(id)));

        let no_role = Claims {
            role: None,
            ..claims.clone()
        };
        assert_eq!(no_role.actor(), None);

        let bad_sub = Claims {
            sub: "not-a-uuid".to_string(),
            ..claims
        };
        assert_eq!(bad_sub.actor(), None);
    }
}
