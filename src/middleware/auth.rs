// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState};

// Estrutura de dados ("claims") dentro do JWT emitido pelo serviço de autenticação
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

pub fn decode_user(token: &str, secret: &str) -> Result<AuthenticatedUser, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;

    Ok(AuthenticatedUser(token_data.claims.sub))
}

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    let user = decode_user(bearer.token(), &app_state.jwt_secret)?;

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub const INGEST_KEY_HEADER: &str = "x-ingest-key";

pub fn check_ingest_key(provided: Option<&str>, expected: &str) -> Result<(), AppError> {
    match provided {
        Some(key) if !expected.is_empty() && key == expected => Ok(()),
        _ => Err(AppError::InvalidToken),
    }
}

// Ponte de hardware: as leituras chegam com uma chave compartilhada, não com JWT
pub async fn ingest_key_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get(INGEST_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    check_ingest_key(provided, &app_state.scan_ingest_key)?;

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(user_id: Uuid, secret: &str) -> String {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id,
            exp: (now + chrono::Duration::hours(1)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    #[test]
    fn decodes_subject_from_valid_token() {
        let user_id = Uuid::new_v4();
        let user = decode_user(&token_for(user_id, "segredo"), "segredo").unwrap();
        assert_eq!(user.0, user_id);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = token_for(Uuid::new_v4(), "outro");
        assert!(matches!(decode_user(&token, "segredo"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn ingest_key_must_match_exactly() {
        assert!(check_ingest_key(Some("chave"), "chave").is_ok());
        assert!(check_ingest_key(Some("outra"), "chave").is_err());
        assert!(check_ingest_key(None, "chave").is_err());
        // Chave vazia na configuração nunca libera
        assert!(check_ingest_key(Some(""), "").is_err());
    }
}
