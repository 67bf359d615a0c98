//! Realtime messaging tokens signed with the messaging service's API secret.

use async_trait::async_trait;
use chrono::Utc;
use enermina_application::StreamTokenIssuer;
use enermina_core::{AppError, AppResult};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct StreamClaims {
    user_id: String,
    iat: i64,
}

/// HS256 token issuer for the realtime messaging service.
#[derive(Clone)]
pub struct JwtStreamTokenIssuer {
    key: EncodingKey,
}

impl JwtStreamTokenIssuer {
    /// Creates an issuer signing with the given API secret.
    pub fn new(api_secret: &str) -> AppResult<Self> {
        if api_secret.trim().is_empty() {
            return Err(AppError::Validation(
                "stream API secret must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            key: EncodingKey::from_secret(api_secret.as_bytes()),
        })
    }
}

#[async_trait]
impl StreamTokenIssuer for JwtStreamTokenIssuer {
    async fn issue(&self, user_id: &str) -> AppResult<String> {
        let claims = StreamClaims {
            user_id: user_id.to_owned(),
            iat: Utc::now().timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|error| AppError::Internal(format!("failed to sign stream token: {error}")))
    }
}
