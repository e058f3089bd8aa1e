use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use super::{config::KeycloakConfig, AppResult, ErrType};

#[derive(Deserialize, Clone)]
pub struct TokenClaims {
    pub sub: String,
}

impl TokenClaims {
    /// Keycloak issues the identity id as the subject
    pub fn identity_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|err| ErrType::Unauthorized.err(err, "Invalid token subject"))
    }
}

/// Validates user access tokens issued by the Keycloak realm
pub struct KeycloakAuth {
    rsa_key: DecodingKey,
    validation: Validation,
}

impl KeycloakAuth {
    pub fn new(config: &KeycloakConfig) -> AppResult<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(config.public_key.as_bytes())
            .map_err(|err| ErrType::ServerError.err(err, "Failed to init decoding pem"))?;

        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        if config.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&[config.audience.as_str()]);
        }
        validation.validate_exp = true;
        validation.validate_nbf = true;

        Ok(Self {
            rsa_key: decoding_key,
            validation,
        })
    }

    pub fn validate_token_for_claims(&self, token: &str) -> AppResult<TokenClaims> {
        decode::<TokenClaims>(token, &self.rsa_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| ErrType::Unauthorized.err(err, "Invalid token"))
    }
}
