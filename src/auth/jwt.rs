use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Session token claims issued by the identity provider. `sub` is the stable
/// external user identifier.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

fn decoding_key(config: &Config) -> AppResult<(DecodingKey, Algorithm)> {
    if let Some(pem) = config.auth_jwt_public_key.as_deref() {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Invalid AUTH_JWT_PUBLIC_KEY: {}", e))
        })?;
        return Ok((key, Algorithm::RS256));
    }

    let secret = config
        .auth_jwt_secret
        .as_deref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("No token verification key configured")))?;
    Ok((DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256))
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let (key, algorithm) = decoding_key(config)?;

    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.validate_aud = false;
    if let Some(issuer) = config.auth_issuer.as_deref() {
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    }

    let data = decode::<Claims>(token, &key, &validation).map_err(|_| AppError::Unauthenticated)?;
    if data.claims.sub.is_empty() {
        return Err(AppError::Unauthenticated);
    }
    Ok(data)
}

#[cfg(test)]
pub(crate) fn sign_test_token(sub: &str, exp_offset_secs: i64, config: &Config) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        exp: now + exp_offset_secs,
        iat: Some(now),
        iss: config.auth_issuer.clone(),
    };
    let secret = config.auth_jwt_secret.as_deref().unwrap_or_default();
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;

    #[test]
    fn test_valid_token_yields_subject() {
        let config = test_config();
        let token = sign_test_token("user_2abc", 600, &config);
        let data = verify_token(&token, &config).unwrap();
        assert_eq!(data.claims.sub, "user_2abc");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = test_config();
        let token = sign_test_token("user_2abc", -3600, &config);
        assert!(matches!(
            verify_token(&token, &config),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let mut config = test_config();
        let token = sign_test_token("user_2abc", 600, &config);
        config.auth_issuer = Some("https://clerk.other.dev".into());
        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_token_from_other_issuer_is_rejected() {
        let mut config = test_config();
        config.auth_issuer = Some("https://clerk.other.dev".into());
        let token = sign_test_token("user_2abc", 600, &config);

        config.auth_issuer = Some("https://clerk.reflct.dev".into());
        assert!(matches!(
            verify_token(&token, &config),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn test_configured_issuer_is_accepted() {
        let mut config = test_config();
        config.auth_issuer = Some("https://clerk.reflct.dev".into());
        let token = sign_test_token("user_2abc", 600, &config);
        assert_eq!(verify_token(&token, &config).unwrap().claims.sub, "user_2abc");
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let config = test_config();
        assert!(verify_token("not.a.jwt", &config).is_err());
    }
}
