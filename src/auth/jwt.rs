use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Decodes and validates an access token. Refresh tokens are refused here;
/// they are only good for the identity service's refresh endpoint.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("Access token required".to_string());
    }

    Ok(claims)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn token(
        secret: &str,
        role: u8,
        employee_id: Option<u64>,
        token_type: TokenType,
    ) -> String {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize
            + 600;
        let claims = Claims {
            user_id: 11,
            sub: "jdoe".into(),
            role,
            exp,
            jti: "test-jti".into(),
            token_type,
            employee_id,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn access_token_verifies() {
        let t = token("s3cret", 3, Some(1000), TokenType::Access);
        let claims = verify_token(&t, "s3cret").unwrap();
        assert_eq!(claims.employee_id, Some(1000));
        assert_eq!(claims.sub, "jdoe");
    }

    #[test]
    fn refresh_token_is_refused() {
        let t = token("s3cret", 3, Some(1000), TokenType::Refresh);
        assert!(verify_token(&t, "s3cret").is_err());
    }

    #[test]
    fn wrong_secret_is_refused() {
        let t = token("s3cret", 1, None, TokenType::Access);
        assert!(verify_token(&t, "other").is_err());
    }
}
