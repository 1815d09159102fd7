use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{AccountRole, JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

/// Mint a bearer token for an authenticated account.
pub fn issue_token(
    account_id: &str,
    username: &str,
    role: AccountRole,
    jwt_secret: &str,
    ttl_hours: i64,
) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let exp = now + Duration::hours(ttl_hours);

    let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
    let claims = serde_json::json!({
        "sub": account_id,
        "username": username,
        "role": role,
        "iat": now.timestamp(),
        "exp": exp.timestamp(),
    });

    let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
    let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string());
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let role = claims
        .role
        .as_deref()
        .and_then(|r| serde_json::from_value::<AccountRole>(serde_json::json!(r)).ok());

    let created_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    Ok(User {
        id: claims.sub,
        username: claims.username,
        role,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

    #[test]
    fn issued_token_round_trips() {
        let token = issue_token("abc-123", "alice", AccountRole::Customer, SECRET, 1).unwrap();
        let user = validate_token(&token, SECRET).unwrap();

        assert_eq!(user.id, "abc-123");
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(user.role, Some(AccountRole::Customer));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token("abc-123", "alice", AccountRole::Staff, SECRET, 1).unwrap();
        assert!(validate_token(&token, "another-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token("abc-123", "alice", AccountRole::Staff, SECRET, -1).unwrap();
        let err = validate_token(&token, SECRET).unwrap_err();
        assert_eq!(err, "Token expired");
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(validate_token("not.a-token", SECRET).is_err());
    }
}
