use std::sync::Arc;

use axum::{
    body::Body, extract::State, http::Request, middleware::Next, response::Response,
};

use shared_config::AppConfig;
use shared_models::auth::{AccountRole, User};
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Middleware: validate the bearer token and stash the caller in extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth(
            "Invalid authorization header format".to_string(),
        ));
    }

    let token = &auth_value[7..];

    let user = validate_token(token, &config.auth_jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Reject callers whose role is not in the allow list.
pub fn require_role(user: &User, allowed: &[AccountRole]) -> Result<(), AppError> {
    match user.role {
        Some(role) if allowed.contains(&role) => Ok(()),
        _ => Err(AppError::Auth(
            "Caller role is not permitted for this operation".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: Option<AccountRole>) -> User {
        User {
            id: "u1".to_string(),
            username: Some("alice".to_string()),
            role,
            created_at: None,
        }
    }

    #[test]
    fn role_guard_allows_listed_roles() {
        let user = user_with_role(Some(AccountRole::Manager));
        assert!(require_role(&user, &[AccountRole::Admin, AccountRole::Manager]).is_ok());
    }

    #[test]
    fn role_guard_rejects_unlisted_and_missing_roles() {
        let user = user_with_role(Some(AccountRole::Customer));
        assert!(require_role(&user, &[AccountRole::Manager]).is_err());

        let anonymous = user_with_role(None);
        assert!(require_role(&anonymous, &[AccountRole::Manager]).is_err());
    }
}
