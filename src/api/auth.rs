//! Login and logout.

use super::ApiClient;
use super::{medical_staff, patients};
use crate::error::Result;
use crate::models::{LoginRequest, LoginResponse};
use crate::routing::Role;
use crate::session::Session;

/// Log in, store the session, and resolve the user's patient or staff id.
pub async fn login(api: &ApiClient, username: &str, password: &str) -> Result<Session> {
    let request = LoginRequest {
        username: username.trim().to_string(),
        password: password.to_string(),
    };
    let response: LoginResponse = api.post_credentials("/auth/login", &request).await?;
    let session = Session::from_token(&response.token, response.role.as_deref())?;
    api.session().set(session.clone());

    tracing::info!("Signed in as {} ({})", session.username, session.role);

    // Best-effort: a missing profile only limits patient-scoped pages.
    let profile_id = match resolve_profile_id(api, &session).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Could not resolve profile for {}: {}", session.username, e);
            None
        }
    };
    api.session().set_profile_id(profile_id);

    Ok(api.session().current().unwrap_or(session))
}

async fn resolve_profile_id(api: &ApiClient, session: &Session) -> Result<Option<i64>> {
    let Some(user_id) = session.user_id else {
        return Ok(None);
    };

    match session.role {
        Role::Patient => Ok(Some(patients::get_by_user(api, user_id).await?.id)),
        Role::Doctor | Role::Radiologist | Role::Admin => Ok(Some(medical_staff::get_by_user(api, user_id).await?.id)),
    }
}

/// Drop the stored session.
pub fn logout(api: &ApiClient) {
    tracing::info!("Signing out");
    api.session().clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, serve_once};
    use crate::error::AppError;
    use crate::session::SessionHandle;

    #[tokio::test]
    async fn test_wrong_password_keeps_backend_message() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"message":"Invalid username or password"}"#).await;
        let api = client_for(&base, SessionHandle::in_memory());

        let err = login(&api, "jane", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!err.requires_login());
        assert_eq!(err.user_message(), "Invalid username or password");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/auth/login"));
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_rejected_login_without_body() {
        let (base, server) = serve_once("401 Unauthorized", "").await;
        let api = client_for(&base, SessionHandle::in_memory());

        let err = login(&api, "jane", "wrong").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid username or password");
        assert!(!api.session().is_signed_in());
        server.await.unwrap();
    }
}
