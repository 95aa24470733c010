//! Login DTOs.

use serde::{Deserialize, Serialize};

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response; some backends return the role beside the token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "accessToken", alias = "jwt")]
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_aliases() {
        let a: LoginResponse = serde_json::from_str(r#"{"token":"t1"}"#).unwrap();
        assert_eq!(a.token, "t1");
        assert!(a.role.is_none());

        let b: LoginResponse = serde_json::from_str(r#"{"accessToken":"t2","role":"DOCTOR"}"#).unwrap();
        assert_eq!(b.token, "t2");
        assert_eq!(b.role.as_deref(), Some("DOCTOR"));
    }
}
