//! REST client for the portal backend.
//!
//! [`ApiClient`] attaches the bearer token from the shared session to every
//! request. A 401 clears the session and surfaces [`AppError::Unauthorized`]
//! so the UI can return to the login screen.

pub mod analytics;
pub mod auth;
pub mod billing;
pub mod images;
pub mod medical_staff;
pub mod patients;
pub mod scan_appointments;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, multipart};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use crate::session::SessionHandle;

/// Backend HTTP client. Cheap to clone; clones share the connection pool and session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionHandle,
}

impl ApiClient {
    /// Create a new client instance.
    pub fn new(config: &ApiConfig, session: SessionHandle) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.effective_base_url(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{base}/{path}", base = self.base_url, path = path.trim_start_matches('/'))
    }

    /// Attach the bearer token, if signed in.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and turn non-success statuses into errors.
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = AppError::from_status(status, body);
        if err.requires_login() {
            tracing::warn!("Backend rejected token, clearing session");
            self.session.clear();
        } else {
            tracing::debug!("Request failed: {}", err);
        }
        Err(err)
    }

    /// Post credentials without a bearer token; a rejection never touches the session.
    pub(crate) async fn post_credentials<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        tracing::debug!("POST {}", path);
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::from_login_status(status, body));
        }
        Self::json(response).await
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await.map_err(AppError::from_reqwest)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!("GET {}", path);
        let response = self.execute(self.client.get(self.url(path))).await?;
        Self::json(response).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        tracing::debug!("POST {}", path);
        let response = self.execute(self.client.post(self.url(path)).json(body)).await?;
        Self::json(response).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        tracing::debug!("PUT {}", path);
        let response = self.execute(self.client.put(self.url(path)).json(body)).await?;
        Self::json(response).await
    }

    pub(crate) async fn patch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!("PATCH {}", path);
        let response = self.execute(self.client.patch(self.url(path))).await?;
        Self::json(response).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        tracing::debug!("DELETE {}", path);
        self.execute(self.client.delete(self.url(path))).await?;
        Ok(())
    }

    pub(crate) async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET (bytes) {}", path);
        let response = self.execute(self.client.get(self.url(path))).await?;
        let bytes = response.bytes().await.map_err(AppError::from_reqwest)?;
        Ok(bytes.to_vec())
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: multipart::Form) -> Result<T> {
        tracing::debug!("POST (multipart) {}", path);
        let response = self.execute(self.client.post(self.url(path)).multipart(form)).await?;
        Self::json(response).await
    }
}

/// Check that something answers HTTP at `base_url`.
///
/// Any response counts, even 401 or 404: the backend is reachable.
pub async fn check_backend(base_url: &str) -> Result<()> {
    let url = base_url.trim();
    if url.is_empty() {
        return Err(AppError::config("Backend URL is empty"));
    }

    let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
    let response = client.get(url).send().await.map_err(AppError::from_reqwest)?;
    tracing::debug!("Backend check {} -> {}", url, response.status());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::Session;
    use crate::session::tests::make_token;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one canned HTTP response; the handle yields the raw request head.
    pub(crate) async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });

        (format!("http://{addr}/api"), handle)
    }

    pub(crate) fn client_for(base_url: &str, session: SessionHandle) -> ApiClient {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            env_base_url: None,
        };
        ApiClient::new(&config, session).unwrap()
    }

    pub(crate) fn signed_in(role: &str) -> SessionHandle {
        let handle = SessionHandle::in_memory();
        let token = make_token(&format!(r#"{{"sub":"tester","role":"{role}","userId":1}}"#));
        handle.set(Session::from_token(&token, None).unwrap());
        handle
    }

    #[test]
    fn test_url_joining() {
        let client = client_for("http://localhost:8080/api/", SessionHandle::in_memory());
        assert_eq!(client.url("/patients"), "http://localhost:8080/api/patients");
        assert_eq!(client.url("patients/1"), "http://localhost:8080/api/patients/1");
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let (base, server) = serve_once("200 OK", r#"{"value":1}"#).await;
        let session = signed_in("DOCTOR");
        let token = session.token().unwrap();
        let client = client_for(&base, session);

        let value: serde_json::Value = client.get("/ping").await.unwrap();
        assert_eq!(value["value"], 1);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/ping"));
        assert!(request.contains(&format!("authorization: Bearer {token}")) || request.contains(&format!("Authorization: Bearer {token}")));
    }

    #[tokio::test]
    async fn test_no_token_when_signed_out() {
        let (base, server) = serve_once("200 OK", "[]").await;
        let client = client_for(&base, SessionHandle::in_memory());

        let list: Vec<serde_json::Value> = client.get("/things").await.unwrap();
        assert!(list.is_empty());

        let request = server.await.unwrap().to_lowercase();
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session() {
        let (base, server) = serve_once("401 Unauthorized", "").await;
        let session = signed_in("PATIENT");
        let client = client_for(&base, session.clone());

        let result: Result<serde_json::Value> = client.get("/patients/1").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert!(!session.is_signed_in());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_message() {
        let (base, server) = serve_once("400 Bad Request", r#"{"message":"Reason is required"}"#).await;
        let session = signed_in("DOCTOR");
        let client = client_for(&base, session.clone());

        let result: Result<serde_json::Value> = client.post("/scan-appointments", &serde_json::json!({})).await;
        match result {
            Err(AppError::Server { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Reason is required");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // Non-401 failures keep the session
        assert!(session.is_signed_in());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}"), SessionHandle::in_memory());
        let result: Result<serde_json::Value> = client.get("/patients").await;
        assert!(matches!(result, Err(AppError::Network(_))));
    }

    #[tokio::test]
    async fn test_check_backend_accepts_any_status() {
        let (base, server) = serve_once("404 Not Found", "").await;
        assert!(check_backend(&base).await.is_ok());
        server.await.unwrap();

        assert!(matches!(check_backend("  ").await, Err(AppError::Config(_))));
    }
}
