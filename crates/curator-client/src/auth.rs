//! Login and refresh calls against the platform auth endpoints
//!
//! Handles the two auth endpoint interactions:
//! 1. Login (creates the session: credential pair + user snapshot)
//! 2. Refresh (exchanges the refresh credential for a new pair)
//!
//! Both POST JSON to the backend; any non-2xx is a rejection. These are
//! plain wire calls — single-flight coordination and session teardown live
//! in the client, not here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Path of the refresh endpoint. The response classifier treats a 401 from
/// this path as terminal for the whole session.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Path of the login endpoint.
pub const LOGIN_PATH: &str = "/auth/login";

/// Credential pair returned by both auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_credential: String,
    pub refresh_credential: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_credential: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    tokens: TokenPair,
}

/// Login request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login payload: credential pair plus the identity snapshot
/// that gets denormalized into the session record.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub tokens: TokenPair,
    pub user: curator_session::UserSnapshot,
}

/// Exchange the refresh credential for a new pair.
///
/// Called only by the refresh coordinator, at most once per expiry event.
pub async fn refresh_session(
    client: &reqwest::Client,
    base_url: &str,
    refresh_credential: &str,
) -> Result<TokenPair> {
    let response = client
        .post(join(base_url, REFRESH_PATH))
        .json(&RefreshRequest { refresh_credential })
        .send()
        .await
        .map_err(|e| Error::Network(format!("refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Auth(format!(
            "refresh endpoint returned {status}: {body}"
        )));
    }

    let tokens = response
        .json::<RefreshResponse>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("invalid refresh response: {e}")))?
        .tokens;

    if tokens.access_credential.is_empty() || tokens.refresh_credential.is_empty() {
        return Err(Error::InvalidResponse(
            "refresh returned an empty credential".into(),
        ));
    }

    Ok(tokens)
}

/// Authenticate with email and password.
pub async fn login(
    client: &reqwest::Client,
    base_url: &str,
    request: &LoginRequest,
) -> Result<LoginResponse> {
    let response = client
        .post(join(base_url, LOGIN_PATH))
        .json(request)
        .send()
        .await
        .map_err(|e| Error::Network(format!("login request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Auth(format!(
            "login endpoint returned {status}: {body}"
        )));
    }

    let login = response
        .json::<LoginResponse>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("invalid login response: {e}")))?;

    if login.tokens.access_credential.is_empty() || login.tokens.refresh_credential.is_empty() {
        return Err(Error::InvalidResponse(
            "login returned an empty credential".into(),
        ));
    }

    Ok(login)
}

/// Join a base URL and an absolute path without doubling the slash.
pub(crate) fn join(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn token_pair_deserializes_camel_case() {
        let json = r#"{"accessCredential":"at_abc","refreshCredential":"rt_def"}"#;
        let tokens: TokenPair = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.access_credential, "at_abc");
        assert_eq!(tokens.refresh_credential, "rt_def");
    }

    #[test]
    fn refresh_request_serializes_camel_case() {
        let body = serde_json::to_string(&RefreshRequest {
            refresh_credential: "rt_1",
        })
        .unwrap();
        assert_eq!(body, r#"{"refreshCredential":"rt_1"}"#);
    }

    #[test]
    fn join_handles_trailing_slash() {
        assert_eq!(
            join("https://api.example.com/", REFRESH_PATH),
            "https://api.example.com/auth/refresh"
        );
        assert_eq!(
            join("https://api.example.com", REFRESH_PATH),
            "https://api.example.com/auth/refresh"
        );
    }

    #[tokio::test]
    async fn refresh_parses_token_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_json(serde_json::json!({"refreshCredential": "rt_1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tokens": {"accessCredential": "at_2", "refreshCredential": "rt_2"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let tokens = refresh_session(&client, &server.uri(), "rt_1").await.unwrap();
        assert_eq!(tokens.access_credential, "at_2");
        assert_eq!(tokens.refresh_credential, "rt_2");
    }

    #[tokio::test]
    async fn refresh_rejection_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = refresh_session(&client, &server.uri(), "rt_old")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)), "got: {err:?}");
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn refresh_undecodable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = refresh_session(&client, &server.uri(), "rt_1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn refresh_empty_credential_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tokens": {"accessCredential": "", "refreshCredential": "rt_2"}
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = refresh_session(&client, &server.uri(), "rt_1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn refresh_unreachable_host_is_network_error() {
        let client = reqwest::Client::new();
        let err = refresh_session(&client, "http://127.0.0.1:1", "rt_1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn login_returns_tokens_and_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(serde_json::json!({
                "email": "editor@example.com",
                "password": "hunter2",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tokens": {"accessCredential": "at_1", "refreshCredential": "rt_1"},
                "user": {"id": "u_1", "email": "editor@example.com", "displayName": "Editor"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let login = login(
            &client,
            &server.uri(),
            &LoginRequest {
                email: "editor@example.com".into(),
                password: "hunter2".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(login.tokens.access_credential, "at_1");
        assert_eq!(login.user.display_name.as_deref(), Some("Editor"));
    }

    #[tokio::test]
    async fn login_rejection_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = login(
            &client,
            &server.uri(),
            &LoginRequest {
                email: "editor@example.com".into(),
                password: "wrong".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Auth(_)), "got: {err:?}");
    }
}
