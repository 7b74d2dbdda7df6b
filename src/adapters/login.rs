use crate::utils::error::{ReaperError, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct InfoResponse {
    authorization_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    links: LoginLinks,
}

#[derive(Debug, Deserialize)]
struct LoginLinks {
    login: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Obtains a bearer token with the password grant:
/// `/v2/info` -> `<authorization_endpoint>/login` -> `<login>/oauth/token`.
pub async fn fetch_oauth_token(
    client: &Client,
    api_url: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    let info: InfoResponse = request_json(
        client.get(format!("{}/v2/info", api_url.trim_end_matches('/'))),
        "/v2/info",
    )
    .await?;
    tracing::debug!("Authorization endpoint: {}", info.authorization_endpoint);

    let login: LoginResponse = request_json(
        client.get(format!("{}/login", info.authorization_endpoint)),
        "/login",
    )
    .await?;
    tracing::debug!("Login endpoint: {}", login.links.login);

    let token: TokenResponse = request_json(
        client
            .post(format!("{}/oauth/token", login.links.login))
            .basic_auth("cf", Some(""))
            .form(&[
                ("grant_type", "password"),
                ("password", password),
                ("scope", ""),
                ("username", username),
            ]),
        "/oauth/token",
    )
    .await?;

    tracing::info!("Authenticated as {}", username);
    Ok(token.access_token)
}

async fn request_json<R: DeserializeOwned>(request: RequestBuilder, step: &str) -> Result<R> {
    let failure = |message: String| ReaperError::Authentication {
        step: step.to_string(),
        message,
    };

    let response = request
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| failure(e.to_string()))?;

    if response.status() != StatusCode::OK {
        return Err(failure(format!("request failed: {}", response.status())));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| failure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_three_step_handshake() {
        let server = MockServer::start_async().await;
        let info_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/info").header("Accept", "application/json");
                then.status(200)
                    .json_body(serde_json::json!({"authorization_endpoint": server.url("/uaa")}));
            })
            .await;
        let login_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/uaa/login");
                then.status(200)
                    .json_body(serde_json::json!({"links": {"login": server.url("/login-server")}}));
            })
            .await;
        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/login-server/oauth/token")
                    .header("Authorization", "Basic Y2Y6")
                    .header("Content-Type", "application/x-www-form-urlencoded")
                    .x_www_form_urlencoded_tuple("grant_type", "password")
                    .x_www_form_urlencoded_tuple("username", "admin")
                    .x_www_form_urlencoded_tuple("password", "s3cret&more");
                then.status(200)
                    .json_body(serde_json::json!({"access_token": "token-123", "token_type": "bearer"}));
            })
            .await;

        let client = Client::new();
        let token = fetch_oauth_token(&client, &server.base_url(), "admin", "s3cret&more")
            .await
            .unwrap();

        info_mock.assert_async().await;
        login_mock.assert_async().await;
        token_mock.assert_async().await;
        assert_eq!(token, "token-123");
    }

    #[tokio::test]
    async fn test_info_failure_names_the_step() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/info");
                then.status(503);
            })
            .await;

        let error = fetch_oauth_token(&Client::new(), &server.base_url(), "admin", "pw")
            .await
            .unwrap_err();

        assert!(matches!(error, ReaperError::Authentication { ref step, .. } if step == "/v2/info"));
        assert!(error.to_string().starts_with("/v2/info failure: request failed: 503"));
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/info");
                then.status(200)
                    .json_body(serde_json::json!({"authorization_endpoint": server.base_url()}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/login");
                then.status(200)
                    .json_body(serde_json::json!({"links": {"login": server.base_url()}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(401).json_body(serde_json::json!({"error": "unauthorized"}));
            })
            .await;

        let error = fetch_oauth_token(&Client::new(), &server.base_url(), "admin", "wrong")
            .await
            .unwrap_err();

        assert!(error.to_string().starts_with("/oauth/token failure: request failed: 401"));
    }

    #[tokio::test]
    async fn test_unexpected_info_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/info");
                then.status(200).body("<html>not an API</html>");
            })
            .await;

        let error = fetch_oauth_token(&Client::new(), &server.base_url(), "admin", "pw")
            .await
            .unwrap_err();

        assert!(error.to_string().starts_with("/v2/info failure: "));
    }
}
