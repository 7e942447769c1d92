use crate::{
    errors::{FinchatError, FinchatResult},
    logging::log_api_call,
    models::{ApiCallLog, Credential, TokenResponse},
};
use chrono::Utc;
use log::debug;
use reqwest::Client;
use std::time::Instant;
use url::Url;

/// Requests a session credential from the token issuer.
///
/// `token_url` already carries the `username` query parameter (see `Config::token_url`).
/// There is no retry: the caller treats any error as terminal for the session.
pub async fn fetch_credential(client: &Client, token_url: &Url) -> FinchatResult<Credential> {
    debug!("Requesting credential from {}", token_url.path());
    let started = Instant::now();

    let response = client
        .post(token_url.clone())
        .send()
        .await
        .map_err(|e| FinchatError::token_error(format!("Request failed: {}", e)))?;

    let status = response.status();
    log_api_call(&ApiCallLog {
        timestamp: Utc::now(),
        endpoint: token_url.path().to_string(),
        request_summary: "POST credential request".to_string(),
        response_status: status.as_u16(),
        response_time_ms: started.elapsed().as_millis(),
    });

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(FinchatError::token_error(format!(
            "Token endpoint returned error: {} - {}",
            status, error_text
        )));
    }

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| FinchatError::token_error(format!("Failed to parse token response: {}", e)))?;

    match body.access_token {
        Some(token) if !token.is_empty() => {
            debug!(
                "Credential issued (type: {})",
                body.token_type.as_deref().unwrap_or("unspecified")
            );
            Ok(Credential::new(token))
        }
        _ => Err(FinchatError::token_error(
            "Token response missing access_token",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn token_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/token?username=testuser", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_credential_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(query_param("username", "testuser"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok1",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let credential = fetch_credential(&Client::new(), &token_url(&mock_server))
            .await
            .unwrap();
        assert_eq!(credential.as_str(), "tok1");
    }

    #[tokio::test]
    async fn test_fetch_credential_missing_token_field() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "bearer"
            })))
            .mount(&mock_server)
            .await;

        let result = fetch_credential(&Client::new(), &token_url(&mock_server)).await;
        assert!(matches!(result, Err(FinchatError::Token(_))));
    }

    #[tokio::test]
    async fn test_fetch_credential_empty_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "",
                "token_type": "bearer"
            })))
            .mount(&mock_server)
            .await;

        let result = fetch_credential(&Client::new(), &token_url(&mock_server)).await;
        assert!(matches!(result, Err(FinchatError::Token(_))));
    }

    #[tokio::test]
    async fn test_fetch_credential_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let result = fetch_credential(&Client::new(), &token_url(&mock_server)).await;
        assert!(matches!(result, Err(FinchatError::Token(_))));
    }

    #[tokio::test]
    async fn test_fetch_credential_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(422).set_body_string("username required"))
            .mount(&mock_server)
            .await;

        let err = fetch_credential(&Client::new(), &token_url(&mock_server))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("422"));
    }

    #[tokio::test]
    async fn test_fetch_credential_unreachable_issuer() {
        // Bind and drop to get a port nothing is listening on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{}/token?username=testuser", port)).unwrap();
        let result = fetch_credential(&Client::new(), &url).await;
        assert!(matches!(result, Err(FinchatError::Token(_))));
    }
}
