// Slack Web API HTTP client.
// Handles authentication, status checking, and the `ok` envelope of every response.

use reqwest::{
    Client, Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, SlackstatError};

pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Retry delay assumed when a 429 response omits `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Slack Web API client bound to one token for the whole run.
pub struct SlackClient {
    client: Client,
    base_url: String,
}

impl SlackClient {
    /// Create a new Slack client with the given token.
    pub fn new(token: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| SlackstatError::Other(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(USER_AGENT, HeaderValue::from_static("slackstat"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(SlackstatError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.token, &config.api_base)
    }

    /// Call a read method with query parameters and return the raw JSON payload.
    ///
    /// The payload is returned whether or not it reports `ok: true`.
    pub async fn get_raw(&self, method: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(method, "GET");
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(SlackstatError::Http)?;

        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Call a read method and return the payload once it reports success.
    pub async fn get(&self, method: &str, params: &[(&str, String)]) -> Result<Value> {
        let payload = self.get_raw(method, params).await?;
        check_payload(method, payload)
    }

    /// Call a write method with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(&self, method: &str, body: &B) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(method, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(SlackstatError::Http)?;

        let response = check_response(response).await?;
        check_payload(method, response.json().await?)
    }
}

/// Check response status and convert errors.
async fn check_response(response: Response) -> Result<Response> {
    match response.status() {
        StatusCode::OK => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SlackstatError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            Err(SlackstatError::RateLimited { retry_after })
        }
        status => Err(SlackstatError::Other(format!(
            "HTTP {}: {}",
            status,
            response.text().await.unwrap_or_default()
        ))),
    }
}

/// Unwrap the `{"ok": bool, "error": ...}` envelope shared by all methods.
pub(crate) fn check_payload(method: &str, payload: Value) -> Result<Value> {
    if payload.get("ok").and_then(Value::as_bool) == Some(true) {
        if let Some(warning) = payload.get("warning").and_then(Value::as_str) {
            warn!(method, warning, "Slack API warning");
        }
        return Ok(payload);
    }

    let error = payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error")
        .to_string();
    Err(SlackstatError::Api {
        method: method.to_string(),
        error,
    })
}

/// Accept a connection-check payload only when it reports `ok: true`.
/// Any other payload is returned verbatim inside the error.
pub(crate) fn check_connection_payload(payload: &Value) -> Result<()> {
    if payload.get("ok").and_then(Value::as_bool) == Some(true) {
        Ok(())
    } else {
        Err(SlackstatError::ConnectionFailed(payload.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_payload_ok() {
        let payload = json!({"ok": true, "members": []});
        assert_eq!(check_payload("users.list", payload.clone()).unwrap(), payload);
    }

    #[test]
    fn test_check_payload_error() {
        let err = check_payload("users.list", json!({"ok": false, "error": "invalid_auth"}))
            .unwrap_err();
        match err {
            SlackstatError::Api { method, error } => {
                assert_eq!(method, "users.list");
                assert_eq!(error, "invalid_auth");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_payload_without_ok_field() {
        let err = check_payload("conversations.list", json!({"channels": []})).unwrap_err();
        assert!(matches!(err, SlackstatError::Api { ref error, .. } if error == "unknown_error"));
    }

    #[test]
    fn test_connection_payload() {
        assert!(check_connection_payload(&json!({"ok": true, "members": []})).is_ok());

        let payload = json!({"ok": false, "error": "invalid_auth"});
        let err = check_connection_payload(&payload).unwrap_err();
        assert!(matches!(err, SlackstatError::ConnectionFailed(ref raw) if *raw == payload.to_string()));
        let message = err.to_string();
        assert!(message.contains(r#""error":"invalid_auth""#), "{message}");
        assert!(message.contains(r#""ok":false"#), "{message}");

        let err = check_connection_payload(&json!({"members": []})).unwrap_err();
        assert!(matches!(err, SlackstatError::ConnectionFailed(_)));
    }

    #[test]
    fn test_new_trims_base_url() {
        let client = SlackClient::new("xoxb-test", "http://localhost:9000/api/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9000/api");
    }
}
