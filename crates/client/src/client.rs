//! Control-plane API client.
//!
//! One client per automation group. The five group endpoints share one
//! request path: build, attach preemptive auth material, send, and if
//! the control plane answers 401 with a challenge, retry exactly once
//! with the computed `Authorization` header. Any remaining non-success
//! response becomes an API error carrying the server's detail text.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use convoy_config::AutomationConfig;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::status::AutomationStatus;

/// Shape of a control-plane error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Client for one automation group on the control plane.
#[derive(Debug, Clone)]
pub struct AutomationClient {
    /// Configuration for the client.
    config: Arc<ClientConfig>,
    /// Underlying HTTP client.
    http_client: reqwest::Client,
}

impl AutomationClient {
    /// Create a new client from a config.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    /// The config this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the group's current automation status.
    pub async fn fetch_status(&self) -> Result<AutomationStatus> {
        let url = self.endpoint("automationStatus")?;
        let response = self.execute(Method::GET, url, None::<&()>).await?;
        Ok(response.json().await?)
    }

    /// Fetch the group's current config document.
    pub async fn fetch_config(&self) -> Result<AutomationConfig> {
        let url = self.endpoint("automationConfig")?;
        let response = self.execute(Method::GET, url, None::<&()>).await?;
        Ok(response.json().await?)
    }

    /// Submit a config document as the group's new desired state.
    ///
    /// The control plane bumps the goal version when it accepts the
    /// document.
    pub async fn submit_config(&self, config: &AutomationConfig) -> Result<()> {
        let url = self.endpoint("automationConfig")?;
        self.execute(Method::PUT, url, Some(config)).await?;
        Ok(())
    }

    /// Submit the monitoring agent section only.
    pub async fn submit_monitoring_agent_config(&self, config: &AutomationConfig) -> Result<()> {
        let url = self.endpoint("automationConfig/monitoringAgentConfig")?;
        self.execute(Method::PUT, url, Some(config)).await?;
        Ok(())
    }

    /// Submit the backup agent section only.
    pub async fn submit_backup_agent_config(&self, config: &AutomationConfig) -> Result<()> {
        let url = self.endpoint("automationConfig/backupAgentConfig")?;
        self.execute(Method::PUT, url, Some(config)).await?;
        Ok(())
    }

    /// Build the URL for a group resource.
    fn endpoint(&self, resource: &str) -> Result<Url> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        let url = format!(
            "{base}/api/public/v1.0/groups/{}/{resource}",
            self.config.group_id
        );
        Ok(Url::parse(&url)?)
    }

    /// Send a request, answering one auth challenge if the control plane
    /// issues one.
    async fn execute<T>(&self, method: Method, url: Url, body: Option<&T>) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        debug!(method = %method, url = %url, "Control-plane request");

        let mut request = self.http_client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        request = self.config.scheme.prepare(request, &self.config.credentials);

        // Cloned up front: the builder is consumed by send, and the
        // authorized attempt must replay the same body.
        let retry = request.try_clone();
        let response = request.send().await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            match self.answer_challenge(&response, &method, &url)? {
                Some(authorization) => {
                    let request = retry.ok_or_else(|| {
                        Error::request_not_repeatable("streaming body has no second attempt")
                    })?;
                    request.header(AUTHORIZATION, authorization).send().await?
                }
                None => response,
            }
        } else {
            response
        };

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    /// Compute the `Authorization` header answering a 401, when the
    /// response carries a challenge the configured scheme can use.
    fn answer_challenge(
        &self,
        response: &Response,
        method: &Method,
        url: &Url,
    ) -> Result<Option<String>> {
        let Some(header) = response.headers().get(WWW_AUTHENTICATE) else {
            return Ok(None);
        };
        let challenge = header
            .to_str()
            .map_err(|e| Error::auth_challenge(format!("challenge is not valid text: {e}")))?;

        self.config.scheme.answer_challenge(
            challenge,
            method.as_str(),
            &request_uri(url),
            &self.config.credentials,
        )
    }

    /// Turn a non-success response into an API error.
    ///
    /// The body's `detail` field carries the server's explanation; when
    /// the body is not that shape, the raw text stands in.
    async fn api_error(response: Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|parsed| parsed.detail)
            .unwrap_or_else(|_| body.trim().to_string());
        Error::api(status, detail)
    }
}

/// Request URI as entered into the digest computation (path plus query).
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]
    #![allow(clippy::indexing_slicing)]

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::Credentials;

    use super::*;

    const STATUS_PATH: &str = "/api/public/v1.0/groups/g1/automationStatus";
    const CONFIG_PATH: &str = "/api/public/v1.0/groups/g1/automationConfig";

    fn group_config(base_url: Url) -> ClientConfig {
        ClientConfig::new(base_url, "g1", Credentials::new("user", "key"))
    }

    #[tokio::test]
    async fn test_fetch_status() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "goalVersion": 4,
                "processes": [
                    {"hostname": "node-1", "lastGoalVersionAchieved": 4, "plan": []},
                    {"hostname": "node-2", "lastGoalVersionAchieved": 3, "plan": ["Download", "Start"]}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = AutomationClient::new(group_config(mock_server.uri().parse()?))?;

        let status = client.fetch_status().await?;

        assert_eq!(status.goal_version, 4);
        assert!(!status.is_converged());
        assert_eq!(
            status.lagging().map(|p| p.hostname.as_str()).collect::<Vec<_>>(),
            vec!["node-2"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_config_puts_document()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(CONFIG_PATH))
            .and(body_json(json!({
                "processes": [{"hostname": "node-1", "processType": "mongod"}],
                "options": {"downloadBase": "/var/lib/automation"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = AutomationClient::new(group_config(mock_server.uri().parse()?))?;
        let document = convoy_config::AutomationConfig::from_json(
            "inline",
            r#"{
                "processes": [{"hostname": "node-1", "processType": "mongod"}],
                "options": {"downloadBase": "/var/lib/automation"}
            }"#,
        )?;

        client.submit_config(&document).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_agent_config_endpoints() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/public/v1.0/groups/g1/automationConfig/monitoringAgentConfig"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/public/v1.0/groups/g1/automationConfig/backupAgentConfig"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = AutomationClient::new(group_config(mock_server.uri().parse()?))?;
        let document = convoy_config::AutomationConfig::from_json(
            "inline",
            r#"{"monitoringVersions": [{"hostname": "node-1"}]}"#,
        )?;

        client.submit_monitoring_agent_config(&document).await?;
        client.submit_backup_agent_config(&document).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_config_preserves_unmodeled_fields()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(CONFIG_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "version": 12,
                "processes": [{"hostname": "node-1"}],
                "replicaSets": [{"_id": "rs_0"}]
            })))
            .mount(&mock_server)
            .await;

        let client = AutomationClient::new(group_config(mock_server.uri().parse()?))?;

        let config = client.fetch_config().await?;

        assert_eq!(config.version, Some(12));
        assert_eq!(config.extra["replicaSets"][0]["_id"], "rs_0");
        Ok(())
    }

    #[tokio::test]
    async fn test_api_error_carries_detail() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "group not found"})),
            )
            .mount(&mock_server)
            .await;

        let client = AutomationClient::new(group_config(mock_server.uri().parse()?))?;

        let result = client.fetch_status().await;

        match result {
            Err(Error::Api { status, ref detail }) => {
                assert_eq!(status, 404);
                assert_eq!(detail, "group not found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert!(
            result
                .err()
                .map(|e| e.to_string())
                .is_some_and(|msg| msg.contains("group not found"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_api_error_without_detail_uses_body()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&mock_server)
            .await;

        let client = AutomationClient::new(group_config(mock_server.uri().parse()?))?;

        match client.fetch_status().await {
            Err(Error::Api { status, detail }) => {
                assert_eq!(status, 503);
                assert_eq!(detail, "upstream unavailable");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_digest_handshake_retries_once()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(401).insert_header(
                "WWW-Authenticate",
                "Digest realm=\"MMS Public API\", qop=\"auth\", nonce=\"abc123\"",
            ))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"goalVersion": 1, "processes": []})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = AutomationClient::new(group_config(mock_server.uri().parse()?))?;

        let status = client.fetch_status().await?;
        assert_eq!(status.goal_version, 1);

        let requests = mock_server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 2);
        let authorization = requests[1]
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(authorization.starts_with("Digest "), "got: {authorization}");
        assert!(authorization.contains("username=\"user\""));
        assert!(authorization.contains("nonce=\"abc123\""));
        assert!(authorization.contains(&format!("uri=\"{STATUS_PATH}\"")));
        assert!(authorization.contains("nc=00000001"));
        Ok(())
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_api_error()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(401).insert_header(
                "WWW-Authenticate",
                "Digest realm=\"MMS Public API\", qop=\"auth\", nonce=\"abc123\"",
            ))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "invalid credentials"})),
            )
            .mount(&mock_server)
            .await;

        let client = AutomationClient::new(group_config(mock_server.uri().parse()?))?;

        match client.fetch_status().await {
            Err(Error::Api { status, detail }) => {
                assert_eq!(status, 401);
                assert_eq!(detail, "invalid credentials");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_basic_auth_is_preemptive() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .and(header("Authorization", "Basic dXNlcjprZXk="))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"goalVersion": 0, "processes": []})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = group_config(mock_server.uri().parse()?).with_basic_auth();
        let client = AutomationClient::new(config)?;

        client.fetch_status().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_trailing_slash_base_url() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"goalVersion": 0, "processes": []})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let base_url: Url = format!("{}/", mock_server.uri()).parse()?;
        let client = AutomationClient::new(group_config(base_url))?;

        client.fetch_status().await?;
        Ok(())
    }
}
