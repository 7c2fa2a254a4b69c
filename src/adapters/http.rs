use crate::config::Transport;
use crate::domain::model::ApiReply;
use crate::domain::ports::ApiClient;
use crate::utils::error::{RelayError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tokio::process::Command;

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct ReqwestApiClient {
    client: Client,
}

impl ReqwestApiClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ApiClient for ReqwestApiClient {
    async fn post_json(&self, url: &str, body: &str) -> Result<ApiReply> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        let text = response.text().await?;

        Ok(ApiReply::new(format!("{:03}", status.as_u16()), text))
    }
}

/// Shells out to `curl`, which prints the body followed by `%{http_code}`.
#[derive(Debug, Clone)]
pub struct CurlApiClient {
    program: String,
    timeout: Duration,
}

impl CurlApiClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("curl", timeout)
    }

    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn command(&self, url: &str, body: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-s")
            .arg("--max-time")
            .arg(self.timeout.as_secs().max(1).to_string())
            .arg("-w")
            .arg("%{http_code}")
            .arg("-X")
            .arg("POST")
            .arg(url)
            .arg("-H")
            .arg(format!("Content-Type: {}", JSON_CONTENT_TYPE))
            .arg("-d")
            .arg(body)
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ApiClient for CurlApiClient {
    async fn post_json(&self, url: &str, body: &str) -> Result<ApiReply> {
        tracing::debug!("{} POST {}", self.program, url);
        let output = self
            .command(url, body)
            .output()
            .await
            .map_err(|e| RelayError::ClientInvocationError {
                message: format!("{}: {}", self.program, e),
            })?;

        if !output.status.success() {
            tracing::debug!("{} exited with {}", self.program, output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(ApiReply::from_raw(&stdout))
    }
}

/// The configured transport, picked at startup.
#[derive(Debug, Clone)]
pub enum HttpTransport {
    Reqwest(ReqwestApiClient),
    Curl(CurlApiClient),
}

impl HttpTransport {
    pub fn build(transport: Transport, timeout: Duration) -> Result<Self> {
        Ok(match transport {
            Transport::Reqwest => HttpTransport::Reqwest(ReqwestApiClient::new(timeout)?),
            Transport::Curl => HttpTransport::Curl(CurlApiClient::new(timeout)),
        })
    }
}

#[async_trait]
impl ApiClient for HttpTransport {
    async fn post_json(&self, url: &str, body: &str) -> Result<ApiReply> {
        match self {
            HttpTransport::Reqwest(client) => client.post_json(url, body).await,
            HttpTransport::Curl(client) => client.post_json(url, body).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const BODY: &str = r#"{"pan":"4111111111111111","expiryDate":"12/26","expiry_date":"12/26"}"#;

    #[tokio::test]
    async fn test_reqwest_posts_json() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/payment/card/")
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "pan": "4111111111111111",
                    "expiryDate": "12/26",
                    "expiry_date": "12/26"
                }));
            then.status(201).body("{\"id\":42}");
        });

        let client = ReqwestApiClient::new(Duration::from_secs(5)).unwrap();
        let reply = client
            .post_json(&server.url("/api/v1/payment/card/"), BODY)
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(reply.http_status.as_deref(), Some("201"));
        assert_eq!(reply.body, "{\"id\":42}");
        assert!(reply.is_success());
    }

    #[tokio::test]
    async fn test_reqwest_error_status_is_a_reply() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/card");
            then.status(500).body("boom");
        });

        let client = ReqwestApiClient::new(Duration::from_secs(5)).unwrap();
        let reply = client.post_json(&server.url("/card"), BODY).await.unwrap();

        api_mock.assert();
        assert_eq!(reply.http_status.as_deref(), Some("500"));
        assert!(!reply.is_success());
    }

    #[tokio::test]
    async fn test_reqwest_unreachable_endpoint_is_an_error() {
        let client = ReqwestApiClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .post_json("http://127.0.0.1:9/card", BODY)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ApiError(_)));
    }

    #[tokio::test]
    async fn test_curl_missing_program_is_invocation_error() {
        let client = CurlApiClient::with_program("card-relay-no-such-curl", Duration::from_secs(1));
        let err = client.post_json("http://127.0.0.1:9/card", BODY).await.unwrap_err();
        assert!(matches!(err, RelayError::ClientInvocationError { .. }));
    }

    #[test]
    fn test_curl_command_line() {
        let client = CurlApiClient::new(Duration::from_secs(30));
        let cmd = client.command("https://pay.example.com/card/", BODY);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-s",
                "--max-time",
                "30",
                "-w",
                "%{http_code}",
                "-X",
                "POST",
                "https://pay.example.com/card/",
                "-H",
                "Content-Type: application/json",
                "-d",
                BODY,
            ]
        );
    }
}
