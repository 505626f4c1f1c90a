use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use syncwatch_core::{Dashboard, JobSnapshot, JobSummary, MailboxId, SystemStats};
use syncwatch_logging::{watch_debug, watch_warn};
use url::Url;

use crate::{CommandError, FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// API root, e.g. `http://127.0.0.1:8000/api`. Endpoint paths are appended to it.
    pub base_url: String,
    pub access_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            access_token: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
            max_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Read side of the migration service.
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn job(&self, job_id: &str) -> Result<JobSnapshot, FetchError>;
    async fn mailbox_log(&self, mailbox_id: MailboxId) -> Result<String, FetchError>;
    async fn jobs(&self) -> Result<Vec<JobSummary>, FetchError>;
    async fn stats(&self) -> Result<SystemStats, FetchError>;

    /// Job list plus stats. A stats failure does not fail the listing.
    async fn dashboard(&self) -> Result<Dashboard, FetchError> {
        let jobs = self.jobs().await?;
        let stats = match self.stats().await {
            Ok(stats) => Some(stats),
            Err(err) => {
                watch_warn!("Stats unavailable: {err}");
                None
            }
        };
        Ok(Dashboard { jobs, stats })
    }
}

/// Write side of the migration service. Success means the server accepted
/// the request, not that the mailbox has changed state yet.
#[async_trait::async_trait]
pub trait ActionGateway: Send + Sync {
    async fn stop_mailbox(&self, mailbox_id: MailboxId) -> Result<(), CommandError>;
    async fn retry_mailbox(&self, mailbox_id: MailboxId) -> Result<(), CommandError>;
    async fn cancel_job(&self, job_id: &str) -> Result<(), CommandError>;
    async fn delete_all_jobs(&self) -> Result<(), CommandError>;
}

#[derive(Debug, Deserialize)]
struct LogBody {
    #[serde(default)]
    logs: String,
}

#[derive(Debug, Deserialize)]
struct DetailBody {
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot carry endpoint paths", settings.base_url),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::new(FailureKind::InvalidUrl, self.settings.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match self.settings.access_token.as_deref() {
            Some(token) if !token.is_empty() => {
                builder.header(AUTHORIZATION, format!("Bearer {token}"))
            }
            _ => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, FetchError> {
        let url = self.endpoint(segments)?;
        watch_debug!("GET {url}");
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }
        let bytes = self.read_body(response).await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    async fn command(&self, method: Method, segments: &[&str]) -> Result<(), CommandError> {
        let url = self.endpoint(segments).map_err(CommandError::Transport)?;
        watch_debug!("{method} {url}");
        let response = self
            .request(method, url)
            .send()
            .await
            .map_err(|err| CommandError::Transport(map_reqwest_error(err)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        // The body is advisory; an unreadable one still yields a rejection.
        let detail = match self.read_body(response).await {
            Ok(bytes) => parse_detail(&bytes),
            Err(_) => None,
        };
        Err(CommandError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait::async_trait]
impl StatusSource for HttpClient {
    async fn job(&self, job_id: &str) -> Result<JobSnapshot, FetchError> {
        self.get_json(&["jobs", job_id]).await
    }

    async fn mailbox_log(&self, mailbox_id: MailboxId) -> Result<String, FetchError> {
        let id = mailbox_id.to_string();
        let body: LogBody = self.get_json(&["mailboxes", &id, "logs"]).await?;
        Ok(body.logs)
    }

    async fn jobs(&self) -> Result<Vec<JobSummary>, FetchError> {
        self.get_json(&["jobs"]).await
    }

    async fn stats(&self) -> Result<SystemStats, FetchError> {
        self.get_json(&["stats"]).await
    }
}

#[async_trait::async_trait]
impl ActionGateway for HttpClient {
    async fn stop_mailbox(&self, mailbox_id: MailboxId) -> Result<(), CommandError> {
        let id = mailbox_id.to_string();
        self.command(Method::POST, &["mailboxes", &id, "stop"]).await
    }

    async fn retry_mailbox(&self, mailbox_id: MailboxId) -> Result<(), CommandError> {
        let id = mailbox_id.to_string();
        self.command(Method::POST, &["mailboxes", &id, "retry"]).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), CommandError> {
        self.command(Method::POST, &["jobs", job_id, "cancel"]).await
    }

    async fn delete_all_jobs(&self) -> Result<(), CommandError> {
        self.command(Method::DELETE, &["jobs"]).await
    }
}

/// `{"detail": "..."}` as a string. Structured details are kept as compact JSON.
fn parse_detail(bytes: &[u8]) -> Option<String> {
    let body: DetailBody = serde_json::from_slice(bytes).ok()?;
    match body.detail? {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn status_error(status: StatusCode) -> FetchError {
    let kind = match status {
        StatusCode::NOT_FOUND => FailureKind::NotFound,
        StatusCode::UNAUTHORIZED => FailureKind::Unauthorized,
        other => FailureKind::HttpStatus(other.as_u16()),
    };
    FetchError::new(kind, status.to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::Decode, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_accepts_strings_and_structures() {
        assert_eq!(
            parse_detail(br#"{"detail":"Mailbox is running"}"#).as_deref(),
            Some("Mailbox is running")
        );
        assert_eq!(
            parse_detail(br#"{"detail":[{"msg":"bad id"}]}"#).as_deref(),
            Some(r#"[{"msg":"bad id"}]"#)
        );
        assert_eq!(parse_detail(br#"{"detail":null}"#), None);
        assert_eq!(parse_detail(b"<html>"), None);
    }

    #[test]
    fn endpoint_appends_segments_to_base_path() {
        let client = HttpClient::new(ClientSettings {
            base_url: "http://localhost:8000/api/".to_string(),
            ..ClientSettings::default()
        })
        .unwrap();
        let url = client.endpoint(&["jobs", "a b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/jobs/a%20b");
    }

    #[test]
    fn rejects_non_base_urls() {
        let err = HttpClient::new(ClientSettings {
            base_url: "mailto:ops@example.com".to_string(),
            ..ClientSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
