use crate::config::UploadConfig;
use anyhow::Context;
use serde::Serialize;
use std::time::Duration;

pub const ACCEPT_V3: &str = "application/vnd.github.v3+json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

/// A fully assembled request against the contents API.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Executes requests built by [`ContentsApi`].
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> anyhow::Result<ApiResponse>;
}

/// Builds requests for `/repos/{owner}/{repo}/contents/{path}`.
pub struct ContentsApi {
    base_url: String,
    token: String,
}

impl ContentsApi {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            base_url: format!(
                "{}/repos/{}/contents",
                config.api_url,
                config.full_repo_name()
            ),
            token: config.token.clone(),
        }
    }

    /// `remote_path` must already be escaped, see [`crate::path::normalize`].
    pub fn url(&self, remote_path: &str) -> String {
        format!("{}/{remote_path}", self.base_url)
    }

    pub fn get(&self, remote_path: &str) -> ApiRequest {
        ApiRequest {
            method: Method::Get,
            url: self.url(remote_path),
            headers: vec![
                ("Authorization", format!("token {}", self.token)),
                ("Accept", ACCEPT_V3.to_string()),
            ],
            body: None,
        }
    }

    pub fn put(&self, remote_path: &str, payload: &WritePayload<'_>) -> anyhow::Result<ApiRequest> {
        let body = serde_json::to_string(payload).context("cannot serialize write payload")?;
        Ok(ApiRequest {
            method: Method::Put,
            url: self.url(remote_path),
            headers: vec![
                ("Authorization", format!("token {}", self.token)),
                ("Content-Type", "application/json".to_string()),
                ("Accept", ACCEPT_V3.to_string()),
            ],
            body: Some(body),
        })
    }
}

/// Body of a create-or-update contents request.
///
/// `sha` must be set exactly when the file already exists on the branch.
#[derive(Serialize, Debug)]
pub struct WritePayload<'a> {
    pub message: &'a str,
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Existence and blob sha of a remote path, as seen right before a write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteState {
    pub exists: bool,
    pub sha: Option<String>,
}

impl RemoteState {
    pub fn missing() -> Self {
        Self {
            exists: false,
            sha: None,
        }
    }

    pub fn existing(sha: impl Into<String>) -> Self {
        Self {
            exists: true,
            sha: Some(sha.into()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("empty response")]
    EmptyResponse,
    #[error("malformed response: {source}; body: {body}")]
    Malformed {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("request failed: {0:#}")]
    Transport(anyhow::Error),
}

/// Interprets the body of a contents `GET`.
///
/// Any JSON document without a string `sha` field (such as the
/// `{"message":"Not Found"}` error shape) means the path does not exist yet.
pub fn parse_probe_body(body: &str) -> Result<RemoteState, ProbeError> {
    if body.trim().is_empty() {
        return Err(ProbeError::EmptyResponse);
    }
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|source| ProbeError::Malformed {
            source,
            body: body.to_string(),
        })?;
    Ok(match value.get("sha").and_then(|sha| sha.as_str()) {
        Some(sha) => RemoteState::existing(sha),
        None => RemoteState::missing(),
    })
}

pub fn probe<T: Transport + ?Sized>(
    api: &ContentsApi,
    transport: &T,
    remote_path: &str,
) -> Result<RemoteState, ProbeError> {
    let response = transport
        .send(&api.get(remote_path))
        .map_err(ProbeError::Transport)?;
    log::debug!("probe {remote_path}: HTTP {}", response.status);
    parse_probe_body(&response.body)
}

/// [`Transport`] backed by a blocking `reqwest` client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("cannot create HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> anyhow::Result<ApiResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Put => self.client.put(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        let response = builder
            .send()
            .with_context(|| format!("cannot reach {}", request.url))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .with_context(|| format!("cannot read response from {}", request.url))?;
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn config() -> UploadConfig {
        serde_json::from_str(
            r#"{"GITHUB_TOKEN":"tkn","GITHUB_USERNAME":"octo","REPO_NAME":"site"}"#,
        )
        .unwrap()
    }

    struct Canned {
        body: &'static str,
        seen: RefCell<Vec<ApiRequest>>,
    }

    impl Transport for Canned {
        fn send(&self, request: &ApiRequest) -> anyhow::Result<ApiResponse> {
            self.seen.borrow_mut().push(request.clone());
            Ok(ApiResponse {
                status: 200,
                body: self.body.to_string(),
            })
        }
    }

    struct Offline;

    impl Transport for Offline {
        fn send(&self, _: &ApiRequest) -> anyhow::Result<ApiResponse> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    #[test]
    fn get_request_shape() {
        let api = ContentsApi::new(&config());
        let request = api.get("a%20b/c.txt");
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.url,
            "https://api.github.com/repos/octo/site/contents/a%20b/c.txt"
        );
        assert_eq!(request.header("authorization"), Some("token tkn"));
        assert_eq!(request.header("Accept"), Some(ACCEPT_V3));
        assert!(request.body.is_none());
    }

    #[test]
    fn put_omits_sha_for_new_files() {
        let api = ContentsApi::new(&config());
        let payload = WritePayload {
            message: "msg",
            content: "TWFu".to_string(),
            branch: "main",
            sha: None,
        };
        let request = api.put("x.txt", &payload).unwrap();
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"message": "msg", "content": "TWFu", "branch": "main"})
        );
    }

    #[test]
    fn put_carries_sha_for_existing_files() {
        let api = ContentsApi::new(&config());
        let payload = WritePayload {
            message: "msg",
            content: String::new(),
            branch: "main",
            sha: Some("abc123".to_string()),
        };
        let request = api.put("x.txt", &payload).unwrap();
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["sha"], "abc123");
    }

    #[test]
    fn probe_body_interpretation() {
        assert_eq!(
            parse_probe_body(r#"{"name":"x.txt","sha":"abc123"}"#).unwrap(),
            RemoteState::existing("abc123")
        );
        assert_eq!(
            parse_probe_body(r#"{"message":"Not Found"}"#).unwrap(),
            RemoteState::missing()
        );
        assert!(matches!(parse_probe_body(""), Err(ProbeError::EmptyResponse)));
        assert!(matches!(
            parse_probe_body("<html>bad gateway</html>"),
            Err(ProbeError::Malformed { .. })
        ));
    }

    #[test]
    fn probe_sends_get() {
        let transport = Canned {
            body: r#"{"sha":"f00"}"#,
            seen: RefCell::default(),
        };
        let state = probe(&ContentsApi::new(&config()), &transport, "docs/a.md").unwrap();
        assert_eq!(state, RemoteState::existing("f00"));
        let seen = transport.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::Get);
        assert!(seen[0].url.ends_with("/contents/docs/a.md"));
    }

    #[test]
    fn transport_errors_fail_the_probe() {
        let result = probe(&ContentsApi::new(&config()), &Offline, "a.md");
        assert!(matches!(result, Err(ProbeError::Transport(_))));
    }
}
