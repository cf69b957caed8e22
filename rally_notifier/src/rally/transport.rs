//! HTTP transport for the Rally WSAPI.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::request::{CreateEnvelope, CreateRequest, CreateResponse, QueryEnvelope, QueryRequest, QueryResponse};
use crate::config::RallyConfig;
use crate::error::RallyError;

const WSAPI_PATH: &str = "slm/webservice/v2.0/";
const MAX_PAGE_SIZE: usize = 200;

/// The two WSAPI operations a publishing run needs.
#[async_trait]
pub trait RallyTransport: Send + Sync {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, RallyError>;
    async fn create(&self, request: &CreateRequest) -> Result<CreateResponse, RallyError>;
}

/// One HTTP client per publishing run; dropped when the run ends.
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(config: &RallyConfig) -> Result<Self, RallyError> {
        let endpoint = wsapi_endpoint(&config.url)?;

        let mut headers = header::HeaderMap::new();
        let key = header::HeaderValue::from_str(&config.api_key).map_err(|e| {
            RallyError::Configuration(format!("API key is not a valid header value: {e}"))
        })?;
        headers.insert("ZSESSIONID", key);
        let integration = header::HeaderValue::from_str(&config.application_name).map_err(|e| {
            RallyError::Configuration(format!("application name is not a valid header value: {e}"))
        })?;
        headers.insert("X-RallyIntegrationName", integration);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("rally-notifier/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| RallyError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    fn url_for(&self, path: &str) -> Result<Url, RallyError> {
        self.endpoint
            .join(path.trim_start_matches('/'))
            .map_err(|e| RallyError::Request(format!("invalid resource path '{path}': {e}")))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RallyError> {
        let response = request
            .send()
            .await
            .map_err(|e| RallyError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RallyError::Request(format!("response read failed: {e}")))?;

        if !status.is_success() {
            return Err(RallyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| RallyError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl RallyTransport for HttpTransport {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, RallyError> {
        let url = self.url_for(request.path())?;
        let limit = request.limit.unwrap_or(usize::MAX);
        let page_size = limit.clamp(1, MAX_PAGE_SIZE);

        let mut collected = QueryResponse::default();
        let mut start = 1;
        loop {
            let mut params = vec![
                ("fetch", request.fetch.as_param()),
                ("pagesize", page_size.to_string()),
                ("start", start.to_string()),
            ];
            if let Some(filter) = &request.filter {
                params.push(("query", filter.to_string()));
            }
            if let Some(workspace) = &request.workspace {
                params.push(("workspace", workspace.clone()));
            }

            crate::metrics::rally_request("query");
            let envelope: QueryEnvelope = self
                .send_json(self.client.get(url.clone()).query(&params))
                .await?;
            let page = envelope.query_result;

            collected.total_result_count = page.total_result_count;
            collected.warnings.extend(page.warnings);
            if !page.errors.is_empty() {
                collected.errors = page.errors;
                break;
            }

            let fetched = page.results.len();
            collected.results.extend(page.results);
            if fetched == 0 || collected.results.len() >= limit.min(collected.total_result_count) {
                break;
            }
            start += fetched;
        }

        collected.results.truncate(limit);
        Ok(collected)
    }

    async fn create(&self, request: &CreateRequest) -> Result<CreateResponse, RallyError> {
        let url = self.url_for(&format!("{}/create", request.type_name))?;
        let mut body = Map::new();
        body.insert(request.type_name.clone(), request.object.clone());

        crate::metrics::rally_request("create");
        let envelope: CreateEnvelope = self
            .send_json(self.client.post(url).json(&Value::Object(body)))
            .await?;
        Ok(envelope.create_result)
    }
}

/// Resolve the WSAPI root for a configured server URL.
pub fn wsapi_endpoint(server: &str) -> Result<Url, RallyError> {
    let invalid = |reason: String| RallyError::InvalidEndpoint {
        url: server.to_string(),
        reason,
    };

    let parsed = Url::parse(server.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
        return Err(invalid("URL has no host".to_string()));
    }

    let base = parsed.as_str().trim_end_matches('/');
    let root = if parsed.path().contains("/slm/webservice/") {
        format!("{base}/")
    } else {
        format!("{base}/{WSAPI_PATH}")
    };
    Url::parse(&root).map_err(|e| invalid(e.to_string()))
}
