//! Solr HTTP client wrapper.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{Result, SolrError};

/// Default Solr listen port
pub const DEFAULT_PORT: u16 = 8983;

/// Endpoint family for the v2 API (`/api/{type}/...`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiType {
    Collections,
    Cores,
    Cluster,
}

impl ApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::Collections => "collections",
            ApiType::Cores => "cores",
            ApiType::Cluster => "cluster",
        }
    }
}

/// Request body for POST calls
#[derive(Debug, Clone)]
pub enum Body {
    /// URL-encoded form parameters (queries)
    Form(Vec<(String, String)>),
    /// Raw JSON text (updates and schema commands)
    Json(String),
}

impl Body {
    pub fn json(value: &Value) -> Self {
        Body::Json(value.to_string())
    }
}

/// Solr client with connection configuration
#[derive(Clone)]
pub struct SolrClient {
    http: Client,
    base: Url,
}

impl SolrClient {
    /// Create a new client for `http://{host}:{port}`
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let base = Url::parse(&format!("http://{}:{}/", host, port))?;
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// v2 URL: `/api/{api_type}/{name}/{api}`
    pub(crate) fn v2_url(&self, api_type: ApiType, name: &str, api: &str) -> String {
        join_url(&self.base, &["api", api_type.as_str(), name, api])
    }

    /// v1 URL: `/solr/{name}/{api}`
    pub(crate) fn v1_url(&self, name: &str, api: &str) -> String {
        join_url(&self.base, &["solr", name, api])
    }

    /// GET on the v2 API, failing on a non-2xx status
    pub async fn get_api(&self, api_type: ApiType, name: &str, api: &str) -> Result<Value> {
        let url = self.v2_url(api_type, name, api);
        debug!("GET {}", url);
        let data = checked_json(self.http.get(&url), &url).await?;
        Ok(unwrap_response(data, api, false))
    }

    /// POST on the v2 API, failing on a non-2xx status
    pub async fn post_api(
        &self,
        api_type: ApiType,
        name: &str,
        api: &str,
        body: Body,
    ) -> Result<Value> {
        let url = self.v2_url(api_type, name, api);
        debug!("POST {}", url);
        let data = checked_json(with_body(self.http.post(&url), body), &url).await?;
        Ok(unwrap_response(data, api, false))
    }

    /// DELETE on the v2 API, failing on a non-2xx status
    pub async fn delete_api(&self, api_type: ApiType, name: &str, api: &str) -> Result<Value> {
        let url = self.v2_url(api_type, name, api);
        debug!("DELETE {}", url);
        let data = checked_json(self.http.delete(&url), &url).await?;
        Ok(unwrap_response(data, api, false))
    }

    /// GET on the v1 API. The HTTP status is not checked.
    pub async fn get_solr(&self, name: &str, api: &str, keep_header: bool) -> Result<Value> {
        let url = self.v1_url(name, api);
        debug!("GET {}", url);
        let text = self.http.get(&url).send().await?.text().await?;
        let data: Value = serde_json::from_str(&text)?;
        Ok(unwrap_response(data, api, keep_header))
    }

    /// POST on the v1 API. The HTTP status is not checked.
    pub async fn post_solr(
        &self,
        name: &str,
        api: &str,
        body: Body,
        keep_header: bool,
    ) -> Result<Value> {
        let url = self.v1_url(name, api);
        debug!("POST {}", url);
        let text = with_body(self.http.post(&url), body)
            .send()
            .await?
            .text()
            .await?;
        let data: Value = serde_json::from_str(&text)?;
        Ok(unwrap_response(data, api, keep_header))
    }
}

fn join_url(base: &Url, segments: &[&str]) -> String {
    let path = segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}{}", base.as_str(), path)
}

fn with_body(request: RequestBuilder, body: Body) -> RequestBuilder {
    match body {
        Body::Form(params) => request.form(&params),
        Body::Json(text) => request.header(CONTENT_TYPE, "application/json").body(text),
    }
}

async fn checked_json(request: RequestBuilder, url: &str) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SolrError::Status {
            status,
            url: url.to_string(),
        });
    }
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// Return the member named after the endpoint when present, otherwise the
/// whole body with `responseHeader` removed unless `keep_header` is set.
pub(crate) fn unwrap_response(mut data: Value, api: &str, keep_header: bool) -> Value {
    if let Value::Object(map) = &mut data {
        if let Some(inner) = map.remove(api) {
            return inner;
        }
        if !keep_header {
            map.remove("responseHeader");
        }
    }
    data
}
