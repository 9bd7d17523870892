use crate::config::{ApiKey, UpstreamConfig};
use crate::context::RequestContext;
use crate::errors::{ForwardError, ProxyError};
use crate::metrics_defs::UPSTREAM_DURATION;
use crate::routes::Endpoint;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName};
use shared::histogram;
use std::fmt;
use std::time::Instant;
use url::Url;

/// Query parameter the provider reads the credential from
pub const API_KEY_PARAM: &str = "apiKey";

/// Provider usage headers relayed back to the caller on success
pub static QUOTA_HEADERS: [HeaderName; 3] = [
    HeaderName::from_static("x-requests-remaining"),
    HeaderName::from_static("x-requests-used"),
    HeaderName::from_static("x-requests-last"),
];

/// Fully built outbound request target.
pub struct UpstreamCall {
    url: Url,
}

impl UpstreamCall {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Upstream path without the query string, safe to log.
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

impl fmt::Debug for UpstreamCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamCall")
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

/// Successful provider response.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub body: Bytes,
    pub quota_headers: HeaderMap,
}

/// Issues the single upstream GET for a matched endpoint.
pub struct Forwarder {
    client: reqwest::Client,
    base_url: Url,
    api_key: ApiKey,
}

impl Forwarder {
    pub fn new(client: reqwest::Client, base_url: Url, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    pub fn try_from_config(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let base_url = config.parsed_base_url()?;
        let api_key = config.api_key()?.clone();
        let client = reqwest::Client::builder()
            .user_agent(concat!("odds-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::new(client, base_url, api_key))
    }

    /// Builds `<base><upstream path>?<forwarded params>&apiKey=<credential>`.
    pub fn upstream_call(
        &self,
        endpoint: &Endpoint,
        context: &RequestContext,
    ) -> Result<UpstreamCall, ForwardError> {
        let path = endpoint
            .upstream_path
            .render(&context.path_params)
            .map_err(|e| ForwardError::Internal(e.to_string()))?;

        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base_path}{path}"));
        url.set_query(None);

        {
            let mut query = url.query_pairs_mut();
            for (name, value) in context.present_query_params() {
                query.append_pair(name, value);
            }
            query.append_pair(API_KEY_PARAM, self.api_key.expose());
        }

        Ok(UpstreamCall { url })
    }

    pub async fn forward(
        &self,
        endpoint: &Endpoint,
        context: &RequestContext,
    ) -> Result<UpstreamResponse, ForwardError> {
        let call = self.upstream_call(endpoint, context)?;
        tracing::debug!(route = endpoint.def.name, upstream_path = call.path(), "Forwarding request");

        let started = Instant::now();
        let result = self.client.get(call.url).send().await;
        histogram!(UPSTREAM_DURATION, "route" => endpoint.def.name)
            .record(started.elapsed().as_secs_f64());

        let response = result.map_err(ForwardError::transport)?;
        let status = response.status();
        tracing::debug!(route = endpoint.def.name, status = status.as_u16(), "Upstream responded");
        let quota_headers = quota_headers(response.headers());
        let body = response.bytes().await.map_err(ForwardError::transport)?;

        if !status.is_success() {
            return Err(ForwardError::upstream(status, &body));
        }

        Ok(UpstreamResponse {
            body,
            quota_headers,
        })
    }
}

fn quota_headers(headers: &HeaderMap) -> HeaderMap {
    let mut quota = HeaderMap::new();
    for name in &QUOTA_HEADERS {
        if let Some(value) = headers.get(name) {
            quota.insert(name.clone(), value.clone());
        }
    }
    quota
}
