use crate::config::ValidationError;
use routing::TemplateError;
use std::io;

#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] ValidationError),
    #[error("route table error: {0}")]
    RouteTable(#[from] RouteTableError),
    #[error("could not build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RouteTableError {
    #[error("route {route}: {source}")]
    UnboundUpstreamParam {
        route: &'static str,
        source: TemplateError,
    },
    #[error("duplicate route: {0} {1}")]
    DuplicateRoute(String, &'static str),
}

/// Failure of a single upstream call.
///
/// Messages never contain the upstream URL, which carries the credential.
#[derive(thiserror::Error, Debug)]
pub enum ForwardError {
    /// The call could not be completed: DNS, connect, timeout, or body read failure.
    #[error("{message}")]
    Transport { message: String },
    /// The provider answered with a non-success status.
    #[error("{message}")]
    Upstream {
        status: hyper::StatusCode,
        message: String,
    },
    #[error("{0}")]
    Internal(String),
}

impl ForwardError {
    pub fn transport(err: reqwest::Error) -> Self {
        // Strip the URL first: its query string holds the credential.
        let err = err.without_url();
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ForwardError::Transport { message }
    }

    /// Builds an upstream failure, preferring the `message` field of the provider's JSON body.
    pub fn upstream(status: hyper::StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(serde_json::Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

        ForwardError::Upstream { status, message }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Transport { .. } => "transport",
            ForwardError::Upstream { .. } => "upstream",
            ForwardError::Internal(_) => "internal",
        }
    }
}
