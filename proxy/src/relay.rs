use crate::errors::{ForwardError, ProxyError};
use crate::forwarder::UpstreamResponse;
use crate::metrics_defs::UPSTREAM_FAILURES;
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use shared::counter;
use shared::http::{make_json_response, serialize_json_response};

/// Body returned to the caller for every failed upstream call.
#[derive(Debug, PartialEq, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub error: &'a str,
    pub message: &'a str,
}

/// Turns a forwarding outcome into the caller's response.
#[derive(Clone, Copy, Debug, Default)]
pub struct Relay {
    propagate_status: bool,
}

impl Relay {
    pub fn new(propagate_status: bool) -> Self {
        Self { propagate_status }
    }

    pub fn respond(
        &self,
        route: &'static str,
        error_label: &'static str,
        outcome: Result<UpstreamResponse, ForwardError>,
    ) -> Response<BoxBody<Bytes, ProxyError>> {
        match outcome {
            Ok(upstream) => success_response(upstream),
            Err(err) => {
                tracing::error!(
                    route,
                    error = error_label,
                    kind = err.kind(),
                    message = %err,
                    "Upstream request failed"
                );
                counter!(UPSTREAM_FAILURES, "route" => route, "kind" => err.kind()).increment(1);
                self.failure_response(error_label, &err)
            }
        }
    }

    pub fn failure_status(&self, err: &ForwardError) -> StatusCode {
        if !self.propagate_status {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }

        match err {
            ForwardError::Upstream { status, .. } if status.is_client_error() || status.is_server_error() => *status,
            ForwardError::Upstream { .. } | ForwardError::Transport { .. } => StatusCode::BAD_GATEWAY,
            ForwardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn failure_response(
        &self,
        error_label: &str,
        err: &ForwardError,
    ) -> Response<BoxBody<Bytes, ProxyError>> {
        let message = err.to_string();
        let envelope = ErrorEnvelope {
            error: error_label,
            message: &message,
        };
        let status = self.failure_status(err);

        serialize_json_response(status, &envelope).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize error envelope");
            make_json_response(
                status,
                r#"{"error":"Internal Server Error","message":"failed to serialize error"}"#,
            )
        })
    }
}

/// Relays a successful upstream body unchanged.
///
/// A body that is not JSON is sent as a JSON string so the caller always receives JSON.
fn success_response(upstream: UpstreamResponse) -> Response<BoxBody<Bytes, ProxyError>> {
    let UpstreamResponse {
        body,
        quota_headers,
    } = upstream;

    let body = if serde_json::from_slice::<serde::de::IgnoredAny>(&body).is_ok() {
        body
    } else {
        let text = String::from_utf8_lossy(&body);
        match serde_json::to_vec(&text) {
            Ok(encoded) => Bytes::from(encoded),
            Err(_) => Bytes::from_static(b"\"\""),
        }
    };

    let mut response = make_json_response(StatusCode::OK, body);
    response.headers_mut().extend(quota_headers);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

    async fn body_string(response: Response<BoxBody<Bytes, ProxyError>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn upstream_ok(body: &'static str) -> Result<UpstreamResponse, ForwardError> {
        Ok(UpstreamResponse {
            body: Bytes::from_static(body.as_bytes()),
            quota_headers: HeaderMap::new(),
        })
    }

    #[tokio::test]
    async fn test_success_is_verbatim() {
        let body = r#"{"z":1,"a":[1,2,3],"m":{"k":null}}"#;
        let response = Relay::default().respond("odds", "Failed to fetch odds", upstream_ok(body));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(body_string(response).await, body);
    }

    #[tokio::test]
    async fn test_non_json_success_is_wrapped() {
        let response = Relay::default().respond("sports", "Failed to fetch sports", upstream_ok("plain \"text\""));
        assert_eq!(body_string(response).await, r#""plain \"text\"""#);

        let response = Relay::default().respond("sports", "Failed to fetch sports", upstream_ok(""));
        assert_eq!(body_string(response).await, r#""""#);
    }

    #[tokio::test]
    async fn test_quota_headers_are_copied() {
        let mut quota_headers = HeaderMap::new();
        quota_headers.insert("x-requests-used", HeaderValue::from_static("20"));
        let outcome = Ok(UpstreamResponse {
            body: Bytes::from_static(b"[]"),
            quota_headers,
        });

        let response = Relay::default().respond("sports", "Failed to fetch sports", outcome);
        assert_eq!(response.headers().get("x-requests-used").unwrap(), "20");
    }

    #[tokio::test]
    async fn test_failure_envelope() {
        let outcome = Err(ForwardError::Upstream {
            status: StatusCode::NOT_FOUND,
            message: "Unknown sport".into(),
        });

        let response = Relay::default().respond("odds", "Failed to fetch odds", outcome);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(
            body_string(response).await,
            r#"{"error":"Failed to fetch odds","message":"Unknown sport"}"#
        );
    }

    #[test]
    fn test_fixed_failure_status() {
        let relay = Relay::default();
        let errors = [
            ForwardError::Upstream {
                status: StatusCode::NOT_FOUND,
                message: "a".into(),
            },
            ForwardError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "b".into(),
            },
            ForwardError::Transport {
                message: "c".into(),
            },
        ];
        for err in &errors {
            assert_eq!(relay.failure_status(err), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_propagated_failure_status() {
        let relay = Relay::new(true);

        let not_found = ForwardError::Upstream {
            status: StatusCode::NOT_FOUND,
            message: "a".into(),
        };
        assert_eq!(relay.failure_status(&not_found), StatusCode::NOT_FOUND);

        let unauthorized = ForwardError::Upstream {
            status: StatusCode::UNAUTHORIZED,
            message: "a".into(),
        };
        assert_eq!(relay.failure_status(&unauthorized), StatusCode::UNAUTHORIZED);

        let redirect = ForwardError::Upstream {
            status: StatusCode::NOT_MODIFIED,
            message: "a".into(),
        };
        assert_eq!(relay.failure_status(&redirect), StatusCode::BAD_GATEWAY);

        let transport = ForwardError::Transport {
            message: "connection refused".into(),
        };
        assert_eq!(relay.failure_status(&transport), StatusCode::BAD_GATEWAY);
    }
}
