use crate::config::Config;
use crate::context::RequestContext;
use crate::errors::{ForwardError, ProxyError};
use crate::forwarder::Forwarder;
use crate::metrics_defs::REQUESTS;
use crate::relay::{ErrorEnvelope, Relay};
use crate::routes::{ROUTES, RouteTable, build_route_table};
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::service::Service as HyperService;
use hyper::{Request, Response, StatusCode};
use shared::counter;
use shared::http::{make_json_response, serialize_json_response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Routes inbound API requests to the provider.
pub struct ProxyService {
    routes: Arc<RouteTable>,
    forwarder: Arc<Forwarder>,
    relay: Relay,
}

impl ProxyService {
    pub fn new(routes: RouteTable, forwarder: Forwarder, relay: Relay) -> Self {
        Self {
            routes: Arc::new(routes),
            forwarder: Arc::new(forwarder),
            relay,
        }
    }

    pub fn try_new(config: &Config) -> Result<Self, ProxyError> {
        let routes = build_route_table(&ROUTES)?;
        let forwarder = Forwarder::try_from_config(&config.upstream)?;
        let relay = Relay::new(config.upstream.propagate_status);
        Ok(Self::new(routes, forwarder, relay))
    }
}

impl<B> HyperService<Request<B>> for ProxyService {
    type Response = Response<BoxBody<Bytes, ProxyError>>;
    type Error = ProxyError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let Some(route_match) = self.routes.resolve(&req) else {
            tracing::debug!(%method, path = %path, "No route matched");
            counter!(REQUESTS, "route" => "none", "status" => "404").increment(1);
            let response = not_found(&method, &path);
            return Box::pin(async move { Ok(response) });
        };

        let endpoint = route_match.action.clone();
        let context = RequestContext::new(endpoint.def, route_match.params, req.uri().query());
        tracing::debug!(%method, path = %path, route = endpoint.def.name, "Matched route");

        let forwarder = self.forwarder.clone();
        let relay = self.relay;

        Box::pin(async move {
            // The upstream call runs in its own task so that it completes even
            // if the caller disconnects and this future is dropped.
            let task_endpoint = endpoint.clone();
            let outcome = tokio::spawn(async move {
                forwarder.forward(&task_endpoint, &context).await
            })
            .await
            .unwrap_or_else(|e| Err(ForwardError::Internal(format!("upstream task failed: {e}"))));

            let response = relay.respond(endpoint.def.name, endpoint.def.error_label, outcome);
            counter!(
                REQUESTS,
                "route" => endpoint.def.name,
                "status" => response.status().as_str().to_string()
            )
            .increment(1);
            Ok(response)
        })
    }
}

fn not_found(method: &hyper::Method, path: &str) -> Response<BoxBody<Bytes, ProxyError>> {
    let message = format!("Cannot {method} {path}");
    let envelope = ErrorEnvelope {
        error: "Not Found",
        message: &message,
    };
    serialize_json_response(StatusCode::NOT_FOUND, &envelope).unwrap_or_else(|_| {
        make_json_response(
            StatusCode::NOT_FOUND,
            r#"{"error":"Not Found","message":"no route matched"}"#,
        )
    })
}
