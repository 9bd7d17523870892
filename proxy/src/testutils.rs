use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
}

/// A provider stand-in that answers every request with a fixed response
/// and records what it received once the response is ready.
pub struct StubUpstream {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubUpstream {
    pub async fn start(status: StatusCode, body: &'static str) -> Self {
        Self::start_with_headers(status, body, vec![]).await
    }

    pub async fn start_with_headers(
        status: StatusCode,
        body: &'static str,
        headers: Vec<(&'static str, &'static str)>,
    ) -> Self {
        Self::spawn(status, body, headers, Duration::ZERO).await
    }

    /// Like `start`, but waits `delay` before answering each request.
    pub async fn start_delayed(status: StatusCode, body: &'static str, delay: Duration) -> Self {
        Self::spawn(status, body, vec![], delay).await
    }

    async fn spawn(
        status: StatusCode,
        body: &'static str,
        headers: Vec<(&'static str, &'static str)>,
        delay: Duration,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let recorded = recorded.clone();
                let headers = headers.clone();

                tokio::spawn(async move {
                    let svc = service_fn(move |req: Request<Incoming>| {
                        let request = RecordedRequest {
                            path: req.uri().path().to_string(),
                            query: req.uri().query().map(str::to_string),
                        };
                        let recorded = recorded.clone();

                        let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
                        *response.status_mut() = status;
                        response
                            .headers_mut()
                            .insert("content-type", "application/json".parse().unwrap());
                        for (name, value) in &headers {
                            response
                                .headers_mut()
                                .insert(*name, value.parse().unwrap());
                        }
                        async move {
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                            recorded.lock().unwrap().push(request);
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await;
                });
            }
        });

        StubUpstream {
            base_url: format!("http://127.0.0.1:{port}/v4"),
            requests,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Base URL of a port nothing listens on.
pub async fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/v4")
}

/// Client that ignores proxy settings from the environment.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
