use crate::http::{full_body, make_boxed_error_response};
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// Serves `/health` and `/ready` on the admin listener.
pub struct AdminService<F, E> {
    is_ready: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> AdminService<F, E>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self {
            is_ready,
            _error: PhantomData,
        }
    }
}

impl<F, E, B> Service<Request<B>> for AdminService<F, E>
where
    F: Fn() -> bool,
    E: Send + 'static,
    B: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, E>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let is_ready = (self.is_ready)();

        Box::pin(async move {
            if req.method() != Method::GET {
                return Ok(make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED));
            }

            let res = match req.uri().path() {
                "/health" => Response::new(full_body("ok\n")),
                "/ready" => match is_ready {
                    true => Response::new(full_body("ok\n")),
                    false => make_boxed_error_response(StatusCode::SERVICE_UNAVAILABLE),
                },
                _ => make_boxed_error_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}
