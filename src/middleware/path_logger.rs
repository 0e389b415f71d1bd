use std::future::{ready, Ready};
use actix_web::{
    dev::{self, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::LocalBoxFuture;

/// Structured request/response logging middleware, one `tracing::debug!`
/// span per request.
pub struct PathLogger;

impl<S, B> Transform<S, ServiceRequest> for PathLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = PathLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PathLoggerMiddleware { service }))
    }
}

pub struct PathLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for PathLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().clone();
        let path = req.path().to_string();
        tracing::debug!(%method, %path, "request received");

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            tracing::debug!(%method, %path, status = res.status().as_u16(), "request completed");
            Ok(res)
        })
    }
}