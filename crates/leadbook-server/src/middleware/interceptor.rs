//! Request audit interceptor
//!
//! Wraps every inbound request, times it, and feeds the audit recorder:
//! - any request answered with 1xx/2xx/3xx records `HTTP_REQUEST`
//! - any request answered with 4xx/5xx records `HTTP_ERROR`
//!
//! Recording is spawned after the response is ready, so a slow or failing
//! queue never delays or fails the request. Every request is also logged as
//! `"{method} {url} {status} {n}ms"`.

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, Method, StatusCode},
    response::Response,
};
use leadbook_common::Actor;
use serde_json::{json, Value as JsonValue};
use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::info;

use crate::api::response::ErrorMessage;
use crate::audit::{models, AuditRecorder};

#[derive(Clone)]
pub struct RequestAuditLayer {
    recorder: AuditRecorder,
}

impl RequestAuditLayer {
    pub fn new(recorder: AuditRecorder) -> Self {
        Self { recorder }
    }
}

impl<S> Layer<S> for RequestAuditLayer {
    type Service = RequestAuditService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestAuditService {
            inner,
            recorder: self.recorder.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequestAuditService<S> {
    inner: S,
    recorder: AuditRecorder,
}

/// What the interceptor knows about a request before it runs.
#[derive(Debug, Clone)]
struct RequestInfo {
    method: Method,
    url: String,
    ip: Option<String>,
    user_agent: Option<String>,
}

impl RequestInfo {
    fn capture(request: &Request) -> Self {
        let headers = request.headers();
        let ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .or_else(|| forwarded_for(headers));

        Self {
            method: request.method().clone(),
            url: request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| request.uri().path().to_string()),
            ip,
            user_agent: headers
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

/// The audit event for a finished request.
fn audit_event(
    info: &RequestInfo,
    status: StatusCode,
    elapsed_ms: u128,
    error: Option<&str>,
) -> (&'static str, JsonValue) {
    let duration = format!("{elapsed_ms}ms");

    if status.is_client_error() || status.is_server_error() {
        let error = error
            .map(str::to_string)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| status.to_string());
        return (
            models::HTTP_ERROR,
            json!({
                "method": info.method.as_str(),
                "url": info.url,
                "statusCode": status.as_u16(),
                "error": error,
                "duration": duration,
                "ip": info.ip,
            }),
        );
    }

    (
        models::HTTP_REQUEST,
        json!({
            "method": info.method.as_str(),
            "url": info.url,
            "statusCode": status.as_u16(),
            "duration": duration,
            "ip": info.ip,
            "userAgent": info.user_agent,
        }),
    )
}

impl<S> Service<Request> for RequestAuditService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // Take the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let recorder = self.recorder.clone();

        Box::pin(async move {
            let info = RequestInfo::capture(&request);
            let started = Instant::now();

            let response = inner.call(request).await?;

            let elapsed_ms = started.elapsed().as_millis();
            let status = response.status();
            info!("{} {} {} {}ms", info.method, info.url, status.as_u16(), elapsed_ms);

            let error = response.extensions().get::<ErrorMessage>().map(|m| m.0.as_str());
            let (action, details) = audit_event(&info, status, elapsed_ms, error);
            tokio::spawn(async move {
                recorder.record_or_log(action, Actor::System, Some(details)).await;
            });

            Ok(response)
        })
    }
}
