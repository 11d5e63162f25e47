//! Test doubles for the request client and the pinning validator
//!
//! Every double is an ordinary value owned by the test that creates it. Clones share
//! state, so a test can hand one clone to the client and inspect another.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Request};
use rustls::pki_types::CertificateDer;
use url::Url;

use crate::http::auth::{AuthorizationProvider, SubjectTokenProvider};
use crate::http::transport::{HttpResponse, Transport, TransportError, TransportErrorKind};
use crate::pinning::evaluator::{ServerTrust, TrustEvaluator};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A request as seen by [`MockTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    fn capture(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body: request
                .body()
                .and_then(|body| body.as_bytes())
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Body decoded as `application/x-www-form-urlencoded`
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(&self.body).into_owned().collect()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

pub type ResponseHandler =
    Arc<dyn Fn(&RecordedRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

#[derive(Default)]
struct MockTransportState {
    requests: Vec<RecordedRequest>,
    handler: Option<ResponseHandler>,
}

/// Transport that records every request and answers from an injected handler
///
/// Without a handler every request fails with a transport error.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with `status` and `body`
    pub fn respond_with(&self, status: u16, body: impl Into<Vec<u8>>) {
        let body = body.into();
        self.respond_with_handler(move |request| {
            Ok(HttpResponse::new(status, request.url.clone(), body.clone()))
        });
    }

    pub fn respond_with_handler<F>(&self, handler: F)
    where
        F: Fn(&RecordedRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        lock(&self.state).handler = Some(Arc::new(handler));
    }

    /// Fail every request with a transport error of `kind`
    pub fn fail_with(&self, kind: TransportErrorKind, message: impl Into<String>) {
        let message = message.into();
        self.respond_with_handler(move |_| Err(TransportError::new(kind, message.clone())));
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Forget recorded requests and the handler
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.requests.clear();
        state.handler = None;
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("MockTransport")
            .field("requests", &state.requests.len())
            .field("has_handler", &state.handler.is_some())
            .finish()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<HttpResponse, TransportError> {
        let recorded = RecordedRequest::capture(&request);
        let handler = {
            let mut state = lock(&self.state);
            state.requests.push(recorded.clone());
            state.handler.clone()
        };

        match handler {
            Some(handler) => handler(&recorded),
            None => Err(TransportError::new(
                TransportErrorKind::Other,
                "No response handler installed",
            )),
        }
    }
}

#[derive(Debug, Clone)]
enum ProviderBehavior {
    Token(String),
    Fail(String),
    Pending,
}

/// Authorization provider with a scripted outcome that records requested scopes
#[derive(Debug, Clone)]
pub struct MockAuthorizationProvider {
    behavior: ProviderBehavior,
    scopes: Arc<Mutex<Vec<String>>>,
}

impl MockAuthorizationProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_behavior(ProviderBehavior::Token(token.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(ProviderBehavior::Fail(message.into()))
    }

    /// Never completes
    pub fn pending() -> Self {
        Self::with_behavior(ProviderBehavior::Pending)
    }

    fn with_behavior(behavior: ProviderBehavior) -> Self {
        Self {
            behavior,
            scopes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn scopes(&self) -> Vec<String> {
        lock(&self.scopes).clone()
    }
}

#[async_trait]
impl AuthorizationProvider for MockAuthorizationProvider {
    async fn fetch_token(&self, scope: &str) -> anyhow::Result<String> {
        lock(&self.scopes).push(scope.to_string());
        match &self.behavior {
            ProviderBehavior::Token(token) => Ok(token.clone()),
            ProviderBehavior::Fail(message) => Err(anyhow::anyhow!(message.clone())),
            ProviderBehavior::Pending => std::future::pending().await,
        }
    }
}

/// Subject token source that counts how often it is asked
#[derive(Debug, Clone)]
pub struct MockSubjectTokenProvider {
    token: String,
    calls: Arc<AtomicUsize>,
}

impl MockSubjectTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubjectTokenProvider for MockSubjectTokenProvider {
    async fn subject_token(&self) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.clone())
    }
}

/// Trust evaluator with a scripted verdict and extracted certificate
#[derive(Debug)]
pub struct MockTrustEvaluator {
    server_trusted: bool,
    certificate: Option<CertificateDer<'static>>,
    evaluations: AtomicUsize,
}

impl MockTrustEvaluator {
    /// Trusts every chain and extracts `certificate` at any index
    pub fn new(certificate: CertificateDer<'static>) -> Self {
        Self {
            server_trusted: true,
            certificate: Some(certificate),
            evaluations: AtomicUsize::new(0),
        }
    }

    pub fn with_server_trusted(mut self, trusted: bool) -> Self {
        self.server_trusted = trusted;
        self
    }

    pub fn without_certificate(mut self) -> Self {
        self.certificate = None;
        self
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl TrustEvaluator for MockTrustEvaluator {
    fn evaluate_trust(&self, _trust: &mut ServerTrust) -> bool {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        self.server_trusted
    }

    fn extract_certificate(&self, _trust: &ServerTrust, _index: usize) -> Option<CertificateDer<'static>> {
        self.certificate.clone()
    }
}
