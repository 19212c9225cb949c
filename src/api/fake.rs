//! Recording transport for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::time::Duration;

use super::{ApiError, ApiRequest, Method, RawResponse, Transport};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    /// Scope prefix plus path, e.g. `/admin/ban-customer/42`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

#[derive(Clone)]
enum Reply {
    Json { status: u16, body: Value },
    Network(String),
}

struct Route {
    method: Method,
    path: String,
    delay: Option<Duration>,
    reply: Reply,
    once: bool,
}

type Observer = Box<dyn Fn(&RecordedCall) + Send + Sync>;

#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedCall>>,
    observer: Mutex<Option<Observer>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, None, Reply::Json { status, body }, false);
    }

    /// Answer one matching call; later calls fall through to the next route.
    pub fn respond_once(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, None, Reply::Json { status, body }, true);
    }

    pub fn respond_after(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        status: u16,
        body: Value,
    ) {
        self.push(method, path, Some(delay), Reply::Json { status, body }, true);
    }

    pub fn fail_network(&self, method: Method, path: &str) {
        self.push(
            method,
            path,
            None,
            Reply::Network("connection refused".into()),
            false,
        );
    }

    /// Called synchronously when a request arrives, before any delay.
    pub fn on_request(&self, f: impl Fn(&RecordedCall) + Send + Sync + 'static) {
        *self.observer.lock() = Some(Box::new(f));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn push(&self, method: Method, path: &str, delay: Option<Duration>, reply: Reply, once: bool) {
        self.routes.lock().push(Route {
            method,
            path: path.to_string(),
            delay,
            reply,
            once,
        });
    }

    fn take_reply(&self, method: Method, path: &str) -> Option<(Option<Duration>, Reply)> {
        let mut routes = self.routes.lock();
        let idx = routes
            .iter()
            .position(|r| r.method == method && r.path == path)?;
        if routes[idx].once {
            let route = routes.remove(idx);
            Some((route.delay, route.reply))
        } else {
            Some((routes[idx].delay, routes[idx].reply.clone()))
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, _url: &str, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        let call = RecordedCall {
            method: request.method,
            path: format!("{}{}", request.scope.prefix(), request.path),
            query: request.query.clone(),
            body: request.body.clone(),
            bearer: request.bearer.clone(),
        };
        self.calls.lock().push(call.clone());
        if let Some(observer) = self.observer.lock().as_ref() {
            observer(&call);
        }

        let (delay, reply) = match self.take_reply(call.method, &call.path) {
            Some(found) => found,
            None => {
                return Ok(RawResponse {
                    status: 404,
                    body: format!("no fake route for {} {}", call.method.as_str(), call.path),
                })
            }
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Json { status, body } => Ok(RawResponse {
                status,
                body: body.to_string(),
            }),
            Reply::Network(message) => Err(ApiError::Network(message)),
        }
    }
}
