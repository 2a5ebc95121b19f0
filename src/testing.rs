//! Recorded-response transport for exercising routers without a device

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::config::ConnectionParams;
use crate::error::{Error, Result};
use crate::http::{Method, Request, Response, Transport};

pub const HOST: &str = "192.168.0.1";

pub fn params() -> ConnectionParams {
    ConnectionParams::new(HOST, "admin", "admin")
}

#[derive(Default)]
struct Fixtures {
    routes: HashMap<(Method, String), VecDeque<Response>>,
    requests: Vec<Request>,
    offline: bool,
}

/// Serves canned responses keyed by method and path (query ignored).
///
/// Several responses for one route are served in order, the last one
/// repeating. Unknown routes answer 404.
#[derive(Clone, Default)]
pub struct FixtureTransport {
    inner: Arc<Mutex<Fixtures>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request fails as if the host were unreachable
    pub fn offline() -> Self {
        let transport = Self::default();
        transport.inner.lock().unwrap().offline = true;
        transport
    }

    pub fn on(self, method: Method, path: &str, response: Response) -> Self {
        self.inner
            .lock()
            .unwrap()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    pub fn get(self, path: &str, response: Response) -> Self {
        self.on(Method::Get, path, response)
    }

    pub fn post(self, path: &str, response: Response) -> Self {
        self.on(Method::Post, path, response)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| request.path().to_string())
            .collect()
    }
}

impl Transport for FixtureTransport {
    async fn send(&self, host: &str, request: &Request) -> Result<Response> {
        assert_eq!(host, HOST);
        let mut fixtures = self.inner.lock().unwrap();
        fixtures.requests.push(request.clone());
        if fixtures.offline {
            return Err(Error::Network("connection refused".into()));
        }
        let key = (request.method, request.path().to_string());
        Ok(match fixtures.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Response::new(404, "Not Found"),
        })
    }
}
