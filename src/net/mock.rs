use crate::errors::ClientError;
use crate::net::{Response, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) enum MockReply {
    Json(Value),
    Status(u16),
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: &'static str,
    pub url: Url,
    pub body: Option<String>,
}

/// Transport answering from canned replies keyed by URL path, recording every call.
///
/// Replies queued for a path are consumed in order; the last one is repeated.
/// Paths without replies answer 404.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<MockReply>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, path: &str, body: Value) -> Self {
        self.push(path, MockReply::Json(body))
    }

    pub fn reply_status(self, path: &str, status: u16) -> Self {
        self.push(path, MockReply::Status(status))
    }

    fn push(self, path: &str, reply: MockReply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url.path().to_string()).collect()
    }

    fn answer(&self, method: &'static str, url: &Url, body: Option<String>) -> Result<Response, ClientError> {
        self.calls.lock().unwrap().push(Call { method, url: url.clone(), body });

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(url.path()) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        let mut response = Response::ok_json(url.clone(), &Value::Null);
        match reply {
            Some(MockReply::Json(v)) => response.body = v.to_string().into_bytes(),
            Some(MockReply::Status(status)) => response.status = status,
            None => response.status = 404,
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<Response, ClientError> {
        self.answer("GET", url, None)
    }

    async fn post(&self, url: &Url, body: String) -> Result<Response, ClientError> {
        self.answer("POST", url, Some(body))
    }
}
