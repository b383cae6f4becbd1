//! Fake provider server for HTTP-level client tests.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use tiny_http::{Header, Response, Server};

/// A request as seen by the fake provider
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query string
    pub url: String,
    pub api_key: Option<String>,
    pub body: String,
}

/// Canned route: requests whose path ends with `suffix` get `status` and `body`
pub struct Route {
    pub suffix: &'static str,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn ok(suffix: &'static str, body: serde_json::Value) -> Self {
        Self {
            suffix,
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(suffix: &'static str, status: u16, body: serde_json::Value) -> Self {
        Self {
            suffix,
            status,
            body: body.to_string(),
        }
    }
}

/// Local HTTP server answering from a fixed route table
pub struct FakeProvider {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeProvider {
    pub fn start(routes: Vec<Route>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);

                let url = request.url().to_string();
                let path = url.split('?').next().unwrap_or_default().to_string();
                let api_key = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("x-goog-api-key"))
                    .map(|h| h.value.as_str().to_string());

                recorded.lock().unwrap().push(RecordedRequest {
                    method: request.method().to_string(),
                    url,
                    api_key,
                    body,
                });

                let (status, payload) = routes
                    .iter()
                    .find(|r| path.ends_with(r.suffix))
                    .map(|r| (r.status, r.body.clone()))
                    .unwrap_or((404, r#"{"message":"no such route"}"#.to_string()));

                let response = Response::from_string(payload)
                    .with_status_code(status)
                    .with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
                    );
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}
