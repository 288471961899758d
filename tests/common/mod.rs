// Stub similarity service for integration tests: an axum router serving
// canned responses per path on its own tokio runtime, recording every
// request it sees (multipart uploads field by field).

#![allow(dead_code)]

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use tokio::sync::oneshot;

pub const COMPARE_PATH: &str = "/compare-image/";

#[derive(Clone)]
pub struct Canned {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Canned {
    pub fn json(status: u16, body: &str) -> Self {
        Canned {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn html(status: u16, body: &str) -> Self {
        Canned {
            status,
            content_type: "text/html",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(content_type: &'static str, body: &[u8]) -> Self {
        Canned {
            status: 200,
            content_type,
            body: body.to_vec(),
        }
    }

    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct RecordedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub parts: Vec<RecordedPart>,
}

#[derive(Default)]
struct Stub {
    routes: HashMap<String, Canned>,
    seen: Mutex<Vec<Recorded>>,
}

impl Stub {
    fn record(&self, recorded: Recorded) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(recorded);
        }
    }

    fn respond(&self, path: &str) -> Response {
        match self.routes.get(path) {
            Some(canned) => canned.clone().into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

pub struct StubServer {
    pub base_url: String,
    stub: Arc<Stub>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubServer {
    /// Serve `routes` (path -> canned response) until the server is dropped.
    pub fn start(routes: Vec<(&str, Canned)>) -> Self {
        let stub = Arc::new(Stub {
            routes: routes
                .into_iter()
                .map(|(path, canned)| (path.to_string(), canned))
                .collect(),
            seen: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route(COMPARE_PATH, post(compare_image))
            .fallback(canned)
            .with_state(stub.clone());

        let (addr_tx, addr_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("stub runtime");
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind stub listener");
                addr_tx
                    .send(listener.local_addr().expect("stub address"))
                    .expect("report stub address");
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("stub server");
            });
        });
        let addr = addr_rx.recv().expect("stub server failed to start");

        StubServer {
            base_url: format!("http://{}", addr),
            stub,
            shutdown: Some(shutdown_tx),
        }
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<Recorded> {
        self.stub.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests()
            .pop()
            .expect("stub server saw no request")
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// An address nothing listens on.
pub fn refused_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn compare_image(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(RecordedPart {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    stub.record(Recorded {
        method: Method::POST.to_string(),
        path: COMPARE_PATH.to_string(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        parts,
    });
    stub.respond(COMPARE_PATH)
}

async fn canned(State(stub): State<Arc<Stub>>, method: Method, uri: Uri) -> Response {
    stub.record(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        content_type: None,
        parts: Vec::new(),
    });
    stub.respond(uri.path())
}
