#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use serde_json::{Value, json};

use pedia_attendance::config::Config;
use pedia_attendance::session::{Role, Session, SessionStore};
use pedia_attendance::shell::AppShell;

#[derive(Debug, Clone)]
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
    pub status: u16,
    pub body: Value,
}

impl Route {
    pub fn new(method: &'static str, path: &'static str, status: u16, body: Value) -> Self {
        Self {
            method,
            path,
            status,
            body,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// In-process stand-in for the attendance API.
pub struct MockApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockApi {
    pub async fn start(routes: Vec<Route>) -> Self {
        let routes = Arc::new(routes);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        let make_svc = make_service_fn(move |_conn| {
            let routes = routes.clone();
            let requests = recorded.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                    let routes = routes.clone();
                    let requests = requests.clone();
                    async move { Ok::<_, Infallible>(respond(req, &routes, &requests).await) }
                }))
            }
        });

        let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
        let addr = server.local_addr();
        tokio::spawn(async move {
            let _ = server.await;
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn respond(req: Request<Body>, routes: &[Route], requests: &Mutex<Vec<Recorded>>) -> Response<Body> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = hyper::body::to_bytes(req.into_body()).await.unwrap_or_default();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        authorization,
        body,
    });

    let (status, body) = match routes.iter().find(|r| r.method == method && r.path == path) {
        Some(route) => (route.status, route.body.clone()),
        None => (404, json!({"detail": "Not Found"})),
    };
    Response::builder()
        .status(StatusCode::from_u16(status).unwrap())
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Base URL where nothing is listening.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn config_for(base_url: &str, dir: &Path) -> Config {
    Config {
        api_base_url: base_url.to_string(),
        session_path: dir.join("session.json"),
        log_dir: dir.join("logs"),
        ..Config::default()
    }
}

pub fn shell_with_session(config: Config, role: Role, token: &str) -> AppShell {
    SessionStore::new(&config.session_path, None)
        .save(&Session {
            token: token.to_string(),
            role,
        })
        .unwrap();
    AppShell::new(config).unwrap()
}

pub fn write_snapshot(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("snapshot.png");
    image::RgbImage::from_pixel(32, 24, image::Rgb([90, 160, 220]))
        .save(&path)
        .unwrap();
    path
}
