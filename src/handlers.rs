use crate::types::{Node, LATENCY_FLOOR_MS};
use hyper::server::conn::Http;
use hyper::service::service_fn;
use hyper::{Body, Method, Request, Response, StatusCode};
use rand::Rng;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tracing::{error, info};

/// The static base set behind the mock endpoint. Everything except latency is
/// fixed for the life of the process.
pub fn base_nodes() -> Vec<Node> {
    vec![
        Node {
            id: "us-1".to_string(),
            name: "Eagle Server".to_string(),
            country: "United States".to_string(),
            latency_ms: 54,
            ip_address: "104.26.10.188".to_string(),
        },
        Node {
            id: "ca-1".to_string(),
            name: "Maple Leaf".to_string(),
            country: "Canada".to_string(),
            latency_ms: 72,
            ip_address: "142.126.146.1".to_string(),
        },
        Node {
            id: "jp-1".to_string(),
            name: "Tokyo Drift".to_string(),
            country: "Japan".to_string(),
            latency_ms: 120,
            ip_address: "103.102.160.10".to_string(),
        },
        Node {
            id: "uk-1".to_string(),
            name: "London Bridge".to_string(),
            country: "United Kingdom".to_string(),
            latency_ms: 35,
            ip_address: "195.245.231.14".to_string(),
        },
    ]
}

/// Base nodes with per-call latency jitter, clamped to the display floor.
fn jittered_nodes() -> Vec<Node> {
    let mut rng = rand::thread_rng();
    base_nodes()
        .into_iter()
        .map(|mut node| {
            let fluctuation: i32 = rng.gen_range(-5..=5);
            let latency = node.latency_ms as i32 + fluctuation;
            node.latency_ms = latency.max(LATENCY_FLOOR_MS as i32) as u32;
            node
        })
        .collect()
}

pub async fn route_request(req: Request<Body>) -> Result<Response<Body>, hyper::Error> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/api/v1/nodes") => {
            let json = serde_json::to_string(&jittered_nodes()).unwrap();
            Ok(Response::builder()
                .header("Content-Type", "application/json")
                .body(Body::from(json))
                .unwrap())
        }

        (&Method::GET, "/health") => {
            // Compile-time version and build hash, set with env! or option_env!
            let version = env!("CARGO_PKG_VERSION");
            let build = option_env!("GIT_COMMIT_HASH").unwrap_or("unknown");
            let json = format!(r#"{{ "version": "{}", "build": "{}" }}"#, version, build);
            Ok(Response::builder()
                .header("Content-Type", "application/json")
                .body(Body::from(json))
                .unwrap())
        }

        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("{\"error\": \"not found\"}"))
            .unwrap()),
    }
}

async fn handle_connection(stream: TcpStream) {
    let service = service_fn(route_request);
    if let Err(e) = Http::new().serve_connection(stream, service).await {
        error!("Connection error: {}", e);
    }
}

/// Accept loop for the mock node API, with graceful shutdown.
pub async fn serve(listener: TcpListener, shutdown_notify: Arc<Notify>) {
    if let Ok(addr) = listener.local_addr() {
        info!("Node API listening on http://{}", addr);
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    tokio::task::spawn(handle_connection(stream));
                }
                Err(e) => error!("Accept error: {}", e),
            },
            _ = shutdown_notify.notified() => {
                info!("Node API shutting down");
                break;
            }
        }
    }
}
