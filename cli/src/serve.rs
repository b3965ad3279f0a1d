//! Local preview: build for `http://localhost:<port>/`, rebuild on changes
//! and serve the output directory over HTTP.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use expander::{Meta, keys};
use tracing::{error, info, warn};

use crate::config::{self, ConfigError, Settings};
use crate::{build, watch};

pub const DEFAULT_PORT: u16 = 8081;

#[derive(Debug)]
pub enum ServeError {
    Config(ConfigError),
    Io(std::io::Error),
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServeError::Config(e) => write!(f, "{}", e),
            ServeError::Io(e) => write!(f, "cannot serve: {}", e),
        }
    }
}

impl std::error::Error for ServeError {}

impl From<ConfigError> for ServeError {
    fn from(e: ConfigError) -> Self {
        ServeError::Config(e)
    }
}

impl From<std::io::Error> for ServeError {
    fn from(e: std::io::Error) -> Self {
        ServeError::Io(e)
    }
}

pub fn local_url(port: u16) -> String {
    format!("http://localhost:{}/", port)
}

/// Config values that point the built site at the local server.
pub fn local_overrides(port: u16) -> Meta {
    Meta::from([(keys::SITE_URL.to_string(), local_url(port))])
}

/// Build, start rebuilding on changes, then serve until interrupted.
pub fn serve(source: &Path, no_color: bool, port: u16) -> Result<(), ServeError> {
    let output = Settings::from_config(&config::load(source)?).output;
    let overrides = local_overrides(port);
    build::run(source, no_color, &overrides);

    let watched = source.to_path_buf();
    thread::spawn(move || {
        let rebuild = || {
            build::run(&watched, no_color, &overrides);
        };
        if let Err(e) = watch::watch(&watched, rebuild) {
            error!(error = %e, "rebuilds stopped");
        }
    });

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server(output, port))
}

async fn run_server(output: PathBuf, port: u16) -> Result<(), ServeError> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    eprintln!("serving {} at {}", output.display(), local_url(port));
    eprintln!("press Ctrl+C to stop");

    axum::serve(listener, router(output))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            warn!(error = %e, "no Ctrl+C handler, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

/// Serve the files of `output`.
pub fn router(output: PathBuf) -> Router {
    Router::new()
        .fallback(content_handler)
        .with_state(Arc::new(output))
        .layer(middleware::from_fn(log_requests))
}

async fn content_handler(State(output): State<Arc<PathBuf>>, request: Request) -> Response {
    let Some(path) = resolve(&output, request.uri().path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, mime_from_extension(&path))], bytes).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn log_requests(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
    if status >= 400 {
        warn!("{} {} {:.1}ms", status, path, latency_ms);
    } else {
        info!("{} {} {:.1}ms", status, path, latency_ms);
    }
    response
}

/// The file under `output` a request path names. A directory means its
/// `index.html`. `None` for paths that would leave `output`.
pub fn resolve(output: &Path, uri_path: &str) -> Option<PathBuf> {
    let mut path = output.to_path_buf();
    for segment in uri_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            _ if segment.contains('\\') => return None,
            _ => path.push(segment),
        }
    }
    if path.is_dir() {
        path.push("index.html");
    }
    Some(path)
}

pub fn mime_from_extension(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
