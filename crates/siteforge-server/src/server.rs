//! Static file server with live-reload injection.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

use crate::reload::{client_script, ReloadHub, ReloadMessage, RELOAD_PATH, SCRIPT_PATH};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Directory to serve
    pub root: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dist"),
            port: 3000,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address '{0}'")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("Server error: {0}")]
    ServeError(String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
    hub: ReloadHub,
}

impl DevServer {
    /// Serve `config.root`, pushing messages from `hub` to browsers.
    pub fn new(config: DevServerConfig, hub: ReloadHub) -> Self {
        Self { config, hub }
    }

    pub fn address(&self) -> Result<SocketAddr, ServerError> {
        let raw = format!("{}:{}", self.config.host, self.config.port);
        raw.parse().map_err(|_| ServerError::InvalidAddress(raw))
    }

    /// Start the server. Runs until the process is interrupted.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr = self.address()?;
        let app = router(self.config.root.clone(), self.hub.clone());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        let url = format!("http://{}", addr);
        tracing::info!("Serving {} at {}", self.config.root.display(), url);

        if self.config.open {
            if let Err(e) = open::that(&url) {
                tracing::warn!("Could not open a browser: {}", e);
            }
        }

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))
    }
}

/// Routes for the reload endpoints, with everything else served from
/// `root`. HTML responses get the reload script injected.
pub fn router(root: PathBuf, hub: ReloadHub) -> Router {
    Router::new()
        .route(RELOAD_PATH, get(ws_handler))
        .route(SCRIPT_PATH, get(script_handler))
        .fallback_service(ServeDir::new(root))
        .layer(map_response(inject_reload))
        .with_state(hub)
}

/// Insert the reload script tag before `</body>`, or append it when the
/// page has no closing body tag.
pub fn inject_script(html: &str) -> String {
    let tag = format!("<script src=\"{}\"></script>", SCRIPT_PATH);
    match html.rfind("</body>") {
        Some(at) => format!("{}{}{}", &html[..at], tag, &html[at..]),
        None => format!("{}{}", html, tag),
    }
}

async fn inject_reload(response: Response) -> Response {
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if !is_html || response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read HTML response: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, hub))
}

async fn handle_ws(mut socket: WebSocket, hub: ReloadHub) {
    let mut rx = hub.subscribe();

    if send(&mut socket, &ReloadMessage::Connected).await.is_err() {
        return;
    }

    while let Ok(msg) = rx.recv().await {
        if send(&mut socket, &msg).await.is_err() {
            break;
        }
    }
}

async fn send(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

async fn script_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], client_script())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn injects_before_closing_body() {
        assert_eq!(
            inject_script("<html><body><p>hi</p></body></html>"),
            "<html><body><p>hi</p><script src=\"/__reload.js\"></script></body></html>"
        );
    }

    #[test]
    fn appends_without_body_tag() {
        assert_eq!(
            inject_script("<p>fragment</p>"),
            "<p>fragment</p><script src=\"/__reload.js\"></script>"
        );
    }

    #[test]
    fn rejects_bad_address() {
        let server = DevServer::new(
            DevServerConfig {
                host: "not a host".to_string(),
                ..DevServerConfig::default()
            },
            ReloadHub::new(),
        );
        assert!(matches!(
            server.address(),
            Err(ServerError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn injects_into_html_responses_only() {
        let html = Response::builder()
            .header(header::CONTENT_TYPE, "text/html")
            .header(header::CONTENT_LENGTH, "26")
            .body(Body::from("<body><p>page</p></body>"))
            .unwrap();
        let injected = inject_reload(html).await;
        assert!(injected.headers().get(header::CONTENT_LENGTH).is_none());
        let body = axum::body::to_bytes(injected.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("/__reload.js"));

        let css = Response::builder()
            .header(header::CONTENT_TYPE, "text/css")
            .body(Body::from("body{}"))
            .unwrap();
        let untouched = inject_reload(css).await;
        let body = axum::body::to_bytes(untouched.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"body{}");
    }
}
