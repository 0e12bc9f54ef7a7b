//! HTTP surface of the relay.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRequestParts, State, rejection::JsonRejection},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    response::{IntoResponse, Response},
    routing::get,
};
use maud::Markup;
use parley_config::{Config, SessionConfig};
use parley_conversation::{RelayRequest, RelayResponse, SessionId, Transcript};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::{
    error::{Error, Result},
    page,
    relay::Relay,
};

/// Shared state of all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub session: Arc<SessionConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(relay: Relay, session: SessionConfig) -> Self {
        Self {
            relay: Arc::new(relay),
            session: Arc::new(session),
        }
    }
}

/// Build the relay router.
pub fn router(state: AppState) -> Router {
    let body_limit = body_limit(state.relay.upload_config().max_bytes);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route(
            "/api/relay",
            get(get_relay).post(post_relay).delete(delete_relay),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the relay until a shutdown signal arrives.
///
/// In-flight requests complete before this returns.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::new(Relay::from_config(config), config.session.clone());

    let listener = TcpListener::bind(config.server.socket_addr()).await?;
    let address = listener.local_addr()?;
    info!(%address, "Parley is listening.");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Parley stopped.");
    Ok(())
}

/// Maximum request body size for files of up to `max_bytes`.
///
/// Leaves room for base64 expansion, line breaks in the payload and the
/// surrounding JSON.
fn body_limit(max_bytes: usize) -> usize {
    let encoded = max_bytes.div_ceil(3) * 4;
    encoded + encoded / 16 + 64 * 1024
}

/// The session a request belongs to.
///
/// Resolved from the session header, then the session cookie. Requests with
/// neither are assigned a new session, which is returned in a cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    issued: bool,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(value) = parts.headers.get(state.session.header_name.as_str()) {
            let value = value.to_str().unwrap_or_default().trim();
            return Ok(Self {
                id: value.parse()?,
                issued: false,
            });
        }

        let cookie = find_cookie(&parts.headers, &state.session.cookie_name)
            .and_then(|value| value.parse::<SessionId>().ok());

        Ok(match cookie {
            Some(id) => Self { id, issued: false },
            None => Self {
                id: SessionId::new(),
                issued: true,
            },
        })
    }
}

impl Session {
    /// Respond with `transcript`, setting the session cookie if it is new.
    fn respond(self, state: &AppState, transcript: Transcript) -> Response {
        let html = transcript
            .iter()
            .map(|turn| parley_format::to_html(&turn.text()))
            .collect();

        let cookie = self.issued.then(|| self.cookie(&state.session)).flatten();
        let body = Json(RelayResponse {
            result: transcript,
            html,
            session: self.id,
        });

        match cookie {
            Some(cookie) => ([(SET_COOKIE, cookie)], body).into_response(),
            None => body.into_response(),
        }
    }

    fn cookie(&self, config: &SessionConfig) -> Option<HeaderValue> {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            config.cookie_name, self.id
        );

        HeaderValue::from_str(&cookie)
            .inspect_err(|error| warn!(%error, "Invalid session cookie name."))
            .ok()
    }
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find_map(|(key, value)| (key == name).then_some(value.trim()))
}

async fn index(State(state): State<AppState>) -> Markup {
    page::render(state.relay.upload_config().max_bytes)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_relay(State(state): State<AppState>, session: Session) -> Response {
    let transcript = state.relay.transcript(&session.id).await;
    session.respond(&state, transcript)
}

async fn post_relay(
    State(state): State<AppState>,
    session: Result<Session>,
    body: std::result::Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Response> {
    state.relay.ensure_configured()?;
    let session = session?;

    let Json(request) = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::Validation("Request body is too large.".to_owned())
        } else {
            Error::Validation(rejection.body_text())
        }
    })?;

    let transcript = state.relay.exchange(&session.id, request).await?;
    Ok(session.respond(&state, transcript))
}

async fn delete_relay(State(state): State<AppState>, session: Session) -> StatusCode {
    state.relay.reset(&session.id);
    StatusCode::NO_CONTENT
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(%error, "Unable to listen for Ctrl-C.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                error!(%error, "Unable to listen for SIGTERM.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutting down.");
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_find_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; parley_session=abc"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(find_cookie(&headers, "parley_session"), Some("abc"));
        assert_eq!(find_cookie(&headers, "other"), Some("1"));
        assert_eq!(find_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_body_limit_fits_encoded_file() {
        let max_bytes = 10 * 1024 * 1024;
        assert!(body_limit(max_bytes) > max_bytes.div_ceil(3) * 4 + max_bytes / 57);
    }
}
