//! The streaming proxy server.
//!
//! One endpoint: `POST /api/chat` accepts a prompt with the prior
//! turns, forwards them to the provider as a single ordered
//! conversation, and relays the incremental answer back as an
//! unbuffered plain-text stream.

use std::env;
use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use barista_core::ChatClient;
use barista_core::transcript::Turn;
use barista_gemini_model::{GeminiConfigBuilder, GeminiProvider};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

/// The fixed persona instruction steering the chat partner.
pub const PERSONA: &str = include_str!("persona.md");

/// Server configuration, read once from the process environment and
/// passed in explicitly from there on.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// The Gemini API key. When absent the server still starts, but
    /// every chat request fails with a configuration error.
    pub api_key: Option<String>,
    /// Overrides the model identifier.
    pub model: Option<String>,
    /// Overrides the provider base URL.
    pub base_url: Option<String>,
    /// The socket address to listen on.
    pub addr: SocketAddr,
}

impl ServerConfig {
    /// Reads the configuration from the process environment:
    /// `GEMINI_API_KEY` is the provider credential, `BARISTA_MODEL`
    /// and `GEMINI_BASE_URL` override the provider defaults, and
    /// `BARISTA_ADDR` overrides the listen address.
    pub fn from_env() -> Self {
        let addr = env::var("BARISTA_ADDR")
            .ok()
            .and_then(|addr| addr.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));
        Self {
            api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            model: env::var("BARISTA_MODEL").ok(),
            base_url: env::var("GEMINI_BASE_URL").ok(),
            addr,
        }
    }
}

/// Shared state for the request handlers.
#[derive(Clone)]
pub struct AppState {
    chat: Option<ChatClient>,
}

impl AppState {
    /// Builds the state from a configuration, wiring the Gemini
    /// provider when a key is present.
    pub fn from_config(config: &ServerConfig) -> Self {
        let chat = config.api_key.as_ref().map(|api_key| {
            let mut builder =
                GeminiConfigBuilder::with_api_key(api_key.clone());
            if let Some(model) = &config.model {
                builder = builder.with_model(model.clone());
            }
            if let Some(base_url) = &config.base_url {
                builder = builder.with_base_url(base_url.clone());
            }
            ChatClient::new(GeminiProvider::new(builder.build()))
                .with_persona(PERSONA)
        });
        Self { chat }
    }

    /// Builds the state around an existing chat client.
    pub fn with_client(chat: ChatClient) -> Self {
        Self { chat: Some(chat) }
    }

    /// Builds a state with no provider configured.
    pub fn unconfigured() -> Self {
        Self { chat: None }
    }
}

/// The request payload of the chat endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The new user prompt.
    #[serde(default)]
    pub prompt: String,
    /// The prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<Turn>,
}

/// The structured error payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A human-readable failure description.
    pub error: String,
}

/// Builds the HTTP router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(send_prompt))
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "barista is brewing",
    })
}

fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn send_prompt(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Response {
    if req.prompt.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Prompt is required");
    }
    let Some(chat) = &state.chat else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "API key is not configured",
        );
    };

    let answer = match chat.send(&req.prompt, &req.history).await {
        Ok(answer) => answer,
        Err(err) => {
            error!("provider call failed: {err}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
            );
        }
    };

    // Each fragment is forwarded as soon as it arrives; a mid-stream
    // provider failure terminates the body in an error state.
    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(answer))
        .unwrap_or_else(|_| {
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response")
                .into_response()
        })
}
