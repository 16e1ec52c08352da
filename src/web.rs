//! The upload form: an axum router around one shared [`Advisor`].
//!
//! ## Routes
//!
//! | Method | Path | Behaviour |
//! |--------|------|-----------|
//! | GET  | `/`        | empty upload form |
//! | POST | `/advise`  | multipart `progress` + `schedule` → advice page |
//! | GET  | `/healthz` | `ok`, never gated |
//!
//! Every advisor state renders as a 200 page: a missing file, a rejected
//! request or a dead upstream are all things the user reads on the form, not
//! server faults. Only an unparsable multipart body answers 400.
//!
//! When credentials are configured, `/` and `/advise` require HTTP Basic
//! authentication. The advisor is reached only after verification succeeds.

use crate::advise::{Advisor, AdvisorState};
use crate::auth::{CredentialGate, Credentials};
use crate::error::{AdviseError, IntakeError};
use crate::pipeline::intake::{DocumentSlot, UploadedDocument};
use crate::pipeline::render::{HtmlRenderer, Render};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Default upload limit for the whole multipart body (both PDFs).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Server settings that only the web form needs.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
    pub gate: CredentialGate,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            gate: CredentialGate::open(),
        }
    }
}

impl WebConfig {
    /// Load from `ADVISEME_BIND`, `ADVISEME_MAX_UPLOAD_BYTES`,
    /// `ADVISEME_USERNAME` and `ADVISEME_PASSWORD_HASH`.
    pub fn from_env() -> Result<Self, AdviseError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AdviseError> {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(bind) = get("ADVISEME_BIND") {
            config.bind = bind
                .trim()
                .parse()
                .map_err(|e| AdviseError::InvalidConfig(format!("ADVISEME_BIND '{bind}': {e}")))?;
        }
        if let Some(max) = get("ADVISEME_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = max.trim().parse().map_err(|e| {
                AdviseError::InvalidConfig(format!("ADVISEME_MAX_UPLOAD_BYTES '{max}': {e}"))
            })?;
        }
        config.gate = match (get("ADVISEME_USERNAME"), get("ADVISEME_PASSWORD_HASH")) {
            (Some(user), Some(hash)) => CredentialGate::with_credentials(Credentials::new(user, hash)?),
            (None, None) => CredentialGate::open(),
            _ => {
                return Err(AdviseError::InvalidConfig(
                    "set both ADVISEME_USERNAME and ADVISEME_PASSWORD_HASH, or neither".into(),
                ))
            }
        };

        Ok(config)
    }
}

/// Shared handler state. Everything inside is immutable.
#[derive(Clone)]
pub struct AppState {
    advisor: Arc<Advisor>,
    renderer: Arc<HtmlRenderer>,
    gate: Arc<CredentialGate>,
}

/// Errors that escape a handler.
#[derive(Debug)]
pub enum WebError {
    BadRequest(String),
    Render(minijinja::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            WebError::Render(e) => {
                warn!("Template rendering failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
            }
        }
    }
}

impl From<minijinja::Error> for WebError {
    fn from(e: minijinja::Error) -> Self {
        WebError::Render(e)
    }
}

/// Build the router.
pub fn router(advisor: Arc<Advisor>, config: &WebConfig) -> Result<Router, AdviseError> {
    let renderer = HtmlRenderer::new().map_err(|e| AdviseError::Internal(format!("template: {e}")))?;
    let state = AppState {
        advisor,
        renderer: Arc::new(renderer),
        gate: Arc::new(config.gate.clone()),
    };

    let gated = Router::new()
        .route("/", get(index))
        .route("/advise", get(index).post(advise))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_credentials));

    Ok(gated
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(advisor: Arc<Advisor>, config: WebConfig) -> Result<(), AdviseError> {
    let app = router(advisor, &config)?;
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| AdviseError::Internal(format!("failed to bind {}: {e}", config.bind)))?;

    info!(
        gated = !config.gate.is_open(),
        max_upload_bytes = config.max_upload_bytes,
        "AdviseMe listening on http://{}",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AdviseError::Internal(format!("server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    Ok(Html(state.renderer.render(&AdvisorState::ready())?))
}

async fn advise(State(state): State<AppState>, multipart: Multipart) -> Result<Html<String>, WebError> {
    let [progress, schedule] = read_submission(multipart).await?;

    let outcome = match (progress, schedule) {
        (Some(Ok(p)), Some(Ok(s))) => state.advisor.advise(Some(&p), Some(&s)).await,
        (None, _) | (_, None) => AdvisorState::missing_input(),
        (Some(Err(e)), _) | (_, Some(Err(e))) => AdvisorState::rejected(&e),
    };

    Ok(Html(state.renderer.render(&outcome)?))
}

type SlotIntake = Option<Result<UploadedDocument, IntakeError>>;

/// Read both file fields into immutable documents.
///
/// Empty file inputs (browsers send a zero-length part) count as absent.
/// Unknown fields are ignored.
async fn read_submission(mut multipart: Multipart) -> Result<[SlotIntake; 2], WebError> {
    let mut slots: [SlotIntake; 2] = [None, None];

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(format!("Failed to parse multipart data: {e}")))?
    {
        let Some(slot) = field.name().and_then(DocumentSlot::from_field_name) else {
            debug!(field = ?field.name(), "Ignoring unknown form field");
            continue;
        };
        let display_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.pdf", slot.field_name()));

        let content = field
            .bytes()
            .await
            .map_err(|e| WebError::BadRequest(format!("Failed to read '{display_name}': {e}")))?;

        let idx = match slot {
            DocumentSlot::Progress => 0,
            DocumentSlot::Schedule => 1,
        };
        slots[idx] = match UploadedDocument::from_bytes(slot, display_name, content) {
            Err(IntakeError::Missing { .. }) => None,
            other => Some(other),
        };
    }

    Ok(slots)
}

async fn require_credentials(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.gate.is_open() {
        return next.run(request).await;
    }

    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Argon2 verification is CPU-bound.
    let gate = Arc::clone(&state.gate);
    let allowed = tokio::task::spawn_blocking(move || gate.allows(authorization.as_deref()))
        .await
        .unwrap_or(false);

    if allowed {
        next.run(request).await
    } else {
        debug!(path = %request.uri().path(), "Rejected unauthenticated request");
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"AdviseMe\"")],
            "Authentication required",
        )
            .into_response()
    }
}
