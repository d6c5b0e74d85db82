use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Json, Path, Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, CONTENT_TYPE, ORIGIN,
            VARY,
        },
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, VoiceRemindersError};
use crate::reminders::{normalize_remind_time, now_created_at, Reminder, ReminderStore};
use crate::replies::{make_reply, ReplyAction, EMERGENCY_MESSAGE};
use crate::speech::{Language, SpeechSynthesizer};

const ALLOWED_METHODS: &str = "DELETE, GET, HEAD, OPTIONS, PATCH, POST, PUT";
const PREFLIGHT_MAX_AGE_SECS: &str = "600";

#[derive(Clone)]
pub struct AppState {
    pub reminder_store: Arc<ReminderStore>,
    pub speech: Arc<SpeechSynthesizer>,
    pub cors_origins: Arc<Vec<String>>,
}

impl AppState {
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let reminder_store = ReminderStore::new(&config.storage.sqlite_path).await?;
        let speech = SpeechSynthesizer::from_config(&config.speech)?;
        Ok(Self {
            reminder_store: Arc::new(reminder_store),
            speech: Arc::new(speech),
            cors_origins: Arc::new(config.server.cors_origins.clone()),
        })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    detail: String,
}

#[derive(Deserialize)]
struct SetReminderRequest {
    text: String,
    #[serde(default)]
    remind_time: Option<String>,
    #[serde(default)]
    lang: Option<String>,
}

#[derive(Serialize)]
struct SetReminderResponse {
    status: String,
    reminder: Reminder,
    reply: String,
    audio_url: String,
}

#[derive(Serialize)]
struct ListRemindersResponse {
    status: String,
    reminders: Vec<Reminder>,
}

#[derive(Serialize)]
struct DeleteReminderResponse {
    status: String,
    deleted: i64,
}

#[derive(Deserialize)]
struct TtsRequest {
    text: String,
    #[serde(default)]
    lang: Option<String>,
}

#[derive(Serialize)]
struct TtsResponse {
    status: String,
    audio_url: String,
}

#[derive(Serialize)]
struct EmergencyResponse {
    status: String,
    simulated: bool,
    message: String,
    reply: String,
    audio_url: String,
}

pub fn build_router(state: AppState) -> Router {
    let audio_route = format!("{}/{{filename}}", state.speech.url_prefix());
    Router::new()
        .route("/health", get(health))
        .route("/set_reminder", post(set_reminder))
        .route("/reminders", get(list_reminders))
        .route("/reminders/{id}", delete(delete_reminder))
        .route("/tts", post(tts))
        .route(&audio_route, get(serve_audio))
        .route("/emergency", post(emergency))
        .layer(middleware::from_fn_with_state(state.clone(), cors))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn set_reminder(
    State(state): State<AppState>,
    Json(payload): Json<SetReminderRequest>,
) -> impl IntoResponse {
    match create_reminder(&state, payload).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            tracing::error!("set_reminder failed: {}", err);
            error_response(err)
        }
    }
}

async fn create_reminder(
    state: &AppState,
    payload: SetReminderRequest,
) -> Result<SetReminderResponse> {
    let created_at = now_created_at();
    let remind_time = normalize_remind_time(payload.remind_time);

    let id = state
        .reminder_store
        .insert(&payload.text, &created_at, remind_time.as_deref())
        .await?;
    tracing::info!(reminder_id = id, "Stored reminder");

    let reply = make_reply(ReplyAction::SetReminder, Some(&payload.text));
    // The row stays even if speaking the confirmation fails below.
    let lang = state.speech.resolve_language(payload.lang.as_deref())?;
    let audio_url = state.speech.synthesize(&reply, &lang).await?;

    Ok(SetReminderResponse {
        status: "ok".to_string(),
        reminder: Reminder {
            id,
            text: payload.text,
            created_at,
            remind_time,
        },
        reply,
        audio_url,
    })
}

async fn list_reminders(State(state): State<AppState>) -> impl IntoResponse {
    match state.reminder_store.list_all().await {
        Ok(reminders) => (
            StatusCode::OK,
            Json(ListRemindersResponse {
                status: "ok".to_string(),
                reminders,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("list_reminders failed: {}", err);
            error_response(err)
        }
    }
}

async fn delete_reminder(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    status: "error".to_string(),
                    detail: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };
    match state.reminder_store.delete(id).await {
        Ok(removed) => {
            tracing::info!(reminder_id = id, removed, "delete_reminder");
            (
                StatusCode::OK,
                Json(DeleteReminderResponse {
                    status: "ok".to_string(),
                    deleted: id,
                }),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!("delete_reminder failed for id={}: {}", id, err);
            error_response(err)
        }
    }
}

async fn tts(State(state): State<AppState>, Json(payload): Json<TtsRequest>) -> impl IntoResponse {
    let result = match state.speech.resolve_language(payload.lang.as_deref()) {
        Ok(lang) => state.speech.synthesize(&payload.text, &lang).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(audio_url) => (
            StatusCode::OK,
            Json(TtsResponse {
                status: "ok".to_string(),
                audio_url,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("tts failed: {}", err);
            error_response(err)
        }
    }
}

async fn emergency(State(state): State<AppState>) -> impl IntoResponse {
    let reply = make_reply(ReplyAction::Emergency, None);
    tracing::warn!("Emergency triggered (simulated)");

    match state.speech.synthesize(&reply, &Language::Hindi).await {
        Ok(audio_url) => (
            StatusCode::OK,
            Json(EmergencyResponse {
                status: "ok".to_string(),
                simulated: true,
                message: EMERGENCY_MESSAGE.to_string(),
                reply,
                audio_url,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("emergency failed: {}", err);
            error_response(err)
        }
    }
}

async fn serve_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    match state.speech.read_audio(&filename).await {
        Ok(audio) => ([(CONTENT_TYPE, "audio/mpeg")], audio).into_response(),
        Err(err) => {
            if !err.is_not_found() {
                tracing::error!("serve_audio failed for {}: {}", filename, err);
            }
            error_response(err)
        }
    }
}

fn status_for(err: &VoiceRemindersError) -> StatusCode {
    match err {
        VoiceRemindersError::NotFound(_) => StatusCode::NOT_FOUND,
        VoiceRemindersError::StoreUnavailable(_)
        | VoiceRemindersError::SynthesisFailed(_)
        | VoiceRemindersError::Config(_)
        | VoiceRemindersError::Runtime(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: VoiceRemindersError) -> Response {
    (
        status_for(&err),
        Json(ErrorResponse {
            status: "error".to_string(),
            detail: err.to_string(),
        }),
    )
        .into_response()
}

async fn cors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let allowed_origin = request
        .headers()
        .get(ORIGIN)
        .filter(|origin| {
            origin
                .to_str()
                .map(|value| state.cors_origins.iter().any(|allowed| allowed == value))
                .unwrap_or(false)
        })
        .cloned();

    let is_preflight = request.method() == Method::OPTIONS
        && request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD);
    if is_preflight {
        let mut response = StatusCode::NO_CONTENT.into_response();
        vary_on_origin(response.headers_mut());
        if let Some(origin) = allowed_origin {
            let headers = response.headers_mut();
            apply_cors_headers(headers, origin);
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            // Credentials rule out `*`, so requested headers are echoed back.
            if let Some(requested) = request.headers().get(ACCESS_CONTROL_REQUEST_HEADERS) {
                headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
            }
            headers.insert(
                ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from_static(PREFLIGHT_MAX_AGE_SECS),
            );
        }
        return response;
    }

    let mut response = next.run(request).await;
    vary_on_origin(response.headers_mut());
    if let Some(origin) = allowed_origin {
        apply_cors_headers(response.headers_mut(), origin);
    }
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
}

/// Every response varies on `Origin`, whether or not the origin is allowed.
fn vary_on_origin(headers: &mut HeaderMap) {
    headers.append(VARY, HeaderValue::from_static("Origin"));
}

pub async fn run(config: Config) -> Result<()> {
    run_with_shutdown(config, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Unable to listen for shutdown signal: {}", err);
        }
    })
    .await
}

pub async fn run_with_shutdown<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::from_config(&config).await?;
    tracing::info!(
        db = %config.storage.sqlite_path,
        audio_dir = %config.speech.audio_dir,
        tts_base_url = %config.speech.base_url,
        default_lang = %config.speech.default_lang,
        "Voice reminders daemon configured"
    );
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VoiceRemindersError::Runtime(format!("failed to bind {addr}: {e}")))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| VoiceRemindersError::Runtime(e.to_string()))?;

    tracing::info!("Voice reminders daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_explicit_status_codes() {
        assert_eq!(
            status_for(&VoiceRemindersError::NotFound("a.mp3".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&VoiceRemindersError::StoreUnavailable("locked".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&VoiceRemindersError::SynthesisFailed("bad lang".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
