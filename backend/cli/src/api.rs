use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use docfill_core::{
    DocfillError, Document, FormSession, Generator, PlaceholderName, Proceed, Template,
};
use docfill_logging::{FormEvent, FormEventLogger};

/// Sessions untouched for this long are dropped.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

struct SessionEntry {
    form: FormSession,
    last_used: Instant,
}

impl SessionEntry {
    fn touch(&mut self) -> &mut FormSession {
        self.last_used = Instant::now();
        &mut self.form
    }
}

/// Shared application state for API handlers.
///
/// Each form session sits behind its own lock; the map lock is held only
/// long enough to find, insert or evict a session. Sessions idle for longer
/// than `idle_ttl` are evicted on the next create and by the sweeper task.
pub struct AppState {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<SessionEntry>>>>,
    pub generator: Generator,
    idle_ttl: Duration,
}

impl AppState {
    pub fn new(generator: Generator) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            generator,
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }

    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = ttl;
        self
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    async fn session(&self, id: &Uuid) -> Result<Arc<Mutex<SessionEntry>>, ApiError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(format!("no session {id}")))
    }

    /// Drop idle sessions and return how many were removed. Sessions whose
    /// lock is held by a request are in use and kept.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| match entry.try_lock() {
            Ok(entry) => entry.last_used.elapsed() < self.idle_ttl,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Evicted idle form sessions");
        }
        evicted
    }
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

fn not_found(message: String) -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
}

fn error_response(err: DocfillError) -> ApiError {
    let status = match &err {
        DocfillError::UnknownPlaceholder(_) => StatusCode::NOT_FOUND,
        DocfillError::InvalidName(_)
        | DocfillError::TypeMismatch { .. }
        | DocfillError::InvalidOption { .. }
        | DocfillError::ArtifactError(_)
        | DocfillError::InvalidDependency { .. }
        | DocfillError::DuplicateName(_) => StatusCode::BAD_REQUEST,
        DocfillError::ValidationFailed { .. } | DocfillError::EmptyFieldsUnconfirmed { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        DocfillError::TemplateMissing(_) => StatusCode::NOT_FOUND,
        DocfillError::EnrichmentServiceError(_) | DocfillError::Other(_) => {
            tracing::error!(error = %err, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let mut body = json!({ "error": err.to_string() });
    match &err {
        DocfillError::ValidationFailed { missing } => body["missing"] = json!(missing),
        DocfillError::EmptyFieldsUnconfirmed { fields } => body["empty_optional"] = json!(fields),
        _ => {}
    }
    (status, Json(body))
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/values/:name", put(set_value))
        .route("/api/sessions/:id/validate", post(validate_session))
        .route("/api/sessions/:id/generate", post(generate))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "docfill",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn session_view(id: &Uuid, session: &FormSession) -> Value {
    json!({
        "id": id,
        "fields": session.field_states(),
        "values": session.values(),
    })
}

/// Start a form session. The body is a template artifact.
async fn create_session(State(state): State<Arc<AppState>>, body: String) -> ApiResult {
    let template = Template::from_json(&body).map_err(error_response)?;
    let session = FormSession::new(Arc::new(template));
    let id = Uuid::new_v4();
    let view = session_view(&id, &session);

    state.evict_idle().await;
    let entry = SessionEntry {
        form: session,
        last_used: Instant::now(),
    };
    state
        .sessions
        .write()
        .await
        .insert(id, Arc::new(Mutex::new(entry)));
    tracing::info!(session = %id, "Form session created");
    Ok(Json(view))
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult {
    let entry = state.session(&id).await?;
    let mut entry = entry.lock().await;
    Ok(Json(session_view(&id, entry.touch())))
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult {
    match state.sessions.write().await.remove(&id) {
        Some(_) => Ok(Json(json!({ "status": "deleted", "id": id }))),
        None => Err(not_found(format!("no session {id}"))),
    }
}

/// Set one value; `null` clears it. Returns the updated field states since
/// visibility of dependents may change.
async fn set_value(
    State(state): State<Arc<AppState>>,
    Path((id, name)): Path<(Uuid, String)>,
    Json(value): Json<Value>,
) -> ApiResult {
    let name = PlaceholderName::parse(&name).map_err(error_response)?;
    let entry = state.session(&id).await?;
    let mut entry = entry.lock().await;
    let session = entry.touch();
    session.set_json(&name, &value).map_err(error_response)?;
    Ok(Json(session_view(&id, session)))
}

async fn validate_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult {
    let entry = state.session(&id).await?;
    let report = entry.lock().await.touch().validate();
    if !report.is_ok() {
        FormEventLogger::log_event(
            &id.to_string(),
            FormEvent::ValidationFailed {
                missing: report.missing.iter().map(|n| n.to_string()).collect(),
            },
        );
    }
    Ok(Json(json!({
        "ok": report.is_ok(),
        "missing": report.missing,
        "empty_optional": report.empty_optional,
    })))
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    /// Source document text.
    content: String,
    #[serde(default)]
    proceed: Proceed,
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult {
    let (template, values) = {
        let entry = state.session(&id).await?;
        let mut entry = entry.lock().await;
        let session = entry.touch();
        (Arc::clone(session.template()), session.snapshot())
    };

    let document = Document::new(request.content);
    let generated = state
        .generator
        .generate(&document, template.registry(), &values, request.proceed)
        .await
        .map_err(error_response)?;

    FormEventLogger::log_event(
        &id.to_string(),
        FormEvent::DocumentGenerated {
            policy: generated.policy_used.to_string(),
            length: generated.content.len(),
            warnings: generated.warnings.len(),
        },
    );
    Ok(Json(json!(generated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use docfill_core::{FieldConfig, FieldKind, GenerationPolicy, Registry};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn name(raw: &str) -> PlaceholderName {
        PlaceholderName::parse(raw).unwrap()
    }

    fn app() -> Router {
        build_router(Arc::new(AppState::new(Generator::new(GenerationPolicy::Literal))))
    }

    fn template_json() -> String {
        let mut registry = Registry::seed([
            name("full-name"),
            name("has-children"),
            name("children-names"),
        ]);
        registry
            .set_config(&name("full-name"), FieldConfig::new(FieldKind::Text).required(true))
            .unwrap();
        registry
            .set_config(&name("has-children"), FieldConfig::new(FieldKind::Checkbox))
            .unwrap();
        registry
            .set_config(
                &name("children-names"),
                FieldConfig::new(FieldKind::Text)
                    .required(true)
                    .depends_on([name("has-children")]),
            )
            .unwrap();
        registry.finalize().to_json().unwrap()
    }

    async fn send(app: &Router, method: &str, uri: &str, body: String) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/api/sessions", template_json()).await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = send(&app(), "GET", "/api/health", String::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn setting_parent_reveals_dependent() {
        let app = app();
        let id = create(&app).await;

        let (_, body) = send(&app, "GET", &format!("/api/sessions/{id}"), String::new()).await;
        assert_eq!(body["fields"][2]["visible"], false);

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/sessions/{id}/values/has-children"),
            "true".to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fields"][2]["name"], "children-names");
        assert_eq!(body["fields"][2]["visible"], true);
        assert_eq!(body["fields"][2]["effectively_required"], true);
    }

    #[tokio::test]
    async fn validate_reports_missing() {
        let app = app();
        let id = create(&app).await;
        send(
            &app,
            "PUT",
            &format!("/api/sessions/{id}/values/full-name"),
            "\"Jane Doe\"".to_string(),
        )
        .await;
        send(
            &app,
            "PUT",
            &format!("/api/sessions/{id}/values/has-children"),
            "true".to_string(),
        )
        .await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{id}/validate"),
            String::new(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], false);
        assert_eq!(body["missing"], json!(["children-names"]));
    }

    #[tokio::test]
    async fn type_mismatch_is_bad_request() {
        let app = app();
        let id = create(&app).await;
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/sessions/{id}/values/has-children"),
            "\"maybe\"".to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_blocks_then_succeeds() {
        let app = app();
        let id = create(&app).await;
        let request = json!({ "content": "Dear ${full-name}" }).to_string();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{id}/generate"),
            request.clone(),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["missing"], json!(["full-name"]));

        send(
            &app,
            "PUT",
            &format!("/api/sessions/{id}/values/full-name"),
            "\"Jane Doe\"".to_string(),
        )
        .await;
        let request = json!({ "content": "Dear ${full-name}", "proceed": "with_empty_fields" })
            .to_string();
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{id}/generate"),
            request,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "Dear Jane Doe");
        assert_eq!(body["policy_used"], "literal");
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (status, _) = send(
            &app(),
            "GET",
            &format!("/api/sessions/{}", Uuid::new_v4()),
            String::new(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_template_is_rejected() {
        let (status, _) = send(&app(), "POST", "/api/sessions", "{\"nope\": 1}".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let state = Arc::new(
            AppState::new(Generator::new(GenerationPolicy::Literal)).with_idle_ttl(Duration::ZERO),
        );
        let app = build_router(Arc::clone(&state));
        let id = create(&app).await;

        assert_eq!(state.evict_idle().await, 1);
        let (status, _) = send(&app, "GET", &format!("/api/sessions/{id}"), String::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn active_sessions_survive_eviction() {
        let state = Arc::new(AppState::new(Generator::new(GenerationPolicy::Literal)));
        let app = build_router(Arc::clone(&state));
        let id = create(&app).await;

        assert_eq!(state.evict_idle().await, 0);
        let (status, _) = send(&app, "GET", &format!("/api/sessions/{id}"), String::new()).await;
        assert_eq!(status, StatusCode::OK);
    }
}
