//! JSON HTTP API.
//!
//! Every `/api` route acts on behalf of the caller named by the identity
//! header (see [`IdentityResolver`]). Requests without it act on the
//! anonymous, shared collection.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/contacts` | List contacts (`industry`, `location`, `limit`) |
//! | `POST` | `/api/contacts` | Create a contact |
//! | `GET`  | `/api/contacts/{id}` | Fetch one contact |
//! | `PATCH`/`PUT` | `/api/contacts/{id}` | Partial update |
//! | `DELETE` | `/api/contacts/{id}` | Delete a contact |
//! | `POST` | `/api/contacts/migrate` | Merge the legacy shared collection |
//! | `POST` | `/api/search` | Weighted search |
//! | `POST` | `/api/voice-search` | Short search result list with summary |
//! | `GET`  | `/api/tags` | Autocomplete tags |
//! | `POST` | `/api/tags` | Add a custom tag |
//! | `DELETE` | `/api/tags/{tag}` | Remove a custom tag |
//! | `GET`/`PUT` | `/api/preferences` | Read or update preferences |
//! | `GET`  | `/api/industries` | Industry catalog |
//!
//! # Response Envelopes
//!
//! Collections are wrapped in an object named after them
//! (`{"contacts": [...]}`, `{"tags": [...]}`, `{"industries": [...]}`).
//! Writes answer `{"success": true, ...}` with the written record alongside.
//! Preferences are returned as the bare document.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "contact not found: 42" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `conflict` (409),
//! `storage_unavailable` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted for browser clients.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use reachr_core::catalog::Industry;
use reachr_core::migrate::MigrationReport;
use reachr_core::{
    Contact, ContactFilter, ContactPatch, Error, NewContact, PreferencesUpdate, TagEntry, UserId,
    UserPreferences,
};

use crate::app::{App, QuickSearchResponse, SearchResponse};
use crate::config::Config;
use crate::identity::{IdentityResolver, TrustedHeaderResolver};

/// Shared state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    app: App,
    identity: Arc<dyn IdentityResolver>,
}

/// Opens the configured backend and serves on `[server].bind` until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let app = App::open(config).await?;
    let identity = Arc::new(TrustedHeaderResolver::new(&config.server.user_header));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %listener.local_addr()?, "reachr server listening");
    println!("Reachr server listening on http://{}", config.server.bind);

    axum::serve(listener, router(app, identity)).await?;
    Ok(())
}

/// Build the router. Exposed so tests can serve it on an ephemeral port.
pub fn router(app: App, identity: Arc<dyn IdentityResolver>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/api/contacts",
            get(handle_list_contacts).post(handle_create_contact),
        )
        .route("/api/contacts/migrate", post(handle_migrate))
        .route(
            "/api/contacts/{id}",
            get(handle_get_contact)
                .patch(handle_update_contact)
                .put(handle_update_contact)
                .delete(handle_delete_contact),
        )
        .route("/api/search", post(handle_search))
        .route("/api/voice-search", post(handle_quick_search))
        .route("/api/tags", get(handle_get_tags).post(handle_add_tag))
        .route("/api/tags/{tag}", delete(handle_remove_tag))
        .route(
            "/api/preferences",
            get(handle_get_preferences).put(handle_set_preferences),
        )
        .route("/api/industries", get(handle_industries))
        .layer(cors)
        .with_state(AppState { app, identity })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::StorageUnavailable(_) => {
                error!(error = %err, "request failed on storage");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

type ApiResult<T> = Result<Json<T>, AppError>;

/// Resolve the caller from the configured identity header.
fn caller(state: &AppState, headers: &HeaderMap) -> Result<UserId, AppError> {
    let credential = headers
        .get(state.identity.header())
        .map(|v| {
            v.to_str()
                .map_err(|_| Error::InvalidInput("identity header is not valid text".into()))
        })
        .transpose()?;
    Ok(state.identity.resolve(credential)?)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Contacts ============

#[derive(Serialize)]
struct ContactsResponse {
    contacts: Vec<Contact>,
}

#[derive(Serialize)]
struct ContactResponse {
    contact: Contact,
}

#[derive(Serialize)]
struct ContactWritten {
    success: bool,
    contact: Contact,
}

#[derive(Serialize)]
struct ContactDeleted {
    success: bool,
    message: &'static str,
}

#[derive(Serialize)]
struct MigrateResponse {
    success: bool,
    #[serde(flatten)]
    report: MigrationReport,
}

async fn handle_list_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<ContactFilter>,
) -> ApiResult<ContactsResponse> {
    let user = caller(&state, &headers)?;
    let contacts = state.app.list_contacts(&user, &filter).await?;
    Ok(Json(ContactsResponse { contacts }))
}

async fn handle_create_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<NewContact>,
) -> Result<(StatusCode, Json<ContactWritten>), AppError> {
    let user = caller(&state, &headers)?;
    let contact = state.app.create_contact(&user, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(ContactWritten {
            success: true,
            contact,
        }),
    ))
}

async fn handle_get_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<ContactResponse> {
    let user = caller(&state, &headers)?;
    let contact = state.app.get_contact(&user, &id).await?;
    Ok(Json(ContactResponse { contact }))
}

async fn handle_update_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<ContactPatch>,
) -> ApiResult<ContactWritten> {
    let user = caller(&state, &headers)?;
    let contact = state.app.update_contact(&user, &id, patch).await?;
    Ok(Json(ContactWritten {
        success: true,
        contact,
    }))
}

async fn handle_delete_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<ContactDeleted> {
    let user = caller(&state, &headers)?;
    state.app.delete_contact(&user, &id).await?;
    Ok(Json(ContactDeleted {
        success: true,
        message: "Contact deleted",
    }))
}

async fn handle_migrate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<MigrateResponse> {
    let user = caller(&state, &headers)?;
    let report = state.app.migrate_contacts(&user).await?;
    Ok(Json(MigrateResponse {
        success: true,
        report,
    }))
}

// ============ Search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

async fn handle_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SearchRequest>,
) -> ApiResult<SearchResponse> {
    let user = caller(&state, &headers)?;
    Ok(Json(state.app.search(&user, &req.query).await?))
}

async fn handle_quick_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SearchRequest>,
) -> ApiResult<QuickSearchResponse> {
    let user = caller(&state, &headers)?;
    Ok(Json(state.app.quick_search(&user, &req.query).await?))
}

// ============ Tags & preferences ============

#[derive(Deserialize)]
struct AddTagRequest {
    tag: String,
}

#[derive(Serialize)]
struct TagsResponse {
    tags: Vec<TagEntry>,
}

#[derive(Serialize)]
struct PreferencesWritten {
    success: bool,
    preferences: UserPreferences,
}

#[derive(Serialize)]
struct IndustriesResponse {
    industries: &'static [Industry],
}

async fn handle_get_tags(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<TagsResponse> {
    let user = caller(&state, &headers)?;
    let tags = state.app.get_tags(&user).await?;
    Ok(Json(TagsResponse { tags }))
}

async fn handle_add_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AddTagRequest>,
) -> ApiResult<PreferencesWritten> {
    let user = caller(&state, &headers)?;
    let preferences = state.app.add_tag(&user, &req.tag).await?;
    Ok(Json(PreferencesWritten {
        success: true,
        preferences,
    }))
}

async fn handle_remove_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tag): Path<String>,
) -> ApiResult<PreferencesWritten> {
    let user = caller(&state, &headers)?;
    let preferences = state.app.remove_tag(&user, &tag).await?;
    Ok(Json(PreferencesWritten {
        success: true,
        preferences,
    }))
}

async fn handle_get_preferences(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<UserPreferences> {
    let user = caller(&state, &headers)?;
    Ok(Json(state.app.get_preferences(&user).await?))
}

async fn handle_set_preferences(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<PreferencesUpdate>,
) -> ApiResult<UserPreferences> {
    let user = caller(&state, &headers)?;
    Ok(Json(state.app.set_preferences(&user, update).await?))
}

async fn handle_industries(State(state): State<AppState>) -> Json<IndustriesResponse> {
    Json(IndustriesResponse {
        industries: state.app.list_industries(),
    })
}
