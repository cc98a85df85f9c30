use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use server_api::{
    contact_action, delete_contact, get_contact, list_contacts, update_contact, ActionOutcome,
    ApiContext,
};
use shared::{
    domain::{Contact, ContactId},
    error::{ApiError, ErrorCode},
    protocol::{ContactActionForm, ContactSummary, ContactUpdate},
};
use storage::Storage;
use tracing::{error, info};

mod config;

use config::load_settings;

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let storage = Storage::new(&settings.database_url).await.map_err(|err| {
        error!(
            database_url = %settings.database_url,
            error = %err,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        err
    })?;
    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "contact server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/contacts",
            get(http_list_contacts).post(http_contact_action),
        )
        .route(
            "/contacts/:contact_id",
            get(http_get_contact).post(http_update_contact),
        )
        .route("/contacts/:contact_id/destroy", post(http_destroy_contact))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_contacts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ContactSummary>>, (StatusCode, Json<ApiError>)> {
    let contacts = list_contacts(&state.api, query.q.as_deref())
        .await
        .map_err(reject)?;
    Ok(Json(contacts))
}

async fn http_get_contact(
    State(state): State<Arc<AppState>>,
    Path(contact_id): Path<String>,
) -> Result<Json<Contact>, (StatusCode, Json<ApiError>)> {
    let contact = get_contact(&state.api, &ContactId(contact_id))
        .await
        .map_err(reject)?;
    Ok(Json(contact))
}

/// The dual-purpose action endpoint. A form carrying `favorite` updates the
/// identified contact and returns the record; a form without one creates a
/// blank contact and redirects to its edit view.
async fn http_contact_action(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ContactActionForm>,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let outcome = contact_action(&state.api, form).await.map_err(reject)?;
    Ok(match outcome {
        ActionOutcome::Updated(contact) => Json(contact).into_response(),
        ActionOutcome::Created(contact) => {
            Redirect::to(&format!("/contacts/{}/edit", contact.id)).into_response()
        }
    })
}

async fn http_update_contact(
    State(state): State<Arc<AppState>>,
    Path(contact_id): Path<String>,
    Form(update): Form<ContactUpdate>,
) -> Result<Json<Contact>, (StatusCode, Json<ApiError>)> {
    let contact = update_contact(&state.api, &ContactId(contact_id), &update)
        .await
        .map_err(reject)?;
    Ok(Json(contact))
}

async fn http_destroy_contact(
    State(state): State<Arc<AppState>>,
    Path(contact_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    delete_contact(&state.api, &ContactId(contact_id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}
