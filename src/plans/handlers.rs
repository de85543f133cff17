use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{DeleteResponse, PlanView};
use super::model::{Plan, PlanId};
use super::params::{GenerateParams, PlanDraft};
use crate::{auth::Credential, error::SyncError, session::Session, state::AppState};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/:id", get(get_plan))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/plans", post(create_plan))
        .route("/plans/refresh", post(refresh_plans))
        .route("/plans/generate", post(generate_plan))
        .route("/plans/:id", axum::routing::put(edit_plan).delete(delete_plan))
}

fn session(state: &AppState, credential: &Credential) -> std::sync::Arc<Session> {
    state
        .sessions
        .for_subject(credential.subject(), state.clock.today())
}

fn views(plans: &[Plan]) -> Vec<PlanView> {
    plans.iter().map(PlanView::from).collect()
}

// --- handlers ---

#[instrument(skip(state, credential), fields(subject = %credential.subject()))]
pub async fn list_plans(
    State(state): State<AppState>,
    credential: Credential,
) -> Json<Vec<PlanView>> {
    let plans = session(&state, &credential).plans.plans();
    Json(views(&plans))
}

#[instrument(skip(state, credential), fields(subject = %credential.subject()))]
pub async fn refresh_plans(
    State(state): State<AppState>,
    credential: Credential,
) -> Result<Json<Vec<PlanView>>, SyncError> {
    let plans = session(&state, &credential).plans.refresh(&credential).await?;
    Ok(Json(views(&plans)))
}

#[instrument(skip(state, credential), fields(subject = %credential.subject()))]
pub async fn get_plan(
    State(state): State<AppState>,
    credential: Credential,
    Path(id): Path<String>,
) -> Result<Json<PlanView>, SyncError> {
    session(&state, &credential)
        .plans
        .plan(&PlanId::from(id))
        .map(|plan| Json(PlanView::from(&plan)))
        .ok_or(SyncError::NotFound)
}

#[instrument(skip(state, credential, params), fields(subject = %credential.subject()))]
pub async fn generate_plan(
    State(state): State<AppState>,
    credential: Credential,
    Json(params): Json<GenerateParams>,
) -> Result<(StatusCode, Json<PlanView>), SyncError> {
    let plan = session(&state, &credential)
        .plans
        .generate(&credential, &params)
        .await?;
    Ok((StatusCode::CREATED, Json(PlanView::from(&plan))))
}

#[instrument(skip(state, credential, draft), fields(subject = %credential.subject()))]
pub async fn create_plan(
    State(state): State<AppState>,
    credential: Credential,
    Json(draft): Json<PlanDraft>,
) -> Result<(StatusCode, Json<PlanView>), SyncError> {
    let plan = session(&state, &credential)
        .plans
        .create(&credential, &draft)
        .await?;
    Ok((StatusCode::CREATED, Json(PlanView::from(&plan))))
}

#[instrument(skip(state, credential, plan), fields(subject = %credential.subject()))]
pub async fn edit_plan(
    State(state): State<AppState>,
    credential: Credential,
    Path(id): Path<String>,
    Json(plan): Json<Plan>,
) -> Result<Json<PlanView>, SyncError> {
    let updated = session(&state, &credential)
        .plans
        .edit(&credential, &PlanId::from(id), plan)
        .await?;
    Ok(Json(PlanView::from(&updated)))
}

#[instrument(skip(state, credential), fields(subject = %credential.subject()))]
pub async fn delete_plan(
    State(state): State<AppState>,
    credential: Credential,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, SyncError> {
    let outcome = session(&state, &credential)
        .plans
        .delete(&credential, &PlanId::from(id))
        .await?;
    Ok(Json(DeleteResponse { outcome }))
}
