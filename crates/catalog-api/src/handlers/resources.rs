//! `/api/v1/resources` handlers.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use catalog_core::{
    CreateResourceRequest, DeleteResourceOutcome, GetResourceOutcome, ListResourcesRequest,
    UpdateResourceOutcome, UpdateResourceRequest,
};

use crate::error::ApiError;
use crate::query_types::{ExpandQuery, ListResourcesQuery};
use crate::AppState;

pub const RESOURCES_PATH: &str = "/api/v1/resources";

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Resource {} not found", id))
}

pub async fn list_resources(
    State(state): State<AppState>,
    query: Result<Query<ListResourcesQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let req = ListResourcesRequest {
        include_tags: query.expand_tags(),
        tag_filters: query.tag_filters(),
    };
    let resources = state.resources.list(req).await?;
    Ok(Json(resources))
}

pub async fn get_resource(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ExpandQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let Query(query) = query?;
    match state.resources.get(id, query.expand_tags()).await? {
        GetResourceOutcome::Found(resource) => Ok(Json(resource)),
        GetResourceOutcome::NotFound => Err(not_found(id)),
    }
}

pub async fn create_resource(
    State(state): State<AppState>,
    body: Result<Json<CreateResourceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let created = state.resources.create(body).await?;
    let location = format!("{}/{}", RESOURCES_PATH, created.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    ))
}

pub async fn update_resource(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateResourceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let Json(body) = body?;
    match state.resources.update(id, body).await? {
        UpdateResourceOutcome::Success(resource) => Ok(Json(resource)),
        UpdateResourceOutcome::NotFound => Err(not_found(id)),
    }
}

pub async fn delete_resource(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    match state.resources.delete(id).await? {
        DeleteResourceOutcome::Success => Ok(StatusCode::NO_CONTENT),
        DeleteResourceOutcome::NotFound => Err(not_found(id)),
    }
}
