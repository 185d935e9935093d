//! # catalog-api
//!
//! HTTP service for the resource catalog: router, handlers, the resource
//! service and server configuration. The `catalog-api` binary wires these
//! to a storage backend and serves them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod query_types;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use catalog_core::ResourceRepository;

use crate::config::ApiConfig;
use crate::handlers::health::health_check;
use crate::handlers::resources::{
    create_resource, delete_resource, get_resource, list_resources, update_resource,
};
use crate::services::ResourceService;

pub use error::ApiError;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub resources: ResourceService,
}

impl AppState {
    pub fn new(repo: Arc<dyn ResourceRepository>) -> Self {
        Self {
            resources: ResourceService::new(repo),
        }
    }
}

/// Build the application router with all middleware attached.
pub fn build_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origin_headers()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::LOCATION])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/v1/resources",
            get(list_resources).post(create_resource),
        )
        .route(
            "/api/v1/resources/:id",
            get(get_resource)
                .put(update_resource)
                .delete(delete_resource),
        )
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state)
}
