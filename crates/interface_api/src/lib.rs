//! HTTP API Layer
//!
//! This crate provides the REST API for crew operations using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for claims, payroll, and health
//! - **Middleware**: JWT authentication and request logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent JSON error responses
//!
//! The router depends only on the domain services, so tests can serve it
//! over the in-memory adapters.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(claims_service, reconciler, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use domain_expenses::ClaimApprovalService;
use domain_payroll::PayrollReconciler;

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, request_log_middleware};
use crate::handlers::{claims, health, payroll};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub claims: ClaimApprovalService,
    pub payroll: Arc<PayrollReconciler>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(claims: ClaimApprovalService, payroll: PayrollReconciler, config: ApiConfig) -> Self {
        Self {
            claims,
            payroll: Arc::new(payroll),
            config,
        }
    }
}

/// Creates the main API router
///
/// Everything under `/api/v1` requires a bearer token; the health
/// endpoints are public.
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let claims_routes = Router::new()
        .route("/", get(claims::list_claims).post(claims::create_claim))
        .route("/:id", get(claims::get_claim).put(claims::update_claim))
        .route("/:id/receipts", get(claims::list_receipts).post(claims::attach_receipt))
        .route("/:id/summary", get(claims::claim_summary))
        .route("/:id/can-approve", get(claims::can_approve))
        .route("/:id/submit", post(claims::submit_claim))
        .route("/:id/approve", post(claims::approve_claim))
        .route("/:id/reject", post(claims::reject_claim));

    let payroll_routes = Router::new()
        .route("/reconcile", post(payroll::reconcile_payroll));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .nest("/payroll", payroll_routes)
        .layer(axum_middleware::from_fn(request_log_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
