//! cmc-hr library - HR administration service for Cathay Metal Corporation
//!
//! Users, roles, departments and employee records, plus the system
//! onboarding workflow (super_admin → office_admin → hr_manager →
//! completed) and the per-user onboarding checklist that gates the HR area.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod checklist;
pub mod config;
pub mod db;
pub mod error;
pub mod onboarding;
pub mod pagination;
pub mod roles;
pub mod validation;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Lifetime of newly issued session tokens
    pub session_ttl_minutes: i64,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, session_ttl_minutes: i64) -> Self {
        Self {
            db,
            session_ttl_minutes,
        }
    }
}

/// Build application router
///
/// - `/health` and `/api/auth/login` are public
/// - everything else requires a bearer session
/// - department and employee routes additionally require a complete checklist
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    // HR area: gated on the caller's onboarding checklist
    let hr_area = Router::new()
        .route(
            "/api/departments",
            get(api::list_departments).post(api::create_department),
        )
        .route(
            "/api/departments/:guid",
            get(api::get_department)
                .put(api::update_department)
                .delete(api::delete_department),
        )
        .route(
            "/api/employees",
            get(api::list_employees).post(api::create_employee),
        )
        .route(
            "/api/employees/:guid",
            get(api::get_employee)
                .put(api::update_employee)
                .delete(api::delete_employee),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::checklist_gate,
        ));

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/auth/logout", post(api::logout))
        .route("/api/auth/me", get(api::me))
        .route("/api/auth/password", put(api::change_password))
        .route("/api/profile", put(api::update_profile))
        .route("/api/checklist", get(api::get_own_checklist))
        .route("/api/checklist/:key", put(api::update_checklist_item))
        .route("/api/onboarding", get(api::get_onboarding_status))
        .route("/api/onboarding/transition", post(api::transition_onboarding))
        .route("/api/onboarding/reset", post(api::reset_onboarding))
        .route(
            "/api/organization",
            get(api::get_organization).put(api::update_organization),
        )
        .route("/api/users", get(api::list_users).post(api::create_user))
        .route("/api/users/:guid", get(api::get_user))
        .route("/api/users/:guid/role", put(api::update_user_role))
        .route("/api/users/:guid/deactivate", post(api::deactivate_user))
        .route("/api/users/:guid/checklist", get(api::get_user_checklist))
        .merge(hr_area)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/auth/login", post(api::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
