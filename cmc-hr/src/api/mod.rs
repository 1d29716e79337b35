//! HTTP API handlers for cmc-hr

pub mod auth;
pub mod checklist;
pub mod departments;
pub mod employees;
pub mod extract;
pub mod gates;
pub mod health;
pub mod onboarding;
pub mod organization;
pub mod users;

pub use auth::{auth_middleware, change_password, login, logout, me, CurrentUser};
pub use checklist::{get_own_checklist, get_user_checklist, update_checklist_item};
pub use departments::{
    create_department, delete_department, get_department, list_departments, update_department,
};
pub use employees::{create_employee, delete_employee, get_employee, list_employees, update_employee};
pub use gates::checklist_gate;
pub use health::health_routes;
pub use onboarding::{get_onboarding_status, reset_onboarding, transition_onboarding};
pub use organization::{get_organization, update_organization};
pub use users::{
    create_user, deactivate_user, get_user, list_users, update_profile, update_user_role,
};
