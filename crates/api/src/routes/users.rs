//! User administration handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{User, UserRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminUser, RequestContext};

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct ChangeRoleResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}

/// POST /api/v1/admin/users/:user_id/role
pub async fn change_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    RequestContext(meta): RequestContext,
    Path(user_id): Path<Uuid>,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<Json<ChangeRoleResponse>, ApiError> {
    let role: UserRole = request.role.parse().map_err(ApiError::Validation)?;

    let user = state.users.change_role(&admin, user_id, role, meta).await?;

    Ok(Json(ChangeRoleResponse {
        success: true,
        message: format!("User role updated to {}", role),
        user,
    }))
}
