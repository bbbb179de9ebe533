use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::auth::{jwt, password};
use crate::config::Config;
use crate::error::EngineError;
use crate::store::Store;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "jane.doe")]
    pub username: String,

    #[schema(example = "hunter2", format = "password")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    #[schema(example = "employee")]
    pub role: String,
    #[schema(example = 1)]
    pub organization_id: u64,
    #[schema(example = 1001)]
    pub employee_id: u64,
}

/// Username/password login issuing a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials or inactive account")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(store, config, payload), fields(username = %payload.username))]
pub async fn login(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<LoginRequest>,
) -> actix_web::Result<HttpResponse> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(EngineError::validation("username and password are required").into());
    }

    let employee = store
        .employee_by_username(payload.username.trim())
        .await
        .map_err(EngineError::from)?;

    let employee = match employee {
        Some(e) => e,
        None => {
            info!("login rejected: unknown username");
            return Ok(HttpResponse::Unauthorized().json(json!({
                "message": "Invalid credentials"
            })));
        }
    };

    if !password::verify(&payload.password, &employee.password_hash) {
        info!(employee_id = employee.id, "login rejected: password mismatch");
        return Ok(HttpResponse::Unauthorized().json(json!({
            "message": "Invalid credentials"
        })));
    }

    if !employee.is_active {
        return Ok(HttpResponse::Unauthorized().json(json!({
            "message": "Account is not active"
        })));
    }

    let token = jwt::issue_token(&employee, &config.jwt_secret, config.token_ttl)?;

    info!(employee_id = employee.id, "login succeeded");
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        role: employee.role.to_string(),
        organization_id: employee.organization_id,
        employee_id: employee.id,
    }))
}
