use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::actor::Actor;
use crate::auth::password;
use crate::error::EngineError;
use crate::model::employee::Role;
use crate::store::{NewEmployee, Store, StoreError};

/// Daily work duration in hours between two "HH:MM" wall times.
pub fn work_hours_between(checkin: &str, checkout: &str) -> Result<f64, EngineError> {
    let parse = |s: &str| {
        NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|_| EngineError::validation(format!("invalid time `{s}`, expected HH:MM")))
    };
    let start = parse(checkin)?;
    let end = parse(checkout)?;

    let hours = (end - start).num_minutes() as f64 / 60.0;
    if hours <= 0.0 {
        return Err(EngineError::validation(
            "checkout time must be after checkin time",
        ));
    }
    Ok(hours)
}

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Jane Doe")]
    pub name: String,

    #[schema(example = "jane.doe")]
    pub username: String,

    #[schema(example = "jane.doe@acme.example")]
    pub email: String,

    #[schema(example = "hunter2", format = "password")]
    pub password: String,

    pub role: Role,

    #[schema(example = 30000.0)]
    pub salary: f64,

    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub join_date: NaiveDate,

    /// Defaults to the organization's standard times when omitted.
    #[schema(example = "09:00", nullable = true)]
    pub checkin_time: Option<String>,

    #[schema(example = "18:00", nullable = true)]
    pub checkout_time: Option<String>,

    #[schema(example = 18)]
    pub alloted_leave: u32,

    #[schema(example = 1000, nullable = true)]
    pub reporting_manager: Option<u64>,
}

/// Enroll an employee into the caller's organization.
#[utoipa::path(
    post,
    path = "/api/v1/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee enrolled"),
        (status = 400, description = "Invalid configuration"),
        (status = 403, description = "Reporting manager or super admin only"),
        (status = 409, description = "Username already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    actor: Actor,
    store: web::Data<dyn Store>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<HttpResponse> {
    actor.require_manager_or_admin()?;

    let payload = payload.into_inner();
    let org = store
        .organization(actor.organization_id)
        .await
        .map_err(EngineError::from)?;
    if !org.is_active {
        return Err(EngineError::forbidden("organization is not active").into());
    }

    // Per-employee hours override the organization's standard ones.
    let checkin_time = payload.checkin_time.as_deref().unwrap_or(&org.checkin_time);
    let checkout_time = payload
        .checkout_time
        .as_deref()
        .unwrap_or(&org.checkout_time);
    let work_hours = work_hours_between(checkin_time, checkout_time)?;

    if let Some(manager_id) = payload.reporting_manager {
        let manager = store.employee(manager_id).await.map_err(EngineError::from)?;
        if manager.organization_id != actor.organization_id {
            return Err(EngineError::not_found("employee not found").into());
        }
    }

    let password_hash = password::hash(&payload.password)?;

    let employee = store
        .insert_employee(NewEmployee {
            organization_id: actor.organization_id,
            name: payload.name,
            username: payload.username,
            email: payload.email,
            password_hash,
            role: payload.role,
            salary: payload.salary,
            join_date: payload.join_date,
            work_hours,
            alloted_leave: payload.alloted_leave,
            reporting_manager: payload.reporting_manager,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate => EngineError::conflict("username already exists"),
            other => other.into(),
        })?;

    Ok(HttpResponse::Created().json(employee))
}

/// Employee detail: self-service, or any employee for managers/admins.
#[utoipa::path(
    get,
    path = "/api/v1/employee/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee detail"),
        (status = 403, description = "Not your record"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    actor: Actor,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    if employee_id != actor.employee_id {
        actor.require_manager_or_admin()?;
    }

    let employee = store.employee(employee_id).await.map_err(EngineError::from)?;
    if employee.organization_id != actor.organization_id {
        return Err(EngineError::not_found("employee not found").into());
    }

    Ok(HttpResponse::Ok().json(employee))
}
