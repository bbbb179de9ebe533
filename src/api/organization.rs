use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::employee::work_hours_between;
use crate::auth::actor::Actor;
use crate::auth::password;
use crate::config::Config;
use crate::error::EngineError;
use crate::model::employee::Role;
use crate::model::geo::GeoPoint;
use crate::model::organization::Holiday;
use crate::store::{NewEmployee, NewOrganization, Store, StoreError};

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Deserialize, ToSchema)]
pub struct AdminAccount {
    #[schema(example = "Asha Rahman")]
    pub name: String,

    #[schema(example = "asha")]
    pub username: String,

    #[schema(example = "asha@acme.example")]
    pub email: String,

    #[schema(example = "hunter2", format = "password")]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateOrganization {
    #[schema(example = "Acme Traders")]
    pub name: String,

    #[schema(example = "hr@acme.example")]
    pub contact_email: String,

    pub location: GeoPoint,

    #[schema(example = "09:00")]
    pub checkin_time: String,

    #[schema(example = "18:00")]
    pub checkout_time: String,

    #[schema(example = "Sunday", nullable = true)]
    pub week_off: Option<String>,

    /// The organization's first super admin, created in the same call.
    pub admin: AdminAccount,
}

#[derive(Deserialize, ToSchema)]
pub struct AddHoliday {
    #[schema(example = "Eid")]
    pub name: String,

    #[schema(example = "2026-03-20", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2026-03-22", value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

/// Onboarding: create an organization together with its super admin.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = CreateOrganization,
    responses(
        (status = 201, description = "Organization created"),
        (status = 400, description = "Invalid configuration"),
        (status = 409, description = "Username already taken")
    ),
    tag = "Organization"
)]
pub async fn create_organization(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<CreateOrganization>,
) -> actix_web::Result<HttpResponse> {
    let payload = payload.into_inner();

    if let Some(week_off) = payload.week_off.as_deref() {
        if !WEEKDAY_NAMES.contains(&week_off) {
            return Err(EngineError::validation("week_off must be a full weekday name").into());
        }
    }
    let work_hours = work_hours_between(&payload.checkin_time, &payload.checkout_time)?;

    let password_hash = password::hash(&payload.admin.password)?;

    let org = store
        .insert_organization(NewOrganization {
            name: payload.name,
            contact_email: payload.contact_email,
            location: payload.location,
            checkin_time: payload.checkin_time,
            checkout_time: payload.checkout_time,
            week_off: payload.week_off,
        })
        .await
        .map_err(EngineError::from)?;

    let admin = store
        .insert_employee(NewEmployee {
            organization_id: org.id,
            name: payload.admin.name,
            username: payload.admin.username,
            email: payload.admin.email,
            password_hash,
            role: Role::SuperAdmin,
            salary: 0.0,
            join_date: config.today(),
            work_hours,
            alloted_leave: 0,
            reporting_manager: None,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate => EngineError::conflict("username already exists"),
            other => other.into(),
        })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Organization created",
        "organization_id": org.id,
        "admin_id": admin.id,
    })))
}

/// Fetch the caller's organization, holidays included.
#[utoipa::path(
    get,
    path = "/api/v1/organization",
    responses(
        (status = 200, description = "Organization detail"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Organization not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn get_organization(
    actor: Actor,
    store: web::Data<dyn Store>,
) -> actix_web::Result<HttpResponse> {
    let org = store
        .organization(actor.organization_id)
        .await
        .map_err(EngineError::from)?;
    Ok(HttpResponse::Ok().json(org))
}

/// Append a holiday interval. Holidays are only ever appended, never removed.
#[utoipa::path(
    post,
    path = "/api/v1/organization/holiday",
    request_body = AddHoliday,
    responses(
        (status = 200, description = "Holiday added"),
        (status = 400, description = "Invalid interval"),
        (status = 403, description = "Super admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn add_holiday(
    actor: Actor,
    store: web::Data<dyn Store>,
    payload: web::Json<AddHoliday>,
) -> actix_web::Result<HttpResponse> {
    actor.require_admin()?;

    let payload = payload.into_inner();
    if payload.end_date < payload.start_date {
        return Err(EngineError::validation("end date cannot be earlier than start date").into());
    }

    store
        .add_holiday(
            actor.organization_id,
            Holiday {
                name: payload.name,
                start_date: payload.start_date,
                end_date: payload.end_date,
            },
        )
        .await
        .map_err(EngineError::from)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Holiday added" })))
}

/// Soft-deactivate the caller's organization.
#[utoipa::path(
    put,
    path = "/api/v1/organization/deactivate",
    responses(
        (status = 200, description = "Organization deactivated"),
        (status = 403, description = "Super admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn deactivate_organization(
    actor: Actor,
    store: web::Data<dyn Store>,
) -> actix_web::Result<HttpResponse> {
    actor.require_admin()?;

    store
        .deactivate_organization(actor.organization_id)
        .await
        .map_err(EngineError::from)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Organization deactivated" })))
}
