use actix_web::{HttpResponse, web};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::actor::Actor;
use crate::config::Config;
use crate::engine::{checkin, month};
use crate::error::EngineError;
use crate::model::geo::GeoPoint;
use crate::store::Store;

#[derive(Deserialize, ToSchema)]
pub struct LocationReport {
    pub location: GeoPoint,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// Defaults to the caller.
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,

    /// Defaults to the current year.
    #[schema(example = 2026)]
    pub year: Option<i32>,

    /// Defaults to the current month.
    #[schema(example = 1)]
    pub month: Option<u32>,
}

/// Geofenced check-in for today.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = LocationReport,
    responses(
        (status = 200, description = "Checked in successfully"),
        (status = 400, description = "Outside the allowed range"),
        (status = 409, description = "Already checked in today")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    actor: Actor,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<LocationReport>,
) -> actix_web::Result<HttpResponse> {
    checkin::check_in(
        store.get_ref(),
        actor.employee_id,
        payload.location,
        config.now_local(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Checked in successfully" })))
}

/// Geofenced check-out; settles the day as present or half_day.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    request_body = LocationReport,
    responses(
        (status = 200, description = "Checked out successfully"),
        (status = 400, description = "No open check-in, or outside the allowed range")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    actor: Actor,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<LocationReport>,
) -> actix_web::Result<HttpResponse> {
    let status = checkin::check_out(
        store.get_ref(),
        actor.employee_id,
        payload.location,
        config.now_local(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully",
        "status": status,
    })))
}

/// Month aggregation: one resolved status per calendar day plus counters.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/monthly",
    params(MonthQuery),
    responses(
        (status = 200, description = "Monthly attendance", body = crate::engine::month::MonthlyAttendance),
        (status = 403, description = "Not your record"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn monthly(
    actor: Actor,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = query.employee_id.unwrap_or(actor.employee_id);
    if employee_id != actor.employee_id {
        actor.require_manager_or_admin()?;
    }

    let employee = store.employee(employee_id).await.map_err(EngineError::from)?;
    if employee.organization_id != actor.organization_id {
        return Err(EngineError::not_found("employee not found").into());
    }

    let today = config.today();
    let year = query.year.unwrap_or_else(|| today.year());
    let month_num = query.month.unwrap_or_else(|| today.month());

    let summary =
        month::monthly_attendance(store.get_ref(), employee_id, year, month_num, today).await?;
    Ok(HttpResponse::Ok().json(summary))
}
