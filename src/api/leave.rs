use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::actor::Actor;
use crate::engine::leave::{self, LeaveApplication, ReviewDecision};
use crate::error::EngineError;
use crate::model::employee::Role;
use crate::model::leave::{LeaveStatus, LeaveType};
use crate::store::{LeaveListFilter, Store};

#[derive(Deserialize, ToSchema)]
pub struct ApplyLeave {
    pub leave_type: LeaveType,

    #[schema(example = "2026-01-10", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2026-01-12", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    #[schema(example = "family function", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LeaveAction {
    #[schema(example = 1)]
    pub leave_id: u64,

    #[schema(example = "approved")]
    pub status: ReviewDecision,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveQuery {
    /// Filter by request status.
    #[schema(example = "pending")]
    pub status: Option<String>,

    /// Filter by employee (super admin only).
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

/// Apply for leave over an inclusive date range.
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = ApplyLeave,
    responses(
        (status = 200, description = "Leave applied"),
        (status = 400, description = "Invalid range"),
        (status = 409, description = "Overlapping request or regularized day")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply(
    actor: Actor,
    store: web::Data<dyn Store>,
    payload: web::Json<ApplyLeave>,
) -> actix_web::Result<HttpResponse> {
    let payload = payload.into_inner();

    let leave = leave::apply_leave(
        store.get_ref(),
        actor.employee_id,
        LeaveApplication {
            leave_type: payload.leave_type,
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: payload.reason,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave applied successfully",
        "leave_id": leave.id,
        "status": leave.status,
    })))
}

/// Approve or reject a pending request. Reporting manager of the applicant,
/// or super admin.
#[utoipa::path(
    post,
    path = "/api/v1/leave/action",
    request_body = LeaveAction,
    responses(
        (status = 200, description = "Leave resolved"),
        (status = 403, description = "Not authorized to review"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Already resolved")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn action(
    actor: Actor,
    store: web::Data<dyn Store>,
    payload: web::Json<LeaveAction>,
) -> actix_web::Result<HttpResponse> {
    leave::review_leave(store.get_ref(), &actor, payload.leave_id, payload.status).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave has been {}", payload.status)
    })))
}

/// Role-filtered listing: employees see their own requests, reporting
/// managers their reports', super admins the whole organization.
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Leave requests"),
        (status = 400, description = "Unknown status filter")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list(
    actor: Actor,
    store: web::Data<dyn Store>,
    query: web::Query<LeaveQuery>,
) -> actix_web::Result<HttpResponse> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            LeaveStatus::from_str(s)
                .map_err(|_| EngineError::validation(format!("unknown status `{s}`")))
        })
        .transpose()?;

    let filter = match actor.role {
        Role::Employee => LeaveListFilter {
            employee_id: Some(actor.employee_id),
            status,
            reporting_manager: None,
        },
        Role::ReportingManager => LeaveListFilter {
            employee_id: None,
            status,
            reporting_manager: Some(actor.employee_id),
        },
        Role::SuperAdmin => LeaveListFilter {
            employee_id: query.employee_id,
            status,
            reporting_manager: None,
        },
    };

    let leaves = store
        .leaves(actor.organization_id, filter)
        .await
        .map_err(EngineError::from)?;

    Ok(HttpResponse::Ok().json(leaves))
}
