use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::actor::Actor;
use crate::config::Config;
use crate::engine::leave::ReviewDecision;
use crate::engine::regularize::{self, RegularizationApplication};
use crate::error::EngineError;
use crate::store::Store;

#[derive(Deserialize, ToSchema)]
pub struct ApplyRegularization {
    #[schema(example = "2026-01-14", value_type = String, format = "date")]
    pub date: NaiveDate,

    /// The check-in the record should have had.
    #[schema(example = "2026-01-14T09:00:00", value_type = String, format = "date-time")]
    pub check_in: NaiveDateTime,

    #[schema(example = "2026-01-14T18:00:00", value_type = String, format = "date-time")]
    pub check_out: NaiveDateTime,

    #[schema(example = "forgot to check in")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegularizationAction {
    #[schema(example = 1)]
    pub attendance_id: u64,

    #[schema(example = "approved")]
    pub status: ReviewDecision,
}

/// Request a retroactive correction of one day's check-in/out.
#[utoipa::path(
    post,
    path = "/api/v1/regularization",
    request_body = ApplyRegularization,
    responses(
        (status = 200, description = "Regularization requested"),
        (status = 400, description = "Future date, before joining, or bad times"),
        (status = 409, description = "Covered by leave, or already requested/approved")
    ),
    security(("bearer_auth" = [])),
    tag = "Regularization"
)]
pub async fn apply(
    actor: Actor,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<ApplyRegularization>,
) -> actix_web::Result<HttpResponse> {
    let payload = payload.into_inner();

    regularize::apply_regularization(
        store.get_ref(),
        actor.employee_id,
        RegularizationApplication {
            date: payload.date,
            check_in: payload.check_in,
            check_out: payload.check_out,
            reason: payload.reason,
        },
        config.today(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Regularization requested" })))
}

/// Approve or reject a pending correction. Reporting manager of the
/// applicant, or super admin.
#[utoipa::path(
    post,
    path = "/api/v1/regularization/action",
    request_body = RegularizationAction,
    responses(
        (status = 200, description = "Regularization resolved"),
        (status = 403, description = "Not authorized to review"),
        (status = 404, description = "Record not found"),
        (status = 409, description = "No pending request")
    ),
    security(("bearer_auth" = [])),
    tag = "Regularization"
)]
pub async fn action(
    actor: Actor,
    store: web::Data<dyn Store>,
    payload: web::Json<RegularizationAction>,
) -> actix_web::Result<HttpResponse> {
    regularize::review_regularization(
        store.get_ref(),
        &actor,
        payload.attendance_id,
        payload.status,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Regularization has been {}", payload.status)
    })))
}

/// Pending corrections across the organization.
#[utoipa::path(
    get,
    path = "/api/v1/regularization/pending",
    responses(
        (status = 200, description = "Pending regularization requests"),
        (status = 403, description = "Reporting manager or super admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Regularization"
)]
pub async fn pending(
    actor: Actor,
    store: web::Data<dyn Store>,
) -> actix_web::Result<HttpResponse> {
    actor.require_manager_or_admin()?;

    let records = store
        .pending_regularizations(actor.organization_id)
        .await
        .map_err(EngineError::from)?;

    Ok(HttpResponse::Ok().json(records))
}
