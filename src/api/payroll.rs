use actix_web::{HttpResponse, web};
use chrono::Datelike;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::actor::Actor;
use crate::config::Config;
use crate::engine::payroll;
use crate::error::EngineError;
use crate::store::Store;

#[derive(Deserialize, ToSchema)]
pub struct SalaryRequest {
    #[schema(example = 1001)]
    pub employee_id: u64,

    /// Defaults to the current year.
    #[schema(example = 2026)]
    pub year: Option<i32>,

    /// Defaults to the current month.
    #[schema(example = 1)]
    pub month: Option<u32>,
}

/// Derive the month's salary from the resolved attendance ledger.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/salary",
    request_body = SalaryRequest,
    responses(
        (status = 200, description = "Salary breakdown", body = crate::engine::payroll::SalaryBreakdown),
        (status = 403, description = "Reporting manager or super admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn calculate_salary(
    actor: Actor,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<SalaryRequest>,
) -> actix_web::Result<HttpResponse> {
    actor.require_manager_or_admin()?;

    let employee = store
        .employee(payload.employee_id)
        .await
        .map_err(EngineError::from)?;
    if employee.organization_id != actor.organization_id {
        return Err(EngineError::not_found("employee not found").into());
    }

    let today = config.today();
    let year = payload.year.unwrap_or_else(|| today.year());
    let month_num = payload.month.unwrap_or_else(|| today.month());

    let breakdown = payroll::salary_for_month(
        store.get_ref(),
        payload.employee_id,
        year,
        month_num,
        today,
    )
    .await?;

    Ok(HttpResponse::Ok().json(breakdown))
}
