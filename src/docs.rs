use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::attendance::{LocationReport, MonthQuery};
use crate::api::employee::CreateEmployee;
use crate::api::leave::{ApplyLeave, LeaveAction, LeaveQuery};
use crate::api::organization::{AddHoliday, AdminAccount, CreateOrganization};
use crate::api::payroll::SalaryRequest;
use crate::api::regularize::{ApplyRegularization, RegularizationAction};
use crate::auth::handlers::{LoginRequest, LoginResponse};
use crate::engine::day_status::ResolvedDay;
use crate::engine::leave::ReviewDecision;
use crate::engine::month::MonthlyAttendance;
use crate::engine::payroll::SalaryBreakdown;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, DayStatus, Regularization};
use crate::model::employee::{Employee, Role};
use crate::model::geo::GeoPoint;
use crate::model::leave::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::organization::{Holiday, Organization};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workforce Management API",
        version = "1.0.0",
        description = r#"
Multi-tenant workforce management backend: geofenced attendance, leave and
regularization workflows, and attendance-derived payroll.

Most endpoints require a JWT bearer token obtained from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::api::organization::create_organization,
        crate::api::organization::get_organization,
        crate::api::organization::add_holiday,
        crate::api::organization::deactivate_organization,
        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::monthly,
        crate::api::leave::apply,
        crate::api::leave::action,
        crate::api::leave::list,
        crate::api::regularize::apply,
        crate::api::regularize::action,
        crate::api::regularize::pending,
        crate::api::payroll::calculate_salary,
    ),
    components(schemas(
        LoginRequest,
        LoginResponse,
        CreateOrganization,
        AdminAccount,
        AddHoliday,
        Organization,
        Holiday,
        GeoPoint,
        CreateEmployee,
        Employee,
        Role,
        LocationReport,
        MonthQuery,
        MonthlyAttendance,
        ResolvedDay,
        DayStatus,
        AttendanceRecord,
        AttendanceStatus,
        Regularization,
        ApplyLeave,
        LeaveAction,
        LeaveQuery,
        LeaveRequest,
        LeaveStatus,
        LeaveType,
        ReviewDecision,
        ApplyRegularization,
        RegularizationAction,
        SalaryRequest,
        SalaryBreakdown,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and organization onboarding"),
        (name = "Organization", description = "Organization configuration APIs"),
        (name = "Employee", description = "Employee enrollment APIs"),
        (name = "Attendance", description = "Check-in/out and monthly attendance APIs"),
        (name = "Leave", description = "Leave workflow APIs"),
        (name = "Regularization", description = "Attendance correction APIs"),
        (name = "Payroll", description = "Salary derivation APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
