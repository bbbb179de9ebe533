use chrono::NaiveDate;
use serde::Deserialize;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::auth::actor::Actor;
use crate::error::EngineError;
use crate::model::attendance::AttendanceStatus;
use crate::model::employee::Employee;
use crate::model::leave::{LeaveRequest, LeaveStatus, LeaveType};
use crate::store::{LeaveReview, NewLeave, Store};

#[derive(Debug, Clone)]
pub struct LeaveApplication {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

/// Terminal disposition a reviewer hands down.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

pub fn authorize_reviewer(actor: &Actor, target: &Employee) -> Result<(), EngineError> {
    if actor.may_review(target) {
        Ok(())
    } else {
        Err(EngineError::forbidden(
            "you are not authorized to review this request",
        ))
    }
}

/// Validates and files a pending leave request.
pub async fn apply_leave(
    store: &dyn Store,
    employee_id: u64,
    application: LeaveApplication,
) -> Result<LeaveRequest, EngineError> {
    let employee = store.employee(employee_id).await?;
    if !employee.is_active {
        return Err(EngineError::forbidden("employee is not active"));
    }

    if application.start_date < employee.join_date {
        return Err(EngineError::validation("leave starts before joining date"));
    }
    if application.end_date < application.start_date {
        return Err(EngineError::validation(
            "end date cannot be earlier than start date",
        ));
    }

    if store
        .overlapping_leave(employee_id, application.start_date, application.end_date)
        .await?
        .is_some()
    {
        return Err(EngineError::conflict(
            "leave already applied for the selected dates",
        ));
    }

    // A day locked by a regularization request (pending or approved) cannot
    // also be covered by leave.
    let records = store
        .attendance_between(employee_id, application.start_date, application.end_date)
        .await?;
    if records
        .iter()
        .any(|r| r.is_regularized() || r.regularization.is_pending())
    {
        return Err(EngineError::conflict(
            "a day in the range is already regularized",
        ));
    }

    let leave = store
        .insert_leave(NewLeave {
            organization_id: employee.organization_id,
            employee_id,
            leave_type: application.leave_type,
            start_date: application.start_date,
            end_date: application.end_date,
            reason: application.reason,
        })
        .await?;

    Ok(leave)
}

/// Resolves a pending request. Approval marks every day in range `on_leave`
/// and charges the leave-taken counter; rejection marks the days
/// `paid_leave` and charges nothing. Both settle atomically with the
/// request's own transition.
pub async fn review_leave(
    store: &dyn Store,
    actor: &Actor,
    leave_id: u64,
    decision: ReviewDecision,
) -> Result<(), EngineError> {
    let leave = store.leave(leave_id).await?;
    if leave.organization_id != actor.organization_id {
        return Err(EngineError::not_found("leave request not found"));
    }
    if leave.status.is_terminal() {
        return Err(EngineError::conflict(format!("already {}", leave.status)));
    }

    let employee = store.employee(leave.employee_id).await?;
    authorize_reviewer(actor, &employee)?;

    let (status, day_status, leave_taken_delta) = match decision {
        ReviewDecision::Approved => (
            LeaveStatus::Approved,
            AttendanceStatus::OnLeave,
            leave.day_count(),
        ),
        ReviewDecision::Rejected => (LeaveStatus::Rejected, AttendanceStatus::PaidLeave, 0),
    };

    store
        .apply_leave_review(
            &leave,
            LeaveReview {
                status,
                approved_by: actor.employee_id,
                day_status,
                days: leave.days(),
                leave_taken_delta,
            },
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{d, dt, seed_employee, seed_org};
    use crate::model::attendance::Regularization;
    use crate::model::employee::Role;
    use crate::store::memory::MemoryStore;
    use crate::store::NewAttendance;

    fn application(start: NaiveDate, end: NaiveDate) -> LeaveApplication {
        LeaveApplication {
            leave_type: LeaveType::Casual,
            start_date: start,
            end_date: end,
            reason: Some("family function".into()),
        }
    }

    fn actor_for(employee: &Employee) -> Actor {
        Actor {
            employee_id: employee.id,
            organization_id: employee.organization_id,
            role: employee.role,
        }
    }

    #[actix_web::test]
    async fn reversed_range_is_rejected() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let emp = seed_employee(&store, &org, "jane", Role::Employee, d(2025, 1, 1), None).await;

        let err = apply_leave(&store, emp.id, application(d(2026, 1, 12), d(2026, 1, 10)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[actix_web::test]
    async fn leave_before_join_date_is_rejected() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let emp = seed_employee(&store, &org, "jane", Role::Employee, d(2026, 2, 1), None).await;

        let err = apply_leave(&store, emp.id, application(d(2026, 1, 10), d(2026, 1, 12)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[actix_web::test]
    async fn overlapping_application_conflicts() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let emp = seed_employee(&store, &org, "jane", Role::Employee, d(2025, 1, 1), None).await;

        apply_leave(&store, emp.id, application(d(2026, 1, 10), d(2026, 1, 12)))
            .await
            .unwrap();
        let err = apply_leave(&store, emp.id, application(d(2026, 1, 12), d(2026, 1, 14)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[actix_web::test]
    async fn regularized_day_in_range_conflicts() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let emp = seed_employee(&store, &org, "jane", Role::Employee, d(2025, 1, 1), None).await;

        store
            .insert_attendance(NewAttendance {
                organization_id: org.id,
                employee_id: emp.id,
                date: d(2026, 1, 11),
                status: crate::model::attendance::AttendanceStatus::ApprovedRegularise,
                check_in: None,
                check_in_location: None,
                regularization: Regularization::Approved {
                    check_in: dt(2026, 1, 11, 9, 0),
                    check_out: dt(2026, 1, 11, 18, 0),
                    reason: "forgot phone".into(),
                    approved_by: 1,
                },
            })
            .await
            .unwrap();

        let err = apply_leave(&store, emp.id, application(d(2026, 1, 10), d(2026, 1, 12)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[actix_web::test]
    async fn approval_cascades_on_leave_and_charges_counter() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let manager =
            seed_employee(&store, &org, "boss", Role::ReportingManager, d(2024, 1, 1), None).await;
        let emp = seed_employee(
            &store,
            &org,
            "jane",
            Role::Employee,
            d(2025, 1, 1),
            Some(manager.id),
        )
        .await;

        let leave = apply_leave(&store, emp.id, application(d(2026, 1, 10), d(2026, 1, 12)))
            .await
            .unwrap();

        review_leave(&store, &actor_for(&manager), leave.id, ReviewDecision::Approved)
            .await
            .unwrap();

        for day in [d(2026, 1, 10), d(2026, 1, 11), d(2026, 1, 12)] {
            let record = store.attendance_on(emp.id, day).await.unwrap().unwrap();
            assert_eq!(record.status, AttendanceStatus::OnLeave);
        }
        assert_eq!(store.employee(emp.id).await.unwrap().leave_taken, 3);

        let stored = store.leave(leave.id).await.unwrap();
        assert_eq!(stored.status, LeaveStatus::Approved);
        assert_eq!(stored.approved_by, Some(manager.id));
    }

    #[actix_web::test]
    async fn rejection_cascades_paid_leave_and_charges_nothing() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let manager =
            seed_employee(&store, &org, "boss", Role::ReportingManager, d(2024, 1, 1), None).await;
        let emp = seed_employee(
            &store,
            &org,
            "jane",
            Role::Employee,
            d(2025, 1, 1),
            Some(manager.id),
        )
        .await;

        let leave = apply_leave(&store, emp.id, application(d(2026, 1, 10), d(2026, 1, 11)))
            .await
            .unwrap();
        review_leave(&store, &actor_for(&manager), leave.id, ReviewDecision::Rejected)
            .await
            .unwrap();

        for day in [d(2026, 1, 10), d(2026, 1, 11)] {
            let record = store.attendance_on(emp.id, day).await.unwrap().unwrap();
            assert_eq!(record.status, AttendanceStatus::PaidLeave);
        }
        assert_eq!(store.employee(emp.id).await.unwrap().leave_taken, 0);
    }

    #[actix_web::test]
    async fn unrelated_employee_cannot_review() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let outsider =
            seed_employee(&store, &org, "other", Role::ReportingManager, d(2024, 1, 1), None).await;
        let manager =
            seed_employee(&store, &org, "boss", Role::ReportingManager, d(2024, 1, 1), None).await;
        let emp = seed_employee(
            &store,
            &org,
            "jane",
            Role::Employee,
            d(2025, 1, 1),
            Some(manager.id),
        )
        .await;

        let leave = apply_leave(&store, emp.id, application(d(2026, 1, 10), d(2026, 1, 11)))
            .await
            .unwrap();
        let err = review_leave(
            &store,
            &actor_for(&outsider),
            leave.id,
            ReviewDecision::Approved,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));

        // super admin is always allowed
        let admin =
            seed_employee(&store, &org, "root", Role::SuperAdmin, d(2024, 1, 1), None).await;
        review_leave(&store, &actor_for(&admin), leave.id, ReviewDecision::Approved)
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn re_review_of_resolved_request_conflicts() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let manager =
            seed_employee(&store, &org, "boss", Role::ReportingManager, d(2024, 1, 1), None).await;
        let emp = seed_employee(
            &store,
            &org,
            "jane",
            Role::Employee,
            d(2025, 1, 1),
            Some(manager.id),
        )
        .await;

        let leave = apply_leave(&store, emp.id, application(d(2026, 1, 10), d(2026, 1, 12)))
            .await
            .unwrap();
        review_leave(&store, &actor_for(&manager), leave.id, ReviewDecision::Approved)
            .await
            .unwrap();

        let err = review_leave(
            &store,
            &actor_for(&manager),
            leave.id,
            ReviewDecision::Rejected,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));

        // counter charged exactly once
        assert_eq!(store.employee(emp.id).await.unwrap().leave_taken, 3);
    }

    #[actix_web::test]
    async fn approval_updates_existing_day_records_in_place() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let manager =
            seed_employee(&store, &org, "boss", Role::ReportingManager, d(2024, 1, 1), None).await;
        let emp = seed_employee(
            &store,
            &org,
            "jane",
            Role::Employee,
            d(2025, 1, 1),
            Some(manager.id),
        )
        .await;

        // a checked-in day already exists inside the range
        store
            .insert_attendance(NewAttendance {
                organization_id: org.id,
                employee_id: emp.id,
                date: d(2026, 1, 11),
                status: AttendanceStatus::CheckedIn,
                check_in: Some(dt(2026, 1, 11, 9, 0)),
                check_in_location: None,
                regularization: Regularization::None,
            })
            .await
            .unwrap();

        let leave = apply_leave(&store, emp.id, application(d(2026, 1, 10), d(2026, 1, 12)))
            .await
            .unwrap();
        review_leave(&store, &actor_for(&manager), leave.id, ReviewDecision::Approved)
            .await
            .unwrap();

        let records = store
            .attendance_between(emp.id, d(2026, 1, 10), d(2026, 1, 12))
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        assert!(
            records
                .iter()
                .all(|r| r.status == AttendanceStatus::OnLeave)
        );
    }

    #[actix_web::test]
    async fn cross_org_reviewer_sees_not_found() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let other_org = seed_org(&store).await;
        let manager =
            seed_employee(&store, &org, "boss", Role::ReportingManager, d(2024, 1, 1), None).await;
        let emp = seed_employee(
            &store,
            &org,
            "jane",
            Role::Employee,
            d(2025, 1, 1),
            Some(manager.id),
        )
        .await;
        let foreign_admin =
            seed_employee(&store, &other_org, "root", Role::SuperAdmin, d(2024, 1, 1), None).await;

        let leave = apply_leave(&store, emp.id, application(d(2026, 1, 10), d(2026, 1, 11)))
            .await
            .unwrap();
        let err = review_leave(
            &store,
            &actor_for(&foreign_admin),
            leave.id,
            ReviewDecision::Approved,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[actix_web::test]
    async fn review_race_applies_once() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let manager =
            seed_employee(&store, &org, "boss", Role::ReportingManager, d(2024, 1, 1), None).await;
        let emp = seed_employee(
            &store,
            &org,
            "jane",
            Role::Employee,
            d(2025, 1, 1),
            Some(manager.id),
        )
        .await;

        let leave = apply_leave(&store, emp.id, application(d(2026, 1, 10), d(2026, 1, 12)))
            .await
            .unwrap();

        let actor = actor_for(&manager);
        let results = futures::future::join_all(
            (0..4).map(|_| review_leave(&store, &actor, leave.id, ReviewDecision::Approved)),
        )
        .await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(store.employee(emp.id).await.unwrap().leave_taken, 3);
    }
}
