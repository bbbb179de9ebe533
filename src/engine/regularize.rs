use chrono::{NaiveDate, NaiveDateTime};

use crate::auth::actor::Actor;
use crate::engine::leave::{ReviewDecision, authorize_reviewer};
use crate::error::EngineError;
use crate::model::attendance::{AttendanceStatus, Regularization};
use crate::store::{NewAttendance, RegularizationReview, Store, StoreError};

#[derive(Debug, Clone)]
pub struct RegularizationApplication {
    pub date: NaiveDate,
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub reason: String,
}

fn validate_application(
    application: &RegularizationApplication,
    join_date: NaiveDate,
    today: NaiveDate,
) -> Result<(), EngineError> {
    if application.date > today {
        return Err(EngineError::validation("cannot regularize a future date"));
    }
    if application.date < join_date {
        return Err(EngineError::validation("date is before joining date"));
    }
    if application.check_out <= application.check_in {
        return Err(EngineError::validation("check-out must be after check-in"));
    }
    if application.check_in.date() != application.date {
        return Err(EngineError::validation(
            "requested times must fall on the requested date",
        ));
    }
    Ok(())
}

/// Files a correction request against one day's record, creating the record
/// if the day has none.
pub async fn apply_regularization(
    store: &dyn Store,
    employee_id: u64,
    application: RegularizationApplication,
    today: NaiveDate,
) -> Result<(), EngineError> {
    let employee = store.employee(employee_id).await?;
    if !employee.is_active {
        return Err(EngineError::forbidden("employee is not active"));
    }

    validate_application(&application, employee.join_date, today)?;

    // Mutual exclusion with the leave workflow: a day under a pending or
    // approved leave cannot be regularized.
    if store
        .overlapping_leave(employee_id, application.date, application.date)
        .await?
        .is_some()
    {
        return Err(EngineError::conflict("leave already covers this date"));
    }

    let pending = Regularization::Pending {
        check_in: application.check_in,
        check_out: application.check_out,
        reason: application.reason,
    };

    match store.attendance_on(employee_id, application.date).await? {
        Some(record) if record.is_regularized() => {
            Err(EngineError::conflict("already regularized on this date"))
        }
        Some(record) if record.regularization.is_pending() => Err(EngineError::conflict(
            "a regularization request is already pending for this date",
        )),
        Some(record) => {
            store
                .request_regularization(record.id, AttendanceStatus::PendingRegularize, pending)
                .await?;
            Ok(())
        }
        None => {
            let result = store
                .insert_attendance(NewAttendance {
                    organization_id: employee.organization_id,
                    employee_id,
                    date: application.date,
                    status: AttendanceStatus::PendingRegularize,
                    check_in: None,
                    check_in_location: None,
                    regularization: pending,
                })
                .await;
            match result {
                Ok(_) => Ok(()),
                Err(StoreError::Duplicate) => Err(EngineError::conflict(
                    "a regularization request is already pending for this date",
                )),
                Err(e) => Err(e.into()),
            }
        }
    }
}

/// Resolves a pending correction. Approval moves the requested times onto
/// the record and recomputes its worked hours; rejection leaves the live
/// times untouched. Either way the outer status and the regularization state
/// land in one guarded write.
pub async fn review_regularization(
    store: &dyn Store,
    actor: &Actor,
    attendance_id: u64,
    decision: ReviewDecision,
) -> Result<(), EngineError> {
    let record = store.attendance(attendance_id).await?;
    if record.organization_id != actor.organization_id {
        return Err(EngineError::not_found("attendance record not found"));
    }

    let employee = store.employee(record.employee_id).await?;
    authorize_reviewer(actor, &employee)?;

    let (check_in, check_out, reason) = match &record.regularization {
        Regularization::Pending {
            check_in,
            check_out,
            reason,
        } => (*check_in, *check_out, reason.clone()),
        _ => {
            return Err(EngineError::conflict(
                "no pending regularization for this record",
            ));
        }
    };

    let review = match decision {
        ReviewDecision::Approved => {
            let worked_hours = (check_out - check_in).num_seconds() as f64 / 3600.0;
            RegularizationReview {
                status: AttendanceStatus::ApprovedRegularise,
                regularization: Regularization::Approved {
                    check_in,
                    check_out,
                    reason,
                    approved_by: actor.employee_id,
                },
                check_in: Some(check_in),
                check_out: Some(check_out),
                work_hours: Some(worked_hours),
            }
        }
        ReviewDecision::Rejected => RegularizationReview {
            status: AttendanceStatus::RejectRegularise,
            regularization: Regularization::Rejected {
                reason,
                rejected_by: actor.employee_id,
            },
            check_in: None,
            check_out: None,
            work_hours: None,
        },
    };

    store
        .apply_regularization_review(record.id, review)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::checkin;
    use crate::engine::leave::{self, LeaveApplication};
    use crate::engine::testutil::{OFFICE, d, dt, seed_employee, seed_org};
    use crate::model::employee::{Employee, Role};
    use crate::model::leave::LeaveType;
    use crate::store::memory::MemoryStore;

    const TODAY: (i32, u32, u32) = (2026, 1, 20);

    fn today() -> NaiveDate {
        d(TODAY.0, TODAY.1, TODAY.2)
    }

    fn actor_for(employee: &Employee) -> Actor {
        Actor {
            employee_id: employee.id,
            organization_id: employee.organization_id,
            role: employee.role,
        }
    }

    fn application(date: NaiveDate) -> RegularizationApplication {
        RegularizationApplication {
            date,
            check_in: date.and_hms_opt(9, 0, 0).unwrap(),
            check_out: date.and_hms_opt(18, 0, 0).unwrap(),
            reason: "forgot to check in".into(),
        }
    }

    #[actix_web::test]
    async fn future_date_is_rejected() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let emp = seed_employee(&store, &org, "jane", Role::Employee, d(2025, 1, 1), None).await;

        let err = apply_regularization(&store, emp.id, application(d(2026, 1, 25)), today())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[actix_web::test]
    async fn date_before_join_is_rejected() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let emp = seed_employee(&store, &org, "jane", Role::Employee, d(2026, 1, 10), None).await;

        let err = apply_regularization(&store, emp.id, application(d(2026, 1, 5)), today())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[actix_web::test]
    async fn day_under_leave_cannot_be_regularized() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let emp = seed_employee(&store, &org, "jane", Role::Employee, d(2025, 1, 1), None).await;

        leave::apply_leave(
            &store,
            emp.id,
            LeaveApplication {
                leave_type: LeaveType::Casual,
                start_date: d(2026, 1, 10),
                end_date: d(2026, 1, 12),
                reason: None,
            },
        )
        .await
        .unwrap();

        let err = apply_regularization(&store, emp.id, application(d(2026, 1, 11)), today())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[actix_web::test]
    async fn apply_then_approve_regularizes_the_record() {
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

        // no record exists for the day yet
        apply_regularization(&store, emp.id, application(d(2026, 1, 14)), today())
            .await
            .unwrap();

        let pending = store
            .attendance_on(emp.id, d(2026, 1, 14))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pending.status, AttendanceStatus::PendingRegularize);
        assert!(pending.regularization.is_pending());
        assert!(pending.check_in.is_none());

        review_regularization(
            &store,
            &actor_for(&manager),
            pending.id,
            ReviewDecision::Approved,
        )
        .await
        .unwrap();

        let record = store.attendance(pending.id).await.unwrap();
        assert!(record.is_regularized());
        assert_eq!(record.status, AttendanceStatus::ApprovedRegularise);
        assert_eq!(record.check_in, Some(dt(2026, 1, 14, 9, 0)));
        assert_eq!(record.check_out, Some(dt(2026, 1, 14, 18, 0)));
        assert!((record.work_hours.unwrap() - 9.0).abs() < 1e-9);
        match record.regularization {
            Regularization::Approved { approved_by, .. } => assert_eq!(approved_by, manager.id),
            other => panic!("expected approved regularization, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn rejection_keeps_live_times() {
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

        // a short day already checked in/out, now disputed
        checkin::check_in(&store, emp.id, OFFICE, dt(2026, 1, 14, 9, 0))
            .await
            .unwrap();
        checkin::check_out(&store, emp.id, OFFICE, dt(2026, 1, 14, 12, 0))
            .await
            .unwrap();

        let mut request = application(d(2026, 1, 14));
        request.check_out = dt(2026, 1, 14, 18, 0);
        apply_regularization(&store, emp.id, request, d(2026, 1, 15))
            .await
            .unwrap();

        let record = store
            .attendance_on(emp.id, d(2026, 1, 14))
            .await
            .unwrap()
            .unwrap();
        review_regularization(
            &store,
            &actor_for(&manager),
            record.id,
            ReviewDecision::Rejected,
        )
        .await
        .unwrap();

        let record = store.attendance(record.id).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::RejectRegularise);
        assert!(!record.is_regularized());
        // live times still those of the actual short day
        assert_eq!(record.check_in, Some(dt(2026, 1, 14, 9, 0)));
        assert_eq!(record.check_out, Some(dt(2026, 1, 14, 12, 0)));
    }

    #[actix_web::test]
    async fn duplicate_pending_request_conflicts() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let emp = seed_employee(&store, &org, "jane", Role::Employee, d(2025, 1, 1), None).await;

        apply_regularization(&store, emp.id, application(d(2026, 1, 14)), today())
            .await
            .unwrap();
        let err = apply_regularization(&store, emp.id, application(d(2026, 1, 14)), today())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[actix_web::test]
    async fn concurrent_reviews_apply_once() {
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

        apply_regularization(&store, emp.id, application(d(2026, 1, 14)), today())
            .await
            .unwrap();
        let record = store
            .attendance_on(emp.id, d(2026, 1, 14))
            .await
            .unwrap()
            .unwrap();

        let actor = actor_for(&manager);
        let results = futures::future::join_all((0..4).map(|_| {
            review_regularization(&store, &actor, record.id, ReviewDecision::Approved)
        }))
        .await;
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    }

    #[actix_web::test]
    async fn employee_role_cannot_review() {
        let store = MemoryStore::new();
        let org = seed_org(&store).await;
        let emp = seed_employee(&store, &org, "jane", Role::Employee, d(2025, 1, 1), None).await;
        let peer = seed_employee(&store, &org, "bob", Role::Employee, d(2025, 1, 1), None).await;

        apply_regularization(&store, emp.id, application(d(2026, 1, 14)), today())
            .await
            .unwrap();
        let record = store
            .attendance_on(emp.id, d(2026, 1, 14))
            .await
            .unwrap()
            .unwrap();

        let err = review_regularization(
            &store,
            &actor_for(&peer),
            record.id,
            ReviewDecision::Approved,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }
}
