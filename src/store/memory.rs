//! Mutex-guarded in-memory store. Single-process stand-in for the MySQL
//! store with identical semantics: every multi-step write runs inside one
//! critical section, so the atomicity contract of [`Store`] holds.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};

use super::{
    CheckOutUpdate, LeaveListFilter, LeaveReview, NewAttendance, NewEmployee, NewLeave,
    NewOrganization, RegularizationReview, Store, StoreError,
};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Regularization};
use crate::model::employee::Employee;
use crate::model::geo::GeoPoint;
use crate::model::leave::{LeaveRequest, LeaveStatus};
use crate::model::organization::{Holiday, Organization};

#[derive(Default)]
struct State {
    organizations: HashMap<u64, Organization>,
    employees: HashMap<u64, Employee>,
    attendance: HashMap<u64, AttendanceRecord>,
    attendance_by_day: HashMap<(u64, NaiveDate), u64>,
    leaves: HashMap<u64, LeaveRequest>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Flips an employee's active flag in place. Not part of [`Store`]; the
    /// engine only reads the flag, lifecycle changes arrive out of band.
    #[cfg(test)]
    pub fn set_employee_active(&self, employee_id: u64, is_active: bool) {
        if let Some(employee) = self.state().employees.get_mut(&employee_id) {
            employee.is_active = is_active;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_organization(&self, new: NewOrganization) -> Result<Organization, StoreError> {
        let mut state = self.state();
        let org = Organization {
            id: state.next_id(),
            name: new.name,
            contact_email: new.contact_email,
            location: new.location,
            checkin_time: new.checkin_time,
            checkout_time: new.checkout_time,
            week_off: new.week_off,
            holidays: vec![],
            is_active: true,
        };
        state.organizations.insert(org.id, org.clone());
        Ok(org)
    }

    async fn organization(&self, id: u64) -> Result<Organization, StoreError> {
        self.state()
            .organizations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("organization"))
    }

    async fn add_holiday(&self, organization_id: u64, holiday: Holiday) -> Result<(), StoreError> {
        let mut state = self.state();
        let org = state
            .organizations
            .get_mut(&organization_id)
            .ok_or(StoreError::NotFound("organization"))?;
        org.holidays.push(holiday);
        Ok(())
    }

    async fn deactivate_organization(&self, id: u64) -> Result<(), StoreError> {
        let mut state = self.state();
        let org = state
            .organizations
            .get_mut(&id)
            .ok_or(StoreError::NotFound("organization"))?;
        org.is_active = false;
        Ok(())
    }

    async fn insert_employee(&self, new: NewEmployee) -> Result<Employee, StoreError> {
        let mut state = self.state();
        if state.employees.values().any(|e| e.username == new.username) {
            return Err(StoreError::Duplicate);
        }
        let employee = Employee {
            id: state.next_id(),
            organization_id: new.organization_id,
            name: new.name,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            is_active: true,
            salary: new.salary,
            join_date: new.join_date,
            work_hours: new.work_hours,
            alloted_leave: new.alloted_leave,
            leave_taken: 0,
            reporting_manager: new.reporting_manager,
        };
        state.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    async fn employee(&self, id: u64) -> Result<Employee, StoreError> {
        self.state()
            .employees
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("employee"))
    }

    async fn employee_by_username(&self, username: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self
            .state()
            .employees
            .values()
            .find(|e| e.username == username)
            .cloned())
    }

    async fn attendance(&self, id: u64) -> Result<AttendanceRecord, StoreError> {
        self.state()
            .attendance
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("attendance record"))
    }

    async fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let state = self.state();
        Ok(state
            .attendance_by_day
            .get(&(employee_id, date))
            .and_then(|id| state.attendance.get(id))
            .cloned())
    }

    async fn attendance_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let state = self.state();
        let mut records: Vec<AttendanceRecord> = state
            .attendance
            .values()
            .filter(|r| r.employee_id == employee_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    async fn insert_attendance(&self, new: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let mut state = self.state();
        let key = (new.employee_id, new.date);
        if state.attendance_by_day.contains_key(&key) {
            return Err(StoreError::Duplicate);
        }
        let record = AttendanceRecord {
            id: state.next_id(),
            organization_id: new.organization_id,
            employee_id: new.employee_id,
            date: new.date,
            status: new.status,
            check_in: new.check_in,
            check_out: None,
            check_in_location: new.check_in_location,
            check_out_location: None,
            work_hours: None,
            regularization: new.regularization,
        };
        state.attendance_by_day.insert(key, record.id);
        state.attendance.insert(record.id, record.clone());
        Ok(record)
    }

    async fn record_check_in(
        &self,
        record_id: u64,
        at: NaiveDateTime,
        location: GeoPoint,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let record = state
            .attendance
            .get_mut(&record_id)
            .ok_or(StoreError::NotFound("attendance record"))?;
        record.check_in = Some(at);
        record.check_in_location = Some(location);
        record.status = AttendanceStatus::CheckedIn;
        Ok(())
    }

    async fn record_check_out(
        &self,
        record_id: u64,
        update: CheckOutUpdate,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let record = state
            .attendance
            .get_mut(&record_id)
            .ok_or(StoreError::NotFound("attendance record"))?;
        record.check_out = Some(update.at);
        record.check_out_location = Some(update.location);
        record.status = update.status;
        record.work_hours = Some(update.work_hours);
        Ok(())
    }

    async fn request_regularization(
        &self,
        record_id: u64,
        status: AttendanceStatus,
        regularization: Regularization,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let record = state
            .attendance
            .get_mut(&record_id)
            .ok_or(StoreError::NotFound("attendance record"))?;
        record.status = status;
        record.regularization = regularization;
        Ok(())
    }

    async fn apply_regularization_review(
        &self,
        record_id: u64,
        review: RegularizationReview,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let record = state
            .attendance
            .get_mut(&record_id)
            .ok_or(StoreError::NotFound("attendance record"))?;
        if !record.regularization.is_pending() {
            return Err(StoreError::Stale);
        }
        record.status = review.status;
        record.regularization = review.regularization;
        if let Some(check_in) = review.check_in {
            record.check_in = Some(check_in);
        }
        if let Some(check_out) = review.check_out {
            record.check_out = Some(check_out);
        }
        if let Some(work_hours) = review.work_hours {
            record.work_hours = Some(work_hours);
        }
        Ok(())
    }

    async fn pending_regularizations(
        &self,
        organization_id: u64,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let state = self.state();
        let mut records: Vec<AttendanceRecord> = state
            .attendance
            .values()
            .filter(|r| r.organization_id == organization_id && r.regularization.is_pending())
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    async fn insert_leave(&self, new: NewLeave) -> Result<LeaveRequest, StoreError> {
        let mut state = self.state();
        let leave = LeaveRequest {
            id: state.next_id(),
            organization_id: new.organization_id,
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            status: LeaveStatus::Pending,
            reason: new.reason,
            approved_by: None,
            applied_at: Utc::now().naive_utc(),
        };
        state.leaves.insert(leave.id, leave.clone());
        Ok(leave)
    }

    async fn leave(&self, id: u64) -> Result<LeaveRequest, StoreError> {
        self.state()
            .leaves
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("leave request"))
    }

    async fn overlapping_leave(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self
            .state()
            .leaves
            .values()
            .find(|l| {
                l.employee_id == employee_id
                    && !matches!(l.status, LeaveStatus::Rejected)
                    && l.start_date <= end
                    && l.end_date >= start
            })
            .cloned())
    }

    async fn leaves(
        &self,
        organization_id: u64,
        filter: LeaveListFilter,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let state = self.state();
        let mut leaves: Vec<LeaveRequest> = state
            .leaves
            .values()
            .filter(|l| l.organization_id == organization_id)
            .filter(|l| filter.employee_id.map_or(true, |id| l.employee_id == id))
            .filter(|l| filter.status.map_or(true, |s| l.status == s))
            .filter(|l| {
                filter.reporting_manager.map_or(true, |manager| {
                    state
                        .employees
                        .get(&l.employee_id)
                        .is_some_and(|e| e.reporting_manager == Some(manager))
                })
            })
            .cloned()
            .collect();
        leaves.sort_by_key(|l| std::cmp::Reverse(l.applied_at));
        Ok(leaves)
    }

    async fn apply_leave_review(
        &self,
        leave: &LeaveRequest,
        review: LeaveReview,
    ) -> Result<(), StoreError> {
        let mut state = self.state();

        // Validate every touched entity before the first mutation so the
        // critical section can never apply partially.
        if !state.employees.contains_key(&leave.employee_id) {
            return Err(StoreError::NotFound("employee"));
        }

        let stored = match state.leaves.get_mut(&leave.id) {
            None => return Err(StoreError::NotFound("leave request")),
            Some(stored) if stored.status.is_terminal() => return Err(StoreError::Stale),
            Some(stored) => stored,
        };
        stored.status = review.status;
        stored.approved_by = Some(review.approved_by);
        let (organization_id, employee_id) = (stored.organization_id, stored.employee_id);

        for date in &review.days {
            let key = (employee_id, *date);
            match state.attendance_by_day.get(&key).copied() {
                Some(record_id) => {
                    if let Some(record) = state.attendance.get_mut(&record_id) {
                        record.status = review.day_status;
                    }
                }
                None => {
                    let id = state.next_id();
                    let record = AttendanceRecord {
                        id,
                        organization_id,
                        employee_id,
                        date: *date,
                        status: review.day_status,
                        check_in: None,
                        check_out: None,
                        check_in_location: None,
                        check_out_location: None,
                        work_hours: None,
                        regularization: Regularization::None,
                    };
                    state.attendance_by_day.insert(key, id);
                    state.attendance.insert(id, record);
                }
            }
        }

        if review.leave_taken_delta > 0 {
            if let Some(employee) = state.employees.get_mut(&employee_id) {
                employee.leave_taken += review.leave_taken_delta;
            }
        }

        Ok(())
    }
}
