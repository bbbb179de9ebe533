pub mod checkin;
pub mod day_status;
pub mod geo;
pub mod leave;
pub mod month;
pub mod payroll;
pub mod regularize;

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::model::employee::{Employee, Role};
    use crate::model::geo::GeoPoint;
    use crate::model::organization::Organization;
    use crate::store::memory::MemoryStore;
    use crate::store::{NewEmployee, NewOrganization, Store};

    pub(crate) const OFFICE: GeoPoint = GeoPoint {
        latitude: 22.3569,
        longitude: 91.7832,
    };

    pub(crate) fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    pub(crate) fn dt(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
        d(y, m, day).and_hms_opt(h, min, 0).unwrap()
    }

    pub(crate) async fn seed_org(store: &MemoryStore) -> Organization {
        store
            .insert_organization(NewOrganization {
                name: "Acme Traders".into(),
                contact_email: "hr@acme.example".into(),
                location: OFFICE,
                checkin_time: "09:00".into(),
                checkout_time: "18:00".into(),
                week_off: None,
            })
            .await
            .unwrap()
    }

    pub(crate) async fn seed_employee(
        store: &MemoryStore,
        org: &Organization,
        username: &str,
        role: Role,
        join_date: NaiveDate,
        reporting_manager: Option<u64>,
    ) -> Employee {
        store
            .insert_employee(NewEmployee {
                organization_id: org.id,
                name: username.to_owned(),
                username: username.to_owned(),
                email: format!("{username}@acme.example"),
                password_hash: String::new(),
                role,
                salary: 30_000.0,
                join_date,
                work_hours: 8.0,
                alloted_leave: 18,
                reporting_manager,
            })
            .await
            .unwrap()
    }
}
