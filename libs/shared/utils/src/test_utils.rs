use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use shared_models::{Patient, Provider, User};

use crate::clock::FixedClock;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid test time")
}

pub fn datetime(day: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    day.and_time(time(hour, minute))
}

/// Clock pinned to 08:00 on 2025-06-01, well before the usual test dates.
pub fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(datetime(date(2025, 6, 1), 8, 0)))
}

pub struct TestUsers {
    pub doctor: User,
    pub other_doctor: User,
    pub patient: User,
    pub other_patient: User,
}

impl Default for TestUsers {
    fn default() -> Self {
        Self {
            doctor: User::doctor("D001", "Dr. Lim"),
            other_doctor: User::doctor("D002", "Dr. Aziz"),
            patient: User::patient("P1001", "Alice Tan"),
            other_patient: User::patient("P1002", "Bob Ng"),
        }
    }
}

impl TestUsers {
    pub fn provider(&self) -> Provider {
        self.doctor.as_provider().expect("doctor fixture")
    }

    pub fn other_provider(&self) -> Provider {
        self.other_doctor.as_provider().expect("doctor fixture")
    }

    pub fn patient(&self) -> Patient {
        self.patient.as_patient().expect("patient fixture")
    }

    pub fn other_patient(&self) -> Patient {
        self.other_patient.as_patient().expect("patient fixture")
    }
}
