#![allow(dead_code)]

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use fake::{
    Fake,
    faker::{internet::en::SafeEmail, internet::en::Username, name::en::Name},
};
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use clinic_scheduler::AppState;
use clinic_scheduler::auth::{ActorContext, ActorRole, issue_token};
use clinic_scheduler::config::Config;
use clinic_scheduler::database::memory::{MemoryStore, MemoryTx};
use clinic_scheduler::database::repositories::{
    AppointmentFilter, AppointmentRepository, AvailabilityRepository, DirectoryRepository,
    LeaveFilter, LeaveRepository, ShiftRepository,
};
use clinic_scheduler::database::{ScheduleStore, ScheduleTx};
use clinic_scheduler::database::models::*;
use clinic_scheduler::handlers::shared::ApiResponse;
use clinic_scheduler::services::{AppointmentNotice, Collaborators, FixedClock, NotificationSink};

pub fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

pub fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// Every test runs on this day unless it builds its own clock.
pub fn today() -> NaiveDate {
    d(5, 30)
}

// Notification sinks
#[derive(Default)]
pub struct RecordingSink {
    pub notices: Mutex<Vec<AppointmentNotice>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<AppointmentNotice> {
        self.notices.lock().unwrap().last().cloned()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, notice: &AppointmentNotice) -> anyhow::Result<()> {
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

pub struct FailingSink;

impl NotificationSink for FailingSink {
    fn deliver(&self, _notice: &AppointmentNotice) -> anyhow::Result<()> {
        anyhow::bail!("mail relay unavailable")
    }
}

// Mock data generators
pub struct MockData;

impl MockData {
    pub fn hospital(code: &str) -> Hospital {
        Hospital {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: format!("{} General Hospital", code),
        }
    }

    pub fn department(hospital: &Hospital, code: &str, name: &str) -> Department {
        Department {
            id: Uuid::new_v4(),
            hospital_id: hospital.id,
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    pub fn staff(hospital: &Hospital, department: Option<&Department>, code: &str) -> StaffMember {
        StaffMember {
            id: Uuid::new_v4(),
            hospital_id: hospital.id,
            department_id: department.map(|d| d.id),
            code: code.to_string(),
            name: Name().fake(),
            email: SafeEmail().fake(),
            username: Username().fake(),
            role: "DOCTOR".to_string(),
            assignment_id: Uuid::new_v4(),
        }
    }

    pub fn patient(hospital: &Hospital, code: &str) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            hospital_id: Some(hospital.id),
            code: code.to_string(),
            name: Name().fake(),
            email: Some(SafeEmail().fake()),
            username: Some(Username().fake()),
        }
    }

    pub fn shift(
        staff: &StaffMember,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> ShiftInput {
        ShiftInput {
            staff_id: staff.id,
            hospital_id: None,
            department_id: None,
            date,
            start_time: start,
            end_time: end,
            shift_type: ShiftType::Custom,
            notes: None,
        }
    }

    pub fn leave(
        staff: &StaffMember,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LeaveRequestInput {
        LeaveRequestInput {
            staff_id: staff.id,
            hospital_id: None,
            department_id: None,
            leave_type: LeaveType::Annual,
            start_date,
            end_date,
            start_time: None,
            end_time: None,
            requires_coverage: false,
            reason: Some("Family trip".to_string()),
        }
    }

    pub fn booking(
        patient: &Patient,
        staff: &StaffMember,
        hospital: &Hospital,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> AppointmentInput {
        AppointmentInput {
            patient: patient.code.clone(),
            staff: staff.code.clone(),
            hospital: hospital.code.clone(),
            department: None,
            date,
            start_time: start,
            end_time: end,
            notes: None,
        }
    }
}

// Actors
pub struct Actors;

impl Actors {
    pub fn admin() -> ActorContext {
        ActorContext::global_admin(Uuid::new_v4())
    }

    pub fn hospital_admin(hospital: &Hospital) -> ActorContext {
        ActorContext {
            user_id: Uuid::new_v4(),
            role: ActorRole::HospitalAdmin,
            hospital_id: Some(hospital.id),
            department_id: None,
            staff_id: None,
            patient_id: None,
        }
    }

    pub fn department_head(department: &Department) -> ActorContext {
        ActorContext {
            user_id: Uuid::new_v4(),
            role: ActorRole::DepartmentHead,
            hospital_id: Some(department.hospital_id),
            department_id: Some(department.id),
            staff_id: None,
            patient_id: None,
        }
    }

    pub fn staff(staff: &StaffMember) -> ActorContext {
        ActorContext {
            user_id: Uuid::new_v4(),
            role: ActorRole::Staff,
            hospital_id: Some(staff.hospital_id),
            department_id: staff.department_id,
            staff_id: Some(staff.id),
            patient_id: None,
        }
    }

    pub fn patient(patient: &Patient) -> ActorContext {
        ActorContext {
            user_id: Uuid::new_v4(),
            role: ActorRole::Patient,
            hospital_id: patient.hospital_id,
            department_id: None,
            staff_id: None,
            patient_id: Some(patient.id),
        }
    }
}

// Authentication helpers
pub struct AuthHelper;

impl AuthHelper {
    pub fn create_test_token(actor: &ActorContext, config: &Config) -> Result<String> {
        issue_token(actor, config)
    }

    pub fn auth_header(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }
}

// Test assertion helpers
pub struct TestAssertions;

impl TestAssertions {
    pub fn assert_success_response<T>(body: &[u8]) -> T
    where
        T: serde::de::DeserializeOwned,
    {
        let response: ApiResponse<T> =
            serde_json::from_slice(body).expect("Failed to parse JSON response");

        assert!(
            response.success,
            "Expected successful response but got error: {:?}",
            response.message
        );
        response.data.expect("Expected data in successful response")
    }

    pub fn assert_error_response(body: &[u8]) -> String {
        let response: ApiResponse<serde_json::Value> =
            serde_json::from_slice(body).expect("Failed to parse JSON response");

        assert!(!response.success, "Expected an error response");
        response.message.expect("Expected an error message")
    }
}

/// One hospital with a cardiology department, two doctors and a patient,
/// seeded into a fresh in-memory store.
pub struct TestContext {
    pub store: MemoryStore,
    pub config: Config,
    pub notices: Arc<RecordingSink>,
    pub hospital: Hospital,
    pub cardiology: Department,
    pub doctor: StaffMember,
    pub other_doctor: StaffMember,
    pub patient: Patient,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let hospital = MockData::hospital("GEN");
        let cardiology = MockData::department(&hospital, "CARD", "Cardiology");
        let doctor = MockData::staff(&hospital, Some(&cardiology), "DR-1");
        let other_doctor = MockData::staff(&hospital, Some(&cardiology), "DR-2");
        let patient = MockData::patient(&hospital, "PT-1");

        store.add_hospital(hospital.clone()).await;
        store.add_department(cardiology.clone()).await;
        store.add_staff(doctor.clone()).await;
        store.add_staff(other_doctor.clone()).await;
        store.add_patient(patient.clone()).await;

        TestContext {
            store,
            config: Config::test_config(),
            notices: Arc::new(RecordingSink::default()),
            hospital,
            cardiology,
            doctor,
            other_doctor,
            patient,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::from_config(&self.config)
            .with_clock(FixedClock(today().and_hms_opt(8, 0, 0).unwrap()))
            .with_notifications(self.notices.clone())
    }

    pub fn state(&self) -> AppState<MemoryStore> {
        AppState::with_collaborators(self.store.clone(), self.collaborators())
    }

    pub fn state_with(&self, collaborators: Collaborators) -> AppState<MemoryStore> {
        AppState::with_collaborators(self.store.clone(), collaborators)
    }

    pub async fn add_staff_elsewhere(&self, code: &str) -> (Hospital, StaffMember) {
        let hospital = MockData::hospital(&format!("H-{}", code));
        let staff = MockData::staff(&hospital, None, code);
        self.store.add_hospital(hospital.clone()).await;
        self.store.add_staff(staff.clone()).await;
        (hospital, staff)
    }
}

/// Wraps a `MemoryStore` so that the `fail_on`-th shift update (1-based,
/// counted across transactions) returns a database error.
#[derive(Clone)]
pub struct ShiftUpdateFailingStore {
    inner: MemoryStore,
    fail_on: usize,
    updates: Arc<AtomicUsize>,
}

impl ShiftUpdateFailingStore {
    pub fn new(inner: MemoryStore, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            updates: Arc::new(AtomicUsize::new(0)),
        }
    }
}

pub struct ShiftUpdateFailingTx {
    inner: MemoryTx,
    fail_on: usize,
    updates: Arc<AtomicUsize>,
}

impl ScheduleStore for ShiftUpdateFailingStore {
    type Tx = ShiftUpdateFailingTx;

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error> {
        Ok(ShiftUpdateFailingTx {
            inner: self.inner.begin().await?,
            fail_on: self.fail_on,
            updates: self.updates.clone(),
        })
    }
}

impl ScheduleTx for ShiftUpdateFailingTx {
    async fn commit(self) -> Result<(), sqlx::Error> {
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        self.inner.rollback().await
    }
}

impl ShiftRepository for ShiftUpdateFailingTx {
    async fn insert_shift(&mut self, shift: &Shift) -> Result<Shift, sqlx::Error> {
        self.inner.insert_shift(shift).await
    }

    async fn update_shift(&mut self, shift: &Shift) -> Result<Shift, sqlx::Error> {
        if self.updates.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
            return Err(sqlx::Error::Protocol("shift update failed".to_string()));
        }
        self.inner.update_shift(shift).await
    }

    async fn find_shift(&mut self, id: Uuid) -> Result<Option<Shift>, sqlx::Error> {
        self.inner.find_shift(id).await
    }

    async fn find_shifts_for_staff_on(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error> {
        self.inner.find_shifts_for_staff_on(staff_id, date).await
    }

    async fn find_scheduled_shifts_between(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error> {
        self.inner
            .find_scheduled_shifts_between(staff_id, start_date, end_date)
            .await
    }

    async fn list_shifts(
        &mut self,
        scope: ScheduleScope,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error> {
        self.inner.list_shifts(scope, start_date, end_date).await
    }
}

impl AvailabilityRepository for ShiftUpdateFailingTx {
    async fn find_availability(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<StaffAvailability>, sqlx::Error> {
        self.inner.find_availability(staff_id, date).await
    }

    async fn list_availability(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<StaffAvailability>, sqlx::Error> {
        self.inner
            .list_availability(staff_id, start_date, end_date)
            .await
    }

    async fn save_availability(
        &mut self,
        availability: &StaffAvailability,
    ) -> Result<StaffAvailability, sqlx::Error> {
        self.inner.save_availability(availability).await
    }
}

impl LeaveRepository for ShiftUpdateFailingTx {
    async fn insert_leave(
        &mut self,
        leave: &StaffLeaveRequest,
    ) -> Result<StaffLeaveRequest, sqlx::Error> {
        self.inner.insert_leave(leave).await
    }

    async fn update_leave(
        &mut self,
        leave: &StaffLeaveRequest,
    ) -> Result<StaffLeaveRequest, sqlx::Error> {
        self.inner.update_leave(leave).await
    }

    async fn find_leave(&mut self, id: Uuid) -> Result<Option<StaffLeaveRequest>, sqlx::Error> {
        self.inner.find_leave(id).await
    }

    async fn find_active_leave_between(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<StaffLeaveRequest>, sqlx::Error> {
        self.inner
            .find_active_leave_between(staff_id, start_date, end_date)
            .await
    }

    async fn list_leave(
        &mut self,
        scope: ScheduleScope,
        filter: &LeaveFilter,
    ) -> Result<Vec<StaffLeaveRequest>, sqlx::Error> {
        self.inner.list_leave(scope, filter).await
    }
}

impl AppointmentRepository for ShiftUpdateFailingTx {
    async fn insert_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<Appointment, sqlx::Error> {
        self.inner.insert_appointment(appointment).await
    }

    async fn update_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<Appointment, sqlx::Error> {
        self.inner.update_appointment(appointment).await
    }

    async fn find_appointment(&mut self, id: Uuid) -> Result<Option<Appointment>, sqlx::Error> {
        self.inner.find_appointment(id).await
    }

    async fn find_appointments_for_staff_on(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        self.inner.find_appointments_for_staff_on(staff_id, date).await
    }

    async fn list_appointments(
        &mut self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        self.inner.list_appointments(filter).await
    }
}

impl DirectoryRepository for ShiftUpdateFailingTx {
    async fn find_hospital(&mut self, lookup: Lookup<'_>) -> Result<Option<Hospital>, sqlx::Error> {
        self.inner.find_hospital(lookup).await
    }

    async fn find_department(
        &mut self,
        hospital_id: Uuid,
        lookup: Lookup<'_>,
    ) -> Result<Option<Department>, sqlx::Error> {
        self.inner.find_department(hospital_id, lookup).await
    }

    async fn find_department_by_id(&mut self, id: Uuid) -> Result<Option<Department>, sqlx::Error> {
        self.inner.find_department_by_id(id).await
    }

    async fn find_staff(&mut self, lookup: Lookup<'_>) -> Result<Option<StaffMember>, sqlx::Error> {
        self.inner.find_staff(lookup).await
    }

    async fn find_patient(&mut self, lookup: Lookup<'_>) -> Result<Option<Patient>, sqlx::Error> {
        self.inner.find_patient(lookup).await
    }

    async fn lock_staff_timeline(&mut self, staff_id: Uuid) -> Result<(), sqlx::Error> {
        self.inner.lock_staff_timeline(staff_id).await
    }
}

pub fn setup_test_env() {
    unsafe {
        env::set_var("RUST_LOG", "debug");
    }
    let _ = env_logger::builder().is_test(true).try_init();
}
