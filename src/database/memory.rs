use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::database::{
    ScheduleStore, ScheduleTx,
    models::{
        Appointment, Department, Hospital, Lookup, Patient, ScheduleScope, Shift, ShiftStatus,
        StaffAvailability, StaffLeaveRequest, StaffMember,
    },
    repositories::{
        AppointmentFilter, AppointmentRepository, AvailabilityRepository, DirectoryRepository,
        LeaveFilter, LeaveRepository, ShiftRepository,
    },
};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub hospitals: Vec<Hospital>,
    pub departments: Vec<Department>,
    pub staff: Vec<StaffMember>,
    pub patients: Vec<Patient>,
    pub availability: Vec<StaffAvailability>,
    pub shifts: Vec<Shift>,
    pub leave: Vec<StaffLeaveRequest>,
    pub appointments: Vec<Appointment>,
}

/// Process-local store. Transactions are serialized and work on a copy of
/// the state that replaces the shared state only on commit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn add_hospital(&self, hospital: Hospital) {
        self.state.lock().await.hospitals.push(hospital);
    }

    pub async fn add_department(&self, department: Department) {
        self.state.lock().await.departments.push(department);
    }

    pub async fn add_staff(&self, staff: StaffMember) {
        self.state.lock().await.staff.push(staff);
    }

    pub async fn add_patient(&self, patient: Patient) {
        self.state.lock().await.patients.push(patient);
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl ScheduleStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }
}

impl ScheduleTx for MemoryTx {
    async fn commit(self) -> Result<(), sqlx::Error> {
        let MemoryTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

fn replace<T, F>(items: &mut [T], item: &T, same: F) -> Result<T, sqlx::Error>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    let slot = items
        .iter_mut()
        .find(|existing| same(existing))
        .ok_or(sqlx::Error::RowNotFound)?;
    *slot = item.clone();
    Ok(item.clone())
}

impl AvailabilityRepository for MemoryTx {
    async fn find_availability(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<StaffAvailability>, sqlx::Error> {
        Ok(self
            .working
            .availability
            .iter()
            .find(|a| a.staff_id == staff_id && a.date == date)
            .cloned())
    }

    async fn list_availability(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<StaffAvailability>, sqlx::Error> {
        let mut records: Vec<StaffAvailability> = self
            .working
            .availability
            .iter()
            .filter(|a| a.staff_id == staff_id && start_date <= a.date && a.date <= end_date)
            .cloned()
            .collect();
        records.sort_by_key(|a| a.date);
        Ok(records)
    }

    async fn save_availability(
        &mut self,
        availability: &StaffAvailability,
    ) -> Result<StaffAvailability, sqlx::Error> {
        let existing = self
            .working
            .availability
            .iter_mut()
            .find(|a| a.staff_id == availability.staff_id && a.date == availability.date);

        match existing {
            Some(record) => {
                record.available_from = availability.available_from;
                record.available_to = availability.available_to;
                record.day_off = availability.day_off;
                record.provisioned = availability.provisioned;
                record.updated_at = availability.updated_at;
                Ok(record.clone())
            }
            None => {
                self.working.availability.push(availability.clone());
                Ok(availability.clone())
            }
        }
    }
}

impl ShiftRepository for MemoryTx {
    async fn insert_shift(&mut self, shift: &Shift) -> Result<Shift, sqlx::Error> {
        self.working.shifts.push(shift.clone());
        Ok(shift.clone())
    }

    async fn update_shift(&mut self, shift: &Shift) -> Result<Shift, sqlx::Error> {
        replace(&mut self.working.shifts, shift, |s| s.id == shift.id)
    }

    async fn find_shift(&mut self, id: Uuid) -> Result<Option<Shift>, sqlx::Error> {
        Ok(self.working.shifts.iter().find(|s| s.id == id).cloned())
    }

    async fn find_shifts_for_staff_on(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error> {
        let mut shifts: Vec<Shift> = self
            .working
            .shifts
            .iter()
            .filter(|s| s.staff_id == staff_id && s.date == date)
            .cloned()
            .collect();
        shifts.sort_by_key(|s| s.start_time);
        Ok(shifts)
    }

    async fn find_scheduled_shifts_between(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error> {
        let mut shifts: Vec<Shift> = self
            .working
            .shifts
            .iter()
            .filter(|s| {
                s.staff_id == staff_id
                    && s.status == ShiftStatus::Scheduled
                    && start_date <= s.date
                    && s.date <= end_date
            })
            .cloned()
            .collect();
        shifts.sort_by_key(|s| (s.date, s.start_time));
        Ok(shifts)
    }

    async fn list_shifts(
        &mut self,
        scope: ScheduleScope,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error> {
        let mut shifts: Vec<Shift> = self
            .working
            .shifts
            .iter()
            .filter(|s| start_date <= s.date && s.date <= end_date)
            .filter(|s| match scope {
                ScheduleScope::Staff(id) => s.staff_id == id,
                ScheduleScope::Department(id) => s.department_id == Some(id),
                ScheduleScope::Hospital(id) => s.hospital_id == id,
                ScheduleScope::All => true,
            })
            .cloned()
            .collect();
        shifts.sort_by_key(|s| (s.date, s.start_time));
        Ok(shifts)
    }
}

impl LeaveRepository for MemoryTx {
    async fn insert_leave(
        &mut self,
        leave: &StaffLeaveRequest,
    ) -> Result<StaffLeaveRequest, sqlx::Error> {
        self.working.leave.push(leave.clone());
        Ok(leave.clone())
    }

    async fn update_leave(
        &mut self,
        leave: &StaffLeaveRequest,
    ) -> Result<StaffLeaveRequest, sqlx::Error> {
        replace(&mut self.working.leave, leave, |l| l.id == leave.id)
    }

    async fn find_leave(&mut self, id: Uuid) -> Result<Option<StaffLeaveRequest>, sqlx::Error> {
        Ok(self.working.leave.iter().find(|l| l.id == id).cloned())
    }

    async fn find_active_leave_between(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<StaffLeaveRequest>, sqlx::Error> {
        let mut leave: Vec<StaffLeaveRequest> = self
            .working
            .leave
            .iter()
            .filter(|l| {
                l.staff_id == staff_id
                    && l.is_active()
                    && l.start_date <= end_date
                    && l.end_date >= start_date
            })
            .cloned()
            .collect();
        leave.sort_by_key(|l| l.start_date);
        Ok(leave)
    }

    async fn list_leave(
        &mut self,
        scope: ScheduleScope,
        filter: &LeaveFilter,
    ) -> Result<Vec<StaffLeaveRequest>, sqlx::Error> {
        let mut leave: Vec<StaffLeaveRequest> = self
            .working
            .leave
            .iter()
            .filter(|l| match scope {
                ScheduleScope::Staff(id) => l.staff_id == id,
                ScheduleScope::Department(id) => l.department_id == Some(id),
                ScheduleScope::Hospital(id) => l.hospital_id == id,
                ScheduleScope::All => true,
            })
            .filter(|l| filter.status.is_none_or(|status| l.status == status))
            .filter(|l| filter.start_date.is_none_or(|start| l.end_date >= start))
            .filter(|l| filter.end_date.is_none_or(|end| l.start_date <= end))
            .cloned()
            .collect();
        leave.sort_by_key(|l| (l.start_date, l.created_at));
        Ok(leave)
    }
}

impl AppointmentRepository for MemoryTx {
    async fn insert_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<Appointment, sqlx::Error> {
        self.working.appointments.push(appointment.clone());
        Ok(appointment.clone())
    }

    async fn update_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<Appointment, sqlx::Error> {
        replace(&mut self.working.appointments, appointment, |a| {
            a.id == appointment.id
        })
    }

    async fn find_appointment(&mut self, id: Uuid) -> Result<Option<Appointment>, sqlx::Error> {
        Ok(self.working.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn find_appointments_for_staff_on(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        let mut appointments: Vec<Appointment> = self
            .working
            .appointments
            .iter()
            .filter(|a| a.staff_id == staff_id && a.date == date)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.start_time);
        Ok(appointments)
    }

    async fn list_appointments(
        &mut self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        let mut appointments: Vec<Appointment> = self
            .working
            .appointments
            .iter()
            .filter(|a| filter.staff_id.is_none_or(|id| a.staff_id == id))
            .filter(|a| filter.patient_id.is_none_or(|id| a.patient_id == id))
            .filter(|a| filter.hospital_id.is_none_or(|id| a.hospital_id == id))
            .filter(|a| filter.start_date <= a.date && a.date <= filter.end_date)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| (a.date, a.start_time));
        Ok(appointments)
    }
}

impl DirectoryRepository for MemoryTx {
    async fn find_hospital(&mut self, lookup: Lookup<'_>) -> Result<Option<Hospital>, sqlx::Error> {
        Ok(self
            .working
            .hospitals
            .iter()
            .find(|h| match lookup {
                Lookup::Id(id) => h.id == id,
                Lookup::Code(_) => lookup.matches_text(&h.code),
                Lookup::Name(_) => lookup.matches_text(&h.name),
                Lookup::Email(_) | Lookup::Username(_) => false,
            })
            .cloned())
    }

    async fn find_department(
        &mut self,
        hospital_id: Uuid,
        lookup: Lookup<'_>,
    ) -> Result<Option<Department>, sqlx::Error> {
        Ok(self
            .working
            .departments
            .iter()
            .filter(|d| d.hospital_id == hospital_id)
            .find(|d| match lookup {
                Lookup::Id(id) => d.id == id,
                Lookup::Code(_) => lookup.matches_text(&d.code),
                Lookup::Name(_) => lookup.matches_text(&d.name),
                Lookup::Email(_) | Lookup::Username(_) => false,
            })
            .cloned())
    }

    async fn find_department_by_id(&mut self, id: Uuid) -> Result<Option<Department>, sqlx::Error> {
        Ok(self.working.departments.iter().find(|d| d.id == id).cloned())
    }

    async fn find_staff(&mut self, lookup: Lookup<'_>) -> Result<Option<StaffMember>, sqlx::Error> {
        Ok(self
            .working
            .staff
            .iter()
            .find(|s| match lookup {
                Lookup::Id(id) => s.id == id,
                Lookup::Code(_) => lookup.matches_text(&s.code),
                Lookup::Name(_) => lookup.matches_text(&s.name),
                Lookup::Email(_) => lookup.matches_text(&s.email),
                Lookup::Username(_) => lookup.matches_text(&s.username),
            })
            .cloned())
    }

    async fn find_patient(&mut self, lookup: Lookup<'_>) -> Result<Option<Patient>, sqlx::Error> {
        Ok(self
            .working
            .patients
            .iter()
            .find(|p| match lookup {
                Lookup::Id(id) => p.id == id,
                Lookup::Code(_) => lookup.matches_text(&p.code),
                Lookup::Name(_) => lookup.matches_text(&p.name),
                Lookup::Email(_) => p.email.as_deref().is_some_and(|e| lookup.matches_text(e)),
                Lookup::Username(_) => p
                    .username
                    .as_deref()
                    .is_some_and(|u| lookup.matches_text(u)),
            })
            .cloned())
    }

    async fn lock_staff_timeline(&mut self, _staff_id: Uuid) -> Result<(), sqlx::Error> {
        // The transaction already holds the store-wide lock.
        Ok(())
    }
}
