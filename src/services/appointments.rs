use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::auth::{ActorContext, ActorRole};
use crate::database::{
    ScheduleStore,
    models::{
        Appointment, AppointmentAction, AppointmentActionInput, AppointmentInput,
        AppointmentQuery, AppointmentStatus, Lookup,
    },
    repositories::{
        AppointmentFilter, AppointmentRepository, AvailabilityRepository, DirectoryRepository,
    },
    transaction,
};
use crate::error::AppError;
use crate::services::{
    Collaborators,
    authorization::require,
    availability::is_available_at,
    identity::{BookingParties, IdentityResolver, require_patient, require_staff},
    notification::{AppointmentNotice, NoticeKind},
    overlap::overlaps,
    scope::resolve_window,
};

/// Patient appointments against staff timelines.
pub struct AppointmentBook<S> {
    store: S,
    collaborators: Collaborators,
}

impl<S: ScheduleStore> AppointmentBook<S> {
    pub fn new(store: S, collaborators: Collaborators) -> Self {
        Self {
            store,
            collaborators,
        }
    }

    pub async fn create_appointment(
        &self,
        actor: &ActorContext,
        input: AppointmentInput,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self.create_appointment_in(&mut tx, actor, input).await;
        let (appointment, parties) = transaction::finish(tx, result).await?;

        log::info!(
            "Appointment {} booked with staff member {} on {} {}-{}",
            appointment.id,
            appointment.staff_id,
            appointment.date,
            appointment.start_time,
            appointment.end_time
        );
        self.notify(&appointment, &parties, NoticeKind::Created);
        Ok(appointment)
    }

    async fn create_appointment_in(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        input: AppointmentInput,
    ) -> Result<(Appointment, BookingParties), AppError> {
        let parties = self.resolve_parties(tx, actor, &input).await?;
        self.check_booking(tx, &parties, &input, None).await?;

        let now = self.collaborators.clock.now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: parties.patient.id,
            staff_id: parties.staff.id,
            hospital_id: parties.hospital.id,
            department_id: parties.department.as_ref().map(|d| d.id),
            date: input.date,
            start_time: input.start_time,
            end_time: input.end_time,
            status: AppointmentStatus::Scheduled,
            notes: input.notes,
            assignment_id: parties.staff.assignment_id,
            assigned_role: parties.staff.role.clone(),
            created_by: actor.user_id,
            created_at: now,
            updated_at: now,
        };

        let appointment = tx.insert_appointment(&appointment).await?;
        Ok((appointment, parties))
    }

    /// Reschedules or reassigns an appointment, re-running the booking checks.
    pub async fn update_appointment(
        &self,
        actor: &ActorContext,
        appointment_id: Uuid,
        input: AppointmentInput,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self
            .update_appointment_in(&mut tx, actor, appointment_id, input)
            .await;
        let (appointment, parties) = transaction::finish(tx, result).await?;

        log::info!(
            "Appointment {} rescheduled to {} {}-{} by {}",
            appointment.id,
            appointment.date,
            appointment.start_time,
            appointment.end_time,
            actor.user_id
        );
        self.notify(&appointment, &parties, NoticeKind::Rescheduled);
        Ok(appointment)
    }

    async fn update_appointment_in(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        appointment_id: Uuid,
        input: AppointmentInput,
    ) -> Result<(Appointment, BookingParties), AppError> {
        let existing = find_appointment(tx, appointment_id).await?;
        let current = self.stored_parties(tx, &existing).await?;
        require(
            self.collaborators
                .authorizer
                .can_book(actor, &current.patient, &current.staff),
            "Cannot change this appointment",
        )?;
        let parties = self.resolve_parties(tx, actor, &input).await?;

        if !existing.is_reschedulable() {
            return Err(AppError::NotEditable(format!(
                "Appointment {} is {} and can no longer be rescheduled",
                existing.id, existing.status
            )));
        }
        self.check_booking(tx, &parties, &input, Some(existing.id)).await?;

        let appointment = Appointment {
            patient_id: parties.patient.id,
            staff_id: parties.staff.id,
            hospital_id: parties.hospital.id,
            department_id: parties.department.as_ref().map(|d| d.id),
            date: input.date,
            start_time: input.start_time,
            end_time: input.end_time,
            notes: input.notes,
            assignment_id: parties.staff.assignment_id,
            assigned_role: parties.staff.role.clone(),
            updated_at: self.collaborators.clock.now(),
            ..existing
        };

        let appointment = tx.update_appointment(&appointment).await?;
        Ok((appointment, parties))
    }

    /// Applies a caller action such as `confirm` or `no_show`. Repeating the
    /// current status changes nothing and sends no notice.
    pub async fn change_status(
        &self,
        actor: &ActorContext,
        appointment_id: Uuid,
        input: AppointmentActionInput,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self
            .change_status_in(&mut tx, actor, appointment_id, &input.action)
            .await;
        let (appointment, changed) = transaction::finish(tx, result).await?;

        if let Some(parties) = changed {
            log::info!(
                "Appointment {} is now {} (changed by {})",
                appointment.id,
                appointment.status,
                actor.user_id
            );
            self.notify(&appointment, &parties, NoticeKind::StatusChanged);
        }
        Ok(appointment)
    }

    async fn change_status_in(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        appointment_id: Uuid,
        action: &str,
    ) -> Result<(Appointment, Option<BookingParties>), AppError> {
        let existing = find_appointment(tx, appointment_id).await?;
        let parties = self.stored_parties(tx, &existing).await?;
        require(
            self.collaborators
                .authorizer
                .can_book(actor, &parties.patient, &parties.staff),
            "Cannot change this appointment",
        )?;

        let action: AppointmentAction = action
            .parse()
            .map_err(|_| AppError::ValidationError(format!("Unknown action '{}'", action)))?;
        let status = action.target_status();
        if status == existing.status {
            return Ok((existing, None));
        }
        if !existing.holds_slot() {
            tx.lock_staff_timeline(existing.staff_id).await?;
            ensure_slot_free(
                tx,
                existing.staff_id,
                existing.date,
                (existing.start_time, existing.end_time),
                Some(existing.id),
            )
            .await?;
        }

        let appointment = Appointment {
            status,
            updated_at: self.collaborators.clock.now(),
            ..existing
        };
        let appointment = tx.update_appointment(&appointment).await?;
        Ok((appointment, Some(parties)))
    }

    pub async fn get_appointment(
        &self,
        actor: &ActorContext,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let appointment = find_appointment(&mut tx, appointment_id).await?;
            let patient = require_patient(&mut tx, appointment.patient_id).await?;
            let staff = require_staff(&mut tx, appointment.staff_id).await?;
            let authorizer = &self.collaborators.authorizer;
            require(
                authorizer.can_book(actor, &patient, &staff)
                    || authorizer.can_view_staff(actor, &staff),
                "Cannot view this appointment",
            )?;
            Ok::<_, AppError>(appointment)
        }
        .await;
        transaction::finish(tx, result).await
    }

    pub async fn list_appointments(
        &self,
        actor: &ActorContext,
        query: AppointmentQuery,
    ) -> Result<Vec<Appointment>, AppError> {
        let (start_date, end_date) = resolve_window(
            self.collaborators.clock.today(),
            self.collaborators.schedule_window_days,
            query.start_date,
            query.end_date,
        )?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let mut filter = AppointmentFilter {
                staff_id: None,
                patient_id: query.patient_id,
                hospital_id: None,
                start_date,
                end_date,
            };

            if actor.role == ActorRole::Patient {
                let own = actor.patient_id.ok_or_else(|| {
                    AppError::PermissionDenied("Caller is not linked to a patient".to_string())
                })?;
                require(
                    query.patient_id.is_none_or(|id| id == own),
                    "Patients can only list their own appointments",
                )?;
                filter.patient_id = Some(own);
                filter.staff_id = query.staff_id;
            } else if let Some(staff_id) = query.staff_id {
                let staff = require_staff(&mut tx, staff_id).await?;
                require(
                    self.collaborators.authorizer.can_view_staff(actor, &staff),
                    "Cannot view this staff member's appointments",
                )?;
                filter.staff_id = Some(staff.id);
            } else {
                match actor.role {
                    ActorRole::GlobalAdmin => {}
                    ActorRole::HospitalAdmin | ActorRole::DepartmentHead => {
                        filter.hospital_id = Some(actor.hospital_id.ok_or_else(|| {
                            AppError::PermissionDenied(
                                "Caller is not linked to a hospital".to_string(),
                            )
                        })?);
                    }
                    ActorRole::Staff | ActorRole::Patient => {
                        filter.staff_id = Some(actor.staff_id.ok_or_else(|| {
                            AppError::PermissionDenied(
                                "Caller is not linked to a staff member".to_string(),
                            )
                        })?);
                    }
                }
            }

            Ok::<_, AppError>(tx.list_appointments(&filter).await?)
        }
        .await;
        transaction::finish(tx, result).await
    }

    async fn resolve_parties(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        input: &AppointmentInput,
    ) -> Result<BookingParties, AppError> {
        let parties = IdentityResolver::new(tx)
            .booking(
                &input.patient,
                &input.staff,
                &input.hospital,
                input.department.as_deref(),
            )
            .await?;
        require(
            self.collaborators
                .authorizer
                .can_book(actor, &parties.patient, &parties.staff),
            "Cannot book appointments for this patient with this staff member",
        )?;
        Ok(parties)
    }

    async fn stored_parties(
        &self,
        tx: &mut S::Tx,
        appointment: &Appointment,
    ) -> Result<BookingParties, AppError> {
        let patient = require_patient(tx, appointment.patient_id).await?;
        let staff = require_staff(tx, appointment.staff_id).await?;
        let hospital = tx
            .find_hospital(Lookup::Id(appointment.hospital_id))
            .await?
            .ok_or_else(|| AppError::not_found("Hospital", appointment.hospital_id))?;
        let department = match appointment.department_id {
            Some(id) => tx.find_department(hospital.id, Lookup::Id(id)).await?,
            None => None,
        };

        Ok(BookingParties {
            patient,
            staff,
            hospital,
            department,
        })
    }

    /// Tenant, ordering, availability and overlap checks, in that order.
    async fn check_booking(
        &self,
        tx: &mut S::Tx,
        parties: &BookingParties,
        input: &AppointmentInput,
        editing: Option<Uuid>,
    ) -> Result<(), AppError> {
        let staff = &parties.staff;
        if staff.hospital_id != parties.hospital.id {
            return Err(AppError::ValidationError(format!(
                "{} does not work at {}",
                staff.name, parties.hospital.name
            )));
        }
        if input.end_time <= input.start_time {
            return Err(AppError::ValidationError(
                "Appointment end time must be after start time".to_string(),
            ));
        }

        tx.lock_staff_timeline(staff.id).await?;

        let availability = tx.find_availability(staff.id, input.date).await?;
        if !is_available_at(availability.as_ref(), input.start_time) {
            return Err(AppError::AvailabilityViolation(format!(
                "{} is not available at {} on {}",
                staff.name, input.start_time, input.date
            )));
        }

        ensure_slot_free(
            tx,
            staff.id,
            input.date,
            (input.start_time, input.end_time),
            editing,
        )
        .await
    }

    /// Delivery happens after commit; failures are logged and dropped.
    fn notify(&self, appointment: &Appointment, parties: &BookingParties, kind: NoticeKind) {
        let notice = AppointmentNotice {
            appointment_id: appointment.id,
            patient_id: appointment.patient_id,
            staff_id: appointment.staff_id,
            kind,
            summary: summarize(appointment, parties),
        };
        if let Err(err) = self.collaborators.notifications.deliver(&notice) {
            log::warn!(
                "Failed to deliver notice for appointment {}: {}",
                appointment.id,
                err
            );
        }
    }
}

fn summarize(appointment: &Appointment, parties: &BookingParties) -> String {
    let department = parties
        .department
        .as_ref()
        .map(|d| format!(", {}", d.name))
        .unwrap_or_default();
    format!(
        "Appointment for {} with {} on {} {}-{} at {}{} is {}",
        parties.patient.name,
        parties.staff.name,
        appointment.date,
        appointment.start_time.format("%H:%M"),
        appointment.end_time.format("%H:%M"),
        parties.hospital.name,
        department,
        appointment.status
    )
}

/// Fails when another slot-holding appointment of the staff member overlaps
/// `window` on `date`. Callers hold the staff timeline lock.
async fn ensure_slot_free<R: AppointmentRepository>(
    tx: &mut R,
    staff_id: Uuid,
    date: NaiveDate,
    (start_time, end_time): (NaiveTime, NaiveTime),
    editing: Option<Uuid>,
) -> Result<(), AppError> {
    let clash = tx
        .find_appointments_for_staff_on(staff_id, date)
        .await?
        .into_iter()
        .filter(|a| a.holds_slot() && Some(a.id) != editing)
        .find(|a| overlaps(a.start_time, a.end_time, start_time, end_time));
    match clash {
        Some(clash) => Err(AppError::OverlapConflict(format!(
            "Overlaps appointment {} ({}-{}) on {}",
            clash.id, clash.start_time, clash.end_time, date
        ))),
        None => Ok(()),
    }
}

async fn find_appointment<R: AppointmentRepository>(
    tx: &mut R,
    appointment_id: Uuid,
) -> Result<Appointment, AppError> {
    tx.find_appointment(appointment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment", appointment_id))
}
