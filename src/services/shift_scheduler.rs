use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::auth::ActorContext;
use crate::database::{
    ScheduleStore,
    models::{
        Lookup, Shift, ShiftInput, ShiftQuery, ShiftStatus, ShiftStatusInput, ShiftUpdateInput,
        StaffMember,
    },
    repositories::{DirectoryRepository, LeaveRepository, ShiftRepository},
    transaction,
};
use crate::error::AppError;
use crate::services::{
    Collaborators,
    authorization::require,
    availability::validate_within,
    cascade::leave_covers_window,
    identity::require_staff,
    overlap::overlaps,
    scope::{ScopeFilter, resolve_scope, resolve_window},
};

/// Staff shift lifecycle: `SCHEDULED -> COMPLETED | CANCELLED`.
pub struct ShiftScheduler<S> {
    store: S,
    collaborators: Collaborators,
}

/// Time slot a shift is asked to occupy.
#[derive(Debug, Clone, Copy)]
struct Slot {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

impl<S: ScheduleStore> ShiftScheduler<S> {
    pub fn new(store: S, collaborators: Collaborators) -> Self {
        Self {
            store,
            collaborators,
        }
    }

    pub async fn schedule_shift(
        &self,
        actor: &ActorContext,
        input: ShiftInput,
    ) -> Result<Shift, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self.schedule_shift_in(&mut tx, actor, input).await;
        let shift = transaction::finish(tx, result).await?;

        log::info!(
            "Scheduled shift {} for staff member {} on {} {}-{}",
            shift.id,
            shift.staff_id,
            shift.date,
            shift.start_time,
            shift.end_time
        );
        Ok(shift)
    }

    async fn schedule_shift_in(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        input: ShiftInput,
    ) -> Result<Shift, AppError> {
        let staff = self.managed_staff(tx, actor, input.staff_id).await?;

        let hospital_id = input.hospital_id.unwrap_or(staff.hospital_id);
        if hospital_id != staff.hospital_id {
            return Err(AppError::ValidationError(
                "Shift hospital must be the staff member's hospital".to_string(),
            ));
        }
        let department_id = match input.department_id {
            Some(id) => Some(self.department_in(tx, hospital_id, id).await?),
            None => staff.department_id,
        };

        tx.lock_staff_timeline(staff.id).await?;
        let slot = Slot {
            date: input.date,
            start: input.start_time,
            end: input.end_time,
        };
        self.check_slot(tx, staff.id, slot, None).await?;

        let now = self.collaborators.clock.now();
        let shift = Shift {
            id: Uuid::new_v4(),
            staff_id: staff.id,
            hospital_id,
            department_id,
            date: slot.date,
            start_time: slot.start,
            end_time: slot.end,
            shift_type: input.shift_type,
            status: ShiftStatus::Scheduled,
            cancellation_reason: None,
            notes: input.notes,
            scheduled_by: actor.user_id,
            last_modified_by: actor.user_id,
            status_changed_at: now,
            created_at: now,
            updated_at: now,
        };

        Ok(tx.insert_shift(&shift).await?)
    }

    /// Moves a scheduled shift in place, re-running every scheduling check.
    pub async fn update_shift(
        &self,
        actor: &ActorContext,
        shift_id: Uuid,
        input: ShiftUpdateInput,
    ) -> Result<Shift, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self.update_shift_in(&mut tx, actor, shift_id, input).await;
        let shift = transaction::finish(tx, result).await?;

        log::info!(
            "Shift {} moved to {} {}-{} by {}",
            shift.id,
            shift.date,
            shift.start_time,
            shift.end_time,
            actor.user_id
        );
        Ok(shift)
    }

    async fn update_shift_in(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        shift_id: Uuid,
        input: ShiftUpdateInput,
    ) -> Result<Shift, AppError> {
        let existing = find_shift(tx, shift_id).await?;
        let staff = self.managed_staff(tx, actor, existing.staff_id).await?;

        if !existing.is_mutable() {
            return Err(AppError::NotEditable(format!(
                "Shift {} is {} and can no longer be edited",
                existing.id, existing.status
            )));
        }

        let department_id = match input.department_id {
            Some(id) => Some(self.department_in(tx, existing.hospital_id, id).await?),
            None => existing.department_id,
        };

        tx.lock_staff_timeline(staff.id).await?;
        let slot = Slot {
            date: input.date,
            start: input.start_time,
            end: input.end_time,
        };
        self.check_slot(tx, staff.id, slot, Some(existing.id)).await?;

        let shift = Shift {
            department_id,
            date: slot.date,
            start_time: slot.start,
            end_time: slot.end,
            shift_type: input.shift_type,
            notes: input.notes,
            last_modified_by: actor.user_id,
            updated_at: self.collaborators.clock.now(),
            ..existing
        };

        Ok(tx.update_shift(&shift).await?)
    }

    /// Setting the current status again leaves the shift untouched.
    pub async fn update_shift_status(
        &self,
        actor: &ActorContext,
        shift_id: Uuid,
        input: ShiftStatusInput,
    ) -> Result<Shift, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self
            .update_shift_status_in(&mut tx, actor, shift_id, input)
            .await;
        let (shift, changed) = transaction::finish(tx, result).await?;

        if changed {
            log::info!(
                "Shift {} is now {} (changed by {})",
                shift.id,
                shift.status,
                actor.user_id
            );
        }
        Ok(shift)
    }

    async fn update_shift_status_in(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        shift_id: Uuid,
        input: ShiftStatusInput,
    ) -> Result<(Shift, bool), AppError> {
        let existing = find_shift(tx, shift_id).await?;
        self.managed_staff(tx, actor, existing.staff_id).await?;

        if input.status == existing.status {
            return Ok((existing, false));
        }
        if !existing.is_mutable() {
            return Err(AppError::NotEditable(format!(
                "Shift {} is {} and can no longer change status",
                existing.id, existing.status
            )));
        }

        let cancellation_reason = match input.status {
            ShiftStatus::Cancelled => {
                let reason = input
                    .cancellation_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        AppError::ValidationError(
                            "A cancellation reason is required".to_string(),
                        )
                    })?;
                Some(reason.to_string())
            }
            _ => None,
        };

        let now = self.collaborators.clock.now();
        let shift = Shift {
            status: input.status,
            cancellation_reason,
            last_modified_by: actor.user_id,
            status_changed_at: now,
            updated_at: now,
            ..existing
        };

        Ok((tx.update_shift(&shift).await?, true))
    }

    pub async fn get_shift(
        &self,
        actor: &ActorContext,
        shift_id: Uuid,
    ) -> Result<Shift, AppError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let shift = find_shift(&mut tx, shift_id).await?;
            let staff = require_staff(&mut tx, shift.staff_id).await?;
            require(
                self.collaborators.authorizer.can_view_staff(actor, &staff),
                "Cannot view this staff member's shifts",
            )?;
            Ok::<_, AppError>(shift)
        }
        .await;
        transaction::finish(tx, result).await
    }

    pub async fn list_shifts(
        &self,
        actor: &ActorContext,
        query: ShiftQuery,
    ) -> Result<Vec<Shift>, AppError> {
        let (start, end) = resolve_window(
            self.collaborators.clock.today(),
            self.collaborators.schedule_window_days,
            query.start_date,
            query.end_date,
        )?;
        let filter = ScopeFilter {
            staff_id: query.staff_id,
            department_id: query.department_id,
            hospital_id: query.hospital_id,
        };

        let mut tx = self.store.begin().await?;
        let result = async {
            let scope = resolve_scope(
                &mut tx,
                self.collaborators.authorizer.as_ref(),
                actor,
                filter,
            )
            .await?;
            Ok::<_, AppError>(tx.list_shifts(scope, start, end).await?)
        }
        .await;
        transaction::finish(tx, result).await
    }

    async fn managed_staff(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        staff_id: Uuid,
    ) -> Result<StaffMember, AppError> {
        let staff = require_staff(tx, staff_id).await?;
        require(
            self.collaborators.authorizer.can_manage_staff(actor, &staff),
            "Cannot manage shifts for this staff member",
        )?;
        Ok(staff)
    }

    async fn department_in(
        &self,
        tx: &mut S::Tx,
        hospital_id: Uuid,
        department_id: Uuid,
    ) -> Result<Uuid, AppError> {
        tx.find_department(hospital_id, Lookup::Id(department_id))
            .await?
            .map(|d| d.id)
            .ok_or_else(|| AppError::not_found("Department", department_id))
    }

    /// Date, ordering, overlap, availability and leave checks, in that order.
    async fn check_slot(
        &self,
        tx: &mut S::Tx,
        staff_id: Uuid,
        slot: Slot,
        editing: Option<Uuid>,
    ) -> Result<(), AppError> {
        if slot.date < self.collaborators.clock.today() {
            return Err(AppError::ValidationError(format!(
                "Cannot schedule a shift in the past ({})",
                slot.date
            )));
        }
        if slot.end <= slot.start {
            return Err(AppError::ValidationError(
                "Shift end time must be after start time".to_string(),
            ));
        }

        let clash = tx
            .find_shifts_for_staff_on(staff_id, slot.date)
            .await?
            .into_iter()
            .filter(|s| s.status != ShiftStatus::Cancelled && Some(s.id) != editing)
            .find(|s| overlaps(s.start_time, s.end_time, slot.start, slot.end));
        if let Some(clash) = clash {
            return Err(AppError::OverlapConflict(format!(
                "Overlaps shift {} ({}-{}) on {}",
                clash.id, clash.start_time, clash.end_time, slot.date
            )));
        }

        let availability = self
            .collaborators
            .ledger()
            .get_or_provision(tx, staff_id, slot.date, slot.start, slot.end)
            .await?;
        validate_within(&availability, slot.start, slot.end)?;

        let leave = tx
            .find_active_leave_between(staff_id, slot.date, slot.date)
            .await?
            .into_iter()
            .find(|l| leave_covers_window(l, slot.date, slot.start, slot.end));
        if let Some(leave) = leave {
            return Err(AppError::OverlapConflict(format!(
                "Staff member has {} leave {} covering {}",
                leave.status, leave.id, slot.date
            )));
        }

        Ok(())
    }
}

async fn find_shift<R: ShiftRepository>(tx: &mut R, shift_id: Uuid) -> Result<Shift, AppError> {
    tx.find_shift(shift_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shift", shift_id))
}
