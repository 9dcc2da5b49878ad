use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::ActorContext;
use crate::database::{
    ScheduleStore,
    models::{AvailabilityQuery, StaffAvailability, StaffAvailabilityInput},
    repositories::AvailabilityRepository,
    transaction,
};
use crate::error::AppError;
use crate::services::{
    Collaborators,
    authorization::require,
    clock::Clock,
    identity::require_staff,
    scope::resolve_window,
};

/// Decides what happens when a shift lands on a date nobody configured.
pub trait AvailabilityProvisioningPolicy: Send + Sync {
    /// Window to create for a date without a record, or `None` to refuse.
    fn provision(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Option<(NaiveTime, NaiveTime)>;

    /// Replacement window for an existing record so `[start, end)` fits it,
    /// or `None` to leave the record alone.
    fn widen(
        &self,
        existing: &StaffAvailability,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Option<(NaiveTime, NaiveTime)>;
}

/// Creates a window equal to the first requested interval and grows windows
/// it created itself. Explicit windows are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientProvisioning;

impl AvailabilityProvisioningPolicy for LenientProvisioning {
    fn provision(
        &self,
        _date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Option<(NaiveTime, NaiveTime)> {
        Some((start, end))
    }

    /// Grows to the hull of the window and the new interval, gaps included.
    /// Appointment checks read the widened window, so a booking between two
    /// provisioned shifts is accepted.
    fn widen(
        &self,
        existing: &StaffAvailability,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Option<(NaiveTime, NaiveTime)> {
        if !existing.provisioned || existing.day_off {
            return None;
        }
        if start >= existing.available_from && end <= existing.available_to {
            return None;
        }
        Some((
            start.min(existing.available_from),
            end.max(existing.available_to),
        ))
    }
}

/// Requires every date to be configured explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictProvisioning;

impl AvailabilityProvisioningPolicy for StrictProvisioning {
    fn provision(
        &self,
        _date: NaiveDate,
        _start: NaiveTime,
        _end: NaiveTime,
    ) -> Option<(NaiveTime, NaiveTime)> {
        None
    }

    fn widen(
        &self,
        _existing: &StaffAvailability,
        _start: NaiveTime,
        _end: NaiveTime,
    ) -> Option<(NaiveTime, NaiveTime)> {
        None
    }
}

/// Fails unless `[start, end)` lies inside a working window.
pub fn validate_within(
    availability: &StaffAvailability,
    start: NaiveTime,
    end: NaiveTime,
) -> Result<(), AppError> {
    if availability.day_off {
        return Err(AppError::AvailabilityViolation(format!(
            "Staff member is off on {}",
            availability.date
        )));
    }
    if start < availability.available_from || end > availability.available_to {
        return Err(AppError::AvailabilityViolation(format!(
            "{}-{} is outside availability {}-{} on {}",
            start,
            end,
            availability.available_from,
            availability.available_to,
            availability.date
        )));
    }
    Ok(())
}

/// Point check used for bookings. A missing record counts as available.
pub fn is_available_at(availability: Option<&StaffAvailability>, instant: NaiveTime) -> bool {
    match availability {
        None => true,
        Some(record) if record.day_off => false,
        Some(record) => record.available_from <= instant && instant < record.available_to,
    }
}

/// Availability reads and implicit provisioning inside an open transaction.
#[derive(Clone)]
pub struct AvailabilityLedger {
    policy: Arc<dyn AvailabilityProvisioningPolicy>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityLedger {
    pub fn new(policy: Arc<dyn AvailabilityProvisioningPolicy>, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    /// The record for `date`, created or widened by the provisioning policy
    /// when it allows it.
    pub async fn get_or_provision<R: AvailabilityRepository>(
        &self,
        repo: &mut R,
        staff_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<StaffAvailability, AppError> {
        let now = self.clock.now();

        if let Some(existing) = repo.find_availability(staff_id, date).await? {
            let Some((available_from, available_to)) = self.policy.widen(&existing, start, end)
            else {
                return Ok(existing);
            };
            let widened = StaffAvailability {
                available_from,
                available_to,
                updated_at: now,
                ..existing
            };
            return Ok(repo.save_availability(&widened).await?);
        }

        let (available_from, available_to) =
            self.policy.provision(date, start, end).ok_or_else(|| {
                AppError::AvailabilityViolation(format!(
                    "No availability configured for staff member {} on {}",
                    staff_id, date
                ))
            })?;

        let record = StaffAvailability {
            id: Uuid::new_v4(),
            staff_id,
            date,
            available_from,
            available_to,
            day_off: false,
            provisioned: true,
            created_at: now,
            updated_at: now,
        };
        let saved = repo.save_availability(&record).await?;
        log::info!(
            "Provisioned availability {}-{} for staff member {} on {}",
            saved.available_from,
            saved.available_to,
            staff_id,
            date
        );
        Ok(saved)
    }
}

pub struct AvailabilityService<S> {
    store: S,
    collaborators: Collaborators,
}

impl<S: ScheduleStore> AvailabilityService<S> {
    pub fn new(store: S, collaborators: Collaborators) -> Self {
        Self {
            store,
            collaborators,
        }
    }

    /// Explicitly configures one date, replacing any provisioned window.
    pub async fn set_availability(
        &self,
        actor: &ActorContext,
        input: StaffAvailabilityInput,
    ) -> Result<StaffAvailability, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self.set_availability_in(&mut tx, actor, input).await;
        let saved = transaction::finish(tx, result).await?;

        log::info!(
            "Availability for staff member {} on {} set by {}",
            saved.staff_id,
            saved.date,
            actor.user_id
        );
        Ok(saved)
    }

    async fn set_availability_in(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        input: StaffAvailabilityInput,
    ) -> Result<StaffAvailability, AppError> {
        let staff = require_staff(tx, input.staff_id).await?;
        require(
            actor.staff_id == Some(staff.id)
                || self.collaborators.authorizer.can_manage_staff(actor, &staff),
            "Cannot change this staff member's availability",
        )?;

        let existing = tx.find_availability(staff.id, input.date).await?;
        let (available_from, available_to) = match (input.available_from, input.available_to) {
            (Some(from), Some(to)) => (from, to),
            _ if input.day_off => existing
                .as_ref()
                .map(|e| (e.available_from, e.available_to))
                .unwrap_or((NaiveTime::MIN, NaiveTime::MIN)),
            _ => {
                return Err(AppError::ValidationError(
                    "availableFrom and availableTo are required unless dayOff is set".to_string(),
                ));
            }
        };
        if !input.day_off && available_to <= available_from {
            return Err(AppError::ValidationError(
                "availableTo must be after availableFrom".to_string(),
            ));
        }

        let now = self.collaborators.clock.now();
        let record = StaffAvailability {
            id: existing.as_ref().map_or_else(Uuid::new_v4, |e| e.id),
            staff_id: staff.id,
            date: input.date,
            available_from,
            available_to,
            day_off: input.day_off,
            provisioned: false,
            created_at: existing.as_ref().map_or(now, |e| e.created_at),
            updated_at: now,
        };

        Ok(tx.save_availability(&record).await?)
    }

    pub async fn list_availability(
        &self,
        actor: &ActorContext,
        query: AvailabilityQuery,
    ) -> Result<Vec<StaffAvailability>, AppError> {
        let staff_id = query.staff_id.or(actor.staff_id).ok_or_else(|| {
            AppError::ValidationError("staffId is required".to_string())
        })?;
        let (start, end) = resolve_window(
            self.collaborators.clock.today(),
            self.collaborators.schedule_window_days,
            query.start_date,
            query.end_date,
        )?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let staff = require_staff(&mut tx, staff_id).await?;
            require(
                self.collaborators.authorizer.can_view_staff(actor, &staff),
                "Cannot view this staff member's availability",
            )?;
            Ok::<_, AppError>(tx.list_availability(staff.id, start, end).await?)
        }
        .await;
        transaction::finish(tx, result).await
    }
}
