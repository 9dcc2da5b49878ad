use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::auth::{ActorContext, ActorRole};
use crate::database::models::{Lookup, ScheduleScope};
use crate::database::repositories::DirectoryRepository;
use crate::error::AppError;
use crate::services::authorization::{Authorizer, require};
use crate::services::identity::require_staff;

/// Listing filter as supplied by the caller. The most specific field wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeFilter {
    pub staff_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub hospital_id: Option<Uuid>,
}

/// Turns a caller filter into a concrete scope the actor may see. Without a
/// filter the actor's own scope is used.
pub async fn resolve_scope<R: DirectoryRepository>(
    repo: &mut R,
    authorizer: &dyn Authorizer,
    actor: &ActorContext,
    filter: ScopeFilter,
) -> Result<ScheduleScope, AppError> {
    if let Some(staff_id) = filter.staff_id {
        let staff = require_staff(repo, staff_id).await?;
        require(
            authorizer.can_view_staff(actor, &staff),
            "Cannot view this staff member's schedule",
        )?;
        return Ok(ScheduleScope::Staff(staff.id));
    }

    if let Some(department_id) = filter.department_id {
        let department = repo
            .find_department_by_id(department_id)
            .await?
            .ok_or_else(|| AppError::not_found("Department", department_id))?;
        require(
            authorizer.can_view_department(actor, &department),
            "Cannot view this department",
        )?;
        return Ok(ScheduleScope::Department(department.id));
    }

    if let Some(hospital_id) = filter.hospital_id {
        let hospital = repo
            .find_hospital(Lookup::Id(hospital_id))
            .await?
            .ok_or_else(|| AppError::not_found("Hospital", hospital_id))?;
        require(
            authorizer.can_view_hospital(actor, hospital.id),
            "Cannot view this hospital",
        )?;
        return Ok(ScheduleScope::Hospital(hospital.id));
    }

    let own = match actor.role {
        ActorRole::GlobalAdmin => Some(ScheduleScope::All),
        ActorRole::HospitalAdmin => actor.hospital_id.map(ScheduleScope::Hospital),
        ActorRole::DepartmentHead => actor.department_id.map(ScheduleScope::Department),
        ActorRole::Staff => actor.staff_id.map(ScheduleScope::Staff),
        ActorRole::Patient => None,
    };
    own.ok_or_else(|| AppError::PermissionDenied("No schedule scope for this caller".to_string()))
}

/// Inclusive date range for listings, defaulting to `window_days` from today.
pub fn resolve_window(
    today: NaiveDate,
    window_days: i64,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = start_date.unwrap_or(today);
    let end = match end_date {
        Some(end) => end,
        None => start
            .checked_add_days(Days::new(window_days.max(0) as u64))
            .unwrap_or(NaiveDate::MAX),
    };

    if end < start {
        return Err(AppError::ValidationError(
            "End date must not be before start date".to_string(),
        ));
    }

    Ok((start, end))
}
