use serde::Serialize;
use uuid::Uuid;

use crate::auth::ActorContext;
use crate::database::{
    ScheduleStore,
    models::{
        LeaveDecisionInput, LeaveQuery, LeaveRequestInput, LeaveStatus, Lookup, StaffLeaveRequest,
        StaffMember,
    },
    repositories::{DirectoryRepository, LeaveFilter, LeaveRepository},
    transaction,
};
use crate::error::AppError;
use crate::services::{
    Collaborators,
    authorization::require,
    cascade::CancelShiftsForLeave,
    identity::require_staff,
    scope::{ScopeFilter, resolve_scope},
};

/// Outcome of a manager decision, with the shifts the approval cancelled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDecision {
    pub leave: StaffLeaveRequest,
    pub cancelled_shift_ids: Vec<Uuid>,
}

/// Staff leave lifecycle: `PENDING -> APPROVED | REJECTED | CANCELLED`.
pub struct LeaveWorkflow<S> {
    store: S,
    collaborators: Collaborators,
}

impl<S: ScheduleStore> LeaveWorkflow<S> {
    pub fn new(store: S, collaborators: Collaborators) -> Self {
        Self {
            store,
            collaborators,
        }
    }

    pub async fn request_leave(
        &self,
        actor: &ActorContext,
        input: LeaveRequestInput,
    ) -> Result<StaffLeaveRequest, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self.request_leave_in(&mut tx, actor, input).await;
        let leave = transaction::finish(tx, result).await?;

        log::info!(
            "Leave {} requested for staff member {} ({} to {})",
            leave.id,
            leave.staff_id,
            leave.start_date,
            leave.end_date
        );
        Ok(leave)
    }

    async fn request_leave_in(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        input: LeaveRequestInput,
    ) -> Result<StaffLeaveRequest, AppError> {
        let staff = require_staff(tx, input.staff_id).await?;
        require(
            self.is_self_or_manager(actor, &staff),
            "Cannot request leave for this staff member",
        )?;

        let hospital_id = input.hospital_id.unwrap_or(staff.hospital_id);
        if hospital_id != staff.hospital_id {
            return Err(AppError::ValidationError(
                "Leave hospital must be the staff member's hospital".to_string(),
            ));
        }
        let department_id = match input.department_id {
            Some(id) => Some(
                tx.find_department(hospital_id, Lookup::Id(id))
                    .await?
                    .ok_or_else(|| AppError::not_found("Department", id))?
                    .id,
            ),
            None => staff.department_id,
        };

        if input.start_date < self.collaborators.clock.today() {
            return Err(AppError::ValidationError(
                "Leave cannot start in the past".to_string(),
            ));
        }
        if input.end_date < input.start_date {
            return Err(AppError::ValidationError(
                "Leave end date must not be before its start date".to_string(),
            ));
        }
        match (input.start_time, input.end_time) {
            (Some(start), Some(end)) if end <= start => {
                return Err(AppError::ValidationError(
                    "Leave end time must be after its start time".to_string(),
                ));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(AppError::ValidationError(
                    "Partial-day leave needs both a start and an end time".to_string(),
                ));
            }
            _ => {}
        }

        tx.lock_staff_timeline(staff.id).await?;
        let existing = tx
            .find_active_leave_between(staff.id, input.start_date, input.end_date)
            .await?;
        if let Some(clash) = existing.first() {
            return Err(AppError::OverlapConflict(format!(
                "Overlaps {} leave {} ({} to {})",
                clash.status, clash.id, clash.start_date, clash.end_date
            )));
        }

        let now = self.collaborators.clock.now();
        let leave = StaffLeaveRequest {
            id: Uuid::new_v4(),
            staff_id: staff.id,
            hospital_id,
            department_id,
            leave_type: input.leave_type,
            status: LeaveStatus::Pending,
            start_date: input.start_date,
            end_date: input.end_date,
            start_time: input.start_time,
            end_time: input.end_time,
            requires_coverage: input.requires_coverage,
            reason: input.reason,
            requested_by: actor.user_id,
            reviewed_by: None,
            reviewed_at: None,
            manager_note: None,
            created_at: now,
            updated_at: now,
        };

        Ok(tx.insert_leave(&leave).await?)
    }

    /// Approves or rejects a pending request. Approval cancels every covered
    /// scheduled shift in the same transaction.
    pub async fn decide_leave(
        &self,
        actor: &ActorContext,
        leave_id: Uuid,
        input: LeaveDecisionInput,
    ) -> Result<LeaveDecision, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self.decide_leave_in(&mut tx, actor, leave_id, input).await;
        let decision = transaction::finish(tx, result).await?;

        log::info!(
            "Leave {} {} by {}, {} shift(s) cancelled",
            decision.leave.id,
            decision.leave.status,
            actor.user_id,
            decision.cancelled_shift_ids.len()
        );
        Ok(decision)
    }

    async fn decide_leave_in(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        leave_id: Uuid,
        input: LeaveDecisionInput,
    ) -> Result<LeaveDecision, AppError> {
        let existing = find_leave(tx, leave_id).await?;
        let staff = require_staff(tx, existing.staff_id).await?;
        require(
            self.collaborators.authorizer.can_manage_staff(actor, &staff),
            "Only a manager of this staff member can decide on leave",
        )?;

        if !matches!(input.status, LeaveStatus::Approved | LeaveStatus::Rejected) {
            return Err(AppError::ValidationError(format!(
                "A decision must be APPROVED or REJECTED, not {}",
                input.status
            )));
        }
        if existing.status != LeaveStatus::Pending {
            return Err(AppError::NotEditable(format!(
                "Leave {} is already {}",
                existing.id, existing.status
            )));
        }

        tx.lock_staff_timeline(staff.id).await?;
        let now = self.collaborators.clock.now();
        let leave = StaffLeaveRequest {
            status: input.status,
            reviewed_by: Some(actor.user_id),
            reviewed_at: Some(now),
            manager_note: input.manager_note,
            updated_at: now,
            ..existing
        };
        let leave = tx.update_leave(&leave).await?;

        let cancelled = if leave.status == LeaveStatus::Approved {
            CancelShiftsForLeave {
                leave: &leave,
                decided_by: actor.user_id,
                at: now,
            }
            .execute(tx)
            .await?
        } else {
            Vec::new()
        };

        Ok(LeaveDecision {
            cancelled_shift_ids: cancelled.iter().map(|s| s.id).collect(),
            leave,
        })
    }

    /// Withdraws a pending request. Shifts are left as they are.
    pub async fn cancel_leave(
        &self,
        actor: &ActorContext,
        leave_id: Uuid,
    ) -> Result<StaffLeaveRequest, AppError> {
        let mut tx = self.store.begin().await?;
        let result = self.cancel_leave_in(&mut tx, actor, leave_id).await;
        let leave = transaction::finish(tx, result).await?;

        log::info!("Leave {} cancelled by {}", leave.id, actor.user_id);
        Ok(leave)
    }

    async fn cancel_leave_in(
        &self,
        tx: &mut S::Tx,
        actor: &ActorContext,
        leave_id: Uuid,
    ) -> Result<StaffLeaveRequest, AppError> {
        let existing = find_leave(tx, leave_id).await?;
        let staff = require_staff(tx, existing.staff_id).await?;
        require(
            actor.user_id == existing.requested_by || self.is_self_or_manager(actor, &staff),
            "Cannot cancel this leave request",
        )?;

        if existing.status != LeaveStatus::Pending {
            return Err(AppError::NotEditable(format!(
                "Leave {} is already {}",
                existing.id, existing.status
            )));
        }

        let now = self.collaborators.clock.now();
        let leave = StaffLeaveRequest {
            status: LeaveStatus::Cancelled,
            reviewed_by: Some(actor.user_id),
            reviewed_at: Some(now),
            updated_at: now,
            ..existing
        };

        Ok(tx.update_leave(&leave).await?)
    }

    pub async fn get_leave(
        &self,
        actor: &ActorContext,
        leave_id: Uuid,
    ) -> Result<StaffLeaveRequest, AppError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let leave = find_leave(&mut tx, leave_id).await?;
            let staff = require_staff(&mut tx, leave.staff_id).await?;
            require(
                actor.user_id == leave.requested_by
                    || self.collaborators.authorizer.can_view_staff(actor, &staff),
                "Cannot view this leave request",
            )?;
            Ok::<_, AppError>(leave)
        }
        .await;
        transaction::finish(tx, result).await
    }

    pub async fn list_leave(
        &self,
        actor: &ActorContext,
        query: LeaveQuery,
    ) -> Result<Vec<StaffLeaveRequest>, AppError> {
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            if end < start {
                return Err(AppError::ValidationError(
                    "End date must not be before start date".to_string(),
                ));
            }
        }
        let filter = LeaveFilter {
            status: query.status,
            start_date: query.start_date,
            end_date: query.end_date,
        };
        let scope_filter = ScopeFilter {
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
                scope_filter,
            )
            .await?;
            Ok::<_, AppError>(tx.list_leave(scope, &filter).await?)
        }
        .await;
        transaction::finish(tx, result).await
    }

    fn is_self_or_manager(&self, actor: &ActorContext, staff: &StaffMember) -> bool {
        actor.staff_id == Some(staff.id)
            || self.collaborators.authorizer.can_manage_staff(actor, staff)
    }
}

async fn find_leave<R: LeaveRepository>(
    tx: &mut R,
    leave_id: Uuid,
) -> Result<StaffLeaveRequest, AppError> {
    tx.find_leave(leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request", leave_id))
}
