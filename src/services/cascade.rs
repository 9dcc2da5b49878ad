use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::database::models::{Shift, ShiftStatus, StaffLeaveRequest};
use crate::database::repositories::ShiftRepository;
use crate::services::overlap::overlaps;

pub const LEAVE_CANCELLATION_REASON: &str =
    "Cancelled automatically: staff member on approved leave";

/// Whether `leave` takes the staff member away during `[start, end)` on `date`.
/// Whole-day leave covers every time of its dates.
pub fn leave_covers_window(
    leave: &StaffLeaveRequest,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> bool {
    if !leave.covers_date(date) {
        return false;
    }
    match leave.partial_day_window() {
        None => true,
        Some((leave_start, leave_end)) => overlaps(leave_start, leave_end, start, end),
    }
}

/// Cancels every scheduled shift an approved leave request covers. Runs in
/// the approval's transaction.
#[derive(Debug, Clone, Copy)]
pub struct CancelShiftsForLeave<'a> {
    pub leave: &'a StaffLeaveRequest,
    pub decided_by: Uuid,
    pub at: NaiveDateTime,
}

impl CancelShiftsForLeave<'_> {
    pub fn affects(&self, shift: &Shift) -> bool {
        shift.staff_id == self.leave.staff_id
            && shift.status == ShiftStatus::Scheduled
            && leave_covers_window(self.leave, shift.date, shift.start_time, shift.end_time)
    }

    /// Returns the shifts it cancelled, in date order.
    pub async fn execute<R: ShiftRepository>(
        &self,
        repo: &mut R,
    ) -> Result<Vec<Shift>, sqlx::Error> {
        let candidates = repo
            .find_scheduled_shifts_between(
                self.leave.staff_id,
                self.leave.start_date,
                self.leave.end_date,
            )
            .await?;

        let mut cancelled = Vec::new();
        for shift in candidates.into_iter().filter(|s| self.affects(s)) {
            let shift = Shift {
                status: ShiftStatus::Cancelled,
                cancellation_reason: Some(LEAVE_CANCELLATION_REASON.to_string()),
                last_modified_by: self.decided_by,
                status_changed_at: self.at,
                updated_at: self.at,
                ..shift
            };
            cancelled.push(repo.update_shift(&shift).await?);
        }

        Ok(cancelled)
    }
}
