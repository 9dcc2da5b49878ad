use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub staff_id: Uuid,
    pub hospital_id: Uuid,
    pub department_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    /// Staff assignment in force when the appointment was booked.
    pub assignment_id: Uuid,
    pub assigned_role: String,
    pub created_by: Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    /// Completed and cancelled appointments can no longer be rescheduled.
    pub fn is_reschedulable(&self) -> bool {
        !matches!(
            self.status,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    /// Whether this appointment still occupies its slot on the staff timeline.
    pub fn holds_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}

/// Booking request. Every party is named by a loose identifier: a UUID, a
/// code, a name, an email or a username.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInput {
    pub patient: String,
    pub staff: String,
    pub hospital: String,
    pub department: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentActionInput {
    pub action: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuery {
    pub staff_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum AppointmentStatus {
        Scheduled => "SCHEDULED",
        Confirmed => "CONFIRMED",
        Cancelled => "CANCELLED",
        Completed => "COMPLETED",
        NoShow => "NO_SHOW",
        Pending => "PENDING",
        Rescheduled => "RESCHEDULED",
        InProgress => "IN_PROGRESS",
        Failed => "FAILED",
    }
}

string_enum! {
    /// Caller-facing verbs, each mapping onto exactly one status.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum AppointmentAction {
        Schedule => "SCHEDULE",
        Confirm => "CONFIRM",
        Cancel => "CANCEL",
        Complete => "COMPLETE",
        NoShow => "NO_SHOW",
        Pending => "PENDING",
        Reschedule => "RESCHEDULE",
        Start => "START",
        Fail => "FAIL",
    }
}

impl AppointmentAction {
    pub fn target_status(self) -> AppointmentStatus {
        match self {
            AppointmentAction::Schedule => AppointmentStatus::Scheduled,
            AppointmentAction::Confirm => AppointmentStatus::Confirmed,
            AppointmentAction::Cancel => AppointmentStatus::Cancelled,
            AppointmentAction::Complete => AppointmentStatus::Completed,
            AppointmentAction::NoShow => AppointmentStatus::NoShow,
            AppointmentAction::Pending => AppointmentStatus::Pending,
            AppointmentAction::Reschedule => AppointmentStatus::Rescheduled,
            AppointmentAction::Start => AppointmentStatus::InProgress,
            AppointmentAction::Fail => AppointmentStatus::Failed,
        }
    }
}
