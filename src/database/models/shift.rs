use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub hospital_id: Uuid,
    pub department_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub shift_type: ShiftType,
    pub status: ShiftStatus,
    pub cancellation_reason: Option<String>,
    pub notes: Option<String>,
    pub scheduled_by: Uuid,
    pub last_modified_by: Uuid,
    pub status_changed_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Shift {
    /// Only scheduled shifts can be edited or change status.
    pub fn is_mutable(&self) -> bool {
        self.status == ShiftStatus::Scheduled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftInput {
    pub staff_id: Uuid,
    pub hospital_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub shift_type: ShiftType,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftUpdateInput {
    pub department_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub shift_type: ShiftType,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftStatusInput {
    pub status: ShiftStatus,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftQuery {
    pub staff_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub hospital_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum ShiftStatus {
        Scheduled => "SCHEDULED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub enum ShiftType {
        Morning => "MORNING",
        Afternoon => "AFTERNOON",
        Evening => "EVENING",
        Night => "NIGHT",
        OnCall => "ON_CALL",
        #[default]
        Custom => "CUSTOM",
    }
}
