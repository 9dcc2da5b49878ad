use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Usable window of one staff member on one calendar date.
///
/// When `day_off` is set the window is kept for display only and never
/// consulted by validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StaffAvailability {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub available_from: NaiveTime,
    pub available_to: NaiveTime,
    pub day_off: bool,
    /// Created by the provisioning policy rather than configured explicitly.
    pub provisioned: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffAvailabilityInput {
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub available_from: Option<NaiveTime>,
    pub available_to: Option<NaiveTime>,
    #[serde(default)]
    pub day_off: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub staff_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
