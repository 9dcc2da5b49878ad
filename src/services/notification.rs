use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeKind {
    Created,
    Rescheduled,
    StatusChanged,
}

/// Human-readable summary of an appointment change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentNotice {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub staff_id: Uuid,
    pub kind: NoticeKind,
    pub summary: String,
}

/// Fire-and-forget delivery. Errors are reported to the caller, who logs and
/// drops them.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notice: &AppointmentNotice) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn deliver(&self, notice: &AppointmentNotice) -> anyhow::Result<()> {
        log::info!(
            "Appointment notice {:?} for {}: {}",
            notice.kind,
            notice.appointment_id,
            notice.summary
        );
        Ok(())
    }
}
