use chrono::NaiveDate;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{LeaveStatus, ScheduleScope, StaffLeaveRequest},
    utils::sql,
};

const LEAVE_COLUMNS: &str = r#"
    id,
    staff_id,
    hospital_id,
    department_id,
    leave_type,
    status,
    start_date,
    end_date,
    start_time,
    end_time,
    requires_coverage,
    reason,
    requested_by,
    reviewed_by,
    reviewed_at,
    manager_note,
    created_at,
    updated_at
"#;

#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub status: Option<LeaveStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[allow(async_fn_in_trait)]
pub trait LeaveRepository {
    async fn insert_leave(
        &mut self,
        leave: &StaffLeaveRequest,
    ) -> Result<StaffLeaveRequest, sqlx::Error>;

    /// Persists the review fields and status of an existing request.
    async fn update_leave(
        &mut self,
        leave: &StaffLeaveRequest,
    ) -> Result<StaffLeaveRequest, sqlx::Error>;

    async fn find_leave(&mut self, id: Uuid) -> Result<Option<StaffLeaveRequest>, sqlx::Error>;

    /// Pending or approved requests of the staff member whose date range
    /// intersects the inclusive range given.
    async fn find_active_leave_between(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<StaffLeaveRequest>, sqlx::Error>;

    async fn list_leave(
        &mut self,
        scope: ScheduleScope,
        filter: &LeaveFilter,
    ) -> Result<Vec<StaffLeaveRequest>, sqlx::Error>;
}

impl LeaveRepository for Transaction<'_, Postgres> {
    async fn insert_leave(
        &mut self,
        leave: &StaffLeaveRequest,
    ) -> Result<StaffLeaveRequest, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO
                staff_leave_requests (
                    id,
                    staff_id,
                    hospital_id,
                    department_id,
                    leave_type,
                    status,
                    start_date,
                    end_date,
                    start_time,
                    end_time,
                    requires_coverage,
                    reason,
                    requested_by,
                    reviewed_by,
                    reviewed_at,
                    manager_note,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {LEAVE_COLUMNS}
        "#
        );

        sqlx::query_as::<_, StaffLeaveRequest>(&sql(&query))
            .bind(leave.id)
            .bind(leave.staff_id)
            .bind(leave.hospital_id)
            .bind(leave.department_id)
            .bind(leave.leave_type)
            .bind(leave.status)
            .bind(leave.start_date)
            .bind(leave.end_date)
            .bind(leave.start_time)
            .bind(leave.end_time)
            .bind(leave.requires_coverage)
            .bind(&leave.reason)
            .bind(leave.requested_by)
            .bind(leave.reviewed_by)
            .bind(leave.reviewed_at)
            .bind(&leave.manager_note)
            .bind(leave.created_at)
            .bind(leave.updated_at)
            .fetch_one(&mut **self)
            .await
    }

    async fn update_leave(
        &mut self,
        leave: &StaffLeaveRequest,
    ) -> Result<StaffLeaveRequest, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE
                staff_leave_requests
            SET
                status = ?,
                reviewed_by = ?,
                reviewed_at = ?,
                manager_note = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {LEAVE_COLUMNS}
        "#
        );

        sqlx::query_as::<_, StaffLeaveRequest>(&sql(&query))
            .bind(leave.status)
            .bind(leave.reviewed_by)
            .bind(leave.reviewed_at)
            .bind(&leave.manager_note)
            .bind(leave.updated_at)
            .bind(leave.id)
            .fetch_one(&mut **self)
            .await
    }

    async fn find_leave(&mut self, id: Uuid) -> Result<Option<StaffLeaveRequest>, sqlx::Error> {
        let query = format!("SELECT {LEAVE_COLUMNS} FROM staff_leave_requests WHERE id = ?");

        sqlx::query_as::<_, StaffLeaveRequest>(&sql(&query))
            .bind(id)
            .fetch_optional(&mut **self)
            .await
    }

    async fn find_active_leave_between(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<StaffLeaveRequest>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM
                staff_leave_requests
            WHERE
                staff_id = ?
                AND status IN (?, ?)
                AND start_date <= ?
                AND end_date >= ?
            ORDER BY
                start_date
        "#
        );

        sqlx::query_as::<_, StaffLeaveRequest>(&sql(&query))
            .bind(staff_id)
            .bind(LeaveStatus::Pending)
            .bind(LeaveStatus::Approved)
            .bind(end_date)
            .bind(start_date)
            .fetch_all(&mut **self)
            .await
    }

    async fn list_leave(
        &mut self,
        scope: ScheduleScope,
        filter: &LeaveFilter,
    ) -> Result<Vec<StaffLeaveRequest>, sqlx::Error> {
        let mut conditions = Vec::new();
        let scope_id = match scope {
            ScheduleScope::Staff(id) => {
                conditions.push("staff_id = ?");
                Some(id)
            }
            ScheduleScope::Department(id) => {
                conditions.push("department_id = ?");
                Some(id)
            }
            ScheduleScope::Hospital(id) => {
                conditions.push("hospital_id = ?");
                Some(id)
            }
            ScheduleScope::All => None,
        };
        if filter.status.is_some() {
            conditions.push("status = ?");
        }
        // Requests intersecting the window, not only those contained in it.
        if filter.start_date.is_some() {
            conditions.push("end_date >= ?");
        }
        if filter.end_date.is_some() {
            conditions.push("start_date <= ?");
        }

        let mut query = format!("SELECT {LEAVE_COLUMNS} FROM staff_leave_requests");
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY start_date, created_at");
        let query = sql(&query);

        let mut prepared = sqlx::query_as::<_, StaffLeaveRequest>(&query);
        if let Some(id) = scope_id {
            prepared = prepared.bind(id);
        }
        if let Some(status) = filter.status {
            prepared = prepared.bind(status);
        }
        if let Some(start_date) = filter.start_date {
            prepared = prepared.bind(start_date);
        }
        if let Some(end_date) = filter.end_date {
            prepared = prepared.bind(end_date);
        }

        prepared.fetch_all(&mut **self).await
    }
}
