use chrono::NaiveDate;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{ScheduleScope, Shift, ShiftStatus},
    utils::sql,
};

const SHIFT_COLUMNS: &str = r#"
    id,
    staff_id,
    hospital_id,
    department_id,
    date,
    start_time,
    end_time,
    shift_type,
    status,
    cancellation_reason,
    notes,
    scheduled_by,
    last_modified_by,
    status_changed_at,
    created_at,
    updated_at
"#;

#[allow(async_fn_in_trait)]
pub trait ShiftRepository {
    async fn insert_shift(&mut self, shift: &Shift) -> Result<Shift, sqlx::Error>;

    /// Overwrites every mutable column of the shift with the same id.
    async fn update_shift(&mut self, shift: &Shift) -> Result<Shift, sqlx::Error>;

    async fn find_shift(&mut self, id: Uuid) -> Result<Option<Shift>, sqlx::Error>;

    /// Every shift of the staff member on `date`, whatever its status.
    async fn find_shifts_for_staff_on(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error>;

    /// Scheduled shifts of the staff member dated within the inclusive range.
    async fn find_scheduled_shifts_between(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error>;

    async fn list_shifts(
        &mut self,
        scope: ScheduleScope,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error>;
}

impl ShiftRepository for Transaction<'_, Postgres> {
    async fn insert_shift(&mut self, shift: &Shift) -> Result<Shift, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO
                shifts (
                    id,
                    staff_id,
                    hospital_id,
                    department_id,
                    date,
                    start_time,
                    end_time,
                    shift_type,
                    status,
                    cancellation_reason,
                    notes,
                    scheduled_by,
                    last_modified_by,
                    status_changed_at,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {SHIFT_COLUMNS}
        "#
        );

        sqlx::query_as::<_, Shift>(&sql(&query))
            .bind(shift.id)
            .bind(shift.staff_id)
            .bind(shift.hospital_id)
            .bind(shift.department_id)
            .bind(shift.date)
            .bind(shift.start_time)
            .bind(shift.end_time)
            .bind(shift.shift_type)
            .bind(shift.status)
            .bind(&shift.cancellation_reason)
            .bind(&shift.notes)
            .bind(shift.scheduled_by)
            .bind(shift.last_modified_by)
            .bind(shift.status_changed_at)
            .bind(shift.created_at)
            .bind(shift.updated_at)
            .fetch_one(&mut **self)
            .await
    }

    async fn update_shift(&mut self, shift: &Shift) -> Result<Shift, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE
                shifts
            SET
                department_id = ?,
                date = ?,
                start_time = ?,
                end_time = ?,
                shift_type = ?,
                status = ?,
                cancellation_reason = ?,
                notes = ?,
                last_modified_by = ?,
                status_changed_at = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {SHIFT_COLUMNS}
        "#
        );

        sqlx::query_as::<_, Shift>(&sql(&query))
            .bind(shift.department_id)
            .bind(shift.date)
            .bind(shift.start_time)
            .bind(shift.end_time)
            .bind(shift.shift_type)
            .bind(shift.status)
            .bind(&shift.cancellation_reason)
            .bind(&shift.notes)
            .bind(shift.last_modified_by)
            .bind(shift.status_changed_at)
            .bind(shift.updated_at)
            .bind(shift.id)
            .fetch_one(&mut **self)
            .await
    }

    async fn find_shift(&mut self, id: Uuid) -> Result<Option<Shift>, sqlx::Error> {
        let query = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?");

        sqlx::query_as::<_, Shift>(&sql(&query))
            .bind(id)
            .fetch_optional(&mut **self)
            .await
    }

    async fn find_shifts_for_staff_on(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM
                shifts
            WHERE
                staff_id = ?
                AND date = ?
            ORDER BY
                start_time
        "#
        );

        sqlx::query_as::<_, Shift>(&sql(&query))
            .bind(staff_id)
            .bind(date)
            .fetch_all(&mut **self)
            .await
    }

    async fn find_scheduled_shifts_between(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM
                shifts
            WHERE
                staff_id = ?
                AND status = ?
                AND date BETWEEN ? AND ?
            ORDER BY
                date,
                start_time
            FOR UPDATE
        "#
        );

        sqlx::query_as::<_, Shift>(&sql(&query))
            .bind(staff_id)
            .bind(ShiftStatus::Scheduled)
            .bind(start_date)
            .bind(end_date)
            .fetch_all(&mut **self)
            .await
    }

    async fn list_shifts(
        &mut self,
        scope: ScheduleScope,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>, sqlx::Error> {
        let (condition, scope_id) = match scope {
            ScheduleScope::Staff(id) => ("staff_id = ? AND ", Some(id)),
            ScheduleScope::Department(id) => ("department_id = ? AND ", Some(id)),
            ScheduleScope::Hospital(id) => ("hospital_id = ? AND ", Some(id)),
            ScheduleScope::All => ("", None),
        };

        let query = format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM
                shifts
            WHERE
                {condition} date BETWEEN ? AND ?
            ORDER BY
                date,
                start_time
        "#
        );
        let query = sql(&query);

        let mut prepared = sqlx::query_as::<_, Shift>(&query);
        if let Some(id) = scope_id {
            prepared = prepared.bind(id);
        }

        prepared
            .bind(start_date)
            .bind(end_date)
            .fetch_all(&mut **self)
            .await
    }
}
