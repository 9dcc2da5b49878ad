use chrono::NaiveDate;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{models::StaffAvailability, utils::sql};

#[allow(async_fn_in_trait)]
pub trait AvailabilityRepository {
    async fn find_availability(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<StaffAvailability>, sqlx::Error>;

    /// Records for one staff member within an inclusive date range, by date.
    async fn list_availability(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<StaffAvailability>, sqlx::Error>;

    /// Inserts or replaces the record for `(staff_id, date)`.
    async fn save_availability(
        &mut self,
        availability: &StaffAvailability,
    ) -> Result<StaffAvailability, sqlx::Error>;
}

impl AvailabilityRepository for Transaction<'_, Postgres> {
    async fn find_availability(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<StaffAvailability>, sqlx::Error> {
        sqlx::query_as::<_, StaffAvailability>(&sql(r#"
            SELECT
                id,
                staff_id,
                date,
                available_from,
                available_to,
                day_off,
                provisioned,
                created_at,
                updated_at
            FROM
                staff_availability
            WHERE
                staff_id = ?
                AND date = ?
        "#))
        .bind(staff_id)
        .bind(date)
        .fetch_optional(&mut **self)
        .await
    }

    async fn list_availability(
        &mut self,
        staff_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<StaffAvailability>, sqlx::Error> {
        sqlx::query_as::<_, StaffAvailability>(&sql(r#"
            SELECT
                id,
                staff_id,
                date,
                available_from,
                available_to,
                day_off,
                provisioned,
                created_at,
                updated_at
            FROM
                staff_availability
            WHERE
                staff_id = ?
                AND date BETWEEN ? AND ?
            ORDER BY
                date
        "#))
        .bind(staff_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&mut **self)
        .await
    }

    async fn save_availability(
        &mut self,
        availability: &StaffAvailability,
    ) -> Result<StaffAvailability, sqlx::Error> {
        sqlx::query_as::<_, StaffAvailability>(&sql(r#"
            INSERT INTO
                staff_availability (
                    id,
                    staff_id,
                    date,
                    available_from,
                    available_to,
                    day_off,
                    provisioned,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (staff_id, date) DO UPDATE
            SET
                available_from = EXCLUDED.available_from,
                available_to = EXCLUDED.available_to,
                day_off = EXCLUDED.day_off,
                provisioned = EXCLUDED.provisioned,
                updated_at = EXCLUDED.updated_at
            RETURNING
                id,
                staff_id,
                date,
                available_from,
                available_to,
                day_off,
                provisioned,
                created_at,
                updated_at
        "#))
        .bind(availability.id)
        .bind(availability.staff_id)
        .bind(availability.date)
        .bind(availability.available_from)
        .bind(availability.available_to)
        .bind(availability.day_off)
        .bind(availability.provisioned)
        .bind(availability.created_at)
        .bind(availability.updated_at)
        .fetch_one(&mut **self)
        .await
    }
}
