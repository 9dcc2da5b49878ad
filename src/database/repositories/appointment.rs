use chrono::NaiveDate;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{models::Appointment, utils::sql};

const APPOINTMENT_COLUMNS: &str = r#"
    id,
    patient_id,
    staff_id,
    hospital_id,
    department_id,
    date,
    start_time,
    end_time,
    status,
    notes,
    assignment_id,
    assigned_role,
    created_by,
    created_at,
    updated_at
"#;

#[derive(Debug, Clone)]
pub struct AppointmentFilter {
    pub staff_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub hospital_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[allow(async_fn_in_trait)]
pub trait AppointmentRepository {
    async fn insert_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<Appointment, sqlx::Error>;

    async fn update_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<Appointment, sqlx::Error>;

    async fn find_appointment(&mut self, id: Uuid) -> Result<Option<Appointment>, sqlx::Error>;

    async fn find_appointments_for_staff_on(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, sqlx::Error>;

    async fn list_appointments(
        &mut self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, sqlx::Error>;
}

impl AppointmentRepository for Transaction<'_, Postgres> {
    async fn insert_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<Appointment, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO
                appointments (
                    id,
                    patient_id,
                    staff_id,
                    hospital_id,
                    department_id,
                    date,
                    start_time,
                    end_time,
                    status,
                    notes,
                    assignment_id,
                    assigned_role,
                    created_by,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {APPOINTMENT_COLUMNS}
        "#
        );

        sqlx::query_as::<_, Appointment>(&sql(&query))
            .bind(appointment.id)
            .bind(appointment.patient_id)
            .bind(appointment.staff_id)
            .bind(appointment.hospital_id)
            .bind(appointment.department_id)
            .bind(appointment.date)
            .bind(appointment.start_time)
            .bind(appointment.end_time)
            .bind(appointment.status)
            .bind(&appointment.notes)
            .bind(appointment.assignment_id)
            .bind(&appointment.assigned_role)
            .bind(appointment.created_by)
            .bind(appointment.created_at)
            .bind(appointment.updated_at)
            .fetch_one(&mut **self)
            .await
    }

    async fn update_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<Appointment, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE
                appointments
            SET
                patient_id = ?,
                staff_id = ?,
                hospital_id = ?,
                department_id = ?,
                date = ?,
                start_time = ?,
                end_time = ?,
                status = ?,
                notes = ?,
                assignment_id = ?,
                assigned_role = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {APPOINTMENT_COLUMNS}
        "#
        );

        sqlx::query_as::<_, Appointment>(&sql(&query))
            .bind(appointment.patient_id)
            .bind(appointment.staff_id)
            .bind(appointment.hospital_id)
            .bind(appointment.department_id)
            .bind(appointment.date)
            .bind(appointment.start_time)
            .bind(appointment.end_time)
            .bind(appointment.status)
            .bind(&appointment.notes)
            .bind(appointment.assignment_id)
            .bind(&appointment.assigned_role)
            .bind(appointment.updated_at)
            .bind(appointment.id)
            .fetch_one(&mut **self)
            .await
    }

    async fn find_appointment(&mut self, id: Uuid) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?");

        sqlx::query_as::<_, Appointment>(&sql(&query))
            .bind(id)
            .fetch_optional(&mut **self)
            .await
    }

    async fn find_appointments_for_staff_on(
        &mut self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM
                appointments
            WHERE
                staff_id = ?
                AND date = ?
            ORDER BY
                start_time
        "#
        );

        sqlx::query_as::<_, Appointment>(&sql(&query))
            .bind(staff_id)
            .bind(date)
            .fetch_all(&mut **self)
            .await
    }

    async fn list_appointments(
        &mut self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        let mut conditions = Vec::new();
        if filter.staff_id.is_some() {
            conditions.push("staff_id = ?");
        }
        if filter.patient_id.is_some() {
            conditions.push("patient_id = ?");
        }
        if filter.hospital_id.is_some() {
            conditions.push("hospital_id = ?");
        }
        conditions.push("date BETWEEN ? AND ?");

        let query = sql(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE {} ORDER BY date, start_time",
            conditions.join(" AND ")
        ));

        let mut prepared = sqlx::query_as::<_, Appointment>(&query);
        for id in [filter.staff_id, filter.patient_id, filter.hospital_id]
            .into_iter()
            .flatten()
        {
            prepared = prepared.bind(id);
        }

        prepared
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(&mut **self)
            .await
    }
}
