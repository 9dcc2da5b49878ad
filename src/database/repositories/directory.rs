use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{Department, Hospital, Lookup, Patient, StaffMember},
    utils::sql,
};

/// Read access to reference records owned outside the scheduling engine.
#[allow(async_fn_in_trait)]
pub trait DirectoryRepository {
    async fn find_hospital(&mut self, lookup: Lookup<'_>) -> Result<Option<Hospital>, sqlx::Error>;

    async fn find_department(
        &mut self,
        hospital_id: Uuid,
        lookup: Lookup<'_>,
    ) -> Result<Option<Department>, sqlx::Error>;

    /// Department by id regardless of hospital, for scope checks.
    async fn find_department_by_id(&mut self, id: Uuid) -> Result<Option<Department>, sqlx::Error>;

    async fn find_staff(&mut self, lookup: Lookup<'_>) -> Result<Option<StaffMember>, sqlx::Error>;

    async fn find_patient(&mut self, lookup: Lookup<'_>) -> Result<Option<Patient>, sqlx::Error>;

    /// Serializes writers on one staff member's timeline until the
    /// transaction ends.
    async fn lock_staff_timeline(&mut self, staff_id: Uuid) -> Result<(), sqlx::Error>;
}

/// Column matched by a lookup, or `None` when the table has no such column.
fn lookup_column(lookup: &Lookup<'_>, columns: &[&'static str]) -> Option<&'static str> {
    let column = match lookup {
        Lookup::Id(_) => "id",
        Lookup::Code(_) => "code",
        Lookup::Name(_) => "name",
        Lookup::Email(_) => "email",
        Lookup::Username(_) => "username",
    };
    columns.iter().copied().find(|c| *c == column)
}

fn lookup_condition(lookup: &Lookup<'_>, column: &str) -> String {
    match lookup {
        Lookup::Id(_) | Lookup::Code(_) => format!("{} = ?", column),
        _ => format!("LOWER({}) = LOWER(?)", column),
    }
}

macro_rules! find_by_lookup {
    ($conn:expr, $ty:ty, $select:expr, $lookup:expr, $columns:expr $(, $extra_cond:literal => $extra:expr)?) => {{
        let Some(column) = lookup_column(&$lookup, $columns) else {
            return Ok(None);
        };
        #[allow(unused_mut)]
        let mut query = format!("{} WHERE {}", $select, lookup_condition(&$lookup, column));
        $(query.push_str(concat!(" AND ", $extra_cond));)?
        query.push_str(" ORDER BY name LIMIT 1");
        let query = sql(&query);

        let prepared = sqlx::query_as::<_, $ty>(&query);
        let prepared = match $lookup {
            Lookup::Id(id) => prepared.bind(id),
            Lookup::Code(s) | Lookup::Name(s) | Lookup::Email(s) | Lookup::Username(s) => {
                prepared.bind(s.to_string())
            }
        };
        $(let prepared = prepared.bind($extra);)?
        prepared.fetch_optional($conn).await
    }};
}

impl DirectoryRepository for Transaction<'_, Postgres> {
    async fn find_hospital(&mut self, lookup: Lookup<'_>) -> Result<Option<Hospital>, sqlx::Error> {
        find_by_lookup!(
            &mut **self,
            Hospital,
            "SELECT id, code, name FROM hospitals",
            lookup,
            &["id", "code", "name"]
        )
    }

    async fn find_department(
        &mut self,
        hospital_id: Uuid,
        lookup: Lookup<'_>,
    ) -> Result<Option<Department>, sqlx::Error> {
        find_by_lookup!(
            &mut **self,
            Department,
            "SELECT id, hospital_id, code, name FROM departments",
            lookup,
            &["id", "code", "name"],
            "hospital_id = ?" => hospital_id
        )
    }

    async fn find_department_by_id(&mut self, id: Uuid) -> Result<Option<Department>, sqlx::Error> {
        sqlx::query_as::<_, Department>(&sql(
            "SELECT id, hospital_id, code, name FROM departments WHERE id = ?",
        ))
        .bind(id)
        .fetch_optional(&mut **self)
        .await
    }

    async fn find_staff(&mut self, lookup: Lookup<'_>) -> Result<Option<StaffMember>, sqlx::Error> {
        find_by_lookup!(
            &mut **self,
            StaffMember,
            r#"SELECT id, hospital_id, department_id, code, name, email, username, role, assignment_id
               FROM staff_members"#,
            lookup,
            &["id", "code", "name", "email", "username"]
        )
    }

    async fn find_patient(&mut self, lookup: Lookup<'_>) -> Result<Option<Patient>, sqlx::Error> {
        find_by_lookup!(
            &mut **self,
            Patient,
            "SELECT id, hospital_id, code, name, email, username FROM patients",
            lookup,
            &["id", "code", "name", "email", "username"]
        )
    }

    async fn lock_staff_timeline(&mut self, staff_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(&sql("SELECT id FROM staff_members WHERE id = ? FOR UPDATE"))
            .bind(staff_id)
            .execute(&mut **self)
            .await?;

        Ok(())
    }
}
