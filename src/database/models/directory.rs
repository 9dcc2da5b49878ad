use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub department_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub role: String,
    /// Current role/hospital assignment; appointments snapshot it.
    pub assignment_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub hospital_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

/// One way of naming a directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Id(Uuid),
    Code(&'a str),
    Name(&'a str),
    Email(&'a str),
    Username(&'a str),
}

impl<'a> Lookup<'a> {
    /// Candidate lookups for a raw identifier, in resolution priority order.
    pub fn candidates(raw: &'a str) -> Vec<Lookup<'a>> {
        let mut lookups = Vec::with_capacity(5);
        if let Ok(id) = Uuid::parse_str(raw) {
            lookups.push(Lookup::Id(id));
        }
        lookups.extend([
            Lookup::Code(raw),
            Lookup::Name(raw),
            Lookup::Email(raw),
            Lookup::Username(raw),
        ]);
        lookups
    }

    /// Compares a stored text value the way the database does: codes exactly,
    /// everything else case-insensitively.
    pub fn matches_text(&self, value: &str) -> bool {
        match self {
            Lookup::Id(_) => false,
            Lookup::Code(code) => value == *code,
            Lookup::Name(s) | Lookup::Email(s) | Lookup::Username(s) => {
                value.eq_ignore_ascii_case(s)
            }
        }
    }
}

/// Which slice of the schedule a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleScope {
    Staff(Uuid),
    Department(Uuid),
    Hospital(Uuid),
    All,
}
