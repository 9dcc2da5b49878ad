use uuid::Uuid;

use crate::database::models::{Department, Hospital, Lookup, Patient, StaffMember};
use crate::database::repositories::DirectoryRepository;
use crate::error::AppError;

/// Resolves loosely typed identifiers (id, code, name, email, username) to
/// directory records. The first lookup kind that matches wins.
pub struct IdentityResolver<'r, R> {
    repo: &'r mut R,
}

/// Every party named by a booking request.
#[derive(Debug, Clone)]
pub struct BookingParties {
    pub patient: Patient,
    pub staff: StaffMember,
    pub hospital: Hospital,
    pub department: Option<Department>,
}

fn non_blank<'a>(raw: &'a str, what: &str) -> Result<&'a str, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!(
            "{} identifier is required",
            what
        )));
    }
    Ok(trimmed)
}

impl<'r, R: DirectoryRepository> IdentityResolver<'r, R> {
    pub fn new(repo: &'r mut R) -> Self {
        Self { repo }
    }

    pub async fn patient(&mut self, raw: &str) -> Result<Patient, AppError> {
        let raw = non_blank(raw, "Patient")?;
        for lookup in Lookup::candidates(raw) {
            if let Some(patient) = self.repo.find_patient(lookup).await? {
                return Ok(patient);
            }
        }
        Err(AppError::not_found("Patient", raw))
    }

    pub async fn staff(&mut self, raw: &str) -> Result<StaffMember, AppError> {
        let raw = non_blank(raw, "Staff")?;
        for lookup in Lookup::candidates(raw) {
            if let Some(staff) = self.repo.find_staff(lookup).await? {
                return Ok(staff);
            }
        }
        Err(AppError::not_found("Staff member", raw))
    }

    pub async fn hospital(&mut self, raw: &str) -> Result<Hospital, AppError> {
        let raw = non_blank(raw, "Hospital")?;
        for lookup in Lookup::candidates(raw) {
            if let Some(hospital) = self.repo.find_hospital(lookup).await? {
                return Ok(hospital);
            }
        }
        Err(AppError::not_found("Hospital", raw))
    }

    /// Departments only resolve inside the given hospital.
    pub async fn department(
        &mut self,
        hospital_id: Uuid,
        raw: &str,
    ) -> Result<Department, AppError> {
        let raw = non_blank(raw, "Department")?;
        for lookup in Lookup::candidates(raw) {
            if let Some(department) = self.repo.find_department(hospital_id, lookup).await? {
                return Ok(department);
            }
        }
        Err(AppError::not_found("Department", raw))
    }

    pub async fn booking(
        &mut self,
        patient: &str,
        staff: &str,
        hospital: &str,
        department: Option<&str>,
    ) -> Result<BookingParties, AppError> {
        let patient = self.patient(patient).await?;
        let staff = self.staff(staff).await?;
        let hospital = self.hospital(hospital).await?;
        let department = match department.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => Some(self.department(hospital.id, raw).await?),
            None => None,
        };

        Ok(BookingParties {
            patient,
            staff,
            hospital,
            department,
        })
    }
}

pub async fn require_staff<R: DirectoryRepository>(
    repo: &mut R,
    staff_id: Uuid,
) -> Result<StaffMember, AppError> {
    repo.find_staff(Lookup::Id(staff_id))
        .await?
        .ok_or_else(|| AppError::not_found("Staff member", staff_id))
}

pub async fn require_patient<R: DirectoryRepository>(
    repo: &mut R,
    patient_id: Uuid,
) -> Result<Patient, AppError> {
    repo.find_patient(Lookup::Id(patient_id))
        .await?
        .ok_or_else(|| AppError::not_found("Patient", patient_id))
}
