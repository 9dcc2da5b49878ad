use uuid::Uuid;

use crate::auth::{ActorContext, ActorRole};
use crate::database::models::{Department, Patient, StaffMember};
use crate::error::AppError;

/// Boolean permission gates consulted before any domain rule runs.
pub trait Authorizer: Send + Sync {
    /// May the actor schedule, edit or decide on behalf of this staff member.
    fn can_manage_staff(&self, actor: &ActorContext, staff: &StaffMember) -> bool;

    fn can_view_staff(&self, actor: &ActorContext, staff: &StaffMember) -> bool;

    fn can_view_hospital(&self, actor: &ActorContext, hospital_id: Uuid) -> bool;

    fn can_view_department(&self, actor: &ActorContext, department: &Department) -> bool;

    fn can_book(&self, actor: &ActorContext, patient: &Patient, staff: &StaffMember) -> bool;
}

/// Grants by role and tenant: global admins everywhere, hospital admins
/// inside their hospital, department heads inside their department.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl Authorizer for RoleAuthorizer {
    fn can_manage_staff(&self, actor: &ActorContext, staff: &StaffMember) -> bool {
        match actor.role {
            ActorRole::GlobalAdmin => true,
            ActorRole::HospitalAdmin => actor.hospital_id == Some(staff.hospital_id),
            ActorRole::DepartmentHead => {
                actor.hospital_id == Some(staff.hospital_id)
                    && staff.department_id.is_some()
                    && actor.department_id == staff.department_id
            }
            ActorRole::Staff | ActorRole::Patient => false,
        }
    }

    fn can_view_staff(&self, actor: &ActorContext, staff: &StaffMember) -> bool {
        actor.staff_id == Some(staff.id) || self.can_manage_staff(actor, staff)
    }

    fn can_view_hospital(&self, actor: &ActorContext, hospital_id: Uuid) -> bool {
        match actor.role {
            ActorRole::GlobalAdmin => true,
            ActorRole::HospitalAdmin => actor.hospital_id == Some(hospital_id),
            _ => false,
        }
    }

    fn can_view_department(&self, actor: &ActorContext, department: &Department) -> bool {
        match actor.role {
            ActorRole::GlobalAdmin => true,
            ActorRole::HospitalAdmin => actor.hospital_id == Some(department.hospital_id),
            ActorRole::DepartmentHead => actor.department_id == Some(department.id),
            ActorRole::Staff | ActorRole::Patient => false,
        }
    }

    fn can_book(&self, actor: &ActorContext, patient: &Patient, staff: &StaffMember) -> bool {
        actor.patient_id == Some(patient.id)
            || actor.staff_id == Some(staff.id)
            || self.can_manage_staff(actor, staff)
    }
}

pub fn require(allowed: bool, message: &str) -> Result<(), AppError> {
    if allowed {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(message.to_string()))
    }
}
