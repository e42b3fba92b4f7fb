use neurocare_types::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fine-grained capabilities granted to roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewOwnProfile,
    UpdateOwnProfile,
    ViewOwnGames,
    PlayGames,
    ViewOwnScores,
    UploadDocuments,
    ViewOwnReports,

    ViewAssignedPatients,
    ViewPatientProgress,
    ViewPatientReports,
    SendMessages,

    ManagePatients,
    AssignGames,
    ViewAllScores,
    GenerateReports,
    RunPredictions,
    ViewAnalytics,
    ManageCaregivers,

    ManageUsers,
    ManageDoctors,
    ManageSystemSettings,
    ViewSystemAnalytics,
    ManageRoles,
    AccessAuditLogs,
}

impl Permission {
    pub const ALL: [Permission; 24] = [
        Permission::ViewOwnProfile,
        Permission::UpdateOwnProfile,
        Permission::ViewOwnGames,
        Permission::PlayGames,
        Permission::ViewOwnScores,
        Permission::UploadDocuments,
        Permission::ViewOwnReports,
        Permission::ViewAssignedPatients,
        Permission::ViewPatientProgress,
        Permission::ViewPatientReports,
        Permission::SendMessages,
        Permission::ManagePatients,
        Permission::AssignGames,
        Permission::ViewAllScores,
        Permission::GenerateReports,
        Permission::RunPredictions,
        Permission::ViewAnalytics,
        Permission::ManageCaregivers,
        Permission::ManageUsers,
        Permission::ManageDoctors,
        Permission::ManageSystemSettings,
        Permission::ViewSystemAnalytics,
        Permission::ManageRoles,
        Permission::AccessAuditLogs,
    ];
}

const PATIENT_PERMISSIONS: &[Permission] = &[
    Permission::ViewOwnProfile,
    Permission::UpdateOwnProfile,
    Permission::ViewOwnGames,
    Permission::PlayGames,
    Permission::ViewOwnScores,
    Permission::UploadDocuments,
    Permission::ViewOwnReports,
];

const CAREGIVER_PERMISSIONS: &[Permission] = &[
    Permission::ViewOwnProfile,
    Permission::UpdateOwnProfile,
    Permission::ViewAssignedPatients,
    Permission::ViewPatientProgress,
    Permission::ViewPatientReports,
    Permission::SendMessages,
];

const DOCTOR_PERMISSIONS: &[Permission] = &[
    Permission::ViewOwnProfile,
    Permission::UpdateOwnProfile,
    Permission::ManagePatients,
    Permission::AssignGames,
    Permission::ViewAllScores,
    Permission::GenerateReports,
    Permission::RunPredictions,
    Permission::ViewAnalytics,
    Permission::ManageCaregivers,
];

pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Patient => PATIENT_PERMISSIONS,
        Role::Caregiver => CAREGIVER_PERMISSIONS,
        Role::Doctor => DOCTOR_PERMISSIONS,
        Role::Admin => &Permission::ALL,
    }
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    role_permissions(role).contains(&permission)
}

/// Who is attached to a patient code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientAccess {
    /// The patient's own account, when linked.
    pub user_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub caregiver_ids: Vec<Uuid>,
}

impl PatientAccess {
    pub fn is_doctor(&self, user_id: Uuid) -> bool {
        self.doctor_id == Some(user_id)
    }
}

/// Patient-scoped reads are open to the patient, their doctor, their
/// caregivers and admins.
pub fn can_view_patient(user_id: Uuid, role: Role, access: &PatientAccess) -> bool {
    match role {
        Role::Admin => true,
        Role::Patient => access.user_id == Some(user_id),
        Role::Doctor => access.is_doctor(user_id),
        Role::Caregiver => access.caregiver_ids.contains(&user_id),
    }
}
