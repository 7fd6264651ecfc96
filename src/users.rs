//! Roles, the central authorization check, and the profile directory.
//!
//! Access control is decided in exactly one place: [`can`]. Handlers map
//! their operation onto an [`Action`] and ask; no call site inspects role
//! values directly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Database, ProfileRecord, ProfileStore, RegisterProfileParams};
use crate::error::{ProfileError, ValidationErrors};

/// Closed role set. `juez` registers and progresses their own cases;
/// `admin` manages users, all cases, statistics, exports, and settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Juez,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Juez => "juez",
            Self::Admin => "admin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Juez => "Juez de Paz",
            Self::Admin => "Administrador",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "juez" => Some(Self::Juez),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Everything a handler can ask permission for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RegisterCase,
    ViewOwnCases,
    ProgressOwnCase,
    RequestExtension,
    ViewAllCases,
    EditAnyCase,
    DeleteCase,
    TransitionAnyStatus,
    ManageUsers,
    ViewStatistics,
    ExportCases,
    EditSettings,
    ViewAuditLog,
}

/// The single authorization point.
pub fn can(role: Role, action: Action) -> bool {
    match role {
        Role::Juez => matches!(
            action,
            Action::RegisterCase
                | Action::ViewOwnCases
                | Action::ProgressOwnCase
                | Action::RequestExtension
        ),
        Role::Admin => matches!(
            action,
            Action::ViewAllCases
                | Action::EditAnyCase
                | Action::DeleteCase
                | Action::TransitionAnyStatus
                | Action::ManageUsers
                | Action::ViewStatistics
                | Action::ExportCases
                | Action::EditSettings
                | Action::ViewAuditLog
        ),
    }
}

/// The role that counts for access control: the assigned role, and only
/// once an admin has approved the profile. A requested-but-unapproved role
/// grants nothing.
pub fn active_role(profile: &ProfileRecord) -> Option<Role> {
    if profile.approved_by_admin {
        profile.role
    } else {
        None
    }
}

fn ensure_can(actor: &ProfileRecord, action: Action) -> Result<Role, ProfileError> {
    match active_role(actor) {
        Some(role) if can(role, action) => Ok(role),
        _ => Err(ProfileError::AccessDenied),
    }
}

fn validate_registration(params: &RegisterProfileParams) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if params.full_name.trim().is_empty() {
        errors.add("full_name", "Los nombres son obligatorios.");
    }
    if params.last_name.trim().is_empty() {
        errors.add("last_name", "Los apellidos son obligatorios.");
    }
    if params.username.trim().is_empty() {
        errors.add("username", "El nombre de usuario es obligatorio.");
    }

    let id_number = params.id_number.trim();
    if id_number.is_empty() || !id_number.chars().all(|c| c.is_ascii_digit()) {
        errors.add("id_number", "La cédula debe contener solo números.");
    }

    let email = params.email.trim();
    if email.is_empty() || !email.contains('@') {
        errors.add("email", "El correo electrónico no es válido.");
    }

    errors
}

/// Citizen registration plus the admin approval workflow.
pub struct ProfileDirectory {
    db: Arc<dyn Database>,
}

impl ProfileDirectory {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Submit a registration request. The profile is created unapproved;
    /// the requested role stays advisory until an admin approves it.
    pub async fn register(
        &self,
        params: &RegisterProfileParams,
    ) -> Result<ProfileRecord, ProfileError> {
        let mut errors = validate_registration(params);

        if errors.is_empty() {
            let taken = self.db.find_profile_conflicts(params).await?;
            if taken.id_number_taken {
                errors.add("id_number", "Ya existe un usuario con esta cédula.");
            }
            if taken.email_taken {
                errors.add("email", "Ya existe un usuario con este correo electrónico.");
            }
            if taken.username_taken {
                errors.add("username", "Ya existe un usuario con este nombre de usuario.");
            }
        }

        errors.into_result().map_err(ProfileError::Validation)?;
        Ok(self.db.create_profile(params).await?)
    }

    /// Approve a pending request: the requested role becomes the assigned,
    /// authoritative role.
    pub async fn approve(
        &self,
        actor: &ProfileRecord,
        profile_id: Uuid,
    ) -> Result<ProfileRecord, ProfileError> {
        ensure_can(actor, Action::ManageUsers)?;
        let approved = self
            .db
            .approve_profile(profile_id)
            .await?
            .ok_or(ProfileError::NotFound)?;
        tracing::info!(
            profile = %approved.username,
            role = approved.role.map(Role::as_str).unwrap_or("?"),
            "profile approved"
        );
        Ok(approved)
    }

    /// Reject a pending request by deleting the profile.
    pub async fn reject(&self, actor: &ProfileRecord, profile_id: Uuid) -> Result<(), ProfileError> {
        ensure_can(actor, Action::ManageUsers)?;
        if self.db.delete_profile(profile_id).await? {
            Ok(())
        } else {
            Err(ProfileError::NotFound)
        }
    }

    pub async fn pending(&self, actor: &ProfileRecord) -> Result<Vec<ProfileRecord>, ProfileError> {
        ensure_can(actor, Action::ManageUsers)?;
        Ok(self.db.list_pending_profiles().await?)
    }

    /// Resolve the authenticated actor supplied by the identity provider.
    pub async fn resolve_actor(
        &self,
        username: &str,
    ) -> Result<Option<ProfileRecord>, ProfileError> {
        Ok(self.db.get_profile_by_username(username).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use crate::db::{ProfileRecord, RegisterProfileParams};

    use super::{Action, Role, active_role, can, validate_registration};

    fn profile(role_request: Role, approved: bool, role: Option<Role>) -> ProfileRecord {
        ProfileRecord {
            id: Uuid::new_v4(),
            username: "mrios".to_string(),
            email: "mrios@example.ec".to_string(),
            full_name: "María".to_string(),
            last_name: "Ríos".to_string(),
            id_number: "1712345678".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 4, 12).expect("valid date"),
            phone: None,
            address: None,
            role_request,
            approved_by_admin: approved,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn judges_cannot_delete_or_manage_users() {
        assert!(can(Role::Juez, Action::RegisterCase));
        assert!(can(Role::Juez, Action::RequestExtension));
        assert!(!can(Role::Juez, Action::DeleteCase));
        assert!(!can(Role::Juez, Action::ManageUsers));
        assert!(!can(Role::Juez, Action::ViewAllCases));
    }

    #[test]
    fn admins_manage_but_do_not_register_cases() {
        assert!(can(Role::Admin, Action::DeleteCase));
        assert!(can(Role::Admin, Action::ManageUsers));
        assert!(can(Role::Admin, Action::ExportCases));
        assert!(!can(Role::Admin, Action::RegisterCase));
    }

    #[test]
    fn unapproved_profile_has_no_active_role() {
        let pending = profile(Role::Juez, false, None);
        assert_eq!(active_role(&pending), None);

        // A stale role value without approval still grants nothing.
        let stale = profile(Role::Juez, false, Some(Role::Juez));
        assert_eq!(active_role(&stale), None);

        let approved = profile(Role::Juez, true, Some(Role::Juez));
        assert_eq!(active_role(&approved), Some(Role::Juez));
    }

    #[test]
    fn registration_requires_digit_only_id_number() {
        let mut params = RegisterProfileParams {
            username: "mrios".to_string(),
            email: "mrios@example.ec".to_string(),
            full_name: "María".to_string(),
            last_name: "Ríos".to_string(),
            id_number: "17-123".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 4, 12).expect("valid date"),
            phone: None,
            address: None,
            role_request: Role::Juez,
        };

        let errors = validate_registration(&params);
        assert_eq!(
            errors.get("id_number"),
            Some("La cédula debe contener solo números.")
        );

        params.id_number = "1712345678".to_string();
        assert!(validate_registration(&params).is_empty());
    }

    #[test]
    fn registration_rejects_blank_names_and_bad_email() {
        let params = RegisterProfileParams {
            username: "  ".to_string(),
            email: "not-an-email".to_string(),
            full_name: String::new(),
            last_name: "Ríos".to_string(),
            id_number: "1712345678".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 4, 12).expect("valid date"),
            phone: None,
            address: None,
            role_request: Role::Admin,
        };

        let errors = validate_registration(&params);
        assert!(errors.get("username").is_some());
        assert!(errors.get("full_name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("last_name").is_none());
    }
}
