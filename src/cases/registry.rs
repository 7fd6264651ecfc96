//! The case registry: validation, ownership, and workflow rules.
//!
//! The registry decides *whether* a mutation may happen; the store decides
//! *how* it is persisted (including the per-month numbering and the audit
//! row committed in the same transaction).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::db::{
    CaseDraft, CaseFilter, CaseRecord, CaseStatus, CaseStore, ConflictType, Database,
    LocationBlock, ProfileRecord, ResolutionMethod,
};
use crate::error::{CaseError, ValidationErrors};
use crate::users::{Action, Role, active_role, can};

use super::deadline::DeadlineReport;

/// Statuses a judge may move a case into. Never back to `registrado`.
const JUDGE_ALLOWED_STATUSES: [CaseStatus; 3] = [
    CaseStatus::EnTramite,
    CaseStatus::Resuelto,
    CaseStatus::Cerrado,
];

/// Result of an extension request. A repeat request succeeds without
/// effect; callers surface it as a warning, not an error.
#[derive(Debug, Clone)]
pub enum ExtensionOutcome {
    Granted(CaseRecord),
    AlreadyGranted(CaseRecord),
}

impl ExtensionOutcome {
    pub fn case(&self) -> &CaseRecord {
        match self {
            Self::Granted(case) | Self::AlreadyGranted(case) => case,
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

fn validate_draft(draft: &CaseDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if draft.applicant_name.trim().is_empty() {
        errors.add("applicant_name", "El nombre del solicitante es obligatorio.");
    }
    if draft.applicant_id.trim().is_empty() {
        errors.add("applicant_id", "La cédula del solicitante es obligatoria.");
    }
    if draft.involved_name.trim().is_empty() {
        errors.add("involved_name", "El nombre del involucrado es obligatorio.");
    }
    if draft.conflict_description.trim().is_empty() {
        errors.add(
            "conflict_description",
            "La descripción del conflicto es obligatoria.",
        );
    }
    if draft.location.trim().is_empty() {
        errors.add("location", "El lugar del conflicto es obligatorio.");
    }

    if draft.conflict_type == ConflictType::Otro && is_blank(&draft.other_conflict_type) {
        errors.add(
            "other_conflict_type",
            "Debe especificar el otro tipo de conflicto.",
        );
    }
    if draft
        .resolution_methods
        .contains(&ResolutionMethod::Otro)
        && is_blank(&draft.other_resolution_method)
    {
        errors.add(
            "other_resolution_method",
            "Debe especificar el otro medio de resolución.",
        );
    }
    if draft.location_blocks.contains(&LocationBlock::Otro)
        && is_blank(&draft.other_location_block)
    {
        errors.add("other_location_block", "Debe especificar el otro bloque.");
    }

    errors
}

pub struct CaseRegistry {
    db: Arc<dyn Database>,
}

impl CaseRegistry {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    fn role_of(actor: &ProfileRecord) -> Result<Role, CaseError> {
        active_role(actor).ok_or(CaseError::AccessDenied)
    }

    /// Register a new case owned by the submitting judge.
    pub async fn register(
        &self,
        actor: &ProfileRecord,
        draft: &CaseDraft,
    ) -> Result<CaseRecord, CaseError> {
        let role = Self::role_of(actor)?;
        if !can(role, Action::RegisterCase) {
            return Err(CaseError::AccessDenied);
        }
        validate_draft(draft)
            .into_result()
            .map_err(CaseError::Validation)?;

        let case = self.db.register_case(actor.id, draft).await?;
        tracing::info!(
            case_number = %case.case_number,
            judge = %actor.username,
            "case registered"
        );
        Ok(case)
    }

    /// Fetch a case the actor is allowed to see. A judge resolving someone
    /// else's case gets not-found, never access-denied, so case numbers
    /// are not probeable.
    pub async fn visible_case(
        &self,
        actor: &ProfileRecord,
        case_number: &str,
    ) -> Result<CaseRecord, CaseError> {
        let role = Self::role_of(actor)?;
        let case = self
            .db
            .get_case(case_number)
            .await?
            .ok_or(CaseError::NotFound)?;

        if can(role, Action::ViewAllCases) {
            return Ok(case);
        }
        if can(role, Action::ViewOwnCases) && case.judge_id == Some(actor.id) {
            return Ok(case);
        }
        Err(CaseError::NotFound)
    }

    /// Detail view: the case plus its deadline report at `now`.
    pub async fn detail(
        &self,
        actor: &ProfileRecord,
        case_number: &str,
        now: DateTime<Utc>,
    ) -> Result<(CaseRecord, DeadlineReport), CaseError> {
        let case = self.visible_case(actor, case_number).await?;
        let report = DeadlineReport::for_case(&case, now);
        Ok((case, report))
    }

    /// List cases for the actor: judges are scoped to their own, admins
    /// see everything the filter matches.
    pub async fn list(
        &self,
        actor: &ProfileRecord,
        mut filter: CaseFilter,
    ) -> Result<Vec<CaseRecord>, CaseError> {
        let role = Self::role_of(actor)?;
        if can(role, Action::ViewAllCases) {
            // Admin filters pass through untouched.
        } else if can(role, Action::ViewOwnCases) {
            filter.judge_id = Some(actor.id);
        } else {
            return Err(CaseError::AccessDenied);
        }
        Ok(self.db.list_cases(&filter).await?)
    }

    /// Full-field update (admin). The case number survives any update.
    pub async fn update(
        &self,
        actor: &ProfileRecord,
        case_number: &str,
        draft: &CaseDraft,
    ) -> Result<CaseRecord, CaseError> {
        let role = Self::role_of(actor)?;
        if !can(role, Action::EditAnyCase) {
            return Err(CaseError::AccessDenied);
        }
        validate_draft(draft)
            .into_result()
            .map_err(CaseError::Validation)?;

        self.db
            .update_case(case_number, draft, Some(actor.id))
            .await?
            .ok_or(CaseError::NotFound)
    }

    /// Move a case to a new status. Judges may only progress their own
    /// cases into the allowed set; admins are unrestricted. A disallowed
    /// target is rejected without touching state.
    pub async fn transition_status(
        &self,
        actor: &ProfileRecord,
        case_number: &str,
        new_status: CaseStatus,
    ) -> Result<CaseRecord, CaseError> {
        let role = Self::role_of(actor)?;
        let case = self.visible_case(actor, case_number).await?;

        let allowed = if can(role, Action::TransitionAnyStatus) {
            true
        } else if can(role, Action::ProgressOwnCase) {
            JUDGE_ALLOWED_STATUSES.contains(&new_status)
        } else {
            return Err(CaseError::AccessDenied);
        };
        if !allowed {
            return Err(CaseError::TransitionNotAllowed {
                requested: new_status.as_str().to_string(),
            });
        }

        self.db
            .update_case_status(&case.case_number, new_status, Some(actor.id))
            .await?
            .ok_or(CaseError::NotFound)
    }

    /// Grant the one-time deadline extension. Idempotent: a second request
    /// reports `AlreadyGranted` and changes nothing.
    pub async fn grant_extension(
        &self,
        actor: &ProfileRecord,
        case_number: &str,
    ) -> Result<ExtensionOutcome, CaseError> {
        let role = Self::role_of(actor)?;
        if !can(role, Action::RequestExtension) {
            return Err(CaseError::AccessDenied);
        }
        let case = self.visible_case(actor, case_number).await?;

        let grant = self
            .db
            .grant_case_extension(&case.case_number, Some(actor.id))
            .await?
            .ok_or(CaseError::NotFound)?;

        if grant.newly_granted {
            tracing::info!(case_number = %grant.case.case_number, "extension granted");
            Ok(ExtensionOutcome::Granted(grant.case))
        } else {
            tracing::debug!(
                case_number = %grant.case.case_number,
                "extension already granted, no-op"
            );
            Ok(ExtensionOutcome::AlreadyGranted(grant.case))
        }
    }

    /// Delete a case (admin only). The DELETED audit row commits with the
    /// deletion.
    pub async fn delete(
        &self,
        actor: &ProfileRecord,
        case_number: &str,
    ) -> Result<(), CaseError> {
        let role = Self::role_of(actor)?;
        if !can(role, Action::DeleteCase) {
            return Err(CaseError::AccessDenied);
        }
        if self.db.delete_case(case_number, Some(actor.id)).await? {
            tracing::info!(case_number, admin = %actor.username, "case deleted");
            Ok(())
        } else {
            Err(CaseError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::db::{CaseDraft, CaseStatus, ConflictType, LocationBlock, ResolutionMethod};

    use super::{JUDGE_ALLOWED_STATUSES, validate_draft};

    fn complete_draft() -> CaseDraft {
        CaseDraft {
            applicant_name: "Rosa Quishpe".to_string(),
            applicant_id: "1704567890".to_string(),
            applicant_phone: Some("0991234567".to_string()),
            applicant_email: None,
            involved_name: "Pedro Armas".to_string(),
            involved_id: None,
            conflict_description: "Linderos en disputa entre parcelas vecinas.".to_string(),
            location: "Sector La Esperanza".to_string(),
            conflict_type: ConflictType::Vecinal,
            other_conflict_type: None,
            estimated_value: Some(dec!(350.00)),
            resolution_methods: vec![ResolutionMethod::Mediacion],
            other_resolution_method: None,
            location_blocks: vec![LocationBlock::Bloque2],
            other_location_block: None,
            notes: None,
        }
    }

    #[test]
    fn complete_draft_validates_clean() {
        assert!(validate_draft(&complete_draft()).is_empty());
    }

    #[test]
    fn required_fields_are_enforced() {
        let mut draft = complete_draft();
        draft.applicant_name = "  ".to_string();
        draft.conflict_description = String::new();

        let errors = validate_draft(&draft);
        assert!(errors.get("applicant_name").is_some());
        assert!(errors.get("conflict_description").is_some());
        assert!(errors.get("location").is_none());
    }

    #[test]
    fn otro_conflict_type_requires_companion_text() {
        let mut draft = complete_draft();
        draft.conflict_type = ConflictType::Otro;
        assert_eq!(
            validate_draft(&draft).get("other_conflict_type"),
            Some("Debe especificar el otro tipo de conflicto.")
        );

        draft.other_conflict_type = Some("Uso de espacios comunales".to_string());
        assert!(validate_draft(&draft).is_empty());
    }

    #[test]
    fn otro_resolution_method_requires_companion_text() {
        let mut draft = complete_draft();
        draft.resolution_methods = vec![ResolutionMethod::Mediacion, ResolutionMethod::Otro];
        assert_eq!(
            validate_draft(&draft).get("other_resolution_method"),
            Some("Debe especificar el otro medio de resolución.")
        );

        draft.other_resolution_method = Some("Conciliación informal".to_string());
        assert!(validate_draft(&draft).is_empty());
    }

    #[test]
    fn otro_block_requires_companion_text() {
        let mut draft = complete_draft();
        draft.location_blocks = vec![LocationBlock::Otro];
        draft.other_location_block = Some("   ".to_string());
        assert_eq!(
            validate_draft(&draft).get("other_location_block"),
            Some("Debe especificar el otro bloque.")
        );
    }

    #[test]
    fn judges_cannot_move_cases_back_to_registered() {
        assert!(!JUDGE_ALLOWED_STATUSES.contains(&CaseStatus::Registrado));
        assert!(JUDGE_ALLOWED_STATUSES.contains(&CaseStatus::EnTramite));
        assert!(JUDGE_ALLOWED_STATUSES.contains(&CaseStatus::Resuelto));
        assert!(JUDGE_ALLOWED_STATUSES.contains(&CaseStatus::Cerrado));
    }
}
