//! Database abstraction layer.
//!
//! Backend-agnostic store traits plus the record/param types they exchange.
//! The single implementation lives in [`postgres`] (deadpool-postgres +
//! tokio-postgres, refinery migrations).
//!
//! Audit rows for case mutations are written by the backend inside the same
//! transaction as the mutation itself, so no code path that persists a case
//! can skip the audit trail.

pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{BrandingDefaults, DatabaseConfig};
use crate::error::DatabaseError;
use crate::users::Role;

/// Create the PostgreSQL backend from configuration, run migrations, and
/// return it behind the unified trait object.
pub async fn connect_from_config(
    config: &DatabaseConfig,
) -> Result<Arc<dyn Database>, DatabaseError> {
    let backend = postgres::PgBackend::new(config)?;
    backend.run_migrations().await?;
    Ok(Arc::new(backend))
}

/// Tags persisted as comma-joined text columns.
///
/// `as_str` is the stored value; `from_db_value` is its inverse. Decoding
/// skips unknown tags rather than failing, since the column is free text at
/// the storage layer.
pub trait TagSet: Sized + Copy {
    fn as_str(self) -> &'static str;
    fn from_db_value(value: &str) -> Option<Self>;
}

/// Encode tags for storage, preserving submission order. No dedup: the
/// persistence layer stores what the form sent.
pub fn encode_tags<T: TagSet>(tags: &[T]) -> String {
    tags.iter()
        .map(|tag| tag.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decode a comma-joined column back into tags, preserving order.
/// Empty input and unknown tags yield nothing.
pub fn decode_tags<T: TagSet>(raw: &str) -> Vec<T> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(T::from_db_value)
        .collect()
}

/// Case workflow state. Extension is a separate one-way flag on the case,
/// not a fifth status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Registrado,
    EnTramite,
    Resuelto,
    Cerrado,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 4] = [
        Self::Registrado,
        Self::EnTramite,
        Self::Resuelto,
        Self::Cerrado,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registrado => "registrado",
            Self::EnTramite => "en_tramite",
            Self::Resuelto => "resuelto",
            Self::Cerrado => "cerrado",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Registrado => "Registrado",
            Self::EnTramite => "En trámite",
            Self::Resuelto => "Resuelto",
            Self::Cerrado => "Cerrado",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "registrado" => Some(Self::Registrado),
            "en_tramite" => Some(Self::EnTramite),
            "resuelto" => Some(Self::Resuelto),
            "cerrado" => Some(Self::Cerrado),
            _ => None,
        }
    }
}

/// Kind of conflict a case records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Vecinal,
    Individual,
    Comunitario,
    Contravencion,
    Patrimonial,
    Otro,
}

impl ConflictType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vecinal => "vecinal",
            Self::Individual => "individual",
            Self::Comunitario => "comunitario",
            Self::Contravencion => "contravencion",
            Self::Patrimonial => "patrimonial",
            Self::Otro => "otro",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Vecinal => "Vecinal",
            Self::Individual => "Individual",
            Self::Comunitario => "Comunitario",
            Self::Contravencion => "Contravención sin privación de libertad",
            Self::Patrimonial => "Obligaciones patrimoniales hasta cinco salarios básicos",
            Self::Otro => "Otro",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "vecinal" => Some(Self::Vecinal),
            "individual" => Some(Self::Individual),
            "comunitario" => Some(Self::Comunitario),
            "contravencion" => Some(Self::Contravencion),
            "patrimonial" => Some(Self::Patrimonial),
            "otro" => Some(Self::Otro),
            _ => None,
        }
    }
}

/// Requested resolution channel. Multi-select on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    Conciliacion,
    Mediacion,
    Equidad,
    Otro,
}

impl TagSet for ResolutionMethod {
    fn as_str(self) -> &'static str {
        match self {
            Self::Conciliacion => "conciliacion",
            Self::Mediacion => "mediacion",
            Self::Equidad => "equidad",
            Self::Otro => "otro",
        }
    }

    fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "conciliacion" => Some(Self::Conciliacion),
            "mediacion" => Some(Self::Mediacion),
            "equidad" => Some(Self::Equidad),
            "otro" => Some(Self::Otro),
            _ => None,
        }
    }
}

impl ResolutionMethod {
    pub fn label(self) -> &'static str {
        match self {
            Self::Conciliacion => "Conciliación",
            Self::Mediacion => "Mediación",
            Self::Equidad => "Resolución en equidad",
            Self::Otro => "Otro",
        }
    }
}

/// Zone tag for where the conflict happens. Multi-select on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationBlock {
    #[serde(rename = "bloque_1")]
    Bloque1,
    #[serde(rename = "bloque_2")]
    Bloque2,
    #[serde(rename = "bloque_3")]
    Bloque3,
    #[serde(rename = "bloque_4")]
    Bloque4,
    #[serde(rename = "bloque_5")]
    Bloque5,
    #[serde(rename = "bloque_6")]
    Bloque6,
    #[serde(rename = "otro")]
    Otro,
}

impl TagSet for LocationBlock {
    fn as_str(self) -> &'static str {
        match self {
            Self::Bloque1 => "bloque_1",
            Self::Bloque2 => "bloque_2",
            Self::Bloque3 => "bloque_3",
            Self::Bloque4 => "bloque_4",
            Self::Bloque5 => "bloque_5",
            Self::Bloque6 => "bloque_6",
            Self::Otro => "otro",
        }
    }

    fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "bloque_1" => Some(Self::Bloque1),
            "bloque_2" => Some(Self::Bloque2),
            "bloque_3" => Some(Self::Bloque3),
            "bloque_4" => Some(Self::Bloque4),
            "bloque_5" => Some(Self::Bloque5),
            "bloque_6" => Some(Self::Bloque6),
            "otro" => Some(Self::Otro),
            _ => None,
        }
    }
}

impl LocationBlock {
    pub fn label(self) -> &'static str {
        match self {
            Self::Bloque1 => "Bloque 1",
            Self::Bloque2 => "Bloque 2",
            Self::Bloque3 => "Bloque 3",
            Self::Bloque4 => "Bloque 4",
            Self::Bloque5 => "Bloque 5",
            Self::Bloque6 => "Bloque 6",
            Self::Otro => "Otro",
        }
    }
}

/// Audit trail action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Deleted => "DELETED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "Creado",
            Self::Updated => "Actualizado",
            Self::Deleted => "Eliminado",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "CREATED" => Some(Self::Created),
            "UPDATED" => Some(Self::Updated),
            "DELETED" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// A persisted community case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: Uuid,
    pub case_number: String,
    pub date_registered: DateTime<Utc>,
    pub applicant_name: String,
    pub applicant_id: String,
    pub applicant_phone: Option<String>,
    pub applicant_email: Option<String>,
    pub involved_name: String,
    pub involved_id: Option<String>,
    pub conflict_description: String,
    pub location: String,
    pub conflict_type: ConflictType,
    pub other_conflict_type: Option<String>,
    pub estimated_value: Option<Decimal>,
    pub resolution_methods: Vec<ResolutionMethod>,
    pub other_resolution_method: Option<String>,
    pub location_blocks: Vec<LocationBlock>,
    pub other_location_block: Option<String>,
    pub notes: Option<String>,
    pub status: CaseStatus,
    pub extension_granted: bool,
    pub judge_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Submitted case fields, shared between registration and full update.
/// The case number, registration date, status, and owning judge are never
/// part of a draft.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseDraft {
    pub applicant_name: String,
    pub applicant_id: String,
    pub applicant_phone: Option<String>,
    pub applicant_email: Option<String>,
    pub involved_name: String,
    pub involved_id: Option<String>,
    pub conflict_description: String,
    pub location: String,
    pub conflict_type: ConflictType,
    pub other_conflict_type: Option<String>,
    pub estimated_value: Option<Decimal>,
    #[serde(default)]
    pub resolution_methods: Vec<ResolutionMethod>,
    pub other_resolution_method: Option<String>,
    #[serde(default)]
    pub location_blocks: Vec<LocationBlock>,
    pub other_location_block: Option<String>,
    pub notes: Option<String>,
}

/// Listing filter. `judge_id` scopes a judge to their own cases; the rest
/// are the admin panel's search controls.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub judge_id: Option<Uuid>,
    pub status: Option<CaseStatus>,
    pub judge_username: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub query: Option<String>,
}

/// Outcome of an extension grant: `newly_granted` is false when the flag
/// was already set (idempotent no-op, not audited).
#[derive(Debug, Clone)]
pub struct ExtensionGrant {
    pub case: CaseRecord,
    pub newly_granted: bool,
}

/// Account profile with role request / approval state.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub last_name: String,
    pub id_number: String,
    pub date_of_birth: NaiveDate,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role_request: Role,
    pub approved_by_admin: bool,
    /// Authoritative for access control. Only set once an admin approves.
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.full_name, self.last_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterProfileParams {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub last_name: String,
    pub id_number: String,
    pub date_of_birth: NaiveDate,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role_request: Role,
}

/// Which unique profile fields are already taken, for field-level errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileConflicts {
    pub username_taken: bool,
    pub email_taken: bool,
    pub id_number_taken: bool,
}

/// One append-only audit trail row.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogRecord {
    pub id: Uuid,
    pub action: AuditAction,
    pub case_number: Option<String>,
    pub performed_by: Option<Uuid>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The singleton branding row.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformSettingsRecord {
    pub primary_color: String,
    pub secondary_color: String,
    pub footer_text: Option<String>,
    pub logo_path: Option<String>,
    pub header_image_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Partial settings update. Outer `Option` = field untouched; inner
/// `Option` = clear vs set for nullable columns.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlatformSettingsParams {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub footer_text: Option<Option<String>>,
    pub logo_path: Option<Option<String>>,
    pub header_image_path: Option<Option<String>>,
}

// ==================== Sub-traits ====================

#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Persist a new case: allocates the (year, month) sequence, stamps the
    /// case number, and writes the CREATED audit row, all in one
    /// transaction.
    async fn register_case(
        &self,
        judge_id: Uuid,
        draft: &CaseDraft,
    ) -> Result<CaseRecord, DatabaseError>;

    async fn get_case(&self, case_number: &str) -> Result<Option<CaseRecord>, DatabaseError>;

    async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseRecord>, DatabaseError>;

    /// Overwrite every draft field. The case number is never touched.
    /// Returns `None` when the case does not exist.
    async fn update_case(
        &self,
        case_number: &str,
        draft: &CaseDraft,
        performed_by: Option<Uuid>,
    ) -> Result<Option<CaseRecord>, DatabaseError>;

    async fn update_case_status(
        &self,
        case_number: &str,
        status: CaseStatus,
        performed_by: Option<Uuid>,
    ) -> Result<Option<CaseRecord>, DatabaseError>;

    /// One-way extension flag. Already-granted returns the record with
    /// `newly_granted: false` and writes no audit row.
    async fn grant_case_extension(
        &self,
        case_number: &str,
        performed_by: Option<Uuid>,
    ) -> Result<Option<ExtensionGrant>, DatabaseError>;

    async fn delete_case(
        &self,
        case_number: &str,
        performed_by: Option<Uuid>,
    ) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn create_profile(
        &self,
        input: &RegisterProfileParams,
    ) -> Result<ProfileRecord, DatabaseError>;
    async fn get_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, DatabaseError>;
    async fn get_profile_by_username(
        &self,
        username: &str,
    ) -> Result<Option<ProfileRecord>, DatabaseError>;
    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, DatabaseError>;
    async fn list_pending_profiles(&self) -> Result<Vec<ProfileRecord>, DatabaseError>;
    /// Sets `approved_by_admin` and copies `role_request` into `role`.
    async fn approve_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, DatabaseError>;
    async fn delete_profile(&self, id: Uuid) -> Result<bool, DatabaseError>;
    async fn find_profile_conflicts(
        &self,
        input: &RegisterProfileParams,
    ) -> Result<ProfileConflicts, DatabaseError>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn list_audit_entries(&self, limit: i64) -> Result<Vec<AuditLogRecord>, DatabaseError>;
    async fn audit_entries_for_case(
        &self,
        case_number: &str,
    ) -> Result<Vec<AuditLogRecord>, DatabaseError>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Atomic get-or-create of the singleton row, keyed by the fixed id.
    /// Safe under concurrent first-time initialization.
    async fn load_platform_settings(
        &self,
        defaults: &BrandingDefaults,
    ) -> Result<PlatformSettingsRecord, DatabaseError>;

    async fn update_platform_settings(
        &self,
        defaults: &BrandingDefaults,
        input: &UpdatePlatformSettingsParams,
    ) -> Result<PlatformSettingsRecord, DatabaseError>;
}

/// Backend-agnostic database supertrait combining all stores.
#[async_trait]
pub trait Database: CaseStore + ProfileStore + AuditStore + SettingsStore + Send + Sync {
    /// Run schema migrations for this backend.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::{
        AuditAction, CaseStatus, ConflictType, LocationBlock, ResolutionMethod, decode_tags,
        encode_tags,
    };

    #[test]
    fn tags_round_trip_in_submission_order() {
        let methods = [ResolutionMethod::Mediacion, ResolutionMethod::Otro];
        let encoded = encode_tags(&methods);
        assert_eq!(encoded, "mediacion, otro");
        assert_eq!(decode_tags::<ResolutionMethod>(&encoded), methods);
    }

    #[test]
    fn decode_tags_handles_empty_and_unknown_values() {
        assert!(decode_tags::<ResolutionMethod>("").is_empty());
        assert!(decode_tags::<ResolutionMethod>("  , ,").is_empty());
        assert_eq!(
            decode_tags::<LocationBlock>("bloque_2, desconocido, otro"),
            vec![LocationBlock::Bloque2, LocationBlock::Otro]
        );
    }

    #[test]
    fn decode_does_not_dedup_repeated_tags() {
        let decoded = decode_tags::<ResolutionMethod>("mediacion, mediacion");
        assert_eq!(
            decoded,
            vec![ResolutionMethod::Mediacion, ResolutionMethod::Mediacion]
        );
    }

    #[test]
    fn status_db_values_round_trip() {
        for status in CaseStatus::ALL {
            assert_eq!(CaseStatus::from_db_value(status.as_str()), Some(status));
        }
        assert_eq!(CaseStatus::from_db_value("prorroga"), None);
    }

    #[test]
    fn conflict_type_labels_keep_long_forms() {
        assert_eq!(
            ConflictType::Contravencion.label(),
            "Contravención sin privación de libertad"
        );
        assert_eq!(
            ConflictType::from_db_value("patrimonial"),
            Some(ConflictType::Patrimonial)
        );
    }

    #[test]
    fn audit_action_db_values_are_uppercase() {
        assert_eq!(AuditAction::Created.as_str(), "CREATED");
        assert_eq!(
            AuditAction::from_db_value("DELETED"),
            Some(AuditAction::Deleted)
        );
        assert_eq!(AuditAction::from_db_value("deleted"), None);
    }
}
