//! PostgreSQL backend for the store traits.
//!
//! Case mutations and their audit rows share one transaction; numbering is
//! an atomic per-month counter increment inside the registration
//! transaction; the settings singleton is an upsert keyed by its fixed id.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Datelike;
use deadpool_postgres::{GenericClient, Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use crate::cases::number::format_case_number;
use crate::config::{BrandingDefaults, DatabaseConfig};
use crate::db::{
    AuditAction, AuditLogRecord, AuditStore, CaseDraft, CaseFilter, CaseRecord, CaseStatus,
    CaseStore, ConflictType, Database, ExtensionGrant, PlatformSettingsRecord, ProfileConflicts,
    ProfileRecord, ProfileStore, RegisterProfileParams, SettingsStore,
    UpdatePlatformSettingsParams, decode_tags, encode_tags,
};
use crate::error::DatabaseError;
use crate::users::Role;

mod embedded {
    refinery::embed_migrations!("migrations");
}

const CASE_COLUMNS: &str = "id, case_number, date_registered, applicant_name, applicant_id, \
     applicant_phone, applicant_email, involved_name, involved_id, conflict_description, \
     location, conflict_type, other_conflict_type, estimated_value, resolution_methods, \
     other_resolution_method, location_blocks, other_location_block, notes, status, \
     extension_granted, judge_id, updated_at";

const PROFILE_COLUMNS: &str = "id, username, email, full_name, last_name, id_number, \
     date_of_birth, phone, address, role_request, approved_by_admin, role, created_at, \
     updated_at";

const SETTINGS_COLUMNS: &str =
    "primary_color, secondary_color, footer_text, logo_path, header_image_path, updated_at";

/// PostgreSQL database backend over a deadpool connection pool.
pub struct PgBackend {
    pool: Pool,
}

impl PgBackend {
    pub fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pg_config = tokio_postgres::Config::from_str(&config.url)
            .map_err(|e| DatabaseError::Pool(format!("invalid database url: {e}")))?;
        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(config.pool_max_size)
            .build()
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Get a clone of the connection pool.
    pub fn pool(&self) -> Pool {
        self.pool.clone()
    }

    async fn conn(&self) -> Result<Object, DatabaseError> {
        Ok(self.pool.get().await?)
    }
}

fn row_to_case_record(row: &tokio_postgres::Row) -> Result<CaseRecord, DatabaseError> {
    let conflict_type_raw: String = row.get("conflict_type");
    let conflict_type = ConflictType::from_db_value(&conflict_type_raw).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid conflict_type '{conflict_type_raw}'"))
    })?;
    let status_raw: String = row.get("status");
    let status = CaseStatus::from_db_value(&status_raw).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid case status '{status_raw}'"))
    })?;
    let methods_raw: String = row.get("resolution_methods");
    let blocks_raw: String = row.get("location_blocks");

    Ok(CaseRecord {
        id: row.get("id"),
        case_number: row.get("case_number"),
        date_registered: row.get("date_registered"),
        applicant_name: row.get("applicant_name"),
        applicant_id: row.get("applicant_id"),
        applicant_phone: row.get("applicant_phone"),
        applicant_email: row.get("applicant_email"),
        involved_name: row.get("involved_name"),
        involved_id: row.get("involved_id"),
        conflict_description: row.get("conflict_description"),
        location: row.get("location"),
        conflict_type,
        other_conflict_type: row.get("other_conflict_type"),
        estimated_value: row.get("estimated_value"),
        resolution_methods: decode_tags(&methods_raw),
        other_resolution_method: row.get("other_resolution_method"),
        location_blocks: decode_tags(&blocks_raw),
        other_location_block: row.get("other_location_block"),
        notes: row.get("notes"),
        status,
        extension_granted: row.get("extension_granted"),
        judge_id: row.get("judge_id"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_profile_record(row: &tokio_postgres::Row) -> Result<ProfileRecord, DatabaseError> {
    let role_request_raw: String = row.get("role_request");
    let role_request = Role::from_db_value(&role_request_raw).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid role_request '{role_request_raw}'"))
    })?;
    let role = match row.get::<_, Option<String>>("role") {
        None => None,
        Some(raw) => Some(Role::from_db_value(&raw).ok_or_else(|| {
            DatabaseError::Serialization(format!("invalid role '{raw}'"))
        })?),
    };

    Ok(ProfileRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        last_name: row.get("last_name"),
        id_number: row.get("id_number"),
        date_of_birth: row.get("date_of_birth"),
        phone: row.get("phone"),
        address: row.get("address"),
        role_request,
        approved_by_admin: row.get("approved_by_admin"),
        role,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_audit_record(row: &tokio_postgres::Row) -> Result<AuditLogRecord, DatabaseError> {
    let action_raw: String = row.get("action");
    let action = AuditAction::from_db_value(&action_raw).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid audit action '{action_raw}'"))
    })?;
    Ok(AuditLogRecord {
        id: row.get("id"),
        action,
        case_number: row.get("case_number"),
        performed_by: row.get("performed_by"),
        details: row.get("details"),
        created_at: row.get("created_at"),
    })
}

fn row_to_settings_record(row: &tokio_postgres::Row) -> PlatformSettingsRecord {
    PlatformSettingsRecord {
        primary_color: row.get("primary_color"),
        secondary_color: row.get("secondary_color"),
        footer_text: row.get("footer_text"),
        logo_path: row.get("logo_path"),
        header_image_path: row.get("header_image_path"),
        updated_at: row.get("updated_at"),
    }
}

/// Append one audit row inside the caller's transaction, so the trail
/// commits or rolls back together with the mutation it describes.
async fn insert_audit<C>(
    conn: &C,
    action: AuditAction,
    case_number: &str,
    performed_by: Option<Uuid>,
    details: &str,
) -> Result<(), DatabaseError>
where
    C: GenericClient + Sync,
{
    conn.execute(
        "INSERT INTO audit_log (id, action, case_number, performed_by, details) \
         VALUES ($1, $2, $3, $4, $5)",
        &[
            &Uuid::new_v4(),
            &action.as_str(),
            &case_number,
            &performed_by,
            &details,
        ],
    )
    .await?;
    Ok(())
}

// ==================== Database (supertrait) ====================

#[async_trait]
impl Database for PgBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let mut conn = self.conn().await?;
        embedded::migrations::runner()
            .run_async(&mut **conn)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }
}

// ==================== CaseStore ====================

#[async_trait]
impl CaseStore for PgBackend {
    async fn register_case(
        &self,
        judge_id: Uuid,
        draft: &CaseDraft,
    ) -> Result<CaseRecord, DatabaseError> {
        let mut conn = self.conn().await?;
        let tx = conn.transaction().await?;

        // The counter row is the serialization point for a month's
        // numbering: the upsert takes a row lock, so two concurrent
        // registrations cannot observe the same last_seq.
        let now = chrono::Utc::now();
        let year = now.year();
        let month = now.month();
        let counter_row = tx
            .query_one(
                "INSERT INTO case_counters (year, month, last_seq) VALUES ($1, $2, 1) \
                 ON CONFLICT (year, month) DO UPDATE \
                 SET last_seq = case_counters.last_seq + 1 \
                 RETURNING last_seq",
                &[&year, &(month as i32)],
            )
            .await?;
        let sequence: i32 = counter_row.get(0);
        let case_number = format_case_number(year, month, sequence as u32);

        let row = tx
            .query_one(
                &format!(
                    "INSERT INTO cases (id, case_number, applicant_name, applicant_id, \
                     applicant_phone, applicant_email, involved_name, involved_id, \
                     conflict_description, location, conflict_type, other_conflict_type, \
                     estimated_value, resolution_methods, other_resolution_method, \
                     location_blocks, other_location_block, notes, status, judge_id) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                     $15, $16, $17, $18, $19, $20) \
                     RETURNING {CASE_COLUMNS}"
                ),
                &[
                    &Uuid::new_v4(),
                    &case_number,
                    &draft.applicant_name,
                    &draft.applicant_id,
                    &draft.applicant_phone,
                    &draft.applicant_email,
                    &draft.involved_name,
                    &draft.involved_id,
                    &draft.conflict_description,
                    &draft.location,
                    &draft.conflict_type.as_str(),
                    &draft.other_conflict_type,
                    &draft.estimated_value,
                    &encode_tags(&draft.resolution_methods),
                    &draft.other_resolution_method,
                    &encode_tags(&draft.location_blocks),
                    &draft.other_location_block,
                    &draft.notes,
                    &CaseStatus::Registrado.as_str(),
                    &judge_id,
                ],
            )
            .await?;
        let case = row_to_case_record(&row)?;

        insert_audit(
            &tx,
            AuditAction::Created,
            &case.case_number,
            Some(judge_id),
            &format!("El caso {} fue creado.", case.case_number),
        )
        .await?;

        tx.commit().await?;
        Ok(case)
    }

    async fn get_case(&self, case_number: &str) -> Result<Option<CaseRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {CASE_COLUMNS} FROM cases WHERE case_number = $1"),
                &[&case_number],
            )
            .await?;
        row.as_ref().map(row_to_case_record).transpose()
    }

    async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseRecord>, DatabaseError> {
        // Owned holders so the borrowed params outlive the query call.
        let status_value = filter.status.map(|s| s.as_str().to_string());
        let judge_pattern = filter
            .judge_username
            .as_ref()
            .map(|name| format!("%{}%", name.trim()));
        let query_pattern = filter
            .query
            .as_ref()
            .map(|q| format!("%{}%", q.trim()));

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(judge_id) = filter.judge_id.as_ref() {
            params.push(judge_id);
            clauses.push(format!("judge_id = ${}", params.len()));
        }
        if let Some(status) = status_value.as_ref() {
            params.push(status);
            clauses.push(format!("status = ${}", params.len()));
        }
        if let Some(pattern) = judge_pattern.as_ref() {
            params.push(pattern);
            clauses.push(format!(
                "judge_id IN (SELECT id FROM user_profiles WHERE username ILIKE ${})",
                params.len()
            ));
        }
        if let Some(from) = filter.date_from.as_ref() {
            params.push(from);
            clauses.push(format!("date_registered::date >= ${}", params.len()));
        }
        if let Some(to) = filter.date_to.as_ref() {
            params.push(to);
            clauses.push(format!("date_registered::date <= ${}", params.len()));
        }
        if let Some(pattern) = query_pattern.as_ref() {
            params.push(pattern);
            let idx = params.len();
            clauses.push(format!(
                "(case_number ILIKE ${idx} OR applicant_id ILIKE ${idx} OR involved_id ILIKE ${idx})"
            ));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {CASE_COLUMNS} FROM cases{where_clause} ORDER BY date_registered DESC"
        );

        let conn = self.conn().await?;
        let rows = conn.query(&sql, &params).await?;
        rows.iter().map(row_to_case_record).collect()
    }

    async fn update_case(
        &self,
        case_number: &str,
        draft: &CaseDraft,
        performed_by: Option<Uuid>,
    ) -> Result<Option<CaseRecord>, DatabaseError> {
        let mut conn = self.conn().await?;
        let tx = conn.transaction().await?;

        let row = tx
            .query_opt(
                &format!(
                    "UPDATE cases SET applicant_name = $2, applicant_id = $3, \
                     applicant_phone = $4, applicant_email = $5, involved_name = $6, \
                     involved_id = $7, conflict_description = $8, location = $9, \
                     conflict_type = $10, other_conflict_type = $11, estimated_value = $12, \
                     resolution_methods = $13, other_resolution_method = $14, \
                     location_blocks = $15, other_location_block = $16, notes = $17, \
                     updated_at = NOW() \
                     WHERE case_number = $1 \
                     RETURNING {CASE_COLUMNS}"
                ),
                &[
                    &case_number,
                    &draft.applicant_name,
                    &draft.applicant_id,
                    &draft.applicant_phone,
                    &draft.applicant_email,
                    &draft.involved_name,
                    &draft.involved_id,
                    &draft.conflict_description,
                    &draft.location,
                    &draft.conflict_type.as_str(),
                    &draft.other_conflict_type,
                    &draft.estimated_value,
                    &encode_tags(&draft.resolution_methods),
                    &draft.other_resolution_method,
                    &encode_tags(&draft.location_blocks),
                    &draft.other_location_block,
                    &draft.notes,
                ],
            )
            .await?;

        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };
        let case = row_to_case_record(&row)?;

        insert_audit(
            &tx,
            AuditAction::Updated,
            &case.case_number,
            performed_by,
            &format!("El caso {} fue actualizado.", case.case_number),
        )
        .await?;

        tx.commit().await?;
        Ok(Some(case))
    }

    async fn update_case_status(
        &self,
        case_number: &str,
        status: CaseStatus,
        performed_by: Option<Uuid>,
    ) -> Result<Option<CaseRecord>, DatabaseError> {
        let mut conn = self.conn().await?;
        let tx = conn.transaction().await?;

        let row = tx
            .query_opt(
                &format!(
                    "UPDATE cases SET status = $2, updated_at = NOW() \
                     WHERE case_number = $1 RETURNING {CASE_COLUMNS}"
                ),
                &[&case_number, &status.as_str()],
            )
            .await?;

        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };
        let case = row_to_case_record(&row)?;

        insert_audit(
            &tx,
            AuditAction::Updated,
            &case.case_number,
            performed_by,
            &format!(
                "Estado del caso {} actualizado a: {}.",
                case.case_number,
                status.label()
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(Some(case))
    }

    async fn grant_case_extension(
        &self,
        case_number: &str,
        performed_by: Option<Uuid>,
    ) -> Result<Option<ExtensionGrant>, DatabaseError> {
        let mut conn = self.conn().await?;
        let tx = conn.transaction().await?;

        // FOR UPDATE serializes concurrent grant attempts on the same case.
        let row = tx
            .query_opt(
                &format!("SELECT {CASE_COLUMNS} FROM cases WHERE case_number = $1 FOR UPDATE"),
                &[&case_number],
            )
            .await?;
        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };
        let case = row_to_case_record(&row)?;

        if case.extension_granted {
            tx.commit().await?;
            return Ok(Some(ExtensionGrant {
                case,
                newly_granted: false,
            }));
        }

        let row = tx
            .query_one(
                &format!(
                    "UPDATE cases SET extension_granted = TRUE, updated_at = NOW() \
                     WHERE case_number = $1 RETURNING {CASE_COLUMNS}"
                ),
                &[&case_number],
            )
            .await?;
        let case = row_to_case_record(&row)?;

        insert_audit(
            &tx,
            AuditAction::Updated,
            &case.case_number,
            performed_by,
            &format!(
                "Prórroga de 15 días concedida para el caso {}.",
                case.case_number
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(Some(ExtensionGrant {
            case,
            newly_granted: true,
        }))
    }

    async fn delete_case(
        &self,
        case_number: &str,
        performed_by: Option<Uuid>,
    ) -> Result<bool, DatabaseError> {
        let mut conn = self.conn().await?;
        let tx = conn.transaction().await?;

        let deleted = tx
            .execute("DELETE FROM cases WHERE case_number = $1", &[&case_number])
            .await?;
        if deleted == 0 {
            tx.commit().await?;
            return Ok(false);
        }

        insert_audit(
            &tx,
            AuditAction::Deleted,
            case_number,
            performed_by,
            &format!("El caso {case_number} fue eliminado."),
        )
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

// ==================== ProfileStore ====================

#[async_trait]
impl ProfileStore for PgBackend {
    async fn create_profile(
        &self,
        input: &RegisterProfileParams,
    ) -> Result<ProfileRecord, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO user_profiles (id, username, email, full_name, last_name, \
                     id_number, date_of_birth, phone, address, role_request) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                     RETURNING {PROFILE_COLUMNS}"
                ),
                &[
                    &Uuid::new_v4(),
                    &input.username.trim(),
                    &input.email.trim(),
                    &input.full_name.trim(),
                    &input.last_name.trim(),
                    &input.id_number.trim(),
                    &input.date_of_birth,
                    &input.phone,
                    &input.address,
                    &input.role_request.as_str(),
                ],
            )
            .await?;
        row_to_profile_record(&row)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE id = $1"),
                &[&id],
            )
            .await?;
        row.as_ref().map(row_to_profile_record).transpose()
    }

    async fn get_profile_by_username(
        &self,
        username: &str,
    ) -> Result<Option<ProfileRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE username = $1"),
                &[&username],
            )
            .await?;
        row.as_ref().map(row_to_profile_record).transpose()
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM user_profiles ORDER BY created_at"),
                &[],
            )
            .await?;
        rows.iter().map(row_to_profile_record).collect()
    }

    async fn list_pending_profiles(&self) -> Result<Vec<ProfileRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {PROFILE_COLUMNS} FROM user_profiles \
                     WHERE approved_by_admin = FALSE ORDER BY created_at"
                ),
                &[],
            )
            .await?;
        rows.iter().map(row_to_profile_record).collect()
    }

    async fn approve_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                &format!(
                    "UPDATE user_profiles SET approved_by_admin = TRUE, role = role_request, \
                     updated_at = NOW() WHERE id = $1 RETURNING {PROFILE_COLUMNS}"
                ),
                &[&id],
            )
            .await?;
        row.as_ref().map(row_to_profile_record).transpose()
    }

    async fn delete_profile(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM user_profiles WHERE id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }

    async fn find_profile_conflicts(
        &self,
        input: &RegisterProfileParams,
    ) -> Result<ProfileConflicts, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "SELECT \
                 EXISTS(SELECT 1 FROM user_profiles WHERE username = $1) AS username_taken, \
                 EXISTS(SELECT 1 FROM user_profiles WHERE email = $2) AS email_taken, \
                 EXISTS(SELECT 1 FROM user_profiles WHERE id_number = $3) AS id_number_taken",
                &[
                    &input.username.trim(),
                    &input.email.trim(),
                    &input.id_number.trim(),
                ],
            )
            .await?;
        Ok(ProfileConflicts {
            username_taken: row.get("username_taken"),
            email_taken: row.get("email_taken"),
            id_number_taken: row.get("id_number_taken"),
        })
    }
}

// ==================== AuditStore ====================

#[async_trait]
impl AuditStore for PgBackend {
    async fn list_audit_entries(&self, limit: i64) -> Result<Vec<AuditLogRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, action, case_number, performed_by, details, created_at \
                 FROM audit_log ORDER BY created_at DESC LIMIT $1",
                &[&limit],
            )
            .await?;
        rows.iter().map(row_to_audit_record).collect()
    }

    async fn audit_entries_for_case(
        &self,
        case_number: &str,
    ) -> Result<Vec<AuditLogRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, action, case_number, performed_by, details, created_at \
                 FROM audit_log WHERE case_number = $1 ORDER BY created_at DESC",
                &[&case_number],
            )
            .await?;
        rows.iter().map(row_to_audit_record).collect()
    }
}

// ==================== SettingsStore ====================

#[async_trait]
impl SettingsStore for PgBackend {
    async fn load_platform_settings(
        &self,
        defaults: &BrandingDefaults,
    ) -> Result<PlatformSettingsRecord, DatabaseError> {
        let conn = self.conn().await?;
        // Atomic get-or-create: concurrent first loads race on the insert,
        // exactly one wins, everyone reads the same row.
        conn.execute(
            "INSERT INTO platform_settings (id, primary_color, secondary_color) \
             VALUES (1, $1, $2) ON CONFLICT (id) DO NOTHING",
            &[&defaults.primary_color, &defaults.secondary_color],
        )
        .await?;
        let row = conn
            .query_one(
                &format!("SELECT {SETTINGS_COLUMNS} FROM platform_settings WHERE id = 1"),
                &[],
            )
            .await?;
        Ok(row_to_settings_record(&row))
    }

    async fn update_platform_settings(
        &self,
        defaults: &BrandingDefaults,
        input: &UpdatePlatformSettingsParams,
    ) -> Result<PlatformSettingsRecord, DatabaseError> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO platform_settings (id, primary_color, secondary_color) \
             VALUES (1, $1, $2) ON CONFLICT (id) DO NOTHING",
            &[&defaults.primary_color, &defaults.secondary_color],
        )
        .await?;

        let mut sets: Vec<String> = vec!["updated_at = NOW()".to_string()];
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(value) = input.primary_color.as_ref() {
            params.push(value);
            sets.push(format!("primary_color = ${}", params.len()));
        }
        if let Some(value) = input.secondary_color.as_ref() {
            params.push(value);
            sets.push(format!("secondary_color = ${}", params.len()));
        }
        if let Some(value) = input.footer_text.as_ref() {
            params.push(value);
            sets.push(format!("footer_text = ${}", params.len()));
        }
        if let Some(value) = input.logo_path.as_ref() {
            params.push(value);
            sets.push(format!("logo_path = ${}", params.len()));
        }
        if let Some(value) = input.header_image_path.as_ref() {
            params.push(value);
            sets.push(format!("header_image_path = ${}", params.len()));
        }

        let sql = format!(
            "UPDATE platform_settings SET {} WHERE id = 1 RETURNING {SETTINGS_COLUMNS}",
            sets.join(", ")
        );
        let row = conn.query_one(&sql, &params).await?;
        Ok(row_to_settings_record(&row))
    }
}
