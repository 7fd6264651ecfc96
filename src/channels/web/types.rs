//! Request and response DTOs for the web gateway API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cases::DeadlineReport;
use crate::db::{
    CaseRecord, CaseStatus, PlatformSettingsRecord, ProfileRecord, UpdatePlatformSettingsParams,
};

// --- Cases ---

/// Admin panel listing controls; judges get the same shape with ownership
/// applied server-side.
#[derive(Debug, Default, Deserialize)]
pub struct CaseListQuery {
    pub status: Option<String>,
    pub judge: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaseListResponse {
    pub cases: Vec<CaseRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct RegisterCaseResponse {
    pub message: String,
    pub case: CaseRecord,
}

#[derive(Debug, Serialize)]
pub struct CaseDetailResponse {
    pub case: CaseRecord,
    pub deadline: DeadlineView,
}

/// Deadline report plus its presentation labels.
#[derive(Debug, Serialize)]
pub struct DeadlineView {
    pub elapsed_days: i64,
    pub limit_days: i64,
    pub progress_percent: u8,
    pub status: &'static str,
    pub status_label: &'static str,
    pub css_class: &'static str,
}

impl From<DeadlineReport> for DeadlineView {
    fn from(report: DeadlineReport) -> Self {
        Self {
            elapsed_days: report.elapsed_days,
            limit_days: report.limit_days,
            progress_percent: report.progress_percent,
            status: match report.status {
                crate::cases::DeadlineStatus::OnTime => "on_time",
                crate::cases::DeadlineStatus::Urgent => "urgent",
                crate::cases::DeadlineStatus::Overdue => "overdue",
            },
            status_label: report.status.label(),
            css_class: report.status.css_class(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: CaseStatus,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub case: CaseRecord,
}

#[derive(Debug, Serialize)]
pub struct ExtensionResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub case: CaseRecord,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// --- Profiles ---

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub profile: ProfileRecord,
}

#[derive(Debug, Serialize)]
pub struct PendingUsersResponse {
    pub pending: Vec<ProfileRecord>,
}

// --- Audit ---

#[derive(Debug, Default, Deserialize)]
pub struct AuditListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub entries: Vec<crate::db::AuditLogRecord>,
}

// --- Settings ---

/// Absent field = untouched; empty string clears a nullable column.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdateRequest {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub footer_text: Option<String>,
    pub logo_path: Option<String>,
    pub header_image_path: Option<String>,
}

fn nullable(value: Option<String>) -> Option<Option<String>> {
    value.map(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl SettingsUpdateRequest {
    pub fn into_params(self) -> UpdatePlatformSettingsParams {
        UpdatePlatformSettingsParams {
            primary_color: self.primary_color,
            secondary_color: self.secondary_color,
            footer_text: nullable(self.footer_text),
            logo_path: nullable(self.logo_path),
            header_image_path: nullable(self.header_image_path),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: PlatformSettingsRecord,
}

#[cfg(test)]
mod tests {
    use super::SettingsUpdateRequest;

    #[test]
    fn empty_string_clears_nullable_fields() {
        let request = SettingsUpdateRequest {
            primary_color: Some("#112233".to_string()),
            secondary_color: None,
            footer_text: Some("  ".to_string()),
            logo_path: Some("branding/logo.png".to_string()),
            header_image_path: None,
        };

        let params = request.into_params();
        assert_eq!(params.primary_color.as_deref(), Some("#112233"));
        assert_eq!(params.secondary_color, None);
        assert_eq!(params.footer_text, Some(None));
        assert_eq!(
            params.logo_path,
            Some(Some("branding/logo.png".to_string()))
        );
        assert_eq!(params.header_image_path, None);
    }
}
