use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::policy::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    View,
    Export,
    Edit,
}

/// Record of one masked disclosure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<String>,
    pub role: Role,
    pub record_id: String,
    pub action: AuditAction,
    pub fields_accessed: Vec<String>,
    pub fields_masked: Vec<String>,
}

impl AuditRecord {
    pub fn view(record_id: impl Into<String>, role: Role) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: None,
            role,
            record_id: record_id.into(),
            action: AuditAction::View,
            fields_accessed: Vec::new(),
            fields_masked: Vec::new(),
        }
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Log under the `audit` target.
    pub fn emit(&self) {
        tracing::info!(
            target: "audit",
            record_id = %self.record_id,
            user_id = self.user_id.as_deref().unwrap_or("anonymous"),
            role = %self.role,
            action = ?self.action,
            fields_accessed = self.fields_accessed.len(),
            fields_masked = ?self.fields_masked,
            "pii disclosure"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_record_defaults() {
        let record = AuditRecord::view("r-1", Role::Standard).with_user(Some("u-7".into()));
        assert_eq!(record.action, AuditAction::View);
        assert_eq!(record.user_id.as_deref(), Some("u-7"));
        assert!(record.fields_masked.is_empty());
        record.emit();
    }

    #[test]
    fn serializes_upper_case_enums() {
        let record = AuditRecord::view("r-1", Role::Gold);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["action"], "VIEW");
        assert_eq!(json["role"], "GOLD");
    }
}
