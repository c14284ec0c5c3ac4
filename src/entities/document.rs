//! Document entity type - controlled documents (SOPs, policies, manuals)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{string_enum, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

string_enum! {
    /// Document lifecycle status
    #[derive(Default)]
    pub enum DocumentStatus ("document status") {
        #[default]
        Draft => "draft",
        PendingReview => "pending_review",
        PendingApproval => "pending_approval",
        Approved => "approved",
        Effective => "effective",
        Superseded => "superseded",
        Archived => "archived",
    }
}

impl DocumentStatus {
    /// Waiting on a reviewer or approver
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            DocumentStatus::PendingReview | DocumentStatus::PendingApproval
        )
    }

    /// Currently in force (periodic review applies)
    pub fn is_in_force(&self) -> bool {
        matches!(self, DocumentStatus::Approved | DocumentStatus::Effective)
    }
}

/// A controlled document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: EntityId,

    /// Document title
    pub title: String,

    /// Document number (e.g., "SOP-001"), unique per organization
    pub document_number: String,

    /// Free-form version string (e.g., "2.1")
    pub version: String,

    /// Document type (e.g., "SOP", "Policy", "Work Instruction")
    pub document_type: String,

    /// Lifecycle status
    #[serde(default)]
    pub status: DocumentStatus,

    /// Inline content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Location of the controlled file, if stored elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,

    /// Next periodic review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<NaiveDate>,

    pub created_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for Document {
    const PREFIX: EntityPrefix = EntityPrefix::Doc;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn number(&self) -> Option<&str> {
        Some(&self.document_number)
    }

    fn status_key(&self) -> &'static str {
        self.status.as_str()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn author(&self) -> &str {
        &self.created_by
    }
}

impl Document {
    /// Create a new draft document
    pub fn new(
        title: String,
        document_number: String,
        document_type: String,
        created_by: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Doc),
            title,
            document_number,
            version: "1.0".to_string(),
            document_type,
            status: DocumentStatus::default(),
            content: None,
            file_url: None,
            effective_date: None,
            review_date: None,
            created_by,
            approved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Periodic review date has passed while the document is in force
    pub fn is_review_due(&self, today: NaiveDate) -> bool {
        self.status.is_in_force() && self.review_date.is_some_and(|d| d < today)
    }

    /// One-line summary used where a description is expected
    pub fn summary(&self) -> String {
        match self.content.as_deref().map(str::trim) {
            Some(content) if !content.is_empty() => content.to_string(),
            _ => format!("{} v{}", self.document_type, self.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(
            "Standard Operating Procedure - Equipment Calibration".to_string(),
            "SOP-001".to_string(),
            "SOP".to_string(),
            "Emily Davis".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_document_creation() {
        let doc = sample();
        assert!(doc.id.to_string().starts_with("DOC-"));
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.number(), Some("SOP-001"));
    }

    #[test]
    fn test_document_roundtrip() {
        let mut doc = sample();
        doc.status = DocumentStatus::PendingApproval;
        doc.review_date = NaiveDate::from_ymd_opt(2025, 1, 15);

        let yaml = serde_yml::to_string(&doc).unwrap();
        assert!(yaml.contains("status: pending_approval"));
        let parsed: Document = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(parsed.id, doc.id);
        assert_eq!(parsed.status, DocumentStatus::PendingApproval);
        assert_eq!(parsed.review_date, doc.review_date);
    }

    #[test]
    fn test_version_is_not_validated() {
        let mut doc = sample();
        doc.version = "rev B (draft)".to_string();
        let yaml = serde_yml::to_string(&doc).unwrap();
        let parsed: Document = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.version, "rev B (draft)");
    }

    #[test]
    fn test_review_due() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut doc = sample();
        doc.review_date = NaiveDate::from_ymd_opt(2025, 2, 1);

        // Drafts are not subject to periodic review
        assert!(!doc.is_review_due(today));

        doc.status = DocumentStatus::Effective;
        assert!(doc.is_review_due(today));

        doc.review_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert!(!doc.is_review_due(today));
    }

    #[test]
    fn test_summary_falls_back_to_type_and_version() {
        let mut doc = sample();
        assert_eq!(doc.summary(), "SOP v1.0");
        doc.content = Some("Calibrate balances monthly.".to_string());
        assert_eq!(doc.summary(), "Calibrate balances monthly.");
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = "published".parse::<DocumentStatus>().unwrap_err();
        assert_eq!(err.kind, "document status");
    }
}
