//! Change control entity type - change requests and their approval workflow

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{string_enum, Entity, Priority};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::overdue::Deadline;

string_enum! {
    /// Change request workflow status
    #[derive(Default)]
    pub enum ChangeStatus ("change status") {
        #[default]
        Draft => "draft",
        PendingReview => "pending_review",
        PendingApproval => "pending_approval",
        Approved => "approved",
        Implemented => "implemented",
        Closed => "closed",
        Cancelled => "cancelled",
    }
}

impl ChangeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChangeStatus::Closed | ChangeStatus::Cancelled)
    }
}

/// A change control record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeControl {
    /// Unique identifier
    pub id: EntityId,

    /// Change number (e.g., "CR-2024-001")
    pub change_number: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Change type (e.g., "Process", "Document", "Equipment")
    pub change_type: String,

    #[serde(default)]
    pub status: ChangeStatus,

    #[serde(default)]
    pub priority: Priority,

    pub requested_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for ChangeControl {
    const PREFIX: EntityPrefix = EntityPrefix::Cr;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn number(&self) -> Option<&str> {
        Some(&self.change_number)
    }

    fn status_key(&self) -> &'static str {
        self.status.as_str()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn author(&self) -> &str {
        &self.requested_by
    }
}

impl Deadline for ChangeControl {
    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl ChangeControl {
    /// Create a new draft change request
    pub fn new(
        change_number: String,
        title: String,
        change_type: String,
        requested_by: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Cr),
            change_number,
            title,
            description: String::new(),
            change_type,
            status: ChangeStatus::default(),
            priority: Priority::default(),
            requested_by,
            approved_by: None,
            due_date: None,
            completed_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_creation() {
        let change = ChangeControl::new(
            "CR-2024-001".to_string(),
            "Update Cleaning Procedure for Lab B".to_string(),
            "Process".to_string(),
            "Robert Taylor".to_string(),
            Utc::now(),
        );

        assert!(change.id.to_string().starts_with("CR-"));
        assert_eq!(change.status, ChangeStatus::Draft);
        assert_eq!(change.author(), "Robert Taylor");
    }

    #[test]
    fn test_change_status_from_str() {
        assert_eq!(
            "pending-approval".parse::<ChangeStatus>().unwrap(),
            ChangeStatus::PendingApproval
        );
        assert_eq!(
            "Implemented".parse::<ChangeStatus>().unwrap(),
            ChangeStatus::Implemented
        );
        assert!("effective".parse::<ChangeStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = ChangeStatus::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .map(|s| s.as_str())
            .collect();
        assert_eq!(terminal, vec!["closed", "cancelled"]);
    }
}
